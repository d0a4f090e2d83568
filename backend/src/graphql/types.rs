//! GraphQL type definitions
//!
//! These types mirror the catalog records but are decorated with
//! async-graphql attributes. Book and Author keep snake_case field names on
//! the wire; everything else uses the default camelCase.

use async_graphql::{ComplexObject, Context, InputObject, MaybeUndefined, Result, SimpleObject};
use chrono::{DateTime, Utc};

use crate::db::{AuthorFields, AuthorRecord, BookFields, BookRecord, NewRating, RatingEntry};
use crate::graphql::scalars::DateTimeScalar;
use crate::services::catalog::{
    AuthorPage, AuthorView, BookPage, BookView, CatalogService, check_comment, check_score,
};

/// A single rating left on a book
#[derive(Debug, Clone, SimpleObject)]
pub struct Rating {
    /// Score from 1 to 5
    pub rating: i32,
    pub comment: String,
    /// When the rating was added
    pub created_at: DateTimeScalar,
}

impl From<RatingEntry> for Rating {
    fn from(entry: RatingEntry) -> Self {
        Self {
            rating: entry.rating,
            comment: entry.comment,
            created_at: entry.created_at.into(),
        }
    }
}

/// A catalogued book
#[derive(Debug, Clone, SimpleObject)]
#[graphql(complex, rename_fields = "snake_case")]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub published_date: Option<DateTimeScalar>,
    pub author_id: i32,
    /// Public URL of the cover image
    pub image: Option<String>,
    pub created_by_id: Option<String>,
    /// All ratings in the order they were added
    pub ratings: Vec<Rating>,
    #[graphql(skip)]
    pub loaded_author: Option<Option<Author>>,
}

#[ComplexObject]
impl Book {
    /// The book's author, or null when the author row no longer exists
    async fn author(&self, ctx: &Context<'_>) -> Result<Option<Author>> {
        if let Some(author) = &self.loaded_author {
            return Ok(author.clone());
        }

        let catalog = ctx.data_unchecked::<CatalogService>();
        let author = catalog
            .find_author(self.author_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(author.map(Author::from))
    }
}

impl From<BookRecord> for Book {
    fn from(record: BookRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            published_date: record.published_date.map(DateTimeScalar::from),
            author_id: record.author_id,
            image: record.image,
            created_by_id: record.created_by_id,
            ratings: Vec::new(),
            loaded_author: None,
        }
    }
}

impl From<BookView> for Book {
    fn from(view: BookView) -> Self {
        Self {
            ratings: view.ratings.into_iter().map(Rating::from).collect(),
            loaded_author: view.author.map(|author| author.map(Author::from)),
            ..Book::from(view.book)
        }
    }
}

/// A book author
#[derive(Debug, Clone, SimpleObject)]
#[graphql(complex, rename_fields = "snake_case")]
pub struct Author {
    pub id: i32,
    pub name: String,
    pub biography: Option<String>,
    pub born_date: Option<DateTimeScalar>,
    pub image: Option<String>,
    pub created_by_id: Option<String>,
    #[graphql(skip)]
    pub loaded_books: Option<Vec<Book>>,
}

#[ComplexObject]
impl Author {
    /// Books written by this author
    async fn books(&self, ctx: &Context<'_>) -> Result<Vec<Book>> {
        if let Some(books) = &self.loaded_books {
            return Ok(books.clone());
        }

        let catalog = ctx.data_unchecked::<CatalogService>();
        let books = catalog
            .books_by_author(self.id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(books.into_iter().map(Book::from).collect())
    }
}

impl From<AuthorRecord> for Author {
    fn from(record: AuthorRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            biography: record.biography,
            born_date: record.born_date.map(DateTimeScalar::from),
            image: record.image,
            created_by_id: record.created_by_id,
            loaded_books: None,
        }
    }
}

impl From<AuthorView> for Author {
    fn from(view: AuthorView) -> Self {
        Self {
            loaded_books: view
                .books
                .map(|books| books.into_iter().map(Book::from).collect()),
            ..Author::from(view.author)
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct PaginatedBooks {
    pub books: Vec<Book>,
    /// Number of books matching the filter across all pages
    pub total: i64,
    pub has_more: bool,
}

impl From<BookPage> for PaginatedBooks {
    fn from(page: BookPage) -> Self {
        Self {
            books: page.books.into_iter().map(Book::from).collect(),
            total: page.total,
            has_more: page.has_more,
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct PaginatedAuthors {
    pub authors: Vec<Author>,
    pub total: i64,
    pub total_pages: i64,
}

impl From<AuthorPage> for PaginatedAuthors {
    fn from(page: AuthorPage) -> Self {
        Self {
            authors: page.authors.into_iter().map(Author::from).collect(),
            total: page.total,
            total_pages: page.total_pages,
        }
    }
}

// ============================================================================
// Inputs
// ============================================================================

/// Undefined leaves a column untouched, null clears it
fn field_change<T>(value: MaybeUndefined<T>) -> Option<Option<T>> {
    match value {
        MaybeUndefined::Undefined => None,
        MaybeUndefined::Null => Some(None),
        MaybeUndefined::Value(v) => Some(Some(v)),
    }
}

fn date_change(value: MaybeUndefined<DateTimeScalar>) -> Option<Option<DateTime<Utc>>> {
    field_change(value).map(|date| date.and_then(DateTimeScalar::into_inner))
}

/// Book payload for create and update. `id` is only read by update.
#[derive(Debug, InputObject)]
#[graphql(rename_fields = "snake_case")]
pub struct BookInput {
    pub id: Option<i32>,
    pub title: String,
    pub description: MaybeUndefined<String>,
    pub published_date: MaybeUndefined<DateTimeScalar>,
    pub author_id: i32,
    pub image: MaybeUndefined<String>,
    pub created_by_id: MaybeUndefined<String>,
}

impl BookInput {
    /// Split into the target id and the fields to write
    pub fn into_parts(self) -> (Option<i32>, BookFields) {
        let fields = BookFields {
            title: self.title,
            author_id: self.author_id,
            description: field_change(self.description),
            published_date: date_change(self.published_date),
            image: field_change(self.image),
            created_by_id: field_change(self.created_by_id),
        };
        (self.id, fields)
    }
}

/// Author payload for create and update. `id` is only read by update.
#[derive(Debug, InputObject)]
#[graphql(rename_fields = "snake_case")]
pub struct AuthorInput {
    pub id: Option<i32>,
    pub name: String,
    pub biography: MaybeUndefined<String>,
    pub born_date: MaybeUndefined<DateTimeScalar>,
    pub image: MaybeUndefined<String>,
    pub created_by_id: MaybeUndefined<String>,
}

impl AuthorInput {
    pub fn into_parts(self) -> (Option<i32>, AuthorFields) {
        let fields = AuthorFields {
            name: self.name,
            biography: field_change(self.biography),
            born_date: date_change(self.born_date),
            image: field_change(self.image),
            created_by_id: field_change(self.created_by_id),
        };
        (self.id, fields)
    }
}

/// A new rating, checked with the catalog service's own rules and messages
#[derive(Debug, InputObject)]
pub struct RatingInput {
    #[graphql(validator(custom = "|score: &i32| check_score(*score)"))]
    pub rating: i32,
    #[graphql(validator(custom = "|comment: &String| check_comment(comment)"))]
    pub comment: String,
}

impl From<RatingInput> for NewRating {
    fn from(input: RatingInput) -> Self {
        Self {
            rating: input.rating,
            comment: input.comment,
        }
    }
}
