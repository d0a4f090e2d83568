//! Catalog query composer
//!
//! Serves every book and author operation. Book results combine rows from
//! the catalog database with rating documents from the rating store; the
//! two reads are independent and not transactional.

use std::collections::HashMap;

use tracing::{debug, info};

use super::pagination::PageRequest;
use crate::db::{
    AuthorFields, AuthorListFilter, AuthorOrder, AuthorRecord, BookFields, BookListFilter,
    BookRecord, BookWithAuthor, Database, NewRating, RatingEntry, RatingStore,
};
use crate::error::{CatalogError, CatalogResult};

/// A book as returned to callers
#[derive(Debug, Clone)]
pub struct BookView {
    pub book: BookRecord,
    /// `None` when the author was not loaded with the book, `Some(None)`
    /// when it was looked up and no author row exists
    pub author: Option<Option<AuthorRecord>>,
    pub ratings: Vec<RatingEntry>,
}

impl BookView {
    fn joined(joined: BookWithAuthor, ratings: Vec<RatingEntry>) -> Self {
        Self {
            book: joined.book,
            author: Some(joined.author),
            ratings,
        }
    }

    fn unjoined(book: BookRecord, ratings: Vec<RatingEntry>) -> Self {
        Self {
            book,
            author: None,
            ratings,
        }
    }
}

/// An author as returned to callers
#[derive(Debug, Clone)]
pub struct AuthorView {
    pub author: AuthorRecord,
    /// `None` when the books were not loaded with the author
    pub books: Option<Vec<BookRecord>>,
}

#[derive(Debug, Clone)]
pub struct BookPage {
    pub books: Vec<BookView>,
    pub total: i64,
    pub has_more: bool,
}

#[derive(Debug, Clone)]
pub struct AuthorPage {
    pub authors: Vec<AuthorView>,
    pub total: i64,
    pub total_pages: i64,
}

/// A score must lie in 1 to 5 inclusive
pub fn check_score(score: i32) -> CatalogResult<()> {
    if (1..=5).contains(&score) {
        Ok(())
    } else {
        Err(CatalogError::InvalidRating("rating must be between 1 and 5"))
    }
}

/// A comment must contain something besides whitespace
pub fn check_comment(comment: &str) -> CatalogResult<()> {
    if comment.trim().is_empty() {
        Err(CatalogError::InvalidRating("comment must not be empty"))
    } else {
        Ok(())
    }
}

/// Reject ratings outside 1 to 5 and blank comments
pub fn validate_rating(rating: &NewRating) -> CatalogResult<()> {
    check_score(rating.rating)?;
    check_comment(&rating.comment)
}

#[derive(Clone)]
pub struct CatalogService {
    db: Database,
    ratings: RatingStore,
}

impl CatalogService {
    pub fn new(db: Database, ratings: RatingStore) -> Self {
        Self { db, ratings }
    }

    pub fn rating_store(&self) -> &RatingStore {
        &self.ratings
    }

    // ------------------------------------------------------------------------
    // Books
    // ------------------------------------------------------------------------

    /// One page of books, newest first, each with its author and ratings
    pub async fn list_books(
        &self,
        filter: &BookListFilter,
        page: PageRequest,
    ) -> CatalogResult<BookPage> {
        let (rows, total) = self
            .db
            .books()
            .list_paginated(filter, page.offset(), page.limit)
            .await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.book.id).collect();
        let mut ratings = self.ratings.find_by_book_ids(&ids).await?;
        debug!(
            page = page.page,
            limit = page.limit,
            total,
            rated = ratings.len(),
            "Composed book page"
        );

        let books = rows
            .into_iter()
            .map(|row| {
                let entries = ratings.remove(&row.book.id).unwrap_or_default();
                BookView::joined(row, entries)
            })
            .collect();

        Ok(BookPage {
            books,
            total,
            has_more: page.has_more(total),
        })
    }

    /// A single book, or `None` when absent
    pub async fn get_book(&self, id: i32) -> CatalogResult<Option<BookView>> {
        let Some(row) = self.db.books().get_by_id(id).await? else {
            return Ok(None);
        };
        let ratings = self.ratings.find_by_book_id(id).await?;
        Ok(Some(BookView::joined(row, ratings)))
    }

    /// Insert a book. A new book has no ratings, so the rating store is not
    /// consulted.
    pub async fn create_book(&self, fields: BookFields) -> CatalogResult<BookView> {
        let book = self.db.books().create(fields).await?;
        info!(book_id = book.id, author_id = book.author_id, "Created book");
        Ok(BookView::unjoined(book, Vec::new()))
    }

    pub async fn update_book(&self, id: Option<i32>, fields: BookFields) -> CatalogResult<BookView> {
        let id = id.ok_or(CatalogError::MissingId("Book"))?;
        let book = self
            .db
            .books()
            .update(id, fields)
            .await?
            .ok_or(CatalogError::NotFound("Book"))?;

        info!(book_id = id, "Updated book");
        let ratings = self.ratings.find_by_book_id(id).await?;
        Ok(BookView::unjoined(book, ratings))
    }

    /// Hard delete. The book's rating document is left in place.
    pub async fn delete_book(&self, id: i32) -> CatalogResult<BookView> {
        let book = self
            .db
            .books()
            .delete(id)
            .await?
            .ok_or(CatalogError::NotFound("Book"))?;

        info!(book_id = id, "Deleted book");
        let ratings = self.ratings.find_by_book_id(id).await?;
        Ok(BookView::unjoined(book, ratings))
    }

    /// Append a rating to a book's document.
    ///
    /// The append happens whether or not the book row exists. When it does
    /// not, the rating stays stored and `NotFound` is returned.
    pub async fn add_book_rating(&self, book_id: i32, rating: NewRating) -> CatalogResult<BookView> {
        validate_rating(&rating)?;

        let ratings = self.ratings.append(book_id, rating).await?;
        info!(book_id, count = ratings.len(), "Added book rating");

        let row = self
            .db
            .books()
            .get_by_id(book_id)
            .await?
            .ok_or(CatalogError::NotFound("Book"))?;
        Ok(BookView::joined(row, ratings))
    }

    /// Lazy author lookup for books returned without one
    pub async fn find_author(&self, author_id: i32) -> CatalogResult<Option<AuthorRecord>> {
        Ok(self.db.authors().get_by_id(author_id).await?)
    }

    // ------------------------------------------------------------------------
    // Authors
    // ------------------------------------------------------------------------

    /// One page of authors, each with its books loaded in a single batch
    pub async fn list_authors(
        &self,
        filter: &AuthorListFilter,
        order: AuthorOrder,
        page: PageRequest,
    ) -> CatalogResult<AuthorPage> {
        let (authors, total) = self
            .db
            .authors()
            .list_paginated(filter, order, page.offset(), page.limit)
            .await?;

        let ids: Vec<i32> = authors.iter().map(|a| a.id).collect();
        let mut books_by_author: HashMap<i32, Vec<BookRecord>> = HashMap::new();
        for book in self.db.books().list_by_author_ids(&ids).await? {
            books_by_author.entry(book.author_id).or_default().push(book);
        }

        let authors = authors
            .into_iter()
            .map(|author| {
                let books = books_by_author.remove(&author.id).unwrap_or_default();
                AuthorView {
                    author,
                    books: Some(books),
                }
            })
            .collect();

        Ok(AuthorPage {
            authors,
            total,
            total_pages: page.total_pages(total),
        })
    }

    /// A single author with all of their books, or `None` when absent
    pub async fn get_author(&self, id: i32) -> CatalogResult<Option<AuthorView>> {
        let Some(author) = self.db.authors().get_by_id(id).await? else {
            return Ok(None);
        };
        let books = self.books_by_author(id).await?;
        Ok(Some(AuthorView {
            author,
            books: Some(books),
        }))
    }

    pub async fn create_author(&self, fields: AuthorFields) -> CatalogResult<AuthorView> {
        let author = self.db.authors().create(fields).await?;
        info!(author_id = author.id, "Created author");
        Ok(AuthorView {
            author,
            books: Some(Vec::new()),
        })
    }

    pub async fn update_author(
        &self,
        id: Option<i32>,
        fields: AuthorFields,
    ) -> CatalogResult<AuthorView> {
        let id = id.ok_or(CatalogError::MissingId("Author"))?;
        let author = self
            .db
            .authors()
            .update(id, fields)
            .await?
            .ok_or(CatalogError::NotFound("Author"))?;

        info!(author_id = id, "Updated author");
        Ok(AuthorView {
            author,
            books: None,
        })
    }

    /// Hard delete. Books keep their now dangling author id.
    pub async fn delete_author(&self, id: i32) -> CatalogResult<AuthorView> {
        let author = self
            .db
            .authors()
            .delete(id)
            .await?
            .ok_or(CatalogError::NotFound("Author"))?;

        info!(author_id = id, "Deleted author");
        Ok(AuthorView {
            author,
            books: None,
        })
    }

    /// Lazy books lookup for authors returned without them
    pub async fn books_by_author(&self, author_id: i32) -> CatalogResult<Vec<BookRecord>> {
        Ok(self.db.books().list_by_author_ids(&[author_id]).await?)
    }
}
