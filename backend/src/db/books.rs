//! Book database repository

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::types::Json;
use sqlx::{FromRow, Row, SqlitePool};
use tracing::debug;

use super::authors::{AuthorRecord, JOINED_AUTHOR_COLUMNS};
use super::filters::{BookListFilter, SetClause, book_query_plan};
use super::sqlite_helpers::{
    datetime_to_str, decode_datetime, decode_datetime_opt, fold_case, now_iso8601,
};

/// Book record from database
#[derive(Debug, Clone, PartialEq)]
pub struct BookRecord {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub published_date: Option<DateTime<Utc>>,
    pub author_id: i32,
    pub image: Option<String>,
    pub created_by_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow<'_, SqliteRow> for BookRecord {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let published_date: Option<String> = row.try_get("published_date")?;
        let created_at: String = row.try_get("created_at")?;
        let updated_at: String = row.try_get("updated_at")?;

        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            published_date: decode_datetime_opt("published_date", published_date)?,
            author_id: row.try_get("author_id")?,
            image: row.try_get("image")?,
            created_by_id: row.try_get("created_by_id")?,
            created_at: decode_datetime("created_at", &created_at)?,
            updated_at: decode_datetime("updated_at", &updated_at)?,
        })
    }
}

/// A book with its author eagerly joined.
///
/// `author` is `None` when the author row no longer exists.
#[derive(Debug, Clone)]
pub struct BookWithAuthor {
    pub book: BookRecord,
    pub author: Option<AuthorRecord>,
}

impl FromRow<'_, SqliteRow> for BookWithAuthor {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            book: BookRecord::from_row(row)?,
            author: AuthorRecord::from_joined_row(row)?,
        })
    }
}

/// Writable book fields. Optional columns follow the same convention as
/// [AuthorFields](super::authors::AuthorFields).
#[derive(Debug, Clone, Default)]
pub struct BookFields {
    pub title: String,
    pub author_id: i32,
    pub description: Option<Option<String>>,
    pub published_date: Option<Option<DateTime<Utc>>>,
    pub image: Option<Option<String>>,
    pub created_by_id: Option<Option<String>>,
}

pub struct BookRepository {
    pool: SqlitePool,
}

impl BookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// One page of books, newest first, plus the count of all matches
    pub async fn list_paginated(
        &self,
        filter: &BookListFilter,
        offset: i64,
        limit: i64,
    ) -> sqlx::Result<(Vec<BookWithAuthor>, i64)> {
        let plan = book_query_plan(filter);
        let join = format!(
            "FROM books b {} authors a ON a.id = b.author_id",
            plan.join.to_sql()
        );
        let (where_sql, values) = plan.filter.to_sql();

        let count_sql = format!("SELECT COUNT(*) {}{}", join, where_sql);
        let mut count_query = sqlx::query(&count_sql);
        for value in &values {
            count_query = value.bind_to_query(count_query);
        }
        let total: i64 = count_query.fetch_one(&self.pool).await?.try_get(0)?;

        let sql = format!(
            "SELECT b.*, {} {}{} ORDER BY b.created_at DESC, b.id DESC LIMIT ? OFFSET ?",
            JOINED_AUTHOR_COLUMNS, join, where_sql
        );
        debug!(sql = %sql, total, "Listing books");

        let mut query = sqlx::query(&sql);
        for value in &values {
            query = value.bind_to_query(query);
        }
        let rows = query.bind(limit).bind(offset).fetch_all(&self.pool).await?;
        let books = rows
            .iter()
            .map(BookWithAuthor::from_row)
            .collect::<sqlx::Result<Vec<_>>>()?;

        Ok((books, total))
    }

    /// Fetch one book with its author
    pub async fn get_by_id(&self, id: i32) -> sqlx::Result<Option<BookWithAuthor>> {
        let sql = format!(
            "SELECT b.*, {} FROM books b LEFT JOIN authors a ON a.id = b.author_id WHERE b.id = ?",
            JOINED_AUTHOR_COLUMNS
        );
        sqlx::query_as::<_, BookWithAuthor>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// All books written by any of the given authors, in id order.
    ///
    /// The ids travel as one JSON array parameter, so the lookup is not
    /// bounded by SQLite's bind-variable limit.
    pub async fn list_by_author_ids(&self, author_ids: &[i32]) -> sqlx::Result<Vec<BookRecord>> {
        if author_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, BookRecord>(
            "SELECT * FROM books WHERE author_id IN (SELECT value FROM json_each(?)) ORDER BY id",
        )
        .bind(Json(author_ids))
        .fetch_all(&self.pool)
        .await
    }

    /// Insert a book. The author id is written as given; a missing author
    /// row is not detected here.
    pub async fn create(&self, fields: BookFields) -> sqlx::Result<BookRecord> {
        let now = now_iso8601();

        sqlx::query_as::<_, BookRecord>(
            r#"
            INSERT INTO books (title, description, published_date, author_id, image, created_by_id, created_at, updated_at,
                               title_folded)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&fields.title)
        .bind(fields.description.flatten())
        .bind(fields.published_date.flatten().map(datetime_to_str))
        .bind(fields.author_id)
        .bind(fields.image.flatten())
        .bind(fields.created_by_id.flatten())
        .bind(&now)
        .bind(&now)
        .bind(fold_case(&fields.title))
        .fetch_one(&self.pool)
        .await
    }

    /// Write the supplied fields; `None` when no row has this id
    pub async fn update(&self, id: i32, fields: BookFields) -> sqlx::Result<Option<BookRecord>> {
        let title_folded = fold_case(&fields.title);
        let set = SetClause::default()
            .set("title", fields.title)
            .set("title_folded", title_folded)
            .set("author_id", fields.author_id)
            .set_if_present("description", fields.description)
            .set_if_present("published_date", fields.published_date)
            .set_if_present("image", fields.image)
            .set_if_present("created_by_id", fields.created_by_id)
            .set("updated_at", now_iso8601());
        let (set_sql, values) = set.to_sql();

        let sql = format!("UPDATE books SET {} WHERE id = ? RETURNING *", set_sql);
        let mut query = sqlx::query(&sql);
        for value in values {
            query = value.bind_to_query(query);
        }

        query
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| BookRecord::from_row(&row))
            .transpose()
    }

    /// Remove the row, returning it as it was before deletion
    pub async fn delete(&self, id: i32) -> sqlx::Result<Option<BookRecord>> {
        sqlx::query_as::<_, BookRecord>("DELETE FROM books WHERE id = ? RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }
}
