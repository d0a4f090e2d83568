//! Rating document store
//!
//! Ratings live in their own SQLite database, one document per book id
//! with the entries embedded as a JSON array. Documents reference books by
//! id only; nothing ties them to rows in the catalog database.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use super::schema::{SchemaSyncResult, sync_ratings_schema};
use super::sqlite_helpers::now_iso8601;

/// One embedded rating entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingEntry {
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Rating payload before the server assigns its timestamp
#[derive(Debug, Clone)]
pub struct NewRating {
    pub rating: i32,
    pub comment: String,
}

/// Pooled connection to the rating document database
#[derive(Clone)]
pub struct RatingStore {
    pool: SqlitePool,
}

impl RatingStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = super::open_pool(database_url, max_connections).await?;
        info!(url = %database_url, "Connected to rating store");
        Ok(Self { pool })
    }

    pub async fn ensure_schema(&self) -> sqlx::Result<SchemaSyncResult> {
        sync_ratings_schema(&self.pool).await
    }

    pub async fn ping(&self) -> sqlx::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Ratings for one book; empty when the book has no document
    pub async fn find_by_book_id(&self, book_id: i32) -> sqlx::Result<Vec<RatingEntry>> {
        let row = sqlx::query("SELECT ratings FROM rating_documents WHERE book_id = ?")
            .bind(book_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(row.try_get::<Json<Vec<RatingEntry>>, _>("ratings")?.0),
            None => Ok(Vec::new()),
        }
    }

    /// Ratings for many books in one query. Books without a document are
    /// absent from the map.
    ///
    /// The ids are bound as a single JSON array, so any page size stays
    /// within SQLite's bind-variable limit.
    pub async fn find_by_book_ids(
        &self,
        book_ids: &[i32],
    ) -> sqlx::Result<HashMap<i32, Vec<RatingEntry>>> {
        if book_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            "SELECT book_id, ratings FROM rating_documents \
             WHERE book_id IN (SELECT value FROM json_each(?))",
        )
        .bind(Json(book_ids))
        .fetch_all(&self.pool)
        .await?;
        debug!(requested = book_ids.len(), found = rows.len(), "Loaded rating documents");

        rows.iter()
            .map(|row| {
                let book_id: i32 = row.try_get("book_id")?;
                let Json(ratings) = row.try_get::<Json<Vec<RatingEntry>>, _>("ratings")?;
                Ok::<_, sqlx::Error>((book_id, ratings))
            })
            .collect()
    }

    /// Append a rating, creating the book's document when it has none.
    ///
    /// The insert-or-append is a single statement, so concurrent appends
    /// for the same book never lose entries. Returns the full list after
    /// the append.
    pub async fn append(&self, book_id: i32, rating: NewRating) -> sqlx::Result<Vec<RatingEntry>> {
        let entry = RatingEntry {
            rating: rating.rating,
            comment: rating.comment,
            created_at: Utc::now(),
        };
        let entry_json = serde_json::to_string(&entry).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        let now = now_iso8601();

        let row = sqlx::query(
            r#"
            INSERT INTO rating_documents (book_id, ratings, created_at, updated_at)
            VALUES (?1, json_array(json(?2)), ?3, ?3)
            ON CONFLICT(book_id) DO UPDATE SET
                ratings = json_insert(rating_documents.ratings, '$[#]', json(?2)),
                updated_at = ?3
            RETURNING ratings
            "#,
        )
        .bind(book_id)
        .bind(&entry_json)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        let Json(ratings) = row.try_get::<Json<Vec<RatingEntry>>, _>("ratings")?;
        debug!(book_id, count = ratings.len(), "Appended rating");
        Ok(ratings)
    }
}
