//! Database connections and repositories
//!
//! Two SQLite databases back the service: the catalog (authors and books)
//! and the rating document store. Both are opened through [open_pool] and
//! handed around as explicit, cloneable wrappers.

pub mod authors;
pub mod books;
pub mod filters;
pub mod ratings;
pub mod schema;
pub mod sqlite_helpers;

use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

pub use authors::{AuthorFields, AuthorRecord, AuthorRepository};
pub use books::{BookFields, BookRecord, BookRepository, BookWithAuthor};
pub use filters::{AuthorListFilter, AuthorOrder, AuthorSortField, BookListFilter, OrderDirection};
pub use ratings::{NewRating, RatingEntry, RatingStore};
pub use schema::SchemaSyncResult;

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Accept both `sqlite:` URLs and bare file paths
fn normalize_url(url: &str) -> String {
    if url.starts_with("sqlite:") {
        url.to_string()
    } else {
        format!("sqlite://{}", url)
    }
}

/// Open a SQLite pool, creating the database file and its directory when
/// missing.
///
/// In-memory databases live only as long as their connection, so they get
/// a single connection that is never recycled.
pub(crate) async fn open_pool(url: &str, max_connections: u32) -> Result<SqlitePool> {
    let url = normalize_url(url);
    let options = SqliteConnectOptions::from_str(&url)
        .with_context(|| format!("Invalid database URL: {}", url))?
        .create_if_missing(true);

    let pool_options = if is_memory_url(&url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        let parent = options.get_filename().parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create database directory {:?}", parent))?;
        }
        SqlitePoolOptions::new().max_connections(max_connections)
    };

    pool_options
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to {}", url))
}

/// Catalog database wrapper providing connection pool access
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection pool
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = open_pool(url, max_connections).await?;
        info!(url = %url, max_connections, "Connected to catalog database");
        Ok(Self { pool })
    }

    /// Create the catalog tables when missing
    pub async fn ensure_schema(&self) -> sqlx::Result<SchemaSyncResult> {
        schema::sync_catalog_schema(&self.pool).await
    }

    pub async fn ping(&self) -> sqlx::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close every pooled connection; used on shutdown
    pub async fn close(&self) {
        self.pool.close().await;
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get the authors repository
    pub fn authors(&self) -> AuthorRepository {
        AuthorRepository::new(self.pool.clone())
    }

    /// Get the books repository
    pub fn books(&self) -> BookRepository {
        BookRepository::new(self.pool.clone())
    }
}
