//! Schema bootstrap for the relational and rating stores
//!
//! Tables are created when missing. Existing tables only gain the
//! case-folded search columns they lack, which are then backfilled.
//! There is no migration history: column renames or type changes
//! require a fresh database file.

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use super::sqlite_helpers::fold_case;

/// Result of a schema sync operation
#[derive(Debug, Default)]
pub struct SchemaSyncResult {
    pub tables_created: Vec<String>,
    pub columns_added: Vec<(String, String)>, // (table, column)
    pub errors: Vec<String>,
}

impl SchemaSyncResult {
    fn merge(&mut self, other: SchemaSyncResult) {
        self.tables_created.extend(other.tables_created);
        self.columns_added.extend(other.columns_added);
        self.errors.extend(other.errors);
    }

    /// Turn collected statement failures into an error naming the store
    pub fn into_result(self, store: &str) -> anyhow::Result<Self> {
        if self.errors.is_empty() {
            Ok(self)
        } else {
            anyhow::bail!("{} schema sync failed: {}", store, self.errors.join("; "))
        }
    }
}

/// A search column holding the [fold_case] copy of another column
struct FoldedColumn {
    column: &'static str,
    source: &'static str,
}

/// A table and the statements that create it and its indexes
struct TableDef {
    name: &'static str,
    create: &'static str,
    indexes: &'static [&'static str],
    folded: &'static [FoldedColumn],
}

const AUTHORS: TableDef = TableDef {
    name: "authors",
    create: r#"
        CREATE TABLE IF NOT EXISTS authors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            biography TEXT,
            born_date TEXT,
            image TEXT,
            created_by_id TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            name_folded TEXT,
            biography_folded TEXT
        )
    "#,
    indexes: &["CREATE INDEX IF NOT EXISTS idx_authors_name ON authors(name)"],
    folded: &[
        FoldedColumn {
            column: "name_folded",
            source: "name",
        },
        FoldedColumn {
            column: "biography_folded",
            source: "biography",
        },
    ],
};

const BOOKS: TableDef = TableDef {
    name: "books",
    create: r#"
        CREATE TABLE IF NOT EXISTS books (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT,
            published_date TEXT,
            author_id INTEGER NOT NULL,
            image TEXT,
            created_by_id TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            title_folded TEXT
        )
    "#,
    indexes: &[
        "CREATE INDEX IF NOT EXISTS idx_books_author_id ON books(author_id)",
        "CREATE INDEX IF NOT EXISTS idx_books_created_at ON books(created_at)",
    ],
    folded: &[FoldedColumn {
        column: "title_folded",
        source: "title",
    }],
};

const RATING_DOCUMENTS: TableDef = TableDef {
    name: "rating_documents",
    create: r#"
        CREATE TABLE IF NOT EXISTS rating_documents (
            book_id INTEGER PRIMARY KEY,
            ratings TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
    "#,
    indexes: &[],
    folded: &[],
};

/// Check if a table exists in the database
async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool, sqlx::Error> {
    let result: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name = ?")
            .bind(table_name)
            .fetch_optional(pool)
            .await?;

    Ok(result.is_some())
}

/// Get existing columns for a table
async fn get_table_columns(
    pool: &SqlitePool,
    table_name: &str,
) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(i32, String, String, i32, Option<String>, i32)> =
        sqlx::query_as(&format!("PRAGMA table_info({})", table_name))
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().map(|(_, name, _, _, _, _)| name).collect())
}

/// Add folded columns missing from a table created before they existed
async fn add_missing_folded_columns(
    pool: &SqlitePool,
    table: &TableDef,
    result: &mut SchemaSyncResult,
) -> Result<(), sqlx::Error> {
    let existing_columns = get_table_columns(pool, table.name).await?;

    for folded in table.folded {
        if existing_columns.iter().any(|c| c == folded.column) {
            continue;
        }

        let alter_sql = format!("ALTER TABLE {} ADD COLUMN {} TEXT", table.name, folded.column);
        debug!("Adding column to {}: {}", table.name, alter_sql);
        match sqlx::query(&alter_sql).execute(pool).await {
            Ok(_) => {
                info!("Added column {}.{}", table.name, folded.column);
                result
                    .columns_added
                    .push((table.name.to_string(), folded.column.to_string()));
            }
            Err(e) => {
                let msg = format!("Failed to add column {}.{}: {}", table.name, folded.column, e);
                warn!("{}", msg);
                result.errors.push(msg);
            }
        }
    }

    Ok(())
}

/// Fill folded columns left NULL for rows whose source text is set.
///
/// Folding happens in Rust because SQLite's `LOWER()` is ASCII-only.
async fn backfill_folded_columns(pool: &SqlitePool, table: &TableDef) -> Result<u64, sqlx::Error> {
    let mut filled = 0;

    for folded in table.folded {
        let rows: Vec<(i64, String)> = sqlx::query_as(&format!(
            "SELECT id, {source} FROM {table} WHERE {column} IS NULL AND {source} IS NOT NULL",
            source = folded.source,
            table = table.name,
            column = folded.column,
        ))
        .fetch_all(pool)
        .await?;

        let update_sql = format!("UPDATE {} SET {} = ? WHERE id = ?", table.name, folded.column);
        for (id, text) in rows {
            sqlx::query(&update_sql)
                .bind(fold_case(&text))
                .bind(id)
                .execute(pool)
                .await?;
            filled += 1;
        }
    }

    if filled > 0 {
        info!(table = table.name, rows = filled, "Backfilled search columns");
    }
    Ok(filled)
}

async fn sync_table(pool: &SqlitePool, table: &TableDef) -> Result<SchemaSyncResult, sqlx::Error> {
    let mut result = SchemaSyncResult::default();

    if !table_exists(pool, table.name).await? {
        debug!(table = table.name, "Creating table");
        match sqlx::query(table.create.trim()).execute(pool).await {
            Ok(_) => {
                info!("Created table: {}", table.name);
                result.tables_created.push(table.name.to_string());
            }
            Err(e) => {
                let msg = format!("Failed to create table {}: {}", table.name, e);
                warn!("{}", msg);
                result.errors.push(msg);
                return Ok(result);
            }
        }
    } else {
        add_missing_folded_columns(pool, table, &mut result).await?;
    }

    for index in table.indexes {
        if let Err(e) = sqlx::query(index).execute(pool).await {
            let msg = format!("Failed to create index on {}: {}", table.name, e);
            warn!("{}", msg);
            result.errors.push(msg);
        }
    }

    if !table.folded.is_empty() && result.errors.is_empty() {
        backfill_folded_columns(pool, table).await?;
    }

    Ok(result)
}

async fn sync_tables(
    pool: &SqlitePool,
    tables: &[&TableDef],
) -> Result<SchemaSyncResult, sqlx::Error> {
    let mut result = SchemaSyncResult::default();
    for table in tables {
        result.merge(sync_table(pool, table).await?);
    }

    if !result.tables_created.is_empty() {
        info!(tables = ?result.tables_created, "Schema sync created tables");
    }
    if !result.columns_added.is_empty() {
        info!(columns = ?result.columns_added, "Schema sync added columns");
    }
    Ok(result)
}

/// Create the `authors` and `books` tables, upgrading older layouts.
///
/// `books.author_id` is indexed but not a foreign key: deleting an author
/// leaves its books in place.
pub async fn sync_catalog_schema(pool: &SqlitePool) -> Result<SchemaSyncResult, sqlx::Error> {
    sync_tables(pool, &[&AUTHORS, &BOOKS]).await
}

/// Create the rating document table
pub async fn sync_ratings_schema(pool: &SqlitePool) -> Result<SchemaSyncResult, sqlx::Error> {
    sync_tables(pool, &[&RATING_DOCUMENTS]).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_sync_creates_tables_once() {
        let pool = memory_pool().await;

        let first = sync_catalog_schema(&pool).await.unwrap();
        assert_eq!(first.tables_created, vec!["authors", "books"]);
        assert!(first.errors.is_empty());

        let second = sync_catalog_schema(&pool).await.unwrap();
        assert!(second.tables_created.is_empty());
        assert!(table_exists(&pool, "books").await.unwrap());
    }

    #[tokio::test]
    async fn test_sync_ratings_schema() {
        let pool = memory_pool().await;
        let result = sync_ratings_schema(&pool).await.unwrap();
        assert_eq!(result.tables_created, vec!["rating_documents"]);
        assert!(!table_exists(&pool, "books").await.unwrap());
    }

    #[tokio::test]
    async fn test_sync_upgrades_tables_without_folded_columns() {
        let pool = memory_pool().await;
        sqlx::query(
            "CREATE TABLE authors (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, \
             biography TEXT, born_date TEXT, image TEXT, created_by_id TEXT, \
             created_at TEXT NOT NULL, updated_at TEXT NOT NULL)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO authors (name, biography, created_at, updated_at) \
             VALUES ('Émile Zola', NULL, 'now', 'now')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let result = sync_catalog_schema(&pool).await.unwrap();
        assert_eq!(result.tables_created, vec!["books"]);
        assert_eq!(
            result.columns_added,
            vec![
                ("authors".to_string(), "name_folded".to_string()),
                ("authors".to_string(), "biography_folded".to_string()),
            ]
        );
        assert!(result.errors.is_empty());

        let (name, biography): (Option<String>, Option<String>) =
            sqlx::query_as("SELECT name_folded, biography_folded FROM authors")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(name.as_deref(), Some("émile zola"));
        assert_eq!(biography, None);

        let again = sync_catalog_schema(&pool).await.unwrap();
        assert!(again.columns_added.is_empty());
    }

    #[tokio::test]
    async fn test_failed_statements_become_an_error() {
        let pool = memory_pool().await;
        // A view by the table's name survives CREATE TABLE IF NOT EXISTS but cannot be indexed
        sqlx::query("CREATE VIEW authors AS SELECT 1 AS id, 'x' AS name")
            .execute(&pool)
            .await
            .unwrap();

        let result = sync_catalog_schema(&pool).await.unwrap();
        assert!(!result.errors.is_empty());

        let err = result.into_result("catalog").unwrap_err();
        assert!(err.to_string().starts_with("catalog schema sync failed: "));

        assert!(SchemaSyncResult::default().into_result("ratings").is_ok());
    }
}
