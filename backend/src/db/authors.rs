//! Author database repository

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};
use tracing::debug;

use super::filters::{AuthorListFilter, AuthorOrder, SetClause, author_where};
use super::sqlite_helpers::{
    datetime_to_str, decode_datetime, decode_datetime_opt, fold_case, now_iso8601,
};

/// Author record from database
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorRecord {
    pub id: i32,
    pub name: String,
    pub biography: Option<String>,
    pub born_date: Option<DateTime<Utc>>,
    pub image: Option<String>,
    pub created_by_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow<'_, SqliteRow> for AuthorRecord {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let born_date: Option<String> = row.try_get("born_date")?;
        let created_at: String = row.try_get("created_at")?;
        let updated_at: String = row.try_get("updated_at")?;

        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            biography: row.try_get("biography")?,
            born_date: decode_datetime_opt("born_date", born_date)?,
            image: row.try_get("image")?,
            created_by_id: row.try_get("created_by_id")?,
            created_at: decode_datetime("created_at", &created_at)?,
            updated_at: decode_datetime("updated_at", &updated_at)?,
        })
    }
}

/// Author columns aliased with an `a_` prefix, for queries that join
/// authors onto another table as `a`
pub(crate) const JOINED_AUTHOR_COLUMNS: &str = "a.id AS a_id, a.name AS a_name, \
     a.biography AS a_biography, a.born_date AS a_born_date, a.image AS a_image, \
     a.created_by_id AS a_created_by_id, a.created_at AS a_created_at, \
     a.updated_at AS a_updated_at";

impl AuthorRecord {
    /// Decode the author half of a joined row. `None` when the join found
    /// no author row.
    pub(crate) fn from_joined_row(row: &SqliteRow) -> sqlx::Result<Option<Self>> {
        let Some(id) = row.try_get::<Option<i32>, _>("a_id")? else {
            return Ok(None);
        };

        let born_date: Option<String> = row.try_get("a_born_date")?;
        let created_at: String = row.try_get("a_created_at")?;
        let updated_at: String = row.try_get("a_updated_at")?;

        Ok(Some(Self {
            id,
            name: row.try_get("a_name")?,
            biography: row.try_get("a_biography")?,
            born_date: decode_datetime_opt("a_born_date", born_date)?,
            image: row.try_get("a_image")?,
            created_by_id: row.try_get("a_created_by_id")?,
            created_at: decode_datetime("a_created_at", &created_at)?,
            updated_at: decode_datetime("a_updated_at", &updated_at)?,
        }))
    }
}

/// Writable author fields.
///
/// For the optional columns the outer `Option` says whether the field was
/// supplied at all: `None` leaves the column untouched on update (and NULL
/// on insert), `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct AuthorFields {
    pub name: String,
    pub biography: Option<Option<String>>,
    pub born_date: Option<Option<DateTime<Utc>>>,
    pub image: Option<Option<String>>,
    pub created_by_id: Option<Option<String>>,
}

pub struct AuthorRepository {
    pool: SqlitePool,
}

impl AuthorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// One page of authors plus the distinct count of all matches
    pub async fn list_paginated(
        &self,
        filter: &AuthorListFilter,
        order: AuthorOrder,
        offset: i64,
        limit: i64,
    ) -> sqlx::Result<(Vec<AuthorRecord>, i64)> {
        let (where_sql, values) = author_where(filter).to_sql();

        let count_sql = format!("SELECT COUNT(DISTINCT a.id) FROM authors a{}", where_sql);
        let mut count_query = sqlx::query(&count_sql);
        for value in &values {
            count_query = value.bind_to_query(count_query);
        }
        let total: i64 = count_query.fetch_one(&self.pool).await?.try_get(0)?;

        let sql = format!(
            "SELECT a.* FROM authors a{} ORDER BY {} LIMIT ? OFFSET ?",
            where_sql,
            order.to_sql()
        );
        debug!(sql = %sql, total, "Listing authors");

        let mut query = sqlx::query(&sql);
        for value in &values {
            query = value.bind_to_query(query);
        }
        let rows = query.bind(limit).bind(offset).fetch_all(&self.pool).await?;
        let authors = rows
            .iter()
            .map(AuthorRecord::from_row)
            .collect::<sqlx::Result<Vec<_>>>()?;

        Ok((authors, total))
    }

    pub async fn get_by_id(&self, id: i32) -> sqlx::Result<Option<AuthorRecord>> {
        sqlx::query_as::<_, AuthorRecord>("SELECT * FROM authors WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn create(&self, fields: AuthorFields) -> sqlx::Result<AuthorRecord> {
        let now = now_iso8601();
        let biography = fields.biography.flatten();

        sqlx::query_as::<_, AuthorRecord>(
            r#"
            INSERT INTO authors (name, biography, born_date, image, created_by_id, created_at, updated_at,
                                 name_folded, biography_folded)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&fields.name)
        .bind(biography.as_deref())
        .bind(fields.born_date.flatten().map(datetime_to_str))
        .bind(fields.image.flatten())
        .bind(fields.created_by_id.flatten())
        .bind(&now)
        .bind(&now)
        .bind(fold_case(&fields.name))
        .bind(biography.as_deref().map(fold_case))
        .fetch_one(&self.pool)
        .await
    }

    /// Write the supplied fields; `None` when no row has this id
    pub async fn update(&self, id: i32, fields: AuthorFields) -> sqlx::Result<Option<AuthorRecord>> {
        let name_folded = fold_case(&fields.name);
        let biography_folded = fields
            .biography
            .as_ref()
            .map(|change| change.as_deref().map(fold_case));
        let set = SetClause::default()
            .set("name", fields.name)
            .set("name_folded", name_folded)
            .set_if_present("biography", fields.biography)
            .set_if_present("biography_folded", biography_folded)
            .set_if_present("born_date", fields.born_date)
            .set_if_present("image", fields.image)
            .set_if_present("created_by_id", fields.created_by_id)
            .set("updated_at", now_iso8601());
        let (set_sql, values) = set.to_sql();

        let sql = format!("UPDATE authors SET {} WHERE id = ? RETURNING *", set_sql);
        let mut query = sqlx::query(&sql);
        for value in values {
            query = value.bind_to_query(query);
        }

        query
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| AuthorRecord::from_row(&row))
            .transpose()
    }

    /// Remove the row, returning it as it was before deletion
    pub async fn delete(&self, id: i32) -> sqlx::Result<Option<AuthorRecord>> {
        sqlx::query_as::<_, AuthorRecord>("DELETE FROM authors WHERE id = ? RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }
}
