//! Typed filter builders for catalog list queries
//!
//! List arguments are turned into an explicit set of [Predicate]s per
//! entity. Predicates render to parameterized SQL fragments together with
//! the values to bind, so every filter can be checked without a live store.

use chrono::{DateTime, Utc};
use sqlx::Sqlite;
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use tracing::warn;

use super::sqlite_helpers::{datetime_to_str, fold_case};

/// A SQL value that can be bound to a query.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Int(i64),
    Null,
}

impl SqlValue {
    /// Bind this value as the next positional parameter
    pub fn bind_to_query<'q>(
        &'q self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        match self {
            SqlValue::Text(s) => query.bind(s.as_str()),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Null => query.bind(None::<String>),
        }
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(value.into())
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        SqlValue::Text(datetime_to_str(value))
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

/// A single condition in a WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Case-insensitive substring match against any of the columns.
    ///
    /// The columns must hold text already folded with [fold_case].
    ContainsAny {
        columns: Vec<&'static str>,
        needle: String,
    },
    /// Column equals value
    Equals {
        column: &'static str,
        value: SqlValue,
    },
    /// Inclusive range; a missing bound leaves that side open
    Between {
        column: &'static str,
        from: Option<SqlValue>,
        to: Option<SqlValue>,
    },
}

impl Predicate {
    fn render(&self, values: &mut Vec<SqlValue>) -> Option<String> {
        match self {
            Predicate::ContainsAny { columns, needle } => {
                if columns.is_empty() {
                    return None;
                }
                let pattern = like_pattern(needle);
                let alternatives: Vec<String> = columns
                    .iter()
                    .map(|column| {
                        values.push(SqlValue::Text(pattern.clone()));
                        format!("{} LIKE ? ESCAPE '\\'", column)
                    })
                    .collect();
                Some(format!("({})", alternatives.join(" OR ")))
            }
            Predicate::Equals { column, value } => {
                values.push(value.clone());
                Some(format!("{} = ?", column))
            }
            Predicate::Between { column, from, to } => match (from, to) {
                (Some(from), Some(to)) => {
                    values.push(from.clone());
                    values.push(to.clone());
                    Some(format!("{} BETWEEN ? AND ?", column))
                }
                (Some(from), None) => {
                    values.push(from.clone());
                    Some(format!("{} >= ?", column))
                }
                (None, Some(to)) => {
                    values.push(to.clone());
                    Some(format!("{} <= ?", column))
                }
                (None, None) => None,
            },
        }
    }
}

/// Case-folded `%needle%` with LIKE wildcards escaped.
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in fold_case(needle).chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Conjunction of predicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    pub predicates: Vec<Predicate>,
}

impl WhereClause {
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Render as ` WHERE ...` (or an empty string) plus the bind values in
    /// placeholder order.
    pub fn to_sql(&self) -> (String, Vec<SqlValue>) {
        let mut values = Vec::new();
        let conditions: Vec<String> = self
            .predicates
            .iter()
            .filter_map(|p| p.render(&mut values))
            .collect();

        if conditions.is_empty() {
            (String::new(), values)
        } else {
            (format!(" WHERE {}", conditions.join(" AND ")), values)
        }
    }
}

/// Column assignments for an UPDATE statement.
#[derive(Debug, Default)]
pub struct SetClause {
    columns: Vec<&'static str>,
    values: Vec<SqlValue>,
}

impl SetClause {
    pub fn set(mut self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        self.columns.push(column);
        self.values.push(value.into());
        self
    }

    /// Assign only when a change was supplied (`None` leaves the column alone)
    pub fn set_if_present<T: Into<SqlValue>>(self, column: &'static str, change: Option<T>) -> Self {
        match change {
            Some(value) => self.set(column, value),
            None => self,
        }
    }

    pub fn to_sql(&self) -> (String, &[SqlValue]) {
        let sql = self
            .columns
            .iter()
            .map(|c| format!("{} = ?", c))
            .collect::<Vec<_>>()
            .join(", ");
        (sql, &self.values)
    }
}

// ============================================================================
// Books
// ============================================================================

/// Arguments accepted by the book list query
#[derive(Debug, Clone, Default)]
pub struct BookListFilter {
    pub search: Option<String>,
    pub author_id: Option<i32>,
    pub published_from: Option<DateTime<Utc>>,
    pub published_to: Option<DateTime<Utc>>,
}

impl BookListFilter {
    /// The search term, treating an empty string as no search
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }
}

/// How authors are joined onto books
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorJoin {
    /// Only books whose author row exists
    Inner,
    /// Every book, author columns NULL when the row is missing
    Left,
}

impl AuthorJoin {
    pub fn to_sql(&self) -> &'static str {
        match self {
            AuthorJoin::Inner => "INNER JOIN",
            AuthorJoin::Left => "LEFT JOIN",
        }
    }
}

/// Join and filter for one book list query
#[derive(Debug, Clone, PartialEq)]
pub struct BookQueryPlan {
    pub join: AuthorJoin,
    pub filter: WhereClause,
}

/// Build the join and predicates for a book list.
///
/// Searching matches on the author's name too, which needs the author row,
/// so the join becomes inner.
pub fn book_query_plan(filter: &BookListFilter) -> BookQueryPlan {
    let mut predicates = Vec::new();
    let mut join = AuthorJoin::Left;

    if let Some(search) = filter.search_term() {
        join = AuthorJoin::Inner;
        predicates.push(Predicate::ContainsAny {
            columns: vec!["b.title_folded", "a.name_folded"],
            needle: search.to_string(),
        });
    }

    if let Some(author_id) = filter.author_id {
        predicates.push(Predicate::Equals {
            column: "b.author_id",
            value: author_id.into(),
        });
    }

    if filter.published_from.is_some() || filter.published_to.is_some() {
        predicates.push(Predicate::Between {
            column: "b.published_date",
            from: filter.published_from.map(SqlValue::from),
            to: filter.published_to.map(SqlValue::from),
        });
    }

    BookQueryPlan {
        join,
        filter: WhereClause { predicates },
    }
}

// ============================================================================
// Authors
// ============================================================================

/// Arguments accepted by the author list query
#[derive(Debug, Clone, Default)]
pub struct AuthorListFilter {
    pub search: Option<String>,
}

/// Build the predicates for an author list
pub fn author_where(filter: &AuthorListFilter) -> WhereClause {
    let predicates = filter
        .search
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|search| Predicate::ContainsAny {
            columns: vec!["a.name_folded", "a.biography_folded"],
            needle: search.to_string(),
        })
        .into_iter()
        .collect();

    WhereClause { predicates }
}

/// Author columns a list can be sorted by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthorSortField {
    #[default]
    Name,
    Biography,
    BornDate,
    CreatedAt,
    UpdatedAt,
    Id,
}

impl AuthorSortField {
    /// Parse the `sortBy` argument; accepts snake_case and camelCase names
    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "name" => Some(Self::Name),
            "biography" => Some(Self::Biography),
            "born_date" | "bornDate" => Some(Self::BornDate),
            "created_at" | "createdAt" => Some(Self::CreatedAt),
            "updated_at" | "updatedAt" => Some(Self::UpdatedAt),
            "id" => Some(Self::Id),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::Name => "a.name",
            Self::Biography => "a.biography",
            Self::BornDate => "a.born_date",
            Self::CreatedAt => "a.created_at",
            Self::UpdatedAt => "a.updated_at",
            Self::Id => "a.id",
        }
    }
}

/// Sort direction for ORDER BY clauses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    /// Parse a direction token case-insensitively
    pub fn from_param(value: &str) -> Option<Self> {
        match value.to_uppercase().as_str() {
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn to_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// Single-column author ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthorOrder {
    pub field: AuthorSortField,
    pub direction: OrderDirection,
}

impl AuthorOrder {
    /// Resolve the `sortBy` / `sortOrder` arguments. Unknown values fall
    /// back to the defaults (name, ascending).
    pub fn from_params(sort_by: Option<&str>, sort_order: Option<&str>) -> Self {
        let field = match sort_by {
            Some(value) => AuthorSortField::from_param(value).unwrap_or_else(|| {
                warn!(sort_by = value, "Unknown author sort field, sorting by name");
                AuthorSortField::default()
            }),
            None => AuthorSortField::default(),
        };
        let direction = sort_order
            .and_then(OrderDirection::from_param)
            .unwrap_or_default();

        Self { field, direction }
    }

    /// ORDER BY fragment; id breaks ties so pages stay stable
    pub fn to_sql(&self) -> String {
        let dir = self.direction.to_sql();
        match self.field {
            AuthorSortField::Id => format!("a.id {}", dir),
            field => format!("{} {}, a.id {}", field.column(), dir, dir),
        }
    }
}
