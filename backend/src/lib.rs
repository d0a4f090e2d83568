//! Shelfie backend
//!
//! A book catalog served over GraphQL. Books and authors live in a SQLite
//! catalog database; ratings live in a separate document store keyed by
//! book id.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod graphql;
pub mod services;
pub mod shutdown;

use std::sync::Arc;

use crate::config::Config;
use crate::db::{Database, RatingStore};
use crate::graphql::ShelfieSchema;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
    pub ratings: RatingStore,
    pub schema: ShelfieSchema,
}
