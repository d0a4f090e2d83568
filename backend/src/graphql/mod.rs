//! GraphQL API
//!
//! Resolvers are grouped per domain under `queries/` and `mutations/` and
//! merged into the roots in `schema.rs`. All catalog access goes through
//! [CatalogService](crate::services::CatalogService), injected as schema
//! data.

pub mod auth;
pub mod mutations;
pub mod queries;
pub mod scalars;
mod schema;
pub mod types;

pub use auth::{AuthUser, verify_token};
pub use schema::{MutationRoot, QueryRoot, ShelfieSchema, build_schema};
