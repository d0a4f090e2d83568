//! GraphQL schema definition
//!
//! Query and mutation roots are merged from per-domain resolver structs.

use async_graphql::extensions::Tracing;
use async_graphql::{EmptySubscription, MergedObject, Schema};

use crate::services::CatalogService;

use super::mutations::{AuthorMutations, BookMutations};
use super::queries::{AuthorQueries, BookQueries};

/// The GraphQL schema type
pub type ShelfieSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

#[derive(MergedObject, Default)]
pub struct QueryRoot(BookQueries, AuthorQueries);

#[derive(MergedObject, Default)]
pub struct MutationRoot(BookMutations, AuthorMutations);

/// Build the GraphQL schema with all resolvers
pub fn build_schema(catalog: CatalogService) -> ShelfieSchema {
    Schema::build(QueryRoot::default(), MutationRoot::default(), EmptySubscription)
        .data(catalog)
        .extension(Tracing)
        .finish()
}
