pub mod authors;
pub mod books;

pub use authors::AuthorQueries;
pub use books::BookQueries;

pub(crate) mod prelude {
    pub(crate) use async_graphql::{Context, Object, Result};

    pub(crate) use crate::db::*;
    pub(crate) use crate::graphql::scalars::DateTimeScalar;
    pub(crate) use crate::graphql::types::*;
    pub(crate) use crate::services::{CatalogService, PageRequest};
}
