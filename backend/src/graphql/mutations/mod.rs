pub mod authors;
pub mod books;

pub use authors::AuthorMutations;
pub use books::BookMutations;

pub(crate) mod prelude {
    pub(crate) use async_graphql::{Context, Object, Result};

    pub(crate) use crate::graphql::auth::AuthExt;
    pub(crate) use crate::graphql::types::*;
    pub(crate) use crate::services::CatalogService;
}

/// Fill `created_by_id` from the authenticated user when the payload did
/// not set it
pub(crate) fn stamp_creator(
    created_by_id: &mut Option<Option<String>>,
    user: Option<&crate::graphql::AuthUser>,
) {
    if created_by_id.is_none() {
        if let Some(user) = user {
            *created_by_id = Some(Some(user.user_id.clone()));
        }
    }
}
