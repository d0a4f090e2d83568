use super::prelude::*;
use super::stamp_creator;

#[derive(Default)]
pub struct AuthorMutations;

#[Object]
impl AuthorMutations {
    async fn create_author(&self, ctx: &Context<'_>, author: AuthorInput) -> Result<Author> {
        let catalog = ctx.data_unchecked::<CatalogService>();

        let (_, mut fields) = author.into_parts();
        stamp_creator(&mut fields.created_by_id, ctx.try_auth_user());

        let created = catalog
            .create_author(fields)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        Ok(created.into())
    }

    async fn update_author(&self, ctx: &Context<'_>, author: AuthorInput) -> Result<Author> {
        let catalog = ctx.data_unchecked::<CatalogService>();

        let (id, fields) = author.into_parts();
        let updated = catalog
            .update_author(id, fields)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        Ok(updated.into())
    }

    /// Delete an author. Their books are kept.
    async fn delete_author(&self, ctx: &Context<'_>, id: i32) -> Result<Author> {
        let catalog = ctx.data_unchecked::<CatalogService>();

        let deleted = catalog
            .delete_author(id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        Ok(deleted.into())
    }
}
