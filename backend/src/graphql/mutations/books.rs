use super::prelude::*;
use super::stamp_creator;

#[derive(Default)]
pub struct BookMutations;

#[Object]
impl BookMutations {
    async fn create_book(&self, ctx: &Context<'_>, book: BookInput) -> Result<Book> {
        let catalog = ctx.data_unchecked::<CatalogService>();

        let (_, mut fields) = book.into_parts();
        stamp_creator(&mut fields.created_by_id, ctx.try_auth_user());

        let created = catalog
            .create_book(fields)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        Ok(created.into())
    }

    /// Update a book. The payload must carry the book's id.
    async fn update_book(&self, ctx: &Context<'_>, book: BookInput) -> Result<Book> {
        let catalog = ctx.data_unchecked::<CatalogService>();

        let (id, fields) = book.into_parts();
        let updated = catalog
            .update_book(id, fields)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        Ok(updated.into())
    }

    async fn delete_book(&self, ctx: &Context<'_>, id: i32) -> Result<Book> {
        let catalog = ctx.data_unchecked::<CatalogService>();

        let deleted = catalog
            .delete_book(id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        Ok(deleted.into())
    }

    /// Append a rating to a book and return the book with all its ratings
    async fn add_book_rating(
        &self,
        ctx: &Context<'_>,
        book_id: i32,
        rating: RatingInput,
    ) -> Result<Book> {
        let catalog = ctx.data_unchecked::<CatalogService>();

        let book = catalog
            .add_book_rating(book_id, rating.into())
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        Ok(book.into())
    }
}
