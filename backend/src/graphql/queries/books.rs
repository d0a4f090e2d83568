use super::prelude::*;

#[derive(Default)]
pub struct BookQueries;

#[Object]
impl BookQueries {
    /// Paginated books, newest first
    async fn books(
        &self,
        ctx: &Context<'_>,
        page: Option<i32>,
        limit: Option<i32>,
        search: Option<String>,
        #[graphql(name = "author_id")] author_id: Option<i32>,
        #[graphql(name = "published_from")] published_from: Option<DateTimeScalar>,
        #[graphql(name = "published_to")] published_to: Option<DateTimeScalar>,
    ) -> Result<PaginatedBooks> {
        let catalog = ctx.data_unchecked::<CatalogService>();

        let filter = BookListFilter {
            search,
            author_id,
            published_from: published_from.and_then(DateTimeScalar::into_inner),
            published_to: published_to.and_then(DateTimeScalar::into_inner),
        };

        let page = catalog
            .list_books(&filter, PageRequest::new(page, limit))
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        Ok(page.into())
    }

    /// Get a specific book by ID
    async fn book(&self, ctx: &Context<'_>, id: i32) -> Result<Option<Book>> {
        let catalog = ctx.data_unchecked::<CatalogService>();

        let book = catalog
            .get_book(id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        Ok(book.map(Book::from))
    }
}
