use super::prelude::*;

#[derive(Default)]
pub struct AuthorQueries;

#[Object]
impl AuthorQueries {
    /// Paginated authors with their books
    async fn authors(
        &self,
        ctx: &Context<'_>,
        page: Option<i32>,
        limit: Option<i32>,
        search: Option<String>,
        sort_by: Option<String>,
        sort_order: Option<String>,
    ) -> Result<PaginatedAuthors> {
        let catalog = ctx.data_unchecked::<CatalogService>();

        let order = AuthorOrder::from_params(sort_by.as_deref(), sort_order.as_deref());
        let page = catalog
            .list_authors(
                &AuthorListFilter { search },
                order,
                PageRequest::new(page, limit),
            )
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        Ok(page.into())
    }

    async fn author(&self, ctx: &Context<'_>, id: i32) -> Result<Option<Author>> {
        let catalog = ctx.data_unchecked::<CatalogService>();

        let author = catalog
            .get_author(id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        Ok(author.map(Author::from))
    }
}
