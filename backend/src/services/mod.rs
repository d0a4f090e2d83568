//! Application services

pub mod catalog;
pub mod pagination;

pub use catalog::{AuthorPage, AuthorView, BookPage, BookView, CatalogService};
pub use pagination::PageRequest;
