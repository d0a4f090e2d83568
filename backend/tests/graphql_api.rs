//! Integration tests for the GraphQL API
//!
//! Each test builds the full schema over fresh in-memory catalog and rating
//! stores and drives it with GraphQL documents, the way a client would.

use async_graphql::{Request, Variables};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use shelfie::db::{Database, RatingStore};
use shelfie::graphql::{AuthUser, ShelfieSchema, build_schema};
use shelfie::services::CatalogService;

async fn stores() -> (Database, RatingStore) {
    let db = Database::connect("sqlite::memory:", 1).await.unwrap();
    db.ensure_schema().await.unwrap();
    let ratings = RatingStore::connect("sqlite::memory:", 1).await.unwrap();
    ratings.ensure_schema().await.unwrap();
    (db, ratings)
}

async fn schema() -> ShelfieSchema {
    let (db, ratings) = stores().await;
    build_schema(CatalogService::new(db, ratings))
}

/// Execute and return `data`, failing on any GraphQL error
async fn run(schema: &ShelfieSchema, query: &str, variables: Value) -> Value {
    let response = schema
        .execute(Request::new(query).variables(Variables::from_json(variables)))
        .await;
    assert!(response.errors.is_empty(), "unexpected errors: {:?}", response.errors);
    response.data.into_json().unwrap()
}

/// Execute and return the first error message
async fn run_err(schema: &ShelfieSchema, query: &str, variables: Value) -> String {
    let response = schema
        .execute(Request::new(query).variables(Variables::from_json(variables)))
        .await;
    assert!(!response.errors.is_empty(), "expected an error");
    response.errors[0].message.clone()
}

async fn create_author(schema: &ShelfieSchema, name: &str) -> i64 {
    let data = run(
        schema,
        "mutation($author: AuthorInput!) { createAuthor(author: $author) { id } }",
        json!({ "author": { "name": name, "biography": format!("About {}", name) } }),
    )
    .await;
    data["createAuthor"]["id"].as_i64().unwrap()
}

async fn create_book(schema: &ShelfieSchema, title: &str, author_id: i64, published: &str) -> i64 {
    let data = run(
        schema,
        "mutation($book: BookInput!) { createBook(book: $book) { id } }",
        json!({ "book": { "title": title, "author_id": author_id, "published_date": published } }),
    )
    .await;
    data["createBook"]["id"].as_i64().unwrap()
}

// ============================================================================
// Books
// ============================================================================

mod books {
    use super::*;
    use pretty_assertions::assert_eq;

    const LIST_BOOKS: &str = r#"
        query($page: Int, $limit: Int, $search: String, $from: DateTime, $to: DateTime) {
            books(page: $page, limit: $limit, search: $search, published_from: $from, published_to: $to) {
                books { title author { name } }
                total
                hasMore
            }
        }
    "#;

    #[tokio::test]
    async fn test_search_without_match_returns_empty_page() {
        let schema = schema().await;
        let author = create_author(&schema, "Someone").await;
        create_book(&schema, "Real Book", author, "2001-01-01").await;

        let data = run(&schema, LIST_BOOKS, json!({ "search": "NonExistentBook" })).await;
        assert_eq!(data["books"], json!({ "books": [], "total": 0, "hasMore": false }));
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii_case() {
        let schema = schema().await;
        let zola = create_author(&schema, "Émile Zola").await;
        let other = create_author(&schema, "Chrétien").await;
        create_book(&schema, "Germinal", zola, "1885-03-01").await;
        create_book(&schema, "Ÿvain", other, "1180-01-01").await;

        let by_author = run(&schema, LIST_BOOKS, json!({ "search": "émile" })).await;
        assert_eq!(
            by_author["books"]["books"],
            json!([{ "title": "Germinal", "author": { "name": "Émile Zola" } }])
        );

        let by_title = run(&schema, LIST_BOOKS, json!({ "search": "ÿvain" })).await;
        assert_eq!(by_title["books"]["total"], 1);
        assert_eq!(by_title["books"]["books"][0]["title"], "Ÿvain");
    }

    #[tokio::test]
    async fn test_publish_date_range_is_inclusive() {
        let schema = schema().await;
        let author = create_author(&schema, "Range").await;
        create_book(&schema, "In Range", author, "1998-11-16").await;
        create_book(&schema, "Too New", author, "2025-06-03").await;
        create_book(&schema, "Lower Edge", author, "1980-01-01").await;

        let data = run(
            &schema,
            LIST_BOOKS,
            json!({ "page": 1, "limit": 10, "from": "1980-01-01", "to": "2000-12-31" }),
        )
        .await;

        let titles: Vec<&str> = data["books"]["books"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Lower Edge", "In Range"]);
        assert_eq!(data["books"]["total"], 2);
    }

    #[tokio::test]
    async fn test_has_more_across_pages() {
        let schema = schema().await;
        let author = create_author(&schema, "Prolific").await;
        for i in 0..3 {
            create_book(&schema, &format!("Volume {}", i), author, "2010-01-01").await;
        }

        let first = run(&schema, LIST_BOOKS, json!({ "page": 1, "limit": 2 })).await;
        assert_eq!(first["books"]["hasMore"], true);
        assert_eq!(first["books"]["total"], 3);

        let second = run(&schema, LIST_BOOKS, json!({ "page": 2, "limit": 2 })).await;
        assert_eq!(second["books"]["hasMore"], false);
        assert_eq!(second["books"]["books"], json!([{ "title": "Volume 0", "author": { "name": "Prolific" } }]));
    }

    #[tokio::test]
    async fn test_create_then_fetch_round_trip() {
        let schema = schema().await;
        let author = create_author(&schema, "Round Trip").await;
        let id = create_book(&schema, "Circle", author, "1998-11-16").await;

        let data = run(
            &schema,
            r#"query($id: Int!) {
                book(id: $id) { id title author_id published_date description ratings { rating } author { id } }
            }"#,
            json!({ "id": id }),
        )
        .await;

        assert_eq!(
            data["book"],
            json!({
                "id": id,
                "title": "Circle",
                "author_id": author,
                "published_date": "1998-11-16T00:00:00.000Z",
                "description": null,
                "ratings": [],
                "author": { "id": author }
            })
        );
    }

    #[tokio::test]
    async fn test_missing_book_is_null() {
        let schema = schema().await;
        let data = run(&schema, "{ book(id: 12345) { id } }", json!({})).await;
        assert_eq!(data["book"], Value::Null);
    }

    #[tokio::test]
    async fn test_update_without_id_fails_before_store() {
        let schema = schema().await;
        let message = run_err(
            &schema,
            "mutation { updateBook(book: { title: \"X\", author_id: 1 }) { id } }",
            json!({}),
        )
        .await;
        assert_eq!(message, "Book ID is required");
    }

    #[tokio::test]
    async fn test_update_unknown_book_is_not_found() {
        let schema = schema().await;
        let message = run_err(
            &schema,
            "mutation { updateBook(book: { id: 999, title: \"X\", author_id: 1 }) { id } }",
            json!({}),
        )
        .await;
        assert_eq!(message, "Book not found");
    }

    #[tokio::test]
    async fn test_update_replaces_supplied_fields() {
        let schema = schema().await;
        let author = create_author(&schema, "Editor").await;
        let id = create_book(&schema, "Draft", author, "2000-01-01").await;

        let data = run(
            &schema,
            r#"mutation($book: BookInput!) {
                updateBook(book: $book) { title published_date description }
            }"#,
            json!({ "book": { "id": id, "title": "Final", "author_id": author, "published_date": null, "description": "Now with words" } }),
        )
        .await;

        assert_eq!(
            data["updateBook"],
            json!({ "title": "Final", "published_date": null, "description": "Now with words" })
        );
    }

    #[tokio::test]
    async fn test_invalid_date_literal_stores_null() {
        let schema = schema().await;
        let author = create_author(&schema, "Lenient").await;

        let data = run(
            &schema,
            &format!(
                "mutation {{ createBook(book: {{ title: \"Undated\", author_id: {}, published_date: true }}) {{ published_date }} }}",
                author
            ),
            json!({}),
        )
        .await;
        assert_eq!(data["createBook"]["published_date"], Value::Null);
    }

    #[tokio::test]
    async fn test_delete_returns_deleted_book() {
        let schema = schema().await;
        let author = create_author(&schema, "Shredder").await;
        let id = create_book(&schema, "Gone Soon", author, "2020-02-02").await;

        let query = "mutation($id: Int!) { deleteBook(id: $id) { title } }";
        let data = run(&schema, query, json!({ "id": id })).await;
        assert_eq!(data["deleteBook"]["title"], "Gone Soon");

        let message = run_err(&schema, query, json!({ "id": id })).await;
        assert_eq!(message, "Book not found");
    }

    #[tokio::test]
    async fn test_authenticated_user_stamps_creator() {
        let schema = schema().await;
        let author = create_author(&schema, "Stamped").await;

        let request = Request::new(
            "mutation($book: BookInput!) { createBook(book: $book) { created_by_id } }",
        )
        .variables(Variables::from_json(json!({ "book": { "title": "Mine", "author_id": author } })))
        .data(AuthUser {
            user_id: "user-7".to_string(),
            email: None,
        });

        let response = schema.execute(request).await;
        assert!(response.errors.is_empty());
        let data = response.data.into_json().unwrap();
        assert_eq!(data["createBook"]["created_by_id"], "user-7");
    }
}

// ============================================================================
// Ratings
// ============================================================================

mod ratings {
    use super::*;
    use pretty_assertions::assert_eq;

    const ADD_RATING: &str = r#"
        mutation($bookId: Int!, $rating: RatingInput!) {
            addBookRating(bookId: $bookId, rating: $rating) {
                id
                ratings { rating comment createdAt }
            }
        }
    "#;

    #[tokio::test]
    async fn test_ratings_append_in_order() {
        let schema = schema().await;
        let author = create_author(&schema, "Critic Bait").await;
        let id = create_book(&schema, "Rate Me", author, "2015-05-05").await;

        let first = run(
            &schema,
            ADD_RATING,
            json!({ "bookId": id, "rating": { "rating": 5, "comment": "Superb" } }),
        )
        .await;
        assert_eq!(first["addBookRating"]["ratings"].as_array().unwrap().len(), 1);

        let second = run(
            &schema,
            ADD_RATING,
            json!({ "bookId": id, "rating": { "rating": 2, "comment": "Overrated" } }),
        )
        .await;
        let ratings = second["addBookRating"]["ratings"].as_array().unwrap();
        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings[0]["comment"], "Superb");
        assert_eq!(ratings[1]["comment"], "Overrated");
        assert!(ratings[1]["createdAt"].as_str().unwrap().ends_with('Z'));

        let listed = run(&schema, "{ books { books { ratings { rating } } } }", json!({})).await;
        assert_eq!(
            listed["books"]["books"][0]["ratings"],
            json!([{ "rating": 5 }, { "rating": 2 }])
        );
    }

    #[tokio::test]
    async fn test_out_of_range_rating_is_rejected() {
        let schema = schema().await;
        let author = create_author(&schema, "Strict").await;
        let id = create_book(&schema, "Bounded", author, "2015-05-05").await;

        let message = run_err(
            &schema,
            ADD_RATING,
            json!({ "bookId": id, "rating": { "rating": 6, "comment": "Too good" } }),
        )
        .await;
        assert!(message.contains("rating must be between 1 and 5"), "{}", message);

        for comment in ["", "   "] {
            let message = run_err(
                &schema,
                ADD_RATING,
                json!({ "bookId": id, "rating": { "rating": 3, "comment": comment } }),
            )
            .await;
            assert!(message.contains("comment must not be empty"), "{}", message);
        }

        let data = run(
            &schema,
            "query($id: Int!) { book(id: $id) { ratings { rating } } }",
            json!({ "id": id }),
        )
        .await;
        assert_eq!(data["book"]["ratings"], json!([]));
    }

    #[tokio::test]
    async fn test_rating_unknown_book_is_not_found() {
        let schema = schema().await;
        let message = run_err(
            &schema,
            ADD_RATING,
            json!({ "bookId": 4242, "rating": { "rating": 4, "comment": "Who?" } }),
        )
        .await;
        assert_eq!(message, "Book not found");
    }
}

// ============================================================================
// Authors
// ============================================================================

mod authors {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_list_sorted_with_nested_books() {
        let schema = schema().await;
        let le_guin = create_author(&schema, "Le Guin").await;
        create_author(&schema, "Butler").await;
        create_author(&schema, "Atwood").await;
        create_book(&schema, "The Lathe of Heaven", le_guin, "1971-01-01").await;

        let data = run(
            &schema,
            r#"{
                authors(page: 1, limit: 2, sortBy: "name", sortOrder: "desc") {
                    authors { name books { title } }
                    total
                    totalPages
                }
            }"#,
            json!({}),
        )
        .await;

        assert_eq!(
            data["authors"],
            json!({
                "authors": [
                    { "name": "Le Guin", "books": [{ "title": "The Lathe of Heaven" }] },
                    { "name": "Butler", "books": [] }
                ],
                "total": 3,
                "totalPages": 2
            })
        );
    }

    #[tokio::test]
    async fn test_search_matches_biography() {
        let schema = schema().await;
        create_author(&schema, "Herbert").await;
        create_author(&schema, "Vance").await;

        let data = run(
            &schema,
            r#"{ authors(search: "ABOUT VAN") { authors { name } total } }"#,
            json!({}),
        )
        .await;
        assert_eq!(data["authors"], json!({ "authors": [{ "name": "Vance" }], "total": 1 }));
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii_names() {
        let schema = schema().await;
        create_author(&schema, "Émile Zola").await;
        create_author(&schema, "Emily Brontë").await;

        let data = run(
            &schema,
            r#"{ authors(search: "ÉMILE") { authors { name } total } }"#,
            json!({}),
        )
        .await;
        assert_eq!(data["authors"], json!({ "authors": [{ "name": "Émile Zola" }], "total": 1 }));

        let data = run(&schema, r#"{ authors(search: "brontë") { total } }"#, json!({})).await;
        assert_eq!(data["authors"]["total"], 1);
    }

    #[tokio::test]
    async fn test_update_requires_id() {
        let schema = schema().await;
        let message = run_err(
            &schema,
            "mutation { updateAuthor(author: { name: \"Anon\" }) { id } }",
            json!({}),
        )
        .await;
        assert_eq!(message, "Author ID is required");

        let message = run_err(
            &schema,
            "mutation { updateAuthor(author: { id: 31337, name: \"Anon\" }) { id } }",
            json!({}),
        )
        .await;
        assert_eq!(message, "Author not found");
    }

    #[tokio::test]
    async fn test_deleting_author_leaves_books_dangling() {
        let schema = schema().await;
        let author = create_author(&schema, "Vanishing").await;
        let book = create_book(&schema, "Left Behind", author, "1999-09-09").await;

        let data = run(
            &schema,
            "mutation($id: Int!) { deleteAuthor(id: $id) { name } }",
            json!({ "id": author }),
        )
        .await;
        assert_eq!(data["deleteAuthor"]["name"], "Vanishing");

        let data = run(
            &schema,
            "query($id: Int!) { book(id: $id) { author_id author { id } } }",
            json!({ "id": book }),
        )
        .await;
        assert_eq!(data["book"], json!({ "author_id": author, "author": null }));
    }

    #[tokio::test]
    async fn test_single_author_with_full_books() {
        let schema = schema().await;
        let author = create_author(&schema, "Detailed").await;
        create_book(&schema, "Tome", author, "1990-03-04").await;

        let data = run(
            &schema,
            "query($id: Int!) { author(id: $id) { name books { title published_date image } } }",
            json!({ "id": author }),
        )
        .await;
        assert_eq!(
            data["author"],
            json!({
                "name": "Detailed",
                "books": [{ "title": "Tome", "published_date": "1990-03-04T00:00:00.000Z", "image": null }]
            })
        );
    }
}

// ============================================================================
// HTTP
// ============================================================================

mod http {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request as HttpRequest, StatusCode, header};
    use tower::ServiceExt;

    use super::*;
    use pretty_assertions::assert_eq;
    use shelfie::AppState;
    use shelfie::api;
    use shelfie::config::Config;

    async fn app() -> axum::Router {
        let (db, ratings) = stores().await;
        let config = Config::from_lookup(|_| None).unwrap();
        let schema = build_schema(CatalogService::new(db.clone(), ratings.clone()));
        api::router(AppState {
            config: Arc::new(config),
            db,
            ratings,
            schema,
        })
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_readyz_checks_both_stores() {
        let response = app()
            .await
            .oneshot(HttpRequest::get("/readyz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "ready": true, "database": true, "ratings": true })
        );
    }

    #[tokio::test]
    async fn test_graphql_post() {
        let request = HttpRequest::post("/graphql")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "query": "{ books { total hasMore } }" }).to_string(),
            ))
            .unwrap();

        let response = app().await.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "data": { "books": { "total": 0, "hasMore": false } } })
        );
    }

    #[tokio::test]
    async fn test_graphql_get_without_browser_is_rejected() {
        let response = app()
            .await
            .oneshot(HttpRequest::get("/graphql").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
