//! GraphQL HTTP handlers

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::{ACCEPT, AUTHORIZATION};
use axum::response::IntoResponse;

use crate::AppState;
use crate::graphql::verify_token;

/// Extract bearer token from Authorization header
fn extract_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// GraphQL query/mutation handler with auth context
pub async fn graphql_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let mut request = req.into_inner();
    if let Some(secret) = state.config.jwt_secret.as_deref()
        && let Some(token) = extract_token(&headers)
        && let Ok(user) = verify_token(token, secret)
    {
        request = request.data(user);
    }

    let response = state.schema.execute(request).await;
    for error in &response.errors {
        tracing::error!(
            message = %error.message,
            path = ?error.path,
            "GraphQL error"
        );
    }
    response.into()
}

/// GraphiQL interactive playground (only for browsers)
pub async fn graphiql(headers: HeaderMap) -> impl IntoResponse {
    let accepts_html = headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/html"))
        .unwrap_or(false);

    if accepts_html {
        axum::response::Html(GraphiQLSource::build().endpoint("/graphql").finish()).into_response()
    } else {
        (
            axum::http::StatusCode::METHOD_NOT_ALLOWED,
            axum::Json(serde_json::json!({
                "error": "GET requests are not supported for GraphQL queries. Use POST with Content-Type: application/json"
            })),
        )
            .into_response()
    }
}
