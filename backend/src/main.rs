//! Shelfie backend entry point
//!
//! All catalog operations are exposed via GraphQL at /graphql.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shelfie::config::Config;
use shelfie::db::{Database, RatingStore};
use shelfie::services::CatalogService;
use shelfie::{AppState, api, graphql, shutdown};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shelfie=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!("Starting Shelfie backend");

    let config = Arc::new(Config::from_env()?);
    tracing::info!("Configuration loaded");

    let db = Database::connect(&config.database_url, config.max_connections).await?;
    db.ensure_schema()
        .await
        .context("Failed to create catalog tables")?
        .into_result("catalog")?;

    let ratings = RatingStore::connect(&config.ratings_database_url, config.max_connections).await?;
    ratings
        .ensure_schema()
        .await
        .context("Failed to create rating tables")?
        .into_result("ratings")?;

    let schema = graphql::build_schema(CatalogService::new(db.clone(), ratings.clone()));
    tracing::info!("GraphQL schema built");

    let state = AppState {
        config: config.clone(),
        db: db.clone(),
        ratings: ratings.clone(),
        schema,
    };
    let app = api::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);
    tracing::info!("GraphQL playground: {}/graphql", config.public_url());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::wait_for_signal())
        .await?;

    tracing::info!("Server stopped, closing database pools");
    db.close().await;
    ratings.close().await;

    Ok(())
}
