use axum::extract::DefaultBodyLimit;
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::{Any, CorsLayer}, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod assets;
mod auth;
mod catalog;
mod config;
mod content;
mod dashboard;
mod db;
mod error;
mod identity;
mod models;
mod payments;
mod purchase;
mod routes;
mod store;
mod webhook;

#[cfg(test)]
mod testutil;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "coursemarket=info,axum=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from_env()?;
    let port = config.port;

    let pool = db::connect(&config.database_url).await?;
    // crate-relative path for sqlx migrations
    sqlx::migrate!("./migrations").run(&pool).await?;

    let state = routes::AppState {
        store: Arc::new(store::PgStore::new(pool)),
        identity: Arc::new(identity::HttpIdentityProvider::new(
            config.identity_api_url.clone(),
            config.identity_api_key.clone(),
        )),
        assets: Arc::new(assets::HttpAssetHost::new(
            config.asset_api_url.clone(),
            config.asset_api_key.clone(),
        )),
        payments: Arc::new(payments::HttpPaymentGateway::new(
            config.payment_api_url.clone(),
            config.payment_api_key.clone(),
        )),
        config: Arc::new(config),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(routes::router(state))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("listening on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}
