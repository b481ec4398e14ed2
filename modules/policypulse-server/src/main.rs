use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use policypulse_common::Config;
use policypulse_ingest::federal_register::FederalRegisterClient;
use policypulse_ingest::news::RssNewsFetcher;
use policypulse_ingest::orchestrator::Orchestrator;
use policypulse_ingest::store::PostgresStore;

mod routes;

pub struct AppState {
    pub orchestrator: Orchestrator,
    pub cron_secret: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    let store = PostgresStore::connect(&config.database_url).await?;
    store.migrate().await?;

    let generator = ai_client::from_env()?;
    let orchestrator = Orchestrator::new(
        Arc::new(store),
        Arc::new(FederalRegisterClient::from_env()),
        Arc::new(RssNewsFetcher::new(config.news_feeds.clone())),
        generator,
    );

    if config.cron_secret.is_none() {
        info!("CRON_SECRET not set, ingestion endpoint is unauthenticated");
    }

    let state = Arc::new(AppState {
        orchestrator,
        cron_secret: config.cron_secret.clone(),
    });

    let app = Router::new()
        .route("/healthz", get(routes::healthz))
        .route("/api/ingest", post(routes::trigger_ingestion))
        .with_state(state)
        // Logging layer: method + path + status + latency only
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        );

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("PolicyPulse server starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
