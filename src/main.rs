use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod composite;
mod config;
mod event;
mod integration;
mod metrics;
mod server;
#[cfg(test)]
mod testing;
mod utils;

use composite::{HealthAggregator, MovieCompositeService};
use integration::{BackendClient, CoreServices, EventPublisher, RedpandaPublisher};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging, level overridable via RUST_LOG.
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,movie_composite=debug")),
        )
        .init();

    let config = config::Config::from_env();
    tracing::info!(
        port = config.http_port,
        movie = %config.movie_service_url,
        recommendation = %config.recommendation_service_url,
        review = %config.review_service_url,
        brokers = %config.brokers,
        "Starting movie composite service"
    );

    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(2))
        .build()?;

    let clients: Arc<dyn CoreServices> = Arc::new(BackendClient::new(http, &config));
    let publisher: Arc<dyn EventPublisher> = Arc::new(RedpandaPublisher::new(&config)?);
    let metrics = Arc::new(metrics::Metrics::new()?);

    let composite = Arc::new(MovieCompositeService::new(
        clients.clone(),
        publisher,
        &config,
        metrics,
    ));

    let state = server::AppState {
        composite,
        health: HealthAggregator::new(clients),
    };

    server::run(state, config.http_port).await?;

    Ok(())
}
