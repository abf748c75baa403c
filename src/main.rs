//! This file defines the geo-analytics binary entry point.

use geo_analytics::app;
use geo_analytics::cli;
use geo_analytics::metrics;
use geo_analytics::server;
use geo_analytics::tracing;

/// Application entry point
#[tokio::main]
async fn main() {
    let args = cli::parse();
    tracing::init_tracing();
    ::tracing::debug!("{:?}", args);
    metrics::register_metrics();
    app::init(&args);
    let service = app::service(&args);
    if let Err(err) = server::serve(&args, service).await {
        ::tracing::error!("server error: {}", err);
        std::process::exit(1);
    }
}
