//! Multi_Predicto - Main Entry Point
//!
//! Serves the prediction form and JSON API over HTTP.

use anyhow::{Context, Result};
use multi_predicto::{
    config::{AppConfig, LogFormat, LoggingConfig},
    metrics::{MetricsReporter, PredictionMetrics},
    pipeline::PredictionPipeline,
    web::{create_router, AppState},
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging(&config.logging);

    info!("Starting Multi_Predicto");
    info!(
        projects = config.projects.len(),
        audit_log = %config.audit_log.path.display(),
        "Configuration loaded successfully"
    );

    let metrics = Arc::new(PredictionMetrics::new());
    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let pipeline = Arc::new(PredictionPipeline::from_config(&config, metrics.clone()));

    // Surface missing artifacts at startup; the form still serves the project
    for project in pipeline.store().projects() {
        match pipeline.probe(&project.name) {
            Ok(()) => info!(project = %project.name, "Artifacts available"),
            Err(e) => warn!(project = %project.name, error = %e, "Artifacts unavailable"),
        }
    }

    let app = create_router(AppState::new(pipeline));

    let host: IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid server host '{}'", config.server.host))?;
    let addr = SocketAddr::from((host, config.server.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Multi_Predicto shutting down...");
    metrics.print_summary();

    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("multi_predicto={},tower_http=info", config.level))
    });

    match config.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true))
                .init();
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for Ctrl+C, running until killed");
            std::future::pending::<()>().await
        }
    }
}
