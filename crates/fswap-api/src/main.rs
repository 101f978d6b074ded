//! Axum API server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fswap_api::{create_router, ApiConfig, AppState};
use fswap_engine::HttpEngine;
use fswap_notify::{Notifier, SmtpConfig, SmtpNotifier};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Install rustls crypto provider (required for rustls 0.23+)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("fswap=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting fswap-api");

    // Load configuration
    let config = ApiConfig::from_env();
    info!("API config: host={}, port={}", config.host, config.port);

    if let Err(e) = tokio::fs::create_dir_all(&config.upload_dir).await {
        error!("Failed to create upload dir: {}", e);
        std::process::exit(1);
    }

    // Engine collaborator
    let engine = match HttpEngine::from_env() {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            error!("Failed to create engine client: {}", e);
            std::process::exit(1);
        }
    };
    if !engine.health_check().await {
        warn!("Inference sidecar is not reachable; runs will fail until it is");
    }

    // Notifier collaborator (optional)
    let notifier: Option<Arc<dyn Notifier>> = match SmtpConfig::from_env() {
        Some(smtp) => Some(Arc::new(SmtpNotifier::new(smtp))),
        None => {
            warn!("SMTP_HOST not set; email delivery disabled");
            None
        }
    };

    // Create application state and router
    let state = AppState::new(config.clone(), engine, notifier);
    let app = create_router(state);

    // Bind and serve
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid bind address");

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    info!("Server shutdown complete");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Received shutdown signal");
}
