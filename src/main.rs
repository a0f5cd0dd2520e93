use predrelay::client::HttpPredictionClient;
use predrelay::config::{Config, ConfigHolder, DEFAULT_CONFIG_FILE};
use predrelay::{create_router, AppState};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("predrelay=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .json()
        .init();

    // Load configuration
    let config_file =
        std::env::var("CONFIG_FILE").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
    let config = Config::load(&config_file).unwrap_or_else(|e| {
        error!("Failed to load config from {}: {}", config_file, e);
        std::process::exit(1);
    });
    if config.upstream.web_service_url().is_err() {
        warn!("web_service_url is not set; prediction requests will fail until it is configured");
    }

    let client = HttpPredictionClient::new(config.upstream.parse_timeout()).unwrap_or_else(|e| {
        error!("Failed to build prediction client: {}", e);
        std::process::exit(1);
    });

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(config.server.port);

    let state = AppState::new(Arc::new(ConfigHolder::new(config)), Arc::new(client));
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!("Starting prediction relay on {}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
