//! Oxygen Supply Calculator - Rust/Axum service
//!
//! Estimates remaining oxygen supply for gas cylinders and liquid reservoirs,
//! recommends tank counts for transports and computes minute ventilation.

use std::sync::Arc;

use axum::{response::Json, routing::get, Router};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
pub mod oxygen;

use config::Config;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oxygen_calc_web=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        liquid_flow_policy = ?config.liquid_flow_policy,
        "Configuration loaded"
    );

    let state = AppState {
        config: Arc::new(config.clone()),
    };

    let app = app(state, &config.static_dir);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the full router: calculator page, JSON API and static assets.
fn app(state: AppState, static_dir: &str) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Calculator page
        .route("/", get(oxygen::show).post(oxygen::submit))
        // Calculation API (called by browser UI shells)
        .nest("/api/oxygen", oxygen::router().layer(CorsLayer::permissive()))
        // Static files
        .nest_service("/static", ServeDir::new(static_dir))
        // State and middleware
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "oxygen-calculator"
    }))
}
