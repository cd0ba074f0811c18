//! HTTP route handlers for the oxygen calculator API.

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};

use crate::error::Result;
use crate::AppState;

use super::calculators::CylinderSize;
use super::models::{
    CylinderInfo, DurationResponse, GasDurationRequest, LiquidDurationRequest,
    MinuteVolumeRequest, MinuteVolumeResponse, TransferRequest, TransferResponse,
    TransportPlanRequest, TransportPlanResponse,
};
use super::services;

/// Create the oxygen router with all endpoints.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/cylinders", get(cylinders))
        .route("/gas", post(gas))
        .route("/liquid", post(liquid))
        .route("/transport", post(transport))
        .route("/minute-volume", post(minute_volume))
        .route("/minute-volume/transfer", post(transfer))
}

/// Health check for the calculation engine.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "oxygen-calculator",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Cylinder sizes and their conversion factors.
async fn cylinders() -> Json<Vec<CylinderInfo>> {
    Json(CylinderSize::ALL.into_iter().map(CylinderInfo::from).collect())
}

async fn gas(Json(request): Json<GasDurationRequest>) -> Result<Json<DurationResponse>> {
    Ok(Json(services::calculate_gas(&request)?))
}

async fn liquid(
    State(state): State<AppState>,
    Json(request): Json<LiquidDurationRequest>,
) -> Result<Json<DurationResponse>> {
    let response = services::calculate_liquid(&request, state.config.liquid_flow_policy)?;
    Ok(Json(response))
}

/// Tank recommendation; `recommendation` is null when it cannot be computed.
async fn transport(Json(request): Json<TransportPlanRequest>) -> Json<TransportPlanResponse> {
    Json(services::plan_transport(&request))
}

async fn minute_volume(
    Json(request): Json<MinuteVolumeRequest>,
) -> Result<Json<MinuteVolumeResponse>> {
    Ok(Json(services::calculate_minute_volume(&request)?))
}

async fn transfer(Json(request): Json<TransferRequest>) -> Json<TransferResponse> {
    Json(services::transfer(&request))
}
