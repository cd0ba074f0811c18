//! Request and response types for the oxygen calculator API.

use serde::{Deserialize, Serialize};

use super::calculators::{CylinderSize, FlowRateTransfer, OxygenMode, TankRecommendation};
use super::validator::{ValidationError, ValidationField, ValidationReason};

/// Request payload for a gas cylinder duration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GasDurationRequest {
    /// Cylinder size code (D, E, M, H)
    #[serde(default)]
    pub tank_size: Option<String>,
    /// Total cylinder pressure in PSI
    #[serde(default)]
    pub psi: Option<f64>,
    /// Reserved pressure in PSI, zero when absent
    #[serde(default)]
    pub safety_residual: Option<f64>,
    /// Flow rate in L/min
    #[serde(default)]
    pub flow_rate: Option<f64>,
    /// FiO2 percentage (21-100)
    #[serde(default)]
    pub fio2: Option<f64>,
    /// Planned transport duration in minutes
    #[serde(default)]
    pub transport_duration_min: Option<f64>,
}

/// Request payload for a liquid oxygen duration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LiquidDurationRequest {
    #[serde(default)]
    pub liters_remaining: Option<f64>,
    #[serde(default)]
    pub flow_rate: Option<f64>,
    #[serde(default)]
    pub fio2: Option<f64>,
    #[serde(default)]
    pub transport_duration_min: Option<f64>,
}

/// Request payload for a transport recommendation.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TransportPlanRequest {
    #[serde(default)]
    pub transport_duration_min: Option<f64>,
    /// Duration of one tank from a previous gas or liquid calculation
    #[serde(default)]
    pub tank_duration_min: Option<f64>,
}

/// Request payload for minute ventilation.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MinuteVolumeRequest {
    /// Breaths per minute
    #[serde(default)]
    pub respiratory_rate: Option<f64>,
    /// Tidal volume in mL
    #[serde(default)]
    pub tidal_volume: Option<f64>,
}

/// Request payload for copying a minute volume into a flow rate field.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TransferRequest {
    #[serde(default)]
    pub minute_volume_lpm: Option<f64>,
    #[serde(default)]
    pub mode: OxygenMode,
}

/// Tank recommendation as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationResponse {
    pub tanks: TankRecommendation,
    /// "N tank" / "N tanks"
    pub label: String,
}

impl From<TankRecommendation> for RecommendationResponse {
    fn from(tanks: TankRecommendation) -> Self {
        Self {
            tanks,
            label: tanks.to_string(),
        }
    }
}

/// Response payload from a gas or liquid calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationResponse {
    /// Oxygen supply calculated
    pub mode: OxygenMode,
    /// Remaining supply in minutes
    pub duration_min: f64,
    /// Human-readable duration
    pub formatted: String,
    /// Tanks needed for the transport, null when unavailable
    pub recommendation: Option<RecommendationResponse>,
    /// SHA256 hash of input
    pub input_hash: String,
}

/// Response payload from a transport recommendation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransportPlanResponse {
    pub recommendation: Option<RecommendationResponse>,
}

/// Response payload from a minute ventilation calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinuteVolumeResponse {
    pub minute_volume_lpm: f64,
    /// "x.xx L/min"
    pub formatted: String,
    pub input_hash: String,
}

/// Response payload from a minute volume transfer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferResponse {
    pub transfer: Option<FlowRateTransfer>,
}

/// One selectable cylinder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CylinderInfo {
    pub code: CylinderSize,
    pub liters_per_psi: f64,
}

impl From<CylinderSize> for CylinderInfo {
    fn from(size: CylinderSize) -> Self {
        Self {
            code: size,
            liters_per_psi: size.conversion_factor(),
        }
    }
}

/// Error body for rejected input.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationErrorResponse {
    pub error: &'static str,
    pub field: ValidationField,
    pub reason: ValidationReason,
}

impl From<ValidationError> for ValidationErrorResponse {
    fn from(err: ValidationError) -> Self {
        Self {
            error: err.message(),
            field: err.field,
            reason: err.reason,
        }
    }
}
