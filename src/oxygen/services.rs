//! Calculation services: validate, compute, format and hash each request.

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::calculators::{
    format_duration, format_minute_volume, gas_duration_minutes, liquid_duration_minutes,
    minute_volume_lpm, recommend_tanks, transfer_minute_volume, OxygenMode,
};
use super::models::{
    DurationResponse, GasDurationRequest, LiquidDurationRequest, MinuteVolumeRequest,
    MinuteVolumeResponse, TransferRequest, TransferResponse, TransportPlanRequest,
    TransportPlanResponse,
};
use super::validator::{self, ValidationError, ValidationField, ValidationReason};
use crate::config::LiquidFlowPolicy;

/// Compute SHA256 hash of a request's JSON form.
fn input_hash<T: Serialize>(request: &T) -> String {
    let json = serde_json::to_string(request).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

fn duration_response(
    mode: OxygenMode,
    duration_min: f64,
    transport_duration_min: Option<f64>,
    input_hash: String,
) -> DurationResponse {
    DurationResponse {
        mode,
        duration_min,
        formatted: format_duration(duration_min),
        recommendation: recommend_tanks(transport_duration_min, Some(duration_min)).map(Into::into),
        input_hash,
    }
}

/// Remaining gas cylinder duration, with a tank recommendation when a transport is planned.
pub fn calculate_gas(request: &GasDurationRequest) -> Result<DurationResponse, ValidationError> {
    let input = validator::validate_gas(request).map_err(|e| {
        tracing::debug!(field = ?e.field, reason = ?e.reason, "gas calculation rejected");
        e
    })?;

    let minutes = gas_duration_minutes(&input);
    tracing::debug!(
        cylinder = %input.cylinder,
        usable_psi = input.pressure_psi - input.safety_reserve_psi,
        minutes,
        "gas duration calculated"
    );

    Ok(duration_response(
        OxygenMode::Gas,
        minutes,
        request.transport_duration_min,
        input_hash(request),
    ))
}

/// Remaining liquid oxygen duration, with a tank recommendation when a transport is planned.
pub fn calculate_liquid(
    request: &LiquidDurationRequest,
    policy: LiquidFlowPolicy,
) -> Result<DurationResponse, ValidationError> {
    let input = validator::validate_liquid(request, policy).map_err(|e| {
        tracing::debug!(field = ?e.field, reason = ?e.reason, "liquid calculation rejected");
        e
    })?;

    let minutes = liquid_duration_minutes(&input);
    if !minutes.is_finite() {
        tracing::debug!(flow_rate = input.flow_rate_lpm, "liquid duration overflowed");
        return Err(ValidationError::new(
            ValidationField::LiquidFlowRate,
            ValidationReason::OutOfRange,
        ));
    }
    tracing::debug!(liters = input.liters_remaining, minutes, "liquid duration calculated");

    Ok(duration_response(
        OxygenMode::Liquid,
        minutes,
        request.transport_duration_min,
        input_hash(request),
    ))
}

/// Tanks needed for a transport given a previously computed tank duration.
pub fn plan_transport(request: &TransportPlanRequest) -> TransportPlanResponse {
    TransportPlanResponse {
        recommendation: recommend_tanks(request.transport_duration_min, request.tank_duration_min)
            .map(Into::into),
    }
}

/// Minute ventilation from respiratory rate and tidal volume.
pub fn calculate_minute_volume(
    request: &MinuteVolumeRequest,
) -> Result<MinuteVolumeResponse, ValidationError> {
    let input = validator::validate_minute_volume(request).map_err(|e| {
        tracing::debug!(field = ?e.field, reason = ?e.reason, "minute volume rejected");
        e
    })?;

    let lpm = minute_volume_lpm(&input);

    Ok(MinuteVolumeResponse {
        minute_volume_lpm: lpm,
        formatted: format_minute_volume(lpm),
        input_hash: input_hash(request),
    })
}

/// Copy a computed minute volume into the flow rate field of the requested mode.
pub fn transfer(request: &TransferRequest) -> TransferResponse {
    TransferResponse {
        transfer: transfer_minute_volume(request.minute_volume_lpm, request.mode),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gas_request() -> GasDurationRequest {
        GasDurationRequest {
            tank_size: Some("D".to_string()),
            psi: Some(2000.0),
            safety_residual: Some(200.0),
            flow_rate: Some(2.0),
            fio2: Some(100.0),
            transport_duration_min: None,
        }
    }

    #[test]
    fn test_gas_without_transport() {
        let result = calculate_gas(&gas_request()).unwrap();

        assert_eq!(result.mode, OxygenMode::Gas);
        assert!((result.duration_min - 144.0).abs() < 1e-9);
        assert_eq!(result.formatted, "2h 24m");
        assert!(result.recommendation.is_none());
    }

    #[test]
    fn test_gas_with_transport() {
        let mut request = gas_request();
        request.transport_duration_min = Some(300.0);

        let result = calculate_gas(&request).unwrap();
        let recommendation = result.recommendation.unwrap();

        assert_eq!(recommendation.tanks.tanks(), 3);
        assert_eq!(recommendation.label, "3 tanks");
    }

    #[test]
    fn test_gas_rejection_has_no_result() {
        let mut request = gas_request();
        request.safety_residual = Some(2000.0);

        let err = calculate_gas(&request).unwrap_err();
        assert_eq!(err.field, ValidationField::SafetyResidual);
    }

    #[test]
    fn test_liquid_reference_case() {
        let request = LiquidDurationRequest {
            liters_remaining: Some(500.0),
            flow_rate: Some(2.0),
            fio2: Some(21.0),
            transport_duration_min: Some(60.0),
        };

        let result = calculate_liquid(&request, LiquidFlowPolicy::WholeNumber).unwrap();

        assert_eq!(result.mode, OxygenMode::Liquid);
        assert_eq!(result.formatted, "17063h 29m");
        assert_eq!(result.recommendation.unwrap().label, "1 tank");
    }

    #[test]
    fn test_liquid_tiny_flow_rejected() {
        let request = LiquidDurationRequest {
            liters_remaining: Some(1.0),
            flow_rate: Some(1e-310),
            fio2: Some(21.0),
            transport_duration_min: None,
        };

        let err = calculate_liquid(&request, LiquidFlowPolicy::Positive).unwrap_err();

        assert_eq!(err.field, ValidationField::LiquidFlowRate);
        assert_eq!(err.reason, ValidationReason::OutOfRange);
        assert_eq!(err.to_string(), "Please enter a valid flow rate");
    }

    #[test]
    fn test_identical_inputs_identical_results() {
        let first = calculate_gas(&gas_request()).unwrap();
        let second = calculate_gas(&gas_request()).unwrap();

        assert_eq!(first, second);
        assert!(first.input_hash.starts_with("sha256:"));
        assert_eq!(first.input_hash.len(), 7 + 64);
    }

    #[test]
    fn test_input_hash_tracks_inputs() {
        let mut other = gas_request();
        other.flow_rate = Some(3.0);

        assert_ne!(
            calculate_gas(&gas_request()).unwrap().input_hash,
            calculate_gas(&other).unwrap().input_hash
        );
    }

    #[test]
    fn test_plan_transport() {
        let plan = plan_transport(&TransportPlanRequest {
            transport_duration_min: Some(500.0),
            tank_duration_min: Some(180.0),
        });
        assert_eq!(plan.recommendation.unwrap().label, "3 tanks");

        let plan = plan_transport(&TransportPlanRequest {
            transport_duration_min: Some(500.0),
            tank_duration_min: None,
        });
        assert!(plan.recommendation.is_none());
    }

    #[test]
    fn test_minute_volume_and_transfer() {
        let result = calculate_minute_volume(&MinuteVolumeRequest {
            respiratory_rate: Some(15.0),
            tidal_volume: Some(450.0),
        })
        .unwrap();
        assert_eq!(result.formatted, "6.75 L/min");

        let moved = transfer(&TransferRequest {
            minute_volume_lpm: Some(result.minute_volume_lpm),
            mode: OxygenMode::Gas,
        });
        let moved = moved.transfer.unwrap();
        assert_eq!(moved.field, "flow_rate");
        assert_eq!(moved.flow_rate, "6.75");
    }
}
