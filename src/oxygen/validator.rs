//! Input validation for the oxygen calculators.
//!
//! Raw inputs arrive as optional floating point numbers. Whole-number fields
//! must be integral; fractional values are rejected, never rounded.

use serde::Serialize;

use super::calculators::{
    CylinderSize, GasCalculationInput, LiquidCalculationInput, MinuteVolumeInput,
};
use super::models::{GasDurationRequest, LiquidDurationRequest, MinuteVolumeRequest};
use crate::config::LiquidFlowPolicy;

const FIO2_MIN: u8 = 21;
const FIO2_MAX: u8 = 100;

/// Input that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationField {
    TankSize,
    Psi,
    SafetyResidual,
    FlowRate,
    Fio2,
    LitersRemaining,
    LiquidFlowRate,
    LiquidFio2,
    RespiratoryRate,
    TidalVolume,
}

/// Why the input was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationReason {
    Missing,
    UnknownCylinder,
    NotPositive,
    Negative,
    NotWholeNumber,
    OutOfRange,
    NotBelowTotal,
}

/// Validation error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationError {
    pub field: ValidationField,
    pub reason: ValidationReason,
}

impl ValidationError {
    pub fn new(field: ValidationField, reason: ValidationReason) -> Self {
        Self { field, reason }
    }

    /// User-facing message, one per validation rule.
    pub fn message(&self) -> &'static str {
        use ValidationField::*;

        match (self.field, self.reason) {
            (TankSize, _) => "Please select a tank size",
            (Psi, _) => "Please enter a valid whole number PSI value",
            (SafetyResidual, ValidationReason::NotBelowTotal) => {
                "Safety residual cannot be greater than or equal to total PSI"
            }
            (SafetyResidual, _) => "Safety residual must be a whole number and cannot be negative",
            (FlowRate, _) => "Please enter a valid whole number flow rate",
            (LiquidFlowRate, ValidationReason::NotWholeNumber) => {
                "Please enter a valid whole number flow rate"
            }
            (LiquidFlowRate, _) => "Please enter a valid flow rate",
            (Fio2 | LiquidFio2, _) => {
                "Please enter a valid whole number FiO2 percentage (between 21% and 100%)"
            }
            (LitersRemaining, _) => "Please enter a valid whole number liters remaining value",
            (RespiratoryRate, _) => "Please enter a valid whole number respiratory rate",
            (TidalVolume, _) => "Please enter a valid whole number tidal volume",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ValidationError {}

/// A present, finite, strictly positive number.
fn positive(value: Option<f64>, field: ValidationField) -> Result<f64, ValidationError> {
    let value = value.ok_or(ValidationError::new(field, ValidationReason::Missing))?;
    if value.is_nan() {
        return Err(ValidationError::new(field, ValidationReason::NotWholeNumber));
    }
    if value <= 0.0 {
        return Err(ValidationError::new(field, ValidationReason::NotPositive));
    }
    if value.is_infinite() {
        return Err(ValidationError::new(field, ValidationReason::OutOfRange));
    }
    Ok(value)
}

/// Integral value that fits the calculator's integer range.
fn whole(value: f64, field: ValidationField) -> Result<u32, ValidationError> {
    if value.fract() != 0.0 {
        return Err(ValidationError::new(field, ValidationReason::NotWholeNumber));
    }
    if value > f64::from(u32::MAX) {
        return Err(ValidationError::new(field, ValidationReason::OutOfRange));
    }
    Ok(value as u32)
}

fn positive_whole(value: Option<f64>, field: ValidationField) -> Result<u32, ValidationError> {
    positive(value, field).and_then(|v| whole(v, field))
}

fn fio2_percent(value: Option<f64>, field: ValidationField) -> Result<u8, ValidationError> {
    let value = positive_whole(value, field)?;
    if !(u32::from(FIO2_MIN)..=u32::from(FIO2_MAX)).contains(&value) {
        return Err(ValidationError::new(field, ValidationReason::OutOfRange));
    }
    Ok(value as u8)
}

/// Absent reserve counts as zero; present must be a non-negative whole number.
fn safety_reserve(value: Option<f64>) -> Result<u32, ValidationError> {
    let field = ValidationField::SafetyResidual;
    match value {
        None => Ok(0),
        Some(v) if v.is_nan() => Err(ValidationError::new(field, ValidationReason::NotWholeNumber)),
        Some(v) if v < 0.0 => Err(ValidationError::new(field, ValidationReason::Negative)),
        Some(v) if v.is_infinite() => Err(ValidationError::new(field, ValidationReason::OutOfRange)),
        Some(v) => whole(v, field),
    }
}

/// Validate gas cylinder inputs, reporting the first failing rule.
pub fn validate_gas(request: &GasDurationRequest) -> Result<GasCalculationInput, ValidationError> {
    let code = request
        .tank_size
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .ok_or(ValidationError::new(ValidationField::TankSize, ValidationReason::Missing))?;
    let cylinder = CylinderSize::from_code(code).ok_or(ValidationError::new(
        ValidationField::TankSize,
        ValidationReason::UnknownCylinder,
    ))?;

    let pressure_psi = positive_whole(request.psi, ValidationField::Psi)?;
    let safety_reserve_psi = safety_reserve(request.safety_residual)?;
    if safety_reserve_psi >= pressure_psi {
        return Err(ValidationError::new(
            ValidationField::SafetyResidual,
            ValidationReason::NotBelowTotal,
        ));
    }

    let flow_rate_lpm = positive_whole(request.flow_rate, ValidationField::FlowRate)?;
    let fio2_percent = fio2_percent(request.fio2, ValidationField::Fio2)?;

    Ok(GasCalculationInput {
        cylinder,
        pressure_psi,
        safety_reserve_psi,
        flow_rate_lpm,
        fio2_percent,
    })
}

/// Validate liquid oxygen inputs under the given flow rate policy.
pub fn validate_liquid(
    request: &LiquidDurationRequest,
    policy: LiquidFlowPolicy,
) -> Result<LiquidCalculationInput, ValidationError> {
    let liters_remaining = positive_whole(request.liters_remaining, ValidationField::LitersRemaining)?;

    let flow_rate_lpm = match policy {
        LiquidFlowPolicy::WholeNumber => {
            f64::from(positive_whole(request.flow_rate, ValidationField::LiquidFlowRate)?)
        }
        LiquidFlowPolicy::Positive => positive(request.flow_rate, ValidationField::LiquidFlowRate)
            .map_err(|e| match e.reason {
                // No whole number is required under this policy.
                ValidationReason::NotWholeNumber => {
                    ValidationError::new(e.field, ValidationReason::NotPositive)
                }
                _ => e,
            })?,
    };

    let fio2_percent = fio2_percent(request.fio2, ValidationField::LiquidFio2)?;

    Ok(LiquidCalculationInput {
        liters_remaining,
        flow_rate_lpm,
        fio2_percent,
    })
}

/// Validate minute ventilation inputs.
pub fn validate_minute_volume(
    request: &MinuteVolumeRequest,
) -> Result<MinuteVolumeInput, ValidationError> {
    Ok(MinuteVolumeInput {
        respiratory_rate: positive_whole(request.respiratory_rate, ValidationField::RespiratoryRate)?,
        tidal_volume_ml: positive_whole(request.tidal_volume, ValidationField::TidalVolume)?,
    })
}
