//! Server-rendered calculator page.
//!
//! The form round-trips the last tank duration and minute volume in hidden
//! fields, so nothing about a user's session is kept on the server.

use askama::Template;
use axum::{extract::State, response::Html, Form};
use serde::Deserialize;

use crate::error::Result;
use crate::AppState;

use super::calculators::{format_duration, transfer_minute_volume, CylinderSize, OxygenMode};
use super::models::{
    GasDurationRequest, LiquidDurationRequest, MinuteVolumeRequest, TransportPlanRequest,
};
use super::services;

/// Button pressed on the calculator form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormAction {
    SwitchMode,
    CalculateGas,
    CalculateLiquid,
    CalculateMinuteVolume,
    UseMinuteVolume,
    #[default]
    UpdateTransport,
}

/// Raw form fields exactly as typed by the user.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CalculatorForm {
    pub mode: OxygenMode,
    pub action: FormAction,
    pub tank_size: String,
    pub psi: String,
    pub safety_residual: String,
    pub flow_rate: String,
    pub fio2: String,
    pub liters_remaining: String,
    pub liquid_flow_rate: String,
    pub liquid_fio2: String,
    pub respiratory_rate: String,
    pub tidal_volume: String,
    pub transport_duration: String,
    pub last_tank_duration: String,
    pub last_minute_volume: String,
    /// Mode whose duration panel is showing, blank when hidden
    pub result_mode: String,
}

/// Parse a text field: blank is absent, unparseable text is an invalid number.
fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(text.parse().unwrap_or(f64::NAN))
}

struct CylinderOption {
    code: &'static str,
    liters_per_psi: f64,
    selected: bool,
}

#[derive(Template)]
#[template(path = "calculator.html")]
struct CalculatorTemplate {
    form: CalculatorForm,
    is_gas: bool,
    cylinders: Vec<CylinderOption>,
    conversion_factor: String,
    gas_duration: Option<String>,
    liquid_duration: Option<String>,
    minute_volume: Option<String>,
    recommendation: Option<String>,
    error: Option<String>,
}

impl CalculatorTemplate {
    fn new(form: CalculatorForm) -> Self {
        let selected = CylinderSize::from_code(&form.tank_size);
        let cylinders = CylinderSize::ALL
            .into_iter()
            .map(|size| CylinderOption {
                code: size.code(),
                liters_per_psi: size.conversion_factor(),
                selected: Some(size) == selected,
            })
            .collect();

        Self {
            is_gas: form.mode == OxygenMode::Gas,
            conversion_factor: selected
                .map(|size| size.conversion_factor().to_string())
                .unwrap_or_default(),
            cylinders,
            form,
            gas_duration: None,
            liquid_duration: None,
            minute_volume: None,
            recommendation: None,
            error: None,
        }
    }
}

/// Empty calculator in gas mode.
pub async fn show() -> Result<Html<String>> {
    let template = CalculatorTemplate::new(CalculatorForm::default());
    Ok(Html(template.render()?))
}

/// Run the pressed action and re-render the calculator.
pub async fn submit(
    State(state): State<AppState>,
    Form(form): Form<CalculatorForm>,
) -> Result<Html<String>> {
    let template = apply(form, &state);
    Ok(Html(template.render()?))
}

fn apply(form: CalculatorForm, state: &AppState) -> CalculatorTemplate {
    let action = form.action;
    let mut page = CalculatorTemplate::new(form);

    match action {
        FormAction::SwitchMode => {
            page.form.result_mode.clear();
        }
        FormAction::CalculateGas => {
            let request = GasDurationRequest {
                tank_size: Some(page.form.tank_size.clone()),
                psi: parse_number(&page.form.psi),
                safety_residual: parse_number(&page.form.safety_residual),
                flow_rate: parse_number(&page.form.flow_rate),
                fio2: parse_number(&page.form.fio2),
                transport_duration_min: None,
            };
            match services::calculate_gas(&request) {
                Ok(result) => {
                    page.gas_duration = Some(result.formatted);
                    page.form.last_tank_duration = result.duration_min.to_string();
                    page.form.result_mode = OxygenMode::Gas.as_str().to_string();
                }
                Err(e) => page.error = Some(e.to_string()),
            }
        }
        FormAction::CalculateLiquid => {
            let request = LiquidDurationRequest {
                liters_remaining: parse_number(&page.form.liters_remaining),
                flow_rate: parse_number(&page.form.liquid_flow_rate),
                fio2: parse_number(&page.form.liquid_fio2),
                transport_duration_min: None,
            };
            match services::calculate_liquid(&request, state.config.liquid_flow_policy) {
                Ok(result) => {
                    page.liquid_duration = Some(result.formatted);
                    page.form.last_tank_duration = result.duration_min.to_string();
                    page.form.result_mode = OxygenMode::Liquid.as_str().to_string();
                }
                Err(e) => page.error = Some(e.to_string()),
            }
        }
        FormAction::CalculateMinuteVolume => {
            let request = MinuteVolumeRequest {
                respiratory_rate: parse_number(&page.form.respiratory_rate),
                tidal_volume: parse_number(&page.form.tidal_volume),
            };
            match services::calculate_minute_volume(&request) {
                Ok(result) => {
                    page.minute_volume = Some(result.formatted);
                    page.form.last_minute_volume = result.minute_volume_lpm.to_string();
                }
                Err(e) => page.error = Some(e.to_string()),
            }
        }
        FormAction::UseMinuteVolume => {
            let lpm = parse_number(&page.form.last_minute_volume);
            if let Some(transfer) = transfer_minute_volume(lpm, page.form.mode) {
                match transfer.mode {
                    OxygenMode::Gas => page.form.flow_rate = transfer.flow_rate,
                    OxygenMode::Liquid => page.form.liquid_flow_rate = transfer.flow_rate,
                }
            }
        }
        FormAction::UpdateTransport => {}
    }

    redisplay_duration(&mut page);

    page.recommendation = services::plan_transport(&TransportPlanRequest {
        transport_duration_min: parse_number(&page.form.transport_duration),
        tank_duration_min: parse_number(&page.form.last_tank_duration),
    })
    .recommendation
    .map(|r| r.label);

    page
}

/// Keep the last duration on screen for the mode that computed it.
fn redisplay_duration(page: &mut CalculatorTemplate) {
    if page.gas_duration.is_some()
        || page.liquid_duration.is_some()
        || page.form.result_mode != page.form.mode.as_str()
    {
        return;
    }

    let minutes = parse_number(&page.form.last_tank_duration).filter(|m| m.is_finite() && *m >= 0.0);
    if let Some(minutes) = minutes {
        let text = Some(format_duration(minutes));
        match page.form.mode {
            OxygenMode::Gas => page.gas_duration = text,
            OxygenMode::Liquid => page.liquid_duration = text,
        }
    }
}
