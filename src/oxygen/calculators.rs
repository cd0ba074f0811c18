//! Pure oxygen supply calculations.
//!
//! Everything here operates on already-validated inputs; see `validator`
//! for the rules that produce them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Gaseous liters produced by one liter of liquid oxygen.
pub const LIQUID_EXPANSION_RATIO: f64 = 860.0;

/// Milliliters per liter, used for tidal volume conversion.
const ML_PER_LITER: f64 = 1000.0;

const MINUTES_PER_HOUR: f64 = 60.0;

/// Compressed gas cylinder sizes and their capacity per PSI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CylinderSize {
    D,
    E,
    M,
    H,
}

impl CylinderSize {
    /// All sizes in the order the calculator offers them.
    pub const ALL: [CylinderSize; 4] = [Self::D, Self::E, Self::M, Self::H];

    /// Conversion factor in liters of gas per PSI.
    pub fn conversion_factor(self) -> f64 {
        match self {
            Self::D => 0.16,
            Self::E => 0.28,
            Self::M => 1.56,
            Self::H => 3.14,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::D => "D",
            Self::E => "E",
            Self::M => "M",
            Self::H => "H",
        }
    }

    /// Look up a size by its code. Blank codes return `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|size| size.code().eq_ignore_ascii_case(code.trim()))
    }
}

impl fmt::Display for CylinderSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Which supply the calculator is working with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OxygenMode {
    #[default]
    Gas,
    Liquid,
}

impl OxygenMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gas => "gas",
            Self::Liquid => "liquid",
        }
    }

    /// Name of the flow rate field this mode reads.
    pub fn flow_rate_field(self) -> &'static str {
        match self {
            Self::Gas => "flow_rate",
            Self::Liquid => "liquid_flow_rate",
        }
    }
}

/// Validated gas cylinder inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasCalculationInput {
    pub cylinder: CylinderSize,
    /// Total cylinder pressure in PSI
    pub pressure_psi: u32,
    /// Pressure withheld as a safety margin, always below `pressure_psi`
    pub safety_reserve_psi: u32,
    /// Flow rate in L/min
    pub flow_rate_lpm: u32,
    /// FiO2 percentage (21-100)
    pub fio2_percent: u8,
}

/// Validated liquid oxygen inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiquidCalculationInput {
    pub liters_remaining: u32,
    /// Flow rate in L/min; fractional only under the positive-only policy
    pub flow_rate_lpm: f64,
    pub fio2_percent: u8,
}

/// Validated minute ventilation inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinuteVolumeInput {
    /// Breaths per minute
    pub respiratory_rate: u32,
    /// Tidal volume in mL
    pub tidal_volume_ml: u32,
}

fn fio2_fraction(fio2_percent: u8) -> f64 {
    f64::from(fio2_percent) / 100.0
}

/// Minutes of supply left in a gas cylinder.
pub fn gas_duration_minutes(input: &GasCalculationInput) -> f64 {
    let usable_psi = input.pressure_psi.saturating_sub(input.safety_reserve_psi);
    let total_liters = input.cylinder.conversion_factor() * f64::from(usable_psi);

    total_liters / (f64::from(input.flow_rate_lpm) * fio2_fraction(input.fio2_percent))
}

/// Minutes of supply left in a liquid oxygen reservoir.
pub fn liquid_duration_minutes(input: &LiquidCalculationInput) -> f64 {
    let gaseous_liters = f64::from(input.liters_remaining) * LIQUID_EXPANSION_RATIO;

    gaseous_liters / (input.flow_rate_lpm * fio2_fraction(input.fio2_percent))
}

/// Minute ventilation in L/min.
pub fn minute_volume_lpm(input: &MinuteVolumeInput) -> f64 {
    f64::from(input.respiratory_rate) * (f64::from(input.tidal_volume_ml) / ML_PER_LITER)
}

/// Number of cylinders needed to cover a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TankRecommendation(pub u64);

impl TankRecommendation {
    pub fn tanks(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TankRecommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tanks = self.tanks();
        let unit = if tanks == 1 { "tank" } else { "tanks" };
        write!(f, "{} {}", tanks, unit)
    }
}

/// Recommend how many tanks cover `transport_minutes` given the duration of one tank.
///
/// Returns `None` when either value is unusable: the transport duration must be
/// a positive whole number and a positive tank duration must have been computed.
pub fn recommend_tanks(
    transport_minutes: Option<f64>,
    tank_duration_minutes: Option<f64>,
) -> Option<TankRecommendation> {
    let transport = transport_minutes.filter(|t| t.is_finite() && *t > 0.0 && t.fract() == 0.0)?;
    let tank = tank_duration_minutes.filter(|d| d.is_finite() && *d > 0.0)?;

    Some(TankRecommendation((transport / tank).ceil() as u64))
}

/// Render a duration for display.
///
/// Under an hour shows one decimal place of minutes, otherwise whole hours
/// and minutes with the minutes part dropped when it is zero.
pub fn format_duration(minutes: f64) -> String {
    if minutes < MINUTES_PER_HOUR {
        return format!("{:.1} minutes", minutes);
    }

    let hours = (minutes / MINUTES_PER_HOUR).floor() as u64;
    let remaining = (minutes % MINUTES_PER_HOUR).floor() as u64;

    match (hours, remaining) {
        (1, 0) => "1 hour".to_string(),
        (h, 0) => format!("{} hours", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

/// Render a minute volume for display.
pub fn format_minute_volume(lpm: f64) -> String {
    format!("{:.2} L/min", lpm)
}

/// A minute volume copied into the active form's flow rate field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowRateTransfer {
    pub mode: OxygenMode,
    pub field: &'static str,
    /// Value as written into the field, two decimal places
    pub flow_rate: String,
}

/// Copy a previously computed minute volume into the flow rate field for `mode`.
///
/// Nothing is transferred when no minute volume has been computed.
pub fn transfer_minute_volume(
    minute_volume_lpm: Option<f64>,
    mode: OxygenMode,
) -> Option<FlowRateTransfer> {
    let lpm = minute_volume_lpm.filter(|v| v.is_finite() && *v != 0.0)?;

    Some(FlowRateTransfer {
        mode,
        field: mode.flow_rate_field(),
        flow_rate: format!("{:.2}", lpm),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6 * b.abs().max(1.0)
    }

    #[test]
    fn test_conversion_factors() {
        assert_eq!(CylinderSize::D.conversion_factor(), 0.16);
        assert_eq!(CylinderSize::E.conversion_factor(), 0.28);
        assert_eq!(CylinderSize::M.conversion_factor(), 1.56);
        assert_eq!(CylinderSize::H.conversion_factor(), 3.14);
    }

    #[test]
    fn test_cylinder_from_code() {
        assert_eq!(CylinderSize::from_code("E"), Some(CylinderSize::E));
        assert_eq!(CylinderSize::from_code(" h "), Some(CylinderSize::H));
        assert_eq!(CylinderSize::from_code(""), None);
        assert_eq!(CylinderSize::from_code("K"), None);
    }

    #[test]
    fn test_gas_duration_d_cylinder() {
        let input = GasCalculationInput {
            cylinder: CylinderSize::D,
            pressure_psi: 2000,
            safety_reserve_psi: 200,
            flow_rate_lpm: 2,
            fio2_percent: 100,
        };

        // 0.16 * 1800 / 2
        assert!(close(gas_duration_minutes(&input), 144.0));
    }

    #[test]
    fn test_gas_duration_room_air_fraction() {
        let input = GasCalculationInput {
            cylinder: CylinderSize::E,
            pressure_psi: 2000,
            safety_reserve_psi: 0,
            flow_rate_lpm: 2,
            fio2_percent: 21,
        };

        assert!(close(gas_duration_minutes(&input), 560.0 / 0.42));
    }

    #[test]
    fn test_liquid_duration() {
        let input = LiquidCalculationInput {
            liters_remaining: 500,
            flow_rate_lpm: 2.0,
            fio2_percent: 21,
        };

        let minutes = liquid_duration_minutes(&input);
        assert!(close(minutes, 1_023_809.523_809_5));
        assert_eq!(format_duration(minutes), "17063h 29m");
    }

    #[test]
    fn test_minute_volume() {
        let input = MinuteVolumeInput {
            respiratory_rate: 12,
            tidal_volume_ml: 500,
        };

        assert!(close(minute_volume_lpm(&input), 6.0));
        assert_eq!(format_minute_volume(minute_volume_lpm(&input)), "6.00 L/min");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(45.0), "45.0 minutes");
        assert_eq!(format_duration(45.3), "45.3 minutes");
        assert_eq!(format_duration(0.0), "0.0 minutes");
        assert_eq!(format_duration(60.0), "1 hour");
        assert_eq!(format_duration(90.0), "1h 30m");
        assert_eq!(format_duration(125.0), "2h 5m");
        assert_eq!(format_duration(120.0), "2 hours");
        assert_eq!(format_duration(120.9), "2 hours");
    }

    #[test]
    fn test_recommend_tanks() {
        let three = recommend_tanks(Some(500.0), Some(180.0)).unwrap();
        assert_eq!(three.tanks(), 3);
        assert_eq!(three.to_string(), "3 tanks");

        let one = recommend_tanks(Some(180.0), Some(180.0)).unwrap();
        assert_eq!(one.tanks(), 1);
        assert_eq!(one.to_string(), "1 tank");
    }

    #[test]
    fn test_recommend_tanks_unavailable() {
        assert_eq!(recommend_tanks(None, Some(180.0)), None);
        assert_eq!(recommend_tanks(Some(0.0), Some(180.0)), None);
        assert_eq!(recommend_tanks(Some(-30.0), Some(180.0)), None);
        assert_eq!(recommend_tanks(Some(90.5), Some(180.0)), None);
        assert_eq!(recommend_tanks(Some(500.0), None), None);
        assert_eq!(recommend_tanks(Some(500.0), Some(0.0)), None);
        assert_eq!(recommend_tanks(Some(500.0), Some(f64::NAN)), None);
    }

    #[test]
    fn test_transfer_minute_volume() {
        let transfer = transfer_minute_volume(Some(7.5), OxygenMode::Liquid).unwrap();
        assert_eq!(transfer.field, "liquid_flow_rate");
        assert_eq!(transfer.flow_rate, "7.50");

        let transfer = transfer_minute_volume(Some(6.0), OxygenMode::Gas).unwrap();
        assert_eq!(transfer.field, "flow_rate");
        assert_eq!(transfer.flow_rate, "6.00");

        assert_eq!(transfer_minute_volume(None, OxygenMode::Gas), None);
        assert_eq!(transfer_minute_volume(Some(0.0), OxygenMode::Gas), None);
    }

    proptest! {
        #[test]
        fn gas_duration_matches_formula(
            size in prop::sample::select(CylinderSize::ALL.to_vec()),
            pressure in 1u32..5000,
            reserve_share in 0.0f64..1.0,
            flow in 1u32..30,
            fio2 in 21u8..=100,
        ) {
            let reserve = ((f64::from(pressure) * reserve_share) as u32).min(pressure - 1);
            let input = GasCalculationInput {
                cylinder: size,
                pressure_psi: pressure,
                safety_reserve_psi: reserve,
                flow_rate_lpm: flow,
                fio2_percent: fio2,
            };

            let expected = size.conversion_factor() * f64::from(pressure - reserve)
                / (f64::from(flow) * f64::from(fio2) / 100.0);
            let minutes = gas_duration_minutes(&input);

            prop_assert!(minutes > 0.0);
            prop_assert!(close(minutes, expected));
            prop_assert_eq!(minutes, gas_duration_minutes(&input));
        }

        #[test]
        fn recommendation_covers_transport(
            transport in 1u32..10_000,
            tank in 0.5f64..2_000.0,
        ) {
            let tanks = recommend_tanks(Some(f64::from(transport)), Some(tank)).unwrap().tanks();
            let transport = f64::from(transport);

            prop_assert!(tanks >= 1);
            prop_assert!(tanks as f64 * tank >= transport - 1e-9);
            prop_assert!(((tanks - 1) as f64) * tank < transport + 1e-9);
        }
    }
}
