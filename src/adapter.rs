//! Boundary adapter: persisted JSON blobs and rows into core values.
//!
//! Persistence stores the weekly schedule and each tariff period's time
//! ranges as JSON strings. The adapter parses them into typed values
//! before anything enters the engine; an unparseable blob degrades to an
//! empty value with a warning instead of failing the whole request, so a
//! half-written row cannot take the service down.

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;

use crate::domain::{
    Country, DaySchedule, FleetConfig, MinuteRange, PileGroup, StationConfig, TimeRange,
    TouPeriod, WeeklySchedule,
};
use crate::engine::{Engine, LoadCurveResult, SizingRequest, SizingResult, V2gRequest, V2gResult};
use crate::error::{CalcError, CalcResult};

/// Persisted vehicle/pile configuration row (nullable columns).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredVehicleConfig {
    pub vehicle_count: Option<u32>,
    pub battery_capacity_kwh: Option<Decimal>,
    pub enable_time_control: Option<bool>,
    pub slow_chargers: Option<u32>,
    pub fast_chargers: Option<u32>,
    pub ultra_fast_chargers: Option<u32>,
    pub slow_chargers_v2g: Option<u32>,
    pub fast_chargers_v2g: Option<u32>,
    pub ultra_fast_chargers_v2g: Option<u32>,
    /// JSON array of day entries.
    pub weekly_schedule: Option<String>,
}

/// Persisted PV configuration row.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPvConfig {
    pub installed_capacity_kw: Option<Decimal>,
}

/// Persisted per-project tariff row; `time_ranges` is a JSON array of
/// `{"start", "end"}` objects.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPriceRow {
    pub period_type: String,
    pub time_ranges: Option<String>,
    pub price: Decimal,
    pub country: Option<String>,
}

/// Everything the boundary loaded for one project.
#[derive(Debug, Clone, Default)]
pub struct ProjectInputs {
    pub transformer_capacity_kva: Option<Decimal>,
    pub pv_config: Option<StoredPvConfig>,
    pub vehicle_config: Option<StoredVehicleConfig>,
    pub price_rows: Vec<StoredPriceRow>,
}

#[derive(Debug, Deserialize)]
struct StoredDayEntry {
    #[serde(default, rename = "isOperating")]
    is_operating: bool,
    #[serde(default, rename = "chargeableRanges")]
    chargeable_ranges: Vec<StoredClockRange>,
}

#[derive(Debug, Deserialize)]
struct StoredClockRange {
    #[serde(default)]
    start: String,
    #[serde(default)]
    end: String,
    #[serde(rename = "minSoc")]
    min_soc: Option<u8>,
}

/// Parse the weekly-schedule blob; a bad blob yields an empty schedule
/// and a warning.
pub fn parse_weekly_schedule(json: Option<&str>) -> (WeeklySchedule, Vec<String>) {
    let Some(json) = json else {
        return (WeeklySchedule::default(), Vec::new());
    };
    match serde_json::from_str::<Vec<StoredDayEntry>>(json) {
        Ok(entries) => {
            let days = entries
                .into_iter()
                .map(|entry| DaySchedule {
                    operating: entry.is_operating,
                    chargeable_ranges: entry
                        .chargeable_ranges
                        .into_iter()
                        .map(|r| TimeRange::new(r.start, r.end, r.min_soc))
                        .collect(),
                })
                .collect();
            (WeeklySchedule::new(days), Vec::new())
        }
        Err(error) => {
            warn!(%error, "failed to parse weekly schedule blob");
            (
                WeeklySchedule::default(),
                vec![format!(
                    "WARNING: weekly schedule blob could not be parsed ({error}); treated as empty"
                )],
            )
        }
    }
}

/// Parse one tariff row's time-range blob. A blob that is not valid
/// JSON degrades to an empty range list with a warning; a range whose
/// clock string is present but malformed is an error.
fn parse_time_ranges(json: Option<&str>) -> CalcResult<(Vec<MinuteRange>, Vec<String>)> {
    let Some(json) = json else {
        return Ok((Vec::new(), Vec::new()));
    };
    let raw: Vec<StoredClockRange> = match serde_json::from_str(json) {
        Ok(raw) => raw,
        Err(error) => {
            warn!(%error, "failed to parse tariff time ranges blob");
            return Ok((
                Vec::new(),
                vec![format!(
                    "WARNING: tariff time ranges could not be parsed ({error}); period ignored"
                )],
            ));
        }
    };
    let mut ranges = Vec::new();
    for entry in raw {
        if entry.start.is_empty() || entry.end.is_empty() {
            continue;
        }
        ranges.push(MinuteRange::parse(&entry.start, &entry.end)?);
    }
    Ok((ranges, Vec::new()))
}

/// Convert persisted tariff rows into ordered TOU periods.
pub fn tou_periods_from_rows(
    rows: &[StoredPriceRow],
) -> CalcResult<(Vec<TouPeriod>, Vec<String>)> {
    let mut periods = Vec::with_capacity(rows.len());
    let mut warnings = Vec::new();
    for row in rows {
        let period_type = row.period_type.parse()?;
        let (ranges, mut range_warnings) = parse_time_ranges(row.time_ranges.as_deref())?;
        warnings.append(&mut range_warnings);
        periods.push(TouPeriod::new(period_type, ranges, row.price));
    }
    Ok((periods, warnings))
}

/// Fleet value from a stored row, nullable columns defaulted.
pub fn fleet_from_stored(stored: &StoredVehicleConfig) -> FleetConfig {
    FleetConfig {
        vehicle_count: stored.vehicle_count.unwrap_or(0),
        battery_kwh: stored.battery_capacity_kwh.unwrap_or(Decimal::ZERO),
        enable_time_control: stored.enable_time_control.unwrap_or(true),
        piles: PileGroup {
            slow: stored.slow_chargers.unwrap_or(0),
            fast: stored.fast_chargers.unwrap_or(0),
            ultra_fast: stored.ultra_fast_chargers.unwrap_or(0),
        },
        v2g_piles: PileGroup {
            slow: stored.slow_chargers_v2g.unwrap_or(0),
            fast: stored.fast_chargers_v2g.unwrap_or(0),
            ultra_fast: stored.ultra_fast_chargers_v2g.unwrap_or(0),
        },
    }
}

fn country_from_rows(rows: &[StoredPriceRow]) -> Country {
    Country::parse_or_default(rows.first().and_then(|r| r.country.as_deref()))
}

fn require_prices(inputs: &ProjectInputs) -> CalcResult<()> {
    if inputs.price_rows.is_empty() {
        return Err(CalcError::missing("TOU electricity prices"));
    }
    Ok(())
}

fn require_vehicle_config(inputs: &ProjectInputs) -> CalcResult<&StoredVehicleConfig> {
    inputs
        .vehicle_config
        .as_ref()
        .ok_or_else(|| CalcError::missing("V2G vehicle config"))
}

/// Project-bound load curve: §external interface operation 1.
pub fn compute_load_curve_for_project(
    engine: &Engine,
    inputs: &ProjectInputs,
) -> CalcResult<LoadCurveResult> {
    let stored = require_vehicle_config(inputs)?;
    require_prices(inputs)?;

    let fleet = fleet_from_stored(stored);
    let (schedule, mut warnings) = parse_weekly_schedule(stored.weekly_schedule.as_deref());
    let (tous, mut tariff_warnings) = tou_periods_from_rows(&inputs.price_rows)?;
    warnings.append(&mut tariff_warnings);

    let mut result = engine.compute_load_curve(&fleet, &schedule, &tous)?;
    result.steps.splice(0..0, warnings);
    Ok(result)
}

/// Project-bound sizing: loads PV, vehicle and tariff rows.
pub fn compute_sizing_for_project(
    engine: &Engine,
    inputs: &ProjectInputs,
    request: &SizingRequest,
) -> CalcResult<SizingResult> {
    let pv = inputs
        .pv_config
        .as_ref()
        .ok_or_else(|| CalcError::missing("PV system config"))?;
    let stored = require_vehicle_config(inputs)?;
    require_prices(inputs)?;

    let station = StationConfig {
        pv_peak_power_kw: pv.installed_capacity_kw.unwrap_or(Decimal::ZERO),
        transformer_kva: inputs.transformer_capacity_kva,
        country: country_from_rows(&inputs.price_rows),
    };
    let fleet = fleet_from_stored(stored);
    let (schedule, mut warnings) = parse_weekly_schedule(stored.weekly_schedule.as_deref());
    let (tous, mut tariff_warnings) = tou_periods_from_rows(&inputs.price_rows)?;
    warnings.append(&mut tariff_warnings);

    let mut result = engine.compute_sizing(&station, &fleet, &schedule, &tous, request)?;
    result.steps.splice(0..0, warnings);
    Ok(result)
}

/// Project-bound V2G calculation: identical to [`Engine::compute_v2g`]
/// with inputs loaded from persistence.
pub fn compute_v2g_for_project(
    engine: &Engine,
    inputs: &ProjectInputs,
) -> CalcResult<V2gResult> {
    let stored = require_vehicle_config(inputs)?;
    require_prices(inputs)?;

    let fleet = fleet_from_stored(stored);
    let (schedule, mut warnings) = parse_weekly_schedule(stored.weekly_schedule.as_deref());
    let (tous, mut tariff_warnings) = tou_periods_from_rows(&inputs.price_rows)?;
    warnings.append(&mut tariff_warnings);

    let request = V2gRequest {
        fleet,
        schedule,
        tous,
        discharge_power_ratio: None,
    };
    let mut result = engine.compute_v2g(&request)?;
    result.steps.splice(0..0, warnings);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SCHEDULE_JSON: &str = r#"[
        {"day": "Mon", "isOperating": true,
         "chargeableRanges": [{"start": "08:00", "end": "10:00", "minSoc": 50}],
         "departureCount": 3},
        {"day": "Tue", "isOperating": false, "chargeableRanges": []}
    ]"#;

    #[test]
    fn test_parse_weekly_schedule_happy_path() {
        let (schedule, warnings) = parse_weekly_schedule(Some(SCHEDULE_JSON));
        assert!(warnings.is_empty());
        assert_eq!(schedule.days.len(), 2);
        assert!(schedule.days[0].operating);
        assert_eq!(schedule.days[0].chargeable_ranges[0].min_soc, Some(50));
        assert!(!schedule.days[1].operating);
    }

    #[test]
    fn test_parse_weekly_schedule_degrades_on_garbage() {
        let (schedule, warnings) = parse_weekly_schedule(Some("{not json"));
        assert!(schedule.days.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("treated as empty"));
    }

    #[test]
    fn test_tou_rows_parse_ranges_and_wrap() {
        let rows = vec![
            StoredPriceRow {
                period_type: "peak".into(),
                time_ranges: Some(r#"[{"start":"18:00","end":"21:00"}]"#.into()),
                price: dec!(1.2),
                country: Some("CN".into()),
            },
            StoredPriceRow {
                period_type: "valley".into(),
                time_ranges: Some(r#"[{"start":"21:00","end":"18:00"}]"#.into()),
                price: dec!(0.3),
                country: Some("CN".into()),
            },
        ];
        let (tous, warnings) = tou_periods_from_rows(&rows).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(tous.len(), 2);
        assert!(tous[1].ranges[0].contains(0));
    }

    #[test]
    fn test_tou_rows_degrade_on_bad_blob_but_reject_bad_time() {
        let rows = vec![StoredPriceRow {
            period_type: "peak".into(),
            time_ranges: Some("oops".into()),
            price: dec!(1.0),
            country: None,
        }];
        let (tous, warnings) = tou_periods_from_rows(&rows).unwrap();
        assert_eq!(tous.len(), 1);
        assert!(tous[0].ranges.is_empty());
        assert_eq!(warnings.len(), 1);

        let rows = vec![StoredPriceRow {
            period_type: "peak".into(),
            time_ranges: Some(r#"[{"start":"6pm","end":"21:00"}]"#.into()),
            price: dec!(1.0),
            country: None,
        }];
        assert!(matches!(
            tou_periods_from_rows(&rows),
            Err(CalcError::MalformedTime(_))
        ));
    }

    #[test]
    fn test_project_flow_requires_inputs() {
        let engine = Engine::default();
        let empty = ProjectInputs::default();
        assert!(matches!(
            compute_load_curve_for_project(&engine, &empty),
            Err(CalcError::MissingInput(_))
        ));
        assert!(matches!(
            compute_v2g_for_project(&engine, &empty),
            Err(CalcError::MissingInput(_))
        ));
    }

    #[test]
    fn test_project_flow_end_to_end() {
        let engine = Engine::default();
        let inputs = ProjectInputs {
            transformer_capacity_kva: None,
            pv_config: Some(StoredPvConfig { installed_capacity_kw: Some(dec!(50)) }),
            vehicle_config: Some(StoredVehicleConfig {
                vehicle_count: Some(2),
                battery_capacity_kwh: Some(dec!(60)),
                enable_time_control: Some(true),
                slow_chargers: Some(2),
                weekly_schedule: Some(SCHEDULE_JSON.into()),
                ..StoredVehicleConfig::default()
            }),
            price_rows: vec![StoredPriceRow {
                period_type: "normal".into(),
                time_ranges: Some(r#"[{"start":"00:00","end":"24:00"}]"#.into()),
                price: dec!(0.6),
                country: Some("CN".into()),
            }],
        };

        let result = compute_load_curve_for_project(&engine, &inputs).unwrap();
        assert!(!result.v2g_enabled);
        // only Monday operates: 08:00-10:00, 9 slots at 14 kW
        assert_eq!(result.daily_curves.len(), 1);
        assert_eq!(result.peak_power_kw, dec!(14.00));

        let request = SizingRequest {
            charge_mode: Default::default(),
            annual_decay_percent: dec!(2),
            enable_peak_shaving: false,
            peak_shaving_subsidy: None,
        };
        let sized = compute_sizing_for_project(&engine, &inputs, &request).unwrap();
        assert!(sized.transformer_auto_selected);
        assert_eq!(sized.pv_peak_power_kw, dec!(50));
    }
}
