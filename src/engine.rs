//! Calculation orchestrators: load curve, storage sizing, V2G arbitrage.
//!
//! Every entry point is a pure function of its value-object inputs plus
//! the injected [`CalculationConfig`]; results carry an ordered list of
//! human-readable step strings for traceability.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::config::CalculationConfig;
use crate::domain::{
    round2, FleetConfig, PileGroup, SlotPoint, StationConfig, TouPeriod, Weekday,
    WeeklySchedule,
};
use crate::economics::{self, ChargeMode, YearlyEconomic};
use crate::error::{CalcError, CalcResult};
use crate::scheduler::{piles, weekly};
use crate::sizing;
use crate::timegrid;

const WEEKS_PER_YEAR: Decimal = dec!(52);

/// Parameters of one sizing run that are chosen per request rather than
/// stored with the project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizingRequest {
    #[serde(default)]
    pub charge_mode: ChargeMode,
    /// Battery capacity decay per year, percent.
    pub annual_decay_percent: Decimal,
    #[serde(default)]
    pub enable_peak_shaving: bool,
    /// Subsidy per kWh per day, when peak shaving is enabled.
    #[serde(default)]
    pub peak_shaving_subsidy: Option<Decimal>,
}

/// Standalone V2G calculation input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct V2gRequest {
    pub fleet: FleetConfig,
    #[serde(default)]
    pub schedule: WeeklySchedule,
    #[serde(default)]
    pub tous: Vec<TouPeriod>,
    /// Overrides the configured discharge derate when set.
    #[serde(default)]
    pub discharge_power_ratio: Option<Decimal>,
}

/// One weekday's curve, labeled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCurve {
    pub day: Weekday,
    pub points: Vec<SlotPoint>,
}

fn day_curves(daily: Vec<(Weekday, Vec<SlotPoint>)>) -> Vec<DayCurve> {
    daily
        .into_iter()
        .map(|(day, points)| DayCurve { day, points })
        .collect()
}

/// Station load curve with optional V2G overlay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadCurveResult {
    pub daily_curves: Vec<DayCurve>,
    pub envelope: Vec<SlotPoint>,
    pub peak_power_kw: Decimal,
    pub daily_energy_kwh: Decimal,
    /// Rated V2G pile discharge capability, not the envelope value.
    pub peak_discharge_power_kw: Decimal,
    pub daily_discharge_energy_kwh: Decimal,
    /// Best single-day arbitrage of the week.
    pub daily_arbitrage_revenue: Decimal,
    pub v2g_enabled: bool,
    pub steps: Vec<String>,
}

/// Complete storage sizing recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizingResult {
    /// Installed (post-rounding) ESS power and capacity.
    pub ess_rated_power_kw: Decimal,
    pub ess_capacity_kwh: Decimal,
    /// Raw requirement before standard-module rounding.
    pub ess_calculated_power_kw: Decimal,
    pub ess_calculated_capacity_kwh: Decimal,
    pub ess_model_power_kw: Decimal,
    pub ess_model_capacity_kwh: Decimal,
    pub ess_units: u32,
    pub load_peak_power_kw: Decimal,
    pub pv_peak_power_kw: Decimal,
    pub transformer_kva: Decimal,
    pub transformer_auto_selected: bool,
    /// Set when the ESS rated power exceeds the transformer.
    pub warning: Option<String>,
    pub load_curve: Vec<SlotPoint>,
    pub yearly_economics: Vec<YearlyEconomic>,
    pub steps: Vec<String>,
}

/// V2G arbitrage outcome with a pile-configuration suggestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct V2gResult {
    pub suggested_piles: PileGroup,
    pub daily_curves: Vec<DayCurve>,
    pub envelope: Vec<SlotPoint>,
    pub peak_charging_power_kw: Decimal,
    /// Rated pile capability after derate, not envelope-derived.
    pub peak_discharge_power_kw: Decimal,
    pub daily_max_charging_energy_kwh: Decimal,
    pub daily_max_discharge_energy_kwh: Decimal,
    pub weekly_arbitrage_revenue: Decimal,
    pub yearly_arbitrage_revenue: Decimal,
    pub discharge_power_ratio: Decimal,
    pub steps: Vec<String>,
}

/// The calculation engine: the injected configuration plus nothing else.
#[derive(Debug, Clone)]
pub struct Engine {
    config: CalculationConfig,
}

impl Default for Engine {
    fn default() -> Self {
        Self { config: CalculationConfig::default() }
    }
}

impl Engine {
    pub fn new(config: CalculationConfig) -> CalcResult<Self> {
        config
            .validate()
            .map_err(|e| CalcError::InvalidConfig(e.to_string()))?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CalculationConfig {
        &self.config
    }

    fn tariff_steps(&self, tous: &[TouPeriod], steps: &mut Vec<String>) {
        let uncovered = timegrid::uncovered_slots(tous, self.config.time_slot_interval_minutes);
        if uncovered > 0 {
            steps.push(format!(
                "WARNING: {uncovered} slots are not covered by any tariff period; \
                 the mean price applies there"
            ));
        }
    }

    fn fleet_steps(&self, fleet: &FleetConfig, total_power: Decimal, steps: &mut Vec<String>) {
        steps.push(format!(
            "Vehicle count={}, battery={:.1}kWh, time control={}",
            fleet.vehicle_count, fleet.battery_kwh, fleet.enable_time_control
        ));
        steps.push(format!(
            "Charging piles: fast {}x{:.0}kW, slow {}x{:.0}kW, ultra {}x{:.0}kW, active piles={}, total power={:.0}kW",
            fleet.piles.fast,
            self.config.fast_pile_power_kw,
            fleet.piles.slow,
            self.config.slow_pile_power_kw,
            fleet.piles.ultra_fast,
            self.config.ultra_fast_pile_power_kw,
            fleet.vehicle_count.min(fleet.piles.total()),
            total_power
        ));
    }

    /// Weekly load curve; V2G overlay when the fleet has V2G piles.
    pub fn compute_load_curve(
        &self,
        fleet: &FleetConfig,
        schedule: &WeeklySchedule,
        tous: &[TouPeriod],
    ) -> CalcResult<LoadCurveResult> {
        fleet.validate()?;
        if tous.is_empty() {
            return Err(CalcError::missing("TOU electricity prices"));
        }

        let mut steps = Vec::new();
        let total_power = piles::total_charging_power(&self.config, &fleet.piles, fleet.vehicle_count);
        self.fleet_steps(fleet, total_power, &mut steps);
        self.tariff_steps(tous, &mut steps);

        let interval_hours = self.config.interval_hours();

        if fleet.v2g_enabled() {
            let total_v2g = fleet.total_v2g_piles();
            steps.push(format!(
                "V2G piles: fast {}, slow {}, ultra {}, total {total_v2g}",
                fleet.v2g_piles.fast, fleet.v2g_piles.slow, fleet.v2g_piles.ultra_fast
            ));

            let v2g_discharge =
                piles::v2g_discharge_power(&self.config, &fleet.v2g_piles, fleet.vehicle_count, None);
            let v2g_charge =
                piles::total_charging_power(&self.config, &fleet.v2g_piles, fleet.vehicle_count);
            let v1g_charge = piles::total_charging_power(
                &self.config,
                &fleet.v1g_piles(),
                fleet.vehicle_count.saturating_sub(total_v2g),
            );

            let week = weekly::week_curves_v2g(
                &self.config,
                schedule,
                tous,
                fleet.vehicle_count,
                fleet.battery_kwh,
                fleet.enable_time_control,
                v1g_charge,
                v2g_charge,
                v2g_discharge,
                total_v2g,
                &mut steps,
            )?;

            steps.push(format!(
                "Load curve peak charge power = {:.2}kW",
                week.peak_power_kw
            ));
            steps.push(format!(
                "Daily max energy consumption = {:.2}kWh",
                week.daily_max_energy_kwh
            ));
            steps.push(format!(
                "V2G daily arbitrage revenue = {:.2}",
                week.max_daily_arbitrage
            ));
            info!(peak = %week.peak_power_kw, "load curve computed (V2G)");

            return Ok(LoadCurveResult {
                peak_power_kw: week.peak_power_kw,
                daily_energy_kwh: week.daily_max_energy_kwh,
                peak_discharge_power_kw: v2g_discharge,
                daily_discharge_energy_kwh: week.daily_max_discharge_energy(interval_hours),
                daily_arbitrage_revenue: week.max_daily_arbitrage,
                v2g_enabled: true,
                envelope: week.envelope,
                daily_curves: day_curves(week.daily),
                steps,
            });
        }

        let week = weekly::week_curves_v1g(
            &self.config,
            schedule,
            tous,
            fleet.vehicle_count,
            fleet.battery_kwh,
            fleet.enable_time_control,
            total_power,
            &mut steps,
        )?;

        steps.push(format!("Load curve peak power = {:.2}kW", week.peak_power_kw));
        steps.push(format!(
            "Daily max energy consumption = {:.2}kWh",
            week.daily_max_energy_kwh
        ));
        info!(peak = %week.peak_power_kw, "load curve computed (V1G)");

        Ok(LoadCurveResult {
            peak_power_kw: week.peak_power_kw,
            daily_energy_kwh: week.daily_max_energy_kwh,
            peak_discharge_power_kw: Decimal::ZERO,
            daily_discharge_energy_kwh: Decimal::ZERO,
            daily_arbitrage_revenue: Decimal::ZERO,
            v2g_enabled: false,
            envelope: week.envelope,
            daily_curves: day_curves(week.daily),
            steps,
        })
    }

    /// Full sizing pipeline: V1G load curve, transformer, ESS modules,
    /// 20-year economics.
    pub fn compute_sizing(
        &self,
        station: &StationConfig,
        fleet: &FleetConfig,
        schedule: &WeeklySchedule,
        tous: &[TouPeriod],
        request: &SizingRequest,
    ) -> CalcResult<SizingResult> {
        fleet.validate()?;
        if tous.is_empty() {
            return Err(CalcError::missing("TOU electricity prices"));
        }
        if station.pv_peak_power_kw < Decimal::ZERO {
            return Err(CalcError::InvalidInput(
                "PV peak power must be non-negative".into(),
            ));
        }

        let mut steps = Vec::new();
        let total_power =
            piles::total_charging_power(&self.config, &fleet.piles, fleet.vehicle_count);
        self.fleet_steps(fleet, total_power, &mut steps);
        steps.push(format!(
            "PV installed capacity = {:.2}kW",
            station.pv_peak_power_kw
        ));
        self.tariff_steps(tous, &mut steps);

        // Sizing always rates the station for the unidirectional worst case.
        let week = weekly::week_curves_v1g(
            &self.config,
            schedule,
            tous,
            fleet.vehicle_count,
            fleet.battery_kwh,
            fleet.enable_time_control,
            total_power,
            &mut steps,
        )?;

        let load_peak = week.peak_power_kw;
        steps.push(format!("Load curve peak power = {load_peak:.2}kW"));
        steps.push(format!(
            "Daily max energy consumption = {:.2}kWh",
            week.daily_max_energy_kwh
        ));

        let (transformer_kva, auto_selected) = match station.specified_transformer() {
            Some(kva) => {
                steps.push(format!("Transformer capacity (user-specified) = {kva:.0}kVA"));
                (kva, false)
            }
            None => {
                let kva = sizing::select_transformer(&self.config, load_peak, station.country);
                steps.push(format!(
                    "Transformer auto-selected = {kva:.0}kVA ({} standard), based on peak load {load_peak:.2}kW",
                    station.country
                ));
                (kva, true)
            }
        };

        let ess_max = sizing::ess_max_power(&self.config, load_peak);
        steps.push(format!(
            "ESS max power = peak({load_peak:.2}) x coefficient({:.2}) = {ess_max:.2}kW",
            self.config.empirical_coefficient
        ));

        let ess_rated = sizing::ess_rated_power(ess_max, station.pv_peak_power_kw);
        steps.push(format!(
            "ESS rated power = ESS max({ess_max:.2}) - PV peak({:.2}) = {ess_rated:.2}kW",
            station.pv_peak_power_kw
        ));

        let warning = sizing::transformer_warning(ess_rated, transformer_kva);
        match &warning {
            Some(text) => steps.push(format!("WARNING: {text}")),
            None => steps.push(format!(
                "Validation passed: ESS rated power({ess_rated:.2}) <= transformer capacity({transformer_kva:.0})"
            )),
        }

        let duration = request.charge_mode.duration_hours();
        let calculated_capacity = round2(ess_rated * duration);
        steps.push(format!(
            "Calculated ESS capacity = rated power({ess_rated:.2}) x duration({duration:.0}h) = {calculated_capacity:.2}kWh"
        ));

        let selection =
            sizing::select_ess_model(&self.config, ess_rated, calculated_capacity, station.country);
        let actual_power = selection.total_power_kw();
        let actual_capacity = selection.total_capacity_kwh();
        steps.push(format!(
            "Standard ESS model selected ({}): {}kW/{}kWh x {} units = {actual_power:.0}kW / {actual_capacity:.0}kWh",
            station.country,
            selection.model_power_kw,
            selection.model_capacity_kwh,
            selection.units
        ));

        let yearly = economics::project_years(
            &self.config,
            actual_capacity,
            tous,
            request.annual_decay_percent,
            request.enable_peak_shaving,
            request.peak_shaving_subsidy,
            request.charge_mode,
        );
        steps.push(format!(
            "Economic indicators calculated for {} years, initial investment = {:.0}",
            economics::PROJECTION_YEARS,
            actual_capacity * self.config.ess_unit_cost_per_kwh
        ));
        info!(%load_peak, %actual_power, %actual_capacity, "sizing computed");

        Ok(SizingResult {
            ess_rated_power_kw: actual_power,
            ess_capacity_kwh: actual_capacity,
            ess_calculated_power_kw: ess_rated,
            ess_calculated_capacity_kwh: calculated_capacity,
            ess_model_power_kw: Decimal::from(selection.model_power_kw),
            ess_model_capacity_kwh: Decimal::from(selection.model_capacity_kwh),
            ess_units: selection.units,
            load_peak_power_kw: load_peak,
            pv_peak_power_kw: station.pv_peak_power_kw,
            transformer_kva,
            transformer_auto_selected: auto_selected,
            warning,
            load_curve: week.envelope,
            yearly_economics: yearly,
            steps,
        })
    }

    /// Standalone V2G calculation with a pile-configuration suggestion.
    pub fn compute_v2g(&self, request: &V2gRequest) -> CalcResult<V2gResult> {
        let fleet = &request.fleet;
        fleet.validate()?;

        let mut steps = Vec::new();

        let suggested = piles::suggest_piles(&self.config, fleet.vehicle_count);
        steps.push(format!(
            "Pile suggestion: fast={}, slow={}, ultra={} (for {} vehicles)",
            suggested.fast, suggested.slow, suggested.ultra_fast, fleet.vehicle_count
        ));

        let derate = request
            .discharge_power_ratio
            .unwrap_or(self.config.v2g_discharge_derate);
        let total_power =
            piles::total_charging_power(&self.config, &fleet.piles, fleet.vehicle_count);
        steps.push(format!(
            "Total charging power: {total_power:.0}kW, discharge power ratio: {:.0}%",
            derate * dec!(100)
        ));
        self.tariff_steps(&request.tous, &mut steps);

        let total_v2g = fleet.total_v2g_piles();
        let interval_hours = self.config.interval_hours();

        let (week, peak_discharge) = if total_v2g > 0 {
            let v2g_discharge = piles::v2g_discharge_power(
                &self.config,
                &fleet.v2g_piles,
                fleet.vehicle_count,
                Some(derate),
            );
            let v2g_charge =
                piles::total_charging_power(&self.config, &fleet.v2g_piles, fleet.vehicle_count);
            let v1g_charge = piles::total_charging_power(
                &self.config,
                &fleet.v1g_piles(),
                fleet.vehicle_count.saturating_sub(total_v2g),
            );
            steps.push(format!(
                "V2G enabled: V1G charge={v1g_charge:.0}kW, V2G charge={v2g_charge:.0}kW, V2G discharge={v2g_discharge:.0}kW"
            ));

            let week = weekly::week_curves_v2g(
                &self.config,
                &request.schedule,
                &request.tous,
                fleet.vehicle_count,
                fleet.battery_kwh,
                fleet.enable_time_control,
                v1g_charge,
                v2g_charge,
                v2g_discharge,
                total_v2g,
                &mut steps,
            )?;
            (week, v2g_discharge)
        } else {
            let week = weekly::week_curves_v1g(
                &self.config,
                &request.schedule,
                &request.tous,
                fleet.vehicle_count,
                fleet.battery_kwh,
                fleet.enable_time_control,
                total_power,
                &mut steps,
            )?;
            (week, Decimal::ZERO)
        };

        let weekly_arbitrage = round2(week.weekly_arbitrage);
        let yearly_arbitrage = round2(weekly_arbitrage * WEEKS_PER_YEAR);
        let daily_discharge = week.daily_max_discharge_energy(interval_hours);

        steps.push(format!(
            "Peak discharge power (rated) = {peak_discharge:.0}kW (pile capability x derate)"
        ));
        steps.push(format!(
            "Weekly arbitrage = {weekly_arbitrage:.2}, yearly = {yearly_arbitrage:.2}"
        ));
        info!(%weekly_arbitrage, "V2G calculation complete");

        Ok(V2gResult {
            suggested_piles: suggested,
            peak_charging_power_kw: week.peak_power_kw,
            peak_discharge_power_kw: peak_discharge,
            daily_max_charging_energy_kwh: week.daily_max_energy_kwh,
            daily_max_discharge_energy_kwh: daily_discharge,
            weekly_arbitrage_revenue: weekly_arbitrage,
            yearly_arbitrage_revenue: yearly_arbitrage,
            discharge_power_ratio: derate,
            envelope: week.envelope,
            daily_curves: day_curves(week.daily),
            steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Country, DaySchedule, MinuteRange, PeriodType, TimeRange};

    fn flat_tariff() -> Vec<TouPeriod> {
        vec![TouPeriod::new(
            PeriodType::Normal,
            vec![MinuteRange::parse("00:00", "24:00").unwrap()],
            dec!(0.5),
        )]
    }

    fn simple_fleet() -> FleetConfig {
        FleetConfig {
            vehicle_count: 1,
            battery_kwh: dec!(100),
            enable_time_control: false,
            piles: PileGroup::new(1, 0, 0),
            v2g_piles: PileGroup::default(),
        }
    }

    #[test]
    fn test_load_curve_requires_tariff() {
        let engine = Engine::default();
        let result =
            engine.compute_load_curve(&simple_fleet(), &WeeklySchedule::default(), &[]);
        assert!(matches!(result, Err(CalcError::MissingInput(_))));
    }

    #[test]
    fn test_v1g_trivial_station() {
        let engine = Engine::default();
        let result = engine
            .compute_load_curve(&simple_fleet(), &WeeklySchedule::default(), &flat_tariff())
            .unwrap();

        assert!(!result.v2g_enabled);
        assert_eq!(result.peak_power_kw, dec!(7.00));
        assert_eq!(result.daily_energy_kwh, dec!(80.00));
        assert_eq!(result.daily_curves.len(), 7);
        for curve in &result.daily_curves {
            assert_eq!(curve.points.len(), 96);
        }
        assert!(result.steps.iter().any(|s| s.contains("peak power")));
    }

    #[test]
    fn test_sizing_end_to_end() {
        let engine = Engine::default();
        let station = StationConfig {
            pv_peak_power_kw: dec!(100),
            transformer_kva: None,
            country: Country::Cn,
        };
        let fleet = FleetConfig {
            vehicle_count: 8,
            battery_kwh: dec!(100),
            enable_time_control: false,
            piles: PileGroup::new(6, 2, 1),
            v2g_piles: PileGroup::default(),
        };
        let request = SizingRequest {
            charge_mode: ChargeMode::One,
            annual_decay_percent: dec!(2),
            enable_peak_shaving: false,
            peak_shaving_subsidy: None,
        };
        let result = engine
            .compute_sizing(
                &station,
                &fleet,
                &WeeklySchedule::default(),
                &flat_tariff(),
                &request,
            )
            .unwrap();

        // top-8 piles: 350 + 2x120 + 5x7 = 625 kW
        assert_eq!(result.load_peak_power_kw, dec!(625.00));
        assert!(result.transformer_auto_selected);
        assert_eq!(result.transformer_kva, dec!(630));
        // 625 x 0.8 - 100 PV = 400 kW, x 2h = 800 kWh
        assert_eq!(result.ess_calculated_power_kw, dec!(400.00));
        assert_eq!(result.ess_calculated_capacity_kwh, dec!(800.00));
        assert_eq!(result.ess_units, 4);
        assert!(result.ess_rated_power_kw >= result.ess_calculated_power_kw);
        assert!(result.ess_capacity_kwh >= result.ess_calculated_capacity_kwh);
        assert_eq!(result.yearly_economics.len(), 20);
        assert!(result.warning.is_none());
    }

    #[test]
    fn test_transformer_overflow_is_warning_not_error() {
        let engine = Engine::default();
        let station = StationConfig {
            pv_peak_power_kw: Decimal::ZERO,
            transformer_kva: Some(dec!(100)),
            country: Country::Cn,
        };
        let fleet = FleetConfig {
            vehicle_count: 8,
            battery_kwh: dec!(100),
            enable_time_control: false,
            piles: PileGroup::new(0, 8, 0),
            v2g_piles: PileGroup::default(),
        };
        let request = SizingRequest {
            charge_mode: ChargeMode::One,
            annual_decay_percent: dec!(2),
            enable_peak_shaving: false,
            peak_shaving_subsidy: None,
        };
        let result = engine
            .compute_sizing(
                &station,
                &fleet,
                &WeeklySchedule::default(),
                &flat_tariff(),
                &request,
            )
            .unwrap();
        assert!(result.warning.is_some());
        assert!(!result.transformer_auto_selected);
    }

    #[test]
    fn test_v2g_scenario_records_negative_arbitrage() {
        let engine = Engine::default();
        let day = DaySchedule {
            operating: true,
            chargeable_ranges: vec![
                TimeRange::new("08:00", "10:00", Some(50)),
                TimeRange::new("18:00", "20:00", Some(90)),
            ],
        };
        let request = V2gRequest {
            fleet: FleetConfig {
                vehicle_count: 1,
                battery_kwh: dec!(100),
                enable_time_control: true,
                piles: PileGroup::new(0, 1, 0),
                v2g_piles: PileGroup::new(0, 1, 0),
            },
            schedule: WeeklySchedule::new(vec![day]),
            tous: vec![
                TouPeriod::new(
                    PeriodType::Peak,
                    vec![MinuteRange::parse("18:00", "20:15").unwrap()],
                    dec!(1.2),
                ),
                TouPeriod::new(
                    PeriodType::Valley,
                    vec![MinuteRange::parse("20:15", "18:00").unwrap()],
                    dec!(0.3),
                ),
            ],
            discharge_power_ratio: None,
        };
        let result = engine.compute_v2g(&request).unwrap();

        assert_eq!(result.peak_discharge_power_kw, dec!(102.00));
        // one operating day: 12.00 revenue - 48.00 cost
        assert_eq!(result.weekly_arbitrage_revenue, dec!(-36.00));
        assert_eq!(result.yearly_arbitrage_revenue, dec!(-1872.00));
        assert_eq!(result.daily_max_discharge_energy_kwh, dec!(40.00));
        assert_eq!(result.discharge_power_ratio, dec!(0.85));
    }

    #[test]
    fn test_zero_vehicles_zero_everything() {
        let engine = Engine::default();
        let fleet = FleetConfig {
            vehicle_count: 0,
            battery_kwh: dec!(100),
            enable_time_control: false,
            piles: PileGroup::new(2, 1, 0),
            v2g_piles: PileGroup::new(1, 0, 0),
        };
        let request = V2gRequest {
            fleet,
            schedule: WeeklySchedule::default(),
            tous: flat_tariff(),
            discharge_power_ratio: None,
        };
        let result = engine.compute_v2g(&request).unwrap();
        assert_eq!(result.peak_charging_power_kw, Decimal::ZERO);
        assert_eq!(result.weekly_arbitrage_revenue, Decimal::ZERO);
        assert!(result
            .envelope
            .iter()
            .all(|p| p.charge_power_kw.is_zero() && p.discharge_power_kw.is_zero()));
    }

    #[test]
    fn test_determinism_byte_identical_runs() {
        let engine = Engine::default();
        let day = DaySchedule {
            operating: true,
            chargeable_ranges: vec![
                TimeRange::new("00:00", "06:00", Some(70)),
                TimeRange::new("12:00", "14:00", Some(40)),
                TimeRange::new("20:00", "23:45", Some(90)),
            ],
        };
        let request = V2gRequest {
            fleet: FleetConfig {
                vehicle_count: 5,
                battery_kwh: dec!(80),
                enable_time_control: true,
                piles: PileGroup::new(3, 2, 1),
                v2g_piles: PileGroup::new(1, 1, 0),
            },
            schedule: WeeklySchedule::new(vec![day.clone(), day.clone(), day]),
            tous: vec![
                TouPeriod::new(
                    PeriodType::Peak,
                    vec![MinuteRange::parse("19:00", "21:00").unwrap()],
                    dec!(1.4),
                ),
                TouPeriod::new(
                    PeriodType::Valley,
                    vec![MinuteRange::parse("23:00", "07:00").unwrap()],
                    dec!(0.31),
                ),
                TouPeriod::new(
                    PeriodType::Normal,
                    vec![
                        MinuteRange::parse("07:00", "19:00").unwrap(),
                        MinuteRange::parse("21:00", "23:00").unwrap(),
                    ],
                    dec!(0.68),
                ),
            ],
            discharge_power_ratio: Some(dec!(0.9)),
        };

        let first = serde_json::to_string(&engine.compute_v2g(&request).unwrap()).unwrap();
        let second = serde_json::to_string(&engine.compute_v2g(&request).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
