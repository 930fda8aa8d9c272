//! Weekly aggregation: per-day curves, max envelope and arbitrage totals.

use rust_decimal::Decimal;
use std::collections::BTreeSet;
use tracing::debug;

use crate::config::CalculationConfig;
use crate::domain::{
    self, round4, zero_curve, DaySchedule, SlotPoint, TouPeriod, Weekday, WeeklySchedule,
    DEFAULT_MIN_SOC_PERCENT,
};
use crate::error::CalcResult;
use crate::scheduler::v1g;
use crate::scheduler::v2g::{self, RangeTarget, V2gDayInputs};
use crate::timegrid;

/// Everything the sizing and V2G orchestrators need from one week.
#[derive(Debug, Clone)]
pub struct WeekOutcome {
    /// Curves for the operating days, Mon…Sun order.
    pub daily: Vec<(Weekday, Vec<SlotPoint>)>,
    /// Slot-wise worst case across all days.
    pub envelope: Vec<SlotPoint>,
    pub peak_power_kw: Decimal,
    pub daily_max_energy_kwh: Decimal,
    /// Best single-day arbitrage (zero for V1G-only weeks).
    pub max_daily_arbitrage: Decimal,
    /// Sum of all days' arbitrage (zero for V1G-only weeks).
    pub weekly_arbitrage: Decimal,
}

impl WeekOutcome {
    fn zeroed(interval_minutes: u32) -> Self {
        Self {
            daily: Vec::new(),
            envelope: zero_curve(interval_minutes),
            peak_power_kw: Decimal::ZERO,
            daily_max_energy_kwh: Decimal::ZERO,
            max_daily_arbitrage: Decimal::ZERO,
            weekly_arbitrage: Decimal::ZERO,
        }
    }

    /// Highest per-day discharged energy, as a positive magnitude.
    pub fn daily_max_discharge_energy(&self, interval_hours: Decimal) -> Decimal {
        self.daily
            .iter()
            .map(|(_, curve)| domain::daily_discharge_energy(curve, interval_hours))
            .max()
            .unwrap_or(Decimal::ZERO)
    }
}

/// Chargeable slot set for one day. Ranges with empty endpoints are
/// skipped (absent UI rows); malformed non-empty times are an error.
fn day_slot_set(day: &DaySchedule, interval_minutes: u32) -> CalcResult<BTreeSet<usize>> {
    let total = timegrid::slots_per_day(interval_minutes);
    let mut slots = BTreeSet::new();
    for range in &day.chargeable_ranges {
        if range.start.is_empty() || range.end.is_empty() {
            continue;
        }
        let from = timegrid::slot_of(&range.start, interval_minutes)?;
        let to = timegrid::slot_of(&range.end, interval_minutes)?;
        timegrid::expand_slot_range(&mut slots, from, to, total);
    }
    Ok(slots)
}

fn day_range_targets(day: &DaySchedule, interval_minutes: u32) -> CalcResult<Vec<RangeTarget>> {
    let mut targets = Vec::new();
    for range in &day.chargeable_ranges {
        if range.start.is_empty() || range.end.is_empty() {
            continue;
        }
        targets.push(RangeTarget::from_time_range(range, interval_minutes)?);
    }
    // Temporal order drives the SOC hand-off between ranges.
    targets.sort_by_key(|r| r.start_slot);
    Ok(targets)
}

fn finish(
    daily: Vec<(Weekday, Vec<SlotPoint>)>,
    config: &CalculationConfig,
    max_daily_arbitrage: Decimal,
    weekly_arbitrage: Decimal,
    steps: &mut Vec<String>,
) -> WeekOutcome {
    let interval_minutes = config.time_slot_interval_minutes;
    if daily.is_empty() {
        steps.push("No operating days found; all curves are zero".to_string());
        return WeekOutcome::zeroed(interval_minutes);
    }

    let curves: Vec<&[SlotPoint]> = daily.iter().map(|(_, c)| c.as_slice()).collect();
    let envelope = domain::max_envelope(&curves, interval_minutes);
    let peak_power_kw = domain::peak_charge_power(&envelope);

    let interval_hours = config.interval_hours();
    let daily_max_energy_kwh = daily
        .iter()
        .map(|(_, curve)| domain::daily_energy(curve, interval_hours))
        .max()
        .unwrap_or(Decimal::ZERO);

    steps.push(format!(
        "Per-day curves computed for {} days, envelope peak={peak_power_kw:.2}kW, max daily energy={daily_max_energy_kwh:.2}kWh",
        daily.len()
    ));
    debug!(days = daily.len(), %peak_power_kw, "weekly envelope computed");

    WeekOutcome {
        daily,
        envelope,
        peak_power_kw,
        daily_max_energy_kwh,
        max_daily_arbitrage,
        weekly_arbitrage,
    }
}

/// V1G-only week: one greedy curve per operating day.
#[allow(clippy::too_many_arguments)]
pub fn week_curves_v1g(
    config: &CalculationConfig,
    schedule: &WeeklySchedule,
    tous: &[TouPeriod],
    vehicle_count: u32,
    battery_kwh: Decimal,
    enable_time_control: bool,
    total_charging_power_kw: Decimal,
    steps: &mut Vec<String>,
) -> CalcResult<WeekOutcome> {
    let interval_minutes = config.time_slot_interval_minutes;
    let slots = config.slots_per_day();
    let interval_hours = config.interval_hours();

    let min_soc = schedule.effective_max_min_soc();
    let soc_ratio = round4(Decimal::from(min_soc) / Decimal::from(100u32));
    let daily_demand_kwh = battery_kwh * soc_ratio * Decimal::from(vehicle_count);
    let max_energy_per_slot_kwh = total_charging_power_kw * interval_hours;

    steps.push(format!(
        "Effective min SOC = {min_soc}% (max across all chargeable ranges)"
    ));
    steps.push(format!(
        "Daily energy demand = {vehicle_count} vehicles x {battery_kwh:.1}kWh x {min_soc}% SOC = {daily_demand_kwh:.2}kWh"
    ));
    steps.push(format!(
        "Max energy per slot = {total_charging_power_kw:.0}kW x {interval_hours:.4}h = {max_energy_per_slot_kwh:.2}kWh"
    ));

    let prices = timegrid::slot_prices(tous, interval_minutes);
    let mut daily: Vec<(Weekday, Vec<SlotPoint>)> = Vec::new();

    if !enable_time_control {
        steps.push(format!(
            "Time control disabled; all {slots} slots are chargeable for all days"
        ));
        let all_slots: BTreeSet<usize> = (0..slots).collect();
        let curve = v1g::day_curve(
            &all_slots,
            &prices,
            daily_demand_kwh,
            max_energy_per_slot_kwh,
            interval_hours,
            interval_minutes,
        );
        for day in Weekday::ALL {
            daily.push((day, curve.clone()));
        }
    } else {
        for (index, day) in Weekday::ALL.iter().enumerate() {
            let Some(entry) = schedule.day(index) else { continue };
            if !entry.operating {
                continue;
            }
            let day_slots = day_slot_set(entry, interval_minutes)?;
            if day_slots.is_empty() {
                steps.push(format!("[{day}] No chargeable slots; zero curve"));
                daily.push((*day, zero_curve(interval_minutes)));
            } else {
                steps.push(format!(
                    "[{day}] {} chargeable slots from configured ranges",
                    day_slots.len()
                ));
                daily.push((
                    *day,
                    v1g::day_curve(
                        &day_slots,
                        &prices,
                        daily_demand_kwh,
                        max_energy_per_slot_kwh,
                        interval_hours,
                        interval_minutes,
                    ),
                ));
            }
        }
    }

    Ok(finish(daily, config, Decimal::ZERO, Decimal::ZERO, steps))
}

/// Week with V2G piles: per-day combined V1G + V2G dispatch.
#[allow(clippy::too_many_arguments)]
pub fn week_curves_v2g(
    config: &CalculationConfig,
    schedule: &WeeklySchedule,
    tous: &[TouPeriod],
    vehicle_count: u32,
    battery_kwh: Decimal,
    enable_time_control: bool,
    v1g_charge_power_kw: Decimal,
    v2g_charge_power_kw: Decimal,
    v2g_discharge_power_kw: Decimal,
    total_v2g_piles: u32,
    steps: &mut Vec<String>,
) -> CalcResult<WeekOutcome> {
    let interval_minutes = config.time_slot_interval_minutes;
    let slots = config.slots_per_day();
    let interval_hours = config.interval_hours();

    let v2g_vehicle_count = total_v2g_piles.min(vehicle_count);
    let v1g_vehicle_count = vehicle_count - v2g_vehicle_count;

    let min_soc = schedule.effective_max_min_soc();
    let soc_ratio = round4(Decimal::from(min_soc) / Decimal::from(100u32));
    let v1g_demand_kwh = battery_kwh * soc_ratio * Decimal::from(v1g_vehicle_count);
    let v1g_max_energy_per_slot_kwh = v1g_charge_power_kw * interval_hours;
    let v2g_max_charge_per_slot_kwh = v2g_charge_power_kw * interval_hours;
    let v2g_max_discharge_per_slot_kwh = v2g_discharge_power_kw * interval_hours;

    steps.push(format!(
        "V1G vehicles={v1g_vehicle_count}, V2G vehicles={v2g_vehicle_count}, V1G target SOC={min_soc}%"
    ));
    steps.push(format!(
        "V1G charge demand={v1g_demand_kwh:.2}kWh, V1G power={v1g_charge_power_kw:.0}kW"
    ));
    steps.push(format!(
        "V2G charge power={v2g_charge_power_kw:.0}kW, V2G discharge power={v2g_discharge_power_kw:.0}kW"
    ));

    let prices = timegrid::slot_prices(tous, interval_minutes);
    let mut daily: Vec<(Weekday, Vec<SlotPoint>)> = Vec::new();
    let mut max_daily_arbitrage = Decimal::ZERO;
    let mut weekly_arbitrage = Decimal::ZERO;

    if !enable_time_control {
        // One synthetic full-day range at the default departure SOC.
        let all_slots: BTreeSet<usize> = (0..slots).collect();
        let full_day = vec![RangeTarget {
            start_slot: 0,
            end_slot: slots - 1,
            min_soc: DEFAULT_MIN_SOC_PERCENT,
            start: timegrid::time_of_slot(0, interval_minutes),
            end: timegrid::time_of_slot(slots - 1, interval_minutes),
        }];
        let inputs = V2gDayInputs {
            chargeable: &all_slots,
            ranges: &full_day,
            prices: &prices,
            v1g_demand_kwh,
            v1g_max_energy_per_slot_kwh,
            v2g_vehicle_count,
            v2g_charge_power_kw,
            v2g_discharge_power_kw,
            v2g_max_charge_per_slot_kwh,
            v2g_max_discharge_per_slot_kwh,
            battery_kwh,
            interval_hours,
            interval_minutes,
        };
        let outcome = v2g::day_curve_with_v2g(&inputs, steps, "all-days");
        for day in Weekday::ALL {
            daily.push((day, outcome.curve.clone()));
        }
        max_daily_arbitrage = outcome.arbitrage;
        weekly_arbitrage = outcome.arbitrage * Decimal::from(7u32);
    } else {
        for (index, day) in Weekday::ALL.iter().enumerate() {
            let Some(entry) = schedule.day(index) else { continue };
            if !entry.operating {
                continue;
            }
            let day_slots = day_slot_set(entry, interval_minutes)?;
            if day_slots.is_empty() {
                daily.push((*day, zero_curve(interval_minutes)));
                continue;
            }
            let ranges = day_range_targets(entry, interval_minutes)?;
            let inputs = V2gDayInputs {
                chargeable: &day_slots,
                ranges: &ranges,
                prices: &prices,
                v1g_demand_kwh,
                v1g_max_energy_per_slot_kwh,
                v2g_vehicle_count,
                v2g_charge_power_kw,
                v2g_discharge_power_kw,
                v2g_max_charge_per_slot_kwh,
                v2g_max_discharge_per_slot_kwh,
                battery_kwh,
                interval_hours,
                interval_minutes,
            };
            let outcome = v2g::day_curve_with_v2g(&inputs, steps, &day.to_string());
            daily.push((*day, outcome.curve));
            weekly_arbitrage += outcome.arbitrage;
            if outcome.arbitrage > max_daily_arbitrage {
                max_daily_arbitrage = outcome.arbitrage;
            }
        }
    }

    Ok(finish(daily, config, max_daily_arbitrage, weekly_arbitrage, steps))
}
