//! Bidirectional (V2G) day scheduling with per-range SOC tracking.
//!
//! V2G vehicles follow the departure SOC target of each plug-in range.
//! Arriving above the target they sell the surplus at the most expensive
//! slots of the range; arriving below it they buy the deficit at the
//! cheapest. The vehicle starts the day at the SOC it left the last
//! range with (steady state across days).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeSet;

use crate::domain::{round2, round4, SlotPoint, TimeRange};
use crate::error::CalcResult;
use crate::scheduler::v1g;
use crate::timegrid;

/// A chargeable range resolved to slot indices, with its SOC target.
#[derive(Debug, Clone)]
pub struct RangeTarget {
    pub start_slot: usize,
    pub end_slot: usize,
    pub min_soc: u8,
    pub start: String,
    pub end: String,
}

impl RangeTarget {
    pub fn from_time_range(range: &TimeRange, interval_minutes: u32) -> CalcResult<Self> {
        Ok(Self {
            start_slot: timegrid::slot_of(&range.start, interval_minutes)?,
            end_slot: timegrid::slot_of(&range.end, interval_minutes)?,
            min_soc: range.effective_min_soc(),
            start: range.start.clone(),
            end: range.end.clone(),
        })
    }
}

/// Inputs for one day's combined V1G + V2G dispatch.
pub struct V2gDayInputs<'a> {
    pub chargeable: &'a BTreeSet<usize>,
    /// Ordered by ascending start slot.
    pub ranges: &'a [RangeTarget],
    pub prices: &'a [Decimal],
    pub v1g_demand_kwh: Decimal,
    pub v1g_max_energy_per_slot_kwh: Decimal,
    pub v2g_vehicle_count: u32,
    pub v2g_charge_power_kw: Decimal,
    pub v2g_discharge_power_kw: Decimal,
    pub v2g_max_charge_per_slot_kwh: Decimal,
    pub v2g_max_discharge_per_slot_kwh: Decimal,
    pub battery_kwh: Decimal,
    pub interval_hours: Decimal,
    pub interval_minutes: u32,
}

#[derive(Debug, Clone)]
pub struct V2gDayOutcome {
    pub curve: Vec<SlotPoint>,
    /// Discharge revenue minus V2G charge cost; negative when selling
    /// cheap and buying dear.
    pub arbitrage: Decimal,
}

/// Compute one day's curve with V2G vehicles overlaid on the V1G fleet.
///
/// V1G and V2G charging may land on the same slot and add up; V2G charge
/// and discharge never share a slot because each range does exactly one
/// of the two.
pub fn day_curve_with_v2g(
    inputs: &V2gDayInputs<'_>,
    steps: &mut Vec<String>,
    day_label: &str,
) -> V2gDayOutcome {
    let slots = inputs.prices.len();

    let v1g_fill = v1g::greedy_fill(
        inputs.chargeable,
        inputs.prices,
        inputs.v1g_demand_kwh,
        inputs.v1g_max_energy_per_slot_kwh,
        inputs.interval_hours,
    );

    if inputs.v2g_vehicle_count == 0 || inputs.ranges.is_empty() {
        let curve = assemble_curve(
            &v1g_fill.power_kw,
            &v1g_fill.energy_kwh,
            &vec![Decimal::ZERO; slots],
            &vec![Decimal::ZERO; slots],
            &vec![Decimal::ZERO; slots],
            &vec![Decimal::ZERO; slots],
            inputs.interval_minutes,
        );
        return V2gDayOutcome { curve, arbitrage: Decimal::ZERO };
    }

    let mut v2g_charge_power = vec![Decimal::ZERO; slots];
    let mut v2g_charge_energy = vec![Decimal::ZERO; slots];
    let mut v2g_discharge_power = vec![Decimal::ZERO; slots];
    let mut v2g_discharge_energy = vec![Decimal::ZERO; slots];

    let vehicles = Decimal::from(inputs.v2g_vehicle_count);

    // Steady state: arrive in the first range at the SOC the fleet left
    // the last range with the previous day.
    let mut soc = inputs.ranges[inputs.ranges.len() - 1].min_soc;
    let mut total_revenue = Decimal::ZERO;
    let mut total_charge_cost = Decimal::ZERO;

    steps.push(format!(
        "  [{day_label}] V2G per-range: {} ranges, initial SOC={soc}% (steady state from last range)",
        inputs.ranges.len()
    ));

    for range in inputs.ranges {
        let arrival = soc;
        let target = range.min_soc;

        let mut range_slots = BTreeSet::new();
        timegrid::expand_slot_range(&mut range_slots, range.start_slot, range.end_slot, slots);
        let mut priced: Vec<(usize, Decimal)> =
            range_slots.iter().map(|&i| (i, inputs.prices[i])).collect();

        if arrival > target {
            let headroom = round4(
                inputs.battery_kwh * Decimal::from(arrival - target) / dec!(100),
            ) * vehicles;

            // Sell at the most expensive slots first.
            priced.sort_by(|a, b| b.1.cmp(&a.1));

            let mut remaining = headroom;
            let mut range_revenue = Decimal::ZERO;
            let mut slots_used = 0usize;
            for (index, price) in priced {
                if remaining <= Decimal::ZERO {
                    break;
                }
                let energy = remaining.min(inputs.v2g_max_discharge_per_slot_kwh);
                v2g_discharge_power[index] -= inputs.v2g_discharge_power_kw;
                v2g_discharge_energy[index] -= energy;
                remaining -= energy;
                range_revenue += energy * price;
                slots_used += 1;
            }
            total_revenue += range_revenue;

            steps.push(format!(
                "  [{day_label}] Range {}~{}: V2G discharge {:.2}kWh in {slots_used} slots, revenue={:.4} (SOC {arrival}% -> {target}%)",
                range.start,
                range.end,
                headroom - remaining,
                range_revenue,
            ));
        } else if arrival < target {
            let deficit = round4(
                inputs.battery_kwh * Decimal::from(target - arrival) / dec!(100),
            ) * vehicles;

            // Buy at the cheapest slots first.
            priced.sort_by(|a, b| a.1.cmp(&b.1));

            let mut remaining = deficit;
            let mut range_cost = Decimal::ZERO;
            for (index, price) in priced {
                if remaining <= Decimal::ZERO {
                    break;
                }
                let energy = remaining.min(inputs.v2g_max_charge_per_slot_kwh);
                v2g_charge_power[index] += inputs.v2g_charge_power_kw;
                v2g_charge_energy[index] += energy;
                remaining -= energy;
                range_cost += energy * price;
            }
            total_charge_cost += range_cost;

            steps.push(format!(
                "  [{day_label}] Range {}~{}: V2G charge {:.2}kWh, cost={:.4} (SOC {arrival}% -> {target}%)",
                range.start, range.end, deficit, range_cost,
            ));
        } else {
            steps.push(format!(
                "  [{day_label}] Range {}~{}: V2G idle (SOC {arrival}% = target {target}%)",
                range.start, range.end,
            ));
        }

        soc = target;
    }

    let arbitrage = round2(total_revenue - total_charge_cost);
    steps.push(format!(
        "  [{day_label}] V2G daily summary: revenue={:.4} - charge cost={:.4} = arbitrage {arbitrage:.2}",
        total_revenue, total_charge_cost,
    ));

    let curve = assemble_curve(
        &v1g_fill.power_kw,
        &v1g_fill.energy_kwh,
        &v2g_charge_power,
        &v2g_charge_energy,
        &v2g_discharge_power,
        &v2g_discharge_energy,
        inputs.interval_minutes,
    );
    V2gDayOutcome { curve, arbitrage }
}

#[allow(clippy::too_many_arguments)]
fn assemble_curve(
    v1g_power: &[Decimal],
    v1g_energy: &[Decimal],
    v2g_charge_power: &[Decimal],
    v2g_charge_energy: &[Decimal],
    v2g_discharge_power: &[Decimal],
    v2g_discharge_energy: &[Decimal],
    interval_minutes: u32,
) -> Vec<SlotPoint> {
    (0..v1g_power.len())
        .map(|i| SlotPoint {
            time_slot: timegrid::time_of_slot(i, interval_minutes),
            charge_power_kw: v1g_power[i] + v2g_charge_power[i],
            discharge_power_kw: v2g_discharge_power[i],
            charge_energy_kwh: v1g_energy[i] + v2g_charge_energy[i],
            discharge_energy_kwh: v2g_discharge_energy[i],
        })
        .collect()
}
