//! Unidirectional (V1G) day scheduling: greedy cheapest-first fill.

use rust_decimal::Decimal;
use std::collections::BTreeSet;

use crate::domain::{round2, SlotPoint};
use crate::timegrid;

/// Per-slot rated power and delivered energy for one day's charging.
#[derive(Debug, Clone)]
pub struct GreedyFill {
    pub power_kw: Vec<Decimal>,
    pub energy_kwh: Vec<Decimal>,
}

impl GreedyFill {
    fn zeros(slots: usize) -> Self {
        Self {
            power_kw: vec![Decimal::ZERO; slots],
            energy_kwh: vec![Decimal::ZERO; slots],
        }
    }
}

/// Dispatch `demand_kwh` across the chargeable slots, cheapest first.
///
/// Ties on price resolve to the lower slot index (stable sort over the
/// index-ordered candidates), so repeated runs fill identical slots.
/// Filled slots carry the rated pile power even when the last one takes
/// only a partial energy assignment.
pub fn greedy_fill(
    chargeable: &BTreeSet<usize>,
    prices: &[Decimal],
    demand_kwh: Decimal,
    max_energy_per_slot_kwh: Decimal,
    interval_hours: Decimal,
) -> GreedyFill {
    let mut fill = GreedyFill::zeros(prices.len());

    let rated_power = if max_energy_per_slot_kwh > Decimal::ZERO {
        round2(max_energy_per_slot_kwh / interval_hours)
    } else {
        Decimal::ZERO
    };

    let mut candidates: Vec<(usize, Decimal)> = chargeable
        .iter()
        .filter(|&&i| i < prices.len())
        .map(|&i| (i, prices[i]))
        .collect();
    candidates.sort_by(|a, b| a.1.cmp(&b.1));

    let mut remaining = demand_kwh;
    for (index, _) in candidates {
        if remaining <= Decimal::ZERO {
            break;
        }
        let energy = remaining.min(max_energy_per_slot_kwh);
        fill.power_kw[index] = rated_power;
        fill.energy_kwh[index] = energy;
        remaining -= energy;
    }
    fill
}

/// A complete V1G day curve (no discharge).
pub fn day_curve(
    chargeable: &BTreeSet<usize>,
    prices: &[Decimal],
    demand_kwh: Decimal,
    max_energy_per_slot_kwh: Decimal,
    interval_hours: Decimal,
    interval_minutes: u32,
) -> Vec<SlotPoint> {
    let fill = greedy_fill(chargeable, prices, demand_kwh, max_energy_per_slot_kwh, interval_hours);
    fill.power_kw
        .iter()
        .zip(fill.energy_kwh.iter())
        .enumerate()
        .map(|(i, (power, energy))| SlotPoint {
            time_slot: timegrid::time_of_slot(i, interval_minutes),
            charge_power_kw: *power,
            discharge_power_kw: Decimal::ZERO,
            charge_energy_kwh: *energy,
            discharge_energy_kwh: Decimal::ZERO,
        })
        .collect()
}
