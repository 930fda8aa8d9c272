use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::round2;
use crate::timegrid;

/// One 15-minute sample of the station load.
///
/// Power fields carry the *rated* instantaneous power while the slot is
/// active; energy fields carry the *actual* integrated kWh. In a
/// partially-filled slot the charger still reports rated power (it runs
/// at full power for a fraction of the interval) while the energy field
/// holds the true amount. Discharge values are negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotPoint {
    /// "HH:MM" label of the slot start.
    pub time_slot: String,
    pub charge_power_kw: Decimal,
    pub discharge_power_kw: Decimal,
    pub charge_energy_kwh: Decimal,
    pub discharge_energy_kwh: Decimal,
}

impl SlotPoint {
    pub fn zero(time_slot: String) -> Self {
        Self {
            time_slot,
            charge_power_kw: Decimal::ZERO,
            discharge_power_kw: Decimal::ZERO,
            charge_energy_kwh: Decimal::ZERO,
            discharge_energy_kwh: Decimal::ZERO,
        }
    }
}

/// A flat (all-zero) day curve.
pub fn zero_curve(interval_minutes: u32) -> Vec<SlotPoint> {
    (0..timegrid::slots_per_day(interval_minutes))
        .map(|i| SlotPoint::zero(timegrid::time_of_slot(i, interval_minutes)))
        .collect()
}

/// Slot-wise worst case across day curves: maximum charge power and the
/// most negative discharge power per slot.
pub fn max_envelope(days: &[&[SlotPoint]], interval_minutes: u32) -> Vec<SlotPoint> {
    let slots = timegrid::slots_per_day(interval_minutes);
    (0..slots)
        .map(|i| {
            let mut point = SlotPoint::zero(timegrid::time_of_slot(i, interval_minutes));
            for day in days {
                if let Some(p) = day.get(i) {
                    if p.charge_power_kw > point.charge_power_kw {
                        point.charge_power_kw = p.charge_power_kw;
                    }
                    if p.discharge_power_kw < point.discharge_power_kw {
                        point.discharge_power_kw = p.discharge_power_kw;
                    }
                }
            }
            point
        })
        .collect()
}

/// Highest charge power across the curve.
pub fn peak_charge_power(curve: &[SlotPoint]) -> Decimal {
    curve
        .iter()
        .map(|p| p.charge_power_kw)
        .max()
        .unwrap_or(Decimal::ZERO)
}

/// Total charged energy over a day. Slots with a recorded energy use it
/// directly; otherwise the rated power integrated over the interval.
pub fn daily_energy(curve: &[SlotPoint], interval_hours: Decimal) -> Decimal {
    let total = curve.iter().fold(Decimal::ZERO, |acc, point| {
        if point.charge_energy_kwh > Decimal::ZERO {
            acc + point.charge_energy_kwh
        } else {
            acc + point.charge_power_kw * interval_hours
        }
    });
    round2(total)
}

/// Total discharged energy over a day, as a positive magnitude.
pub fn daily_discharge_energy(curve: &[SlotPoint], interval_hours: Decimal) -> Decimal {
    let total = curve.iter().fold(Decimal::ZERO, |acc, point| {
        if point.discharge_energy_kwh < Decimal::ZERO {
            acc + point.discharge_energy_kwh.abs()
        } else {
            acc + point.discharge_power_kw.abs() * interval_hours
        }
    });
    round2(total)
}
