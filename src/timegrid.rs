//! Day grid arithmetic and TOU price resolution.
//!
//! A day is partitioned into fixed-width slots (96 slots of 15 minutes by
//! default). Clock strings are "HH:MM"; "24:00" is accepted as the
//! end-of-day marker because published tariffs use it.

use chrono::{NaiveTime, Timelike};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeSet;

use crate::domain::{round4, TouPeriod};
use crate::error::CalcError;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Price returned when the tariff list itself is empty. Not expected in
/// well-formed input; kept for parity with the upstream behavior.
pub const EMPTY_TARIFF_PRICE: Decimal = dec!(0.5);

/// Number of slots in one day for the given interval.
pub fn slots_per_day(interval_minutes: u32) -> usize {
    (MINUTES_PER_DAY / interval_minutes) as usize
}

/// Parse "HH:MM" into minutes since midnight. Rejects anything the grid
/// cannot place instead of silently defaulting.
pub fn minutes_of(hhmm: &str) -> Result<u32, CalcError> {
    let trimmed = hhmm.trim();
    if trimmed == "24:00" {
        return Ok(MINUTES_PER_DAY);
    }
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .map(|t| t.hour() * 60 + t.minute())
        .map_err(|_| CalcError::MalformedTime(hhmm.to_string()))
}

/// Slot index containing the given clock time.
pub fn slot_of(hhmm: &str, interval_minutes: u32) -> Result<usize, CalcError> {
    Ok((minutes_of(hhmm)? / interval_minutes) as usize)
}

/// Zero-padded "HH:MM" label of a slot.
pub fn time_of_slot(index: usize, interval_minutes: u32) -> String {
    let total = index as u32 * interval_minutes;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Add every slot of `[from, to]` (end-inclusive) to the set, wrapping
/// past midnight when `from > to`. Out-of-grid indices are dropped.
pub fn expand_slot_range(slots: &mut BTreeSet<usize>, from: usize, to: usize, total: usize) {
    if from <= to {
        for i in from..=to.min(total.saturating_sub(1)) {
            slots.insert(i);
        }
    } else {
        for i in from..total {
            slots.insert(i);
        }
        for i in 0..=to.min(total.saturating_sub(1)) {
            slots.insert(i);
        }
    }
}

/// Resolve the tariff price at a minute of the day.
///
/// Periods are scanned in order and the first containing range wins.
/// When nothing matches, the arithmetic mean of all period prices is
/// used; an empty tariff yields [`EMPTY_TARIFF_PRICE`].
pub fn price_at(minute: u32, tous: &[TouPeriod]) -> Decimal {
    for period in tous {
        if period.ranges.iter().any(|range| range.contains(minute)) {
            return period.price;
        }
    }
    mean_price(tous)
}

fn mean_price(tous: &[TouPeriod]) -> Decimal {
    if tous.is_empty() {
        return EMPTY_TARIFF_PRICE;
    }
    let sum: Decimal = tous.iter().map(|p| p.price).sum();
    round4(sum / Decimal::from(tous.len() as u64))
}

/// Per-slot price table for one day.
pub fn slot_prices(tous: &[TouPeriod], interval_minutes: u32) -> Vec<Decimal> {
    (0..slots_per_day(interval_minutes))
        .map(|i| price_at(i as u32 * interval_minutes, tous))
        .collect()
}

/// Count of slots no tariff period covers (the mean-price fallback would
/// apply there). Used to flag incomplete tariffs in the trace.
pub fn uncovered_slots(tous: &[TouPeriod], interval_minutes: u32) -> usize {
    (0..slots_per_day(interval_minutes))
        .filter(|i| {
            let minute = *i as u32 * interval_minutes;
            !tous
                .iter()
                .any(|p| p.ranges.iter().any(|r| r.contains(minute)))
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MinuteRange, PeriodType};

    fn period(ranges: &[(&str, &str)], price: Decimal) -> TouPeriod {
        TouPeriod::new(
            PeriodType::Normal,
            ranges
                .iter()
                .map(|(s, e)| MinuteRange::parse(s, e).unwrap())
                .collect(),
            price,
        )
    }

    #[test]
    fn test_minutes_of() {
        assert_eq!(minutes_of("00:00").unwrap(), 0);
        assert_eq!(minutes_of("08:15").unwrap(), 495);
        assert_eq!(minutes_of("23:45").unwrap(), 1425);
        assert_eq!(minutes_of("24:00").unwrap(), 1440);
    }

    #[test]
    fn test_minutes_of_rejects_malformed() {
        for bad in ["", "8", "25:00", "12:61", "ab:cd", "12.30"] {
            assert!(minutes_of(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_slot_round_trip() {
        assert_eq!(slot_of("00:00", 15).unwrap(), 0);
        assert_eq!(slot_of("23:45", 15).unwrap(), 95);
        assert_eq!(time_of_slot(0, 15), "00:00");
        assert_eq!(time_of_slot(95, 15), "23:45");
        assert_eq!(time_of_slot(33, 15), "08:15");
    }

    #[test]
    fn test_expand_linear_range_inclusive() {
        let mut slots = BTreeSet::new();
        expand_slot_range(&mut slots, 32, 40, 96);
        assert_eq!(slots.len(), 9);
        assert!(slots.contains(&32) && slots.contains(&40));
    }

    #[test]
    fn test_expand_wrapping_range() {
        let mut slots = BTreeSet::new();
        expand_slot_range(&mut slots, 92, 3, 96);
        let expected: BTreeSet<usize> = (92..96).chain(0..=3).collect();
        assert_eq!(slots, expected);
    }

    #[test]
    fn test_expand_clamps_out_of_grid() {
        let mut slots = BTreeSet::new();
        // end slot from "24:00" lands at index 96 and must be dropped
        expand_slot_range(&mut slots, 90, 96, 96);
        assert_eq!(slots.iter().copied().max(), Some(95));
    }

    #[test]
    fn test_price_first_match_wins() {
        let tous = vec![
            period(&[("08:00", "12:00")], dec!(1.0)),
            period(&[("08:00", "24:00")], dec!(0.4)),
        ];
        assert_eq!(price_at(9 * 60, &tous), dec!(1.0));
        assert_eq!(price_at(13 * 60, &tous), dec!(0.4));
    }

    #[test]
    fn test_price_mean_fallback_and_sentinel() {
        let tous = vec![
            period(&[("00:00", "06:00")], dec!(0.3)),
            period(&[("06:00", "12:00")], dec!(0.6)),
        ];
        // 18:00 is uncovered -> mean of 0.3 and 0.6
        assert_eq!(price_at(18 * 60, &tous), dec!(0.4500));
        assert_eq!(price_at(0, &[]), EMPTY_TARIFF_PRICE);
    }

    #[test]
    fn test_uncovered_slots() {
        let tous = vec![period(&[("00:00", "12:00")], dec!(0.3))];
        assert_eq!(uncovered_slots(&tous, 15), 48);
        let full = vec![period(&[("00:00", "24:00")], dec!(0.3))];
        assert_eq!(uncovered_slots(&full, 15), 0);
    }
}
