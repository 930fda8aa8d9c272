use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CalcError;
use crate::timegrid;

/// TOU tariff period classes, most to least expensive by convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    Peak,
    High,
    Normal,
    Valley,
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Peak => "peak",
            Self::High => "high",
            Self::Normal => "normal",
            Self::Valley => "valley",
        };
        write!(f, "{s}")
    }
}

impl FromStr for PeriodType {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "peak" => Ok(Self::Peak),
            "high" => Ok(Self::High),
            "normal" => Ok(Self::Normal),
            "valley" => Ok(Self::Valley),
            other => Err(CalcError::InvalidInput(format!(
                "unknown TOU period type: {other:?}"
            ))),
        }
    }
}

/// Half-open window in minutes since midnight; `start >= end` wraps
/// past midnight. `end` may be 1440 ("24:00").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinuteRange {
    pub start_min: u32,
    pub end_min: u32,
}

impl MinuteRange {
    pub fn parse(start: &str, end: &str) -> Result<Self, CalcError> {
        Ok(Self {
            start_min: timegrid::minutes_of(start)?,
            end_min: timegrid::minutes_of(end)?,
        })
    }

    /// Non-wrapping ranges are `[start, end)`; wrapping ranges match
    /// `minute >= start OR minute < end`.
    pub fn contains(&self, minute: u32) -> bool {
        if self.start_min <= self.end_min {
            minute >= self.start_min && minute < self.end_min
        } else {
            minute >= self.start_min || minute < self.end_min
        }
    }
}

/// One tariff period: a price that applies over one or more clock ranges.
/// Periods are scanned in order; the first range match wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TouPeriod {
    pub period_type: PeriodType,
    pub ranges: Vec<MinuteRange>,
    /// Price per kWh (4 decimal places).
    pub price: Decimal,
}

impl TouPeriod {
    pub fn new(period_type: PeriodType, ranges: Vec<MinuteRange>, price: Decimal) -> Self {
        Self { period_type, ranges, price }
    }

    /// Convenience constructor from "HH:MM" pairs.
    pub fn from_clock_ranges(
        period_type: PeriodType,
        clock_ranges: &[(&str, &str)],
        price: Decimal,
    ) -> Result<Self, CalcError> {
        let ranges = clock_ranges
            .iter()
            .map(|(start, end)| MinuteRange::parse(start, end))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(period_type, ranges, price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_linear_range_is_half_open() {
        let range = MinuteRange::parse("18:00", "20:00").unwrap();
        assert!(range.contains(1080));
        assert!(range.contains(1199));
        assert!(!range.contains(1200));
        assert!(!range.contains(0));
    }

    #[test]
    fn test_wrapping_range() {
        let range = MinuteRange::parse("22:00", "06:00").unwrap();
        assert!(range.contains(1320));
        assert!(range.contains(0));
        assert!(range.contains(359));
        assert!(!range.contains(360));
        assert!(!range.contains(720));
    }

    #[test]
    fn test_end_of_day_marker() {
        let range = MinuteRange::parse("20:00", "24:00").unwrap();
        assert!(range.contains(1439));
        assert!(!range.contains(1080));
    }

    #[test]
    fn test_period_type_parse() {
        assert_eq!("Peak".parse::<PeriodType>().unwrap(), PeriodType::Peak);
        assert_eq!("valley".parse::<PeriodType>().unwrap(), PeriodType::Valley);
        assert!("weekend".parse::<PeriodType>().is_err());
    }

    #[test]
    fn test_from_clock_ranges() {
        let period =
            TouPeriod::from_clock_ranges(PeriodType::Peak, &[("18:00", "20:00")], dec!(1.2))
                .unwrap();
        assert_eq!(period.ranges.len(), 1);
        assert_eq!(period.price, dec!(1.2));
    }
}
