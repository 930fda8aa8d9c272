use serde::{Deserialize, Serialize};
use std::fmt;

/// A range with no explicit (or a zero) departure SOC charges to this.
pub const DEFAULT_MIN_SOC_PERCENT: u8 = 80;

/// Days of the week in the fixed Mon…Sun iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A window during which vehicles are plugged in, with the SOC they must
/// hold when leaving it. `start > end` wraps past midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    /// "HH:MM"
    pub start: String,
    /// "HH:MM", inclusive at slot granularity.
    pub end: String,
    /// Departure SOC target in percent; absent or zero means the default.
    #[serde(default)]
    pub min_soc: Option<u8>,
}

impl TimeRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>, min_soc: Option<u8>) -> Self {
        Self { start: start.into(), end: end.into(), min_soc }
    }

    pub fn effective_min_soc(&self) -> u8 {
        match self.min_soc {
            Some(soc) if soc > 0 => soc.min(100),
            _ => DEFAULT_MIN_SOC_PERCENT,
        }
    }
}

/// One weekday's operating plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    pub operating: bool,
    #[serde(default)]
    pub chargeable_ranges: Vec<TimeRange>,
}

/// Up to seven day plans, Monday first. Days beyond the stored length
/// are treated as non-operating.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub days: Vec<DaySchedule>,
}

impl WeeklySchedule {
    pub fn new(days: Vec<DaySchedule>) -> Self {
        Self { days }
    }

    pub fn day(&self, index: usize) -> Option<&DaySchedule> {
        self.days.get(index)
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Highest departure SOC configured across all operating days'
    /// ranges; the default when none carries an explicit value.
    pub fn effective_max_min_soc(&self) -> u8 {
        self.days
            .iter()
            .filter(|day| day.operating)
            .flat_map(|day| day.chargeable_ranges.iter())
            .filter_map(|range| range.min_soc.filter(|soc| *soc > 0))
            .max()
            .map(|soc| soc.min(100))
            .unwrap_or(DEFAULT_MIN_SOC_PERCENT)
    }
}
