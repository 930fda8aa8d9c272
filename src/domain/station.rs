use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Market the station operates in. Standard transformer and ESS module
/// tables are looked up per country; unknown codes fall back to CN.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Country {
    Cn,
    Jp,
    Uk,
}

impl Country {
    pub fn parse_or_default(code: Option<&str>) -> Self {
        match code.map(|c| c.trim().to_uppercase()) {
            Some(ref c) if c == "JP" => Self::Jp,
            Some(ref c) if c == "UK" => Self::Uk,
            _ => Self::Cn,
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cn => "CN",
            Self::Jp => "JP",
            Self::Uk => "UK",
        };
        write!(f, "{s}")
    }
}

/// Site-level parameters of one charging station.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationConfig {
    /// PV installed capacity (kW, peak).
    pub pv_peak_power_kw: Decimal,
    /// User-specified transformer nameplate capacity (kVA).
    /// `None` (or a non-positive stored value) means auto-select.
    #[serde(default)]
    pub transformer_kva: Option<Decimal>,
    pub country: Country,
}

impl StationConfig {
    /// A user-specified transformer only counts when it is positive.
    pub fn specified_transformer(&self) -> Option<Decimal> {
        self.transformer_kva.filter(|kva| *kva > Decimal::ZERO)
    }
}
