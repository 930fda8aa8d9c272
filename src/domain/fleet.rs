use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Counts of charging piles by power class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PileGroup {
    pub slow: u32,
    pub fast: u32,
    pub ultra_fast: u32,
}

impl PileGroup {
    pub fn new(slow: u32, fast: u32, ultra_fast: u32) -> Self {
        Self { slow, fast, ultra_fast }
    }

    pub fn total(&self) -> u32 {
        self.slow + self.fast + self.ultra_fast
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Piles of each class not equipped for V2G.
    pub fn minus(&self, other: &PileGroup) -> PileGroup {
        PileGroup {
            slow: self.slow.saturating_sub(other.slow),
            fast: self.fast.saturating_sub(other.fast),
            ultra_fast: self.ultra_fast.saturating_sub(other.ultra_fast),
        }
    }
}

/// The EV fleet served by the station, with its pile inventory.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_fleet"))]
pub struct FleetConfig {
    pub vehicle_count: u32,
    /// Battery capacity per vehicle (kWh).
    pub battery_kwh: Decimal,
    /// When false every slot of every day is chargeable.
    pub enable_time_control: bool,
    pub piles: PileGroup,
    /// V2G-capable subset of `piles`; each class count must not exceed
    /// the corresponding total.
    #[serde(default)]
    pub v2g_piles: PileGroup,
}

impl FleetConfig {
    pub fn total_v2g_piles(&self) -> u32 {
        self.v2g_piles.total()
    }

    pub fn v2g_enabled(&self) -> bool {
        self.total_v2g_piles() > 0
    }

    /// Pile inventory available to plain (unidirectional) charging.
    pub fn v1g_piles(&self) -> PileGroup {
        self.piles.minus(&self.v2g_piles)
    }
}

fn validate_fleet(fleet: &FleetConfig) -> Result<(), validator::ValidationError> {
    if fleet.battery_kwh < Decimal::ZERO {
        return Err(validator::ValidationError::new("battery_kwh must be >= 0"));
    }
    if fleet.v2g_piles.slow > fleet.piles.slow
        || fleet.v2g_piles.fast > fleet.piles.fast
        || fleet.v2g_piles.ultra_fast > fleet.piles.ultra_fast
    {
        return Err(validator::ValidationError::new(
            "v2g pile count exceeds total pile count for a power class",
        ));
    }
    Ok(())
}
