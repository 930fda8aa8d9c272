pub mod curve;
pub mod fleet;
pub mod schedule;
pub mod station;
pub mod tariff;

pub use curve::*;
pub use fleet::*;
pub use schedule::*;
pub use station::*;
pub use tariff::*;

use rust_decimal::{Decimal, RoundingStrategy};

/// HALF_UP to 2 decimal places — the scale for power, energy and money.
pub(crate) fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// HALF_UP to 4 decimal places — the scale for prices and ratios.
pub(crate) fn round4(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}
