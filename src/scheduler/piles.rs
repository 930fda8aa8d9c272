//! Pile selection: how much power the station can draw at once.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::config::CalculationConfig;
use crate::domain::{round2, PileGroup};

/// Total simultaneous charging power for a pile inventory, capped by the
/// vehicle count.
///
/// More piles than vehicles means only `vehicle_count` piles can be
/// energized at once; vehicles are assigned to the highest-power piles
/// first since that is the peak the transformer must serve. With no
/// piles configured at all, the fallback per-vehicle power applies.
pub fn total_charging_power(
    config: &CalculationConfig,
    piles: &PileGroup,
    vehicle_count: u32,
) -> Decimal {
    if piles.is_empty() {
        return config.default_pile_power_kw;
    }

    let mut powers: Vec<Decimal> = Vec::with_capacity(piles.total() as usize);
    powers.extend(
        std::iter::repeat(config.ultra_fast_pile_power_kw).take(piles.ultra_fast as usize),
    );
    powers.extend(std::iter::repeat(config.fast_pile_power_kw).take(piles.fast as usize));
    powers.extend(std::iter::repeat(config.slow_pile_power_kw).take(piles.slow as usize));
    powers.sort_by(|a, b| b.cmp(a));

    let active = (vehicle_count as usize).min(powers.len());
    powers[..active].iter().copied().sum()
}

/// Rated V2G discharge power: the V2G piles' charge power derated by the
/// configured (or caller-supplied) ratio.
pub fn v2g_discharge_power(
    config: &CalculationConfig,
    v2g_piles: &PileGroup,
    vehicle_count: u32,
    derate: Option<Decimal>,
) -> Decimal {
    let charge_power = total_charging_power(config, v2g_piles, vehicle_count);
    let factor = derate.unwrap_or(config.v2g_discharge_derate);
    round2(charge_power * factor)
}

/// Suggested pile counts for a fleet size, from the configured
/// fast/slow/ultra ratios (each rounded up).
pub fn suggest_piles(config: &CalculationConfig, vehicle_count: u32) -> PileGroup {
    let ceil_of = |ratio: Decimal| -> u32 {
        (Decimal::from(vehicle_count) * ratio)
            .ceil()
            .to_u32()
            .unwrap_or(0)
    };
    let [fast, slow, ultra] = config.pile_suggestion_ratios;
    PileGroup {
        fast: ceil_of(fast),
        slow: ceil_of(slow),
        ultra_fast: ceil_of(ultra),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_top_piles_win() {
        let config = CalculationConfig::default();
        // 8 vehicles over 1x350 + 2x120 + 6x7 piles
        let piles = PileGroup::new(6, 2, 1);
        let total = total_charging_power(&config, &piles, 8);
        assert_eq!(total, dec!(625));
    }

    #[test]
    fn test_more_vehicles_than_piles() {
        let config = CalculationConfig::default();
        let piles = PileGroup::new(2, 1, 0);
        assert_eq!(total_charging_power(&config, &piles, 10), dec!(134));
    }

    #[test]
    fn test_no_piles_falls_back() {
        let config = CalculationConfig::default();
        assert_eq!(
            total_charging_power(&config, &PileGroup::default(), 5),
            dec!(7)
        );
    }

    #[test]
    fn test_zero_vehicles_zero_power() {
        let config = CalculationConfig::default();
        let piles = PileGroup::new(2, 1, 0);
        assert_eq!(total_charging_power(&config, &piles, 0), Decimal::ZERO);
    }

    #[test]
    fn test_discharge_power_applies_derate() {
        let config = CalculationConfig::default();
        let v2g = PileGroup::new(0, 1, 0);
        assert_eq!(v2g_discharge_power(&config, &v2g, 1, None), dec!(102.00));
        assert_eq!(
            v2g_discharge_power(&config, &v2g, 1, Some(dec!(0.5))),
            dec!(60.00)
        );
    }

    #[test]
    fn test_suggestion_rounds_up() {
        let config = CalculationConfig::default();
        let suggested = suggest_piles(&config, 7);
        assert_eq!(suggested.fast, 4); // ceil(7 * 0.5)
        assert_eq!(suggested.slow, 3); // ceil(7 * 0.4)
        assert_eq!(suggested.ultra_fast, 1); // ceil(7 * 0.1)
    }
}
