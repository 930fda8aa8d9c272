//! Twenty-year economic projection of the ESS investment.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::CalculationConfig;
use crate::domain::{round2, round4, TouPeriod};

pub const PROJECTION_YEARS: u32 = 20;

/// Charge/discharge cadence of the ESS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChargeMode {
    /// One charge, one discharge per day; 2-hour sizing duration.
    One,
    /// Two charges, two discharges per day; 4-hour sizing duration.
    Two,
}

impl Default for ChargeMode {
    fn default() -> Self {
        Self::One
    }
}

impl ChargeMode {
    pub fn duration_hours(&self) -> Decimal {
        match self {
            Self::One => dec!(2),
            Self::Two => dec!(4),
        }
    }

    pub fn daily_cycles(&self) -> Decimal {
        match self {
            Self::One => Decimal::ONE,
            Self::Two => dec!(2),
        }
    }
}

/// One projected year, all money at 2 decimal places.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyEconomic {
    pub year: u32,
    pub arbitrage_revenue: Decimal,
    pub peak_shaving_revenue: Decimal,
    pub operating_cost: Decimal,
    pub net_profit: Decimal,
    pub cumulative_profit: Decimal,
}

/// Project years 1..=20.
///
/// Capacity decays exponentially (running product, full decimal
/// precision); O&M inflates linearly from the initial investment.
pub fn project_years(
    config: &CalculationConfig,
    capacity_kwh: Decimal,
    tous: &[TouPeriod],
    annual_decay_percent: Decimal,
    enable_peak_shaving: bool,
    peak_shaving_subsidy: Option<Decimal>,
    charge_mode: ChargeMode,
) -> Vec<YearlyEconomic> {
    let max_price = tous.iter().map(|p| p.price).max().unwrap_or(Decimal::ONE);
    let min_price = tous.iter().map(|p| p.price).min().unwrap_or(Decimal::ZERO);
    let price_spread = max_price - min_price;

    let daily_cycles = charge_mode.daily_cycles();
    let days_per_year = dec!(365);
    let initial_investment = capacity_kwh * config.ess_unit_cost_per_kwh;
    let decay_factor = Decimal::ONE - round4(annual_decay_percent / dec!(100));

    let mut decay_power = Decimal::ONE;
    let mut cumulative = Decimal::ZERO;
    let mut years = Vec::with_capacity(PROJECTION_YEARS as usize);

    for year in 1..=PROJECTION_YEARS {
        let effective_capacity = capacity_kwh * decay_power;

        let annual_arbitrage =
            round2(effective_capacity * price_spread * daily_cycles * days_per_year);

        let annual_peak_shaving = match peak_shaving_subsidy {
            Some(subsidy) if enable_peak_shaving => {
                round2(effective_capacity * subsidy * days_per_year)
            }
            _ => Decimal::ZERO,
        };

        let inflation =
            Decimal::ONE + config.maintenance_inflation_step * Decimal::from(year - 1);
        let annual_cost =
            round2(initial_investment * config.ess_annual_maintenance_ratio * inflation);

        let net_profit = round2(annual_arbitrage + annual_peak_shaving - annual_cost);
        cumulative = round2(cumulative + net_profit);

        years.push(YearlyEconomic {
            year,
            arbitrage_revenue: annual_arbitrage,
            peak_shaving_revenue: annual_peak_shaving,
            operating_cost: annual_cost,
            net_profit,
            cumulative_profit: cumulative,
        });

        decay_power *= decay_factor;
    }

    years
}
