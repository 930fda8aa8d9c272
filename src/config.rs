use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

use crate::domain::Country;

/// One standard ESS module: rated power and usable capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EssModel {
    pub power_kw: u32,
    pub capacity_kwh: u32,
}

impl EssModel {
    pub const fn new(power_kw: u32, capacity_kwh: u32) -> Self {
        Self { power_kw, capacity_kwh }
    }
}

/// Process-wide calculation constants and standard-module tables.
///
/// Immutable after loading; injected by value into the engine. Every
/// field has a default so an empty config file is valid.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "snake_case")]
#[validate(schema(function = "validate_calculation_config"))]
pub struct CalculationConfig {
    /// ESS max power = load peak × this coefficient.
    pub empirical_coefficient: Decimal,

    /// Width of one load-curve slot in minutes. Must divide a day evenly.
    pub time_slot_interval_minutes: u32,

    /// Fallback per-vehicle charging power when no piles are configured.
    pub default_pile_power_kw: Decimal,

    pub slow_pile_power_kw: Decimal,
    pub fast_pile_power_kw: Decimal,
    pub ultra_fast_pile_power_kw: Decimal,

    /// V2G discharge rated power = charge power × this ratio.
    pub v2g_discharge_derate: Decimal,

    /// ESS procurement cost per kWh (for the economic projection).
    pub ess_unit_cost_per_kwh: Decimal,

    /// Annual O&M cost as a fraction of the initial investment.
    pub ess_annual_maintenance_ratio: Decimal,

    /// Linear O&M escalation per elapsed year.
    pub maintenance_inflation_step: Decimal,

    /// Suggested piles per vehicle: fast, slow, ultra-fast ratios.
    pub pile_suggestion_ratios: [Decimal; 3],

    /// Standard transformer nameplate sizes per country (kVA, ascending).
    pub standard_transformer_kva: BTreeMap<Country, Vec<u32>>,

    /// Standard ESS modules per country.
    pub standard_ess_models: BTreeMap<Country, Vec<EssModel>>,
}

impl Default for CalculationConfig {
    fn default() -> Self {
        Self {
            empirical_coefficient: default_empirical_coefficient(),
            time_slot_interval_minutes: default_time_slot_interval_minutes(),
            default_pile_power_kw: default_default_pile_power_kw(),
            slow_pile_power_kw: default_slow_pile_power_kw(),
            fast_pile_power_kw: default_fast_pile_power_kw(),
            ultra_fast_pile_power_kw: default_ultra_fast_pile_power_kw(),
            v2g_discharge_derate: default_v2g_discharge_derate(),
            ess_unit_cost_per_kwh: default_ess_unit_cost_per_kwh(),
            ess_annual_maintenance_ratio: default_ess_annual_maintenance_ratio(),
            maintenance_inflation_step: default_maintenance_inflation_step(),
            pile_suggestion_ratios: default_pile_suggestion_ratios(),
            standard_transformer_kva: default_transformer_tables(),
            standard_ess_models: default_ess_tables(),
        }
    }
}

// Default value functions
fn default_empirical_coefficient() -> Decimal { dec!(0.8) }
fn default_time_slot_interval_minutes() -> u32 { 15 }
fn default_default_pile_power_kw() -> Decimal { dec!(7) }
fn default_slow_pile_power_kw() -> Decimal { dec!(7) }
fn default_fast_pile_power_kw() -> Decimal { dec!(120) }
fn default_ultra_fast_pile_power_kw() -> Decimal { dec!(350) }
fn default_v2g_discharge_derate() -> Decimal { dec!(0.85) }
fn default_ess_unit_cost_per_kwh() -> Decimal { dec!(1500) }
fn default_ess_annual_maintenance_ratio() -> Decimal { dec!(0.02) }
fn default_maintenance_inflation_step() -> Decimal { dec!(0.02) }
fn default_pile_suggestion_ratios() -> [Decimal; 3] { [dec!(0.5), dec!(0.4), dec!(0.1)] }

fn default_transformer_tables() -> BTreeMap<Country, Vec<u32>> {
    BTreeMap::from([
        (
            Country::Cn,
            vec![
                30, 50, 80, 100, 125, 160, 200, 250, 315, 400, 500, 630, 800, 1000, 1250,
                1600, 2000, 2500, 3150,
            ],
        ),
        (
            Country::Jp,
            vec![30, 50, 75, 100, 150, 200, 300, 500, 750, 1000, 1500, 2000, 3000],
        ),
        (
            Country::Uk,
            vec![25, 50, 100, 200, 315, 500, 800, 1000, 1500, 2000, 2500],
        ),
    ])
}

fn default_ess_tables() -> BTreeMap<Country, Vec<EssModel>> {
    let standard = vec![EssModel::new(100, 215), EssModel::new(125, 261)];
    BTreeMap::from([
        (Country::Cn, standard.clone()),
        (Country::Jp, standard.clone()),
        (Country::Uk, standard),
    ])
}

fn validate_calculation_config(
    config: &CalculationConfig,
) -> Result<(), validator::ValidationError> {
    if config.time_slot_interval_minutes == 0
        || (24 * 60) % config.time_slot_interval_minutes != 0
    {
        return Err(validator::ValidationError::new(
            "time_slot_interval_minutes must divide 1440",
        ));
    }
    if config.empirical_coefficient <= Decimal::ZERO {
        return Err(validator::ValidationError::new(
            "empirical_coefficient must be positive",
        ));
    }
    if config.v2g_discharge_derate <= Decimal::ZERO || config.v2g_discharge_derate > Decimal::ONE
    {
        return Err(validator::ValidationError::new(
            "v2g_discharge_derate must be in (0, 1]",
        ));
    }
    let ratio_sum: Decimal = config.pile_suggestion_ratios.iter().copied().sum();
    if ratio_sum < Decimal::ONE {
        return Err(validator::ValidationError::new(
            "pile_suggestion_ratios must sum to at least 1",
        ));
    }
    Ok(())
}

impl CalculationConfig {
    /// Load from `config/calculation.toml` overridden by `ESS_SIZER__`
    /// environment variables (`ESS_SIZER__EMPIRICAL_COEFFICIENT=0.75`).
    pub fn load() -> Result<Self> {
        let config: CalculationConfig = Figment::new()
            .merge(Toml::file("config/calculation.toml"))
            .merge(Env::prefixed("ESS_SIZER__").split("__"))
            .extract()
            .context("failed to parse calculation configuration")?;
        config
            .validate()
            .context("calculation configuration validation failed")?;
        Ok(config)
    }

    /// Duration of one slot in hours, at price scale (4 dp).
    pub fn interval_hours(&self) -> Decimal {
        crate::domain::round4(
            Decimal::from(self.time_slot_interval_minutes) / dec!(60),
        )
    }

    pub fn slots_per_day(&self) -> usize {
        crate::timegrid::slots_per_day(self.time_slot_interval_minutes)
    }

    /// Country's transformer table, falling back to CN for unknown or
    /// unconfigured countries.
    pub fn transformer_sizes(&self, country: Country) -> &[u32] {
        self.standard_transformer_kva
            .get(&country)
            .or_else(|| self.standard_transformer_kva.get(&Country::Cn))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Country's ESS module table, falling back to CN.
    pub fn ess_models(&self, country: Country) -> &[EssModel] {
        self.standard_ess_models
            .get(&country)
            .or_else(|| self.standard_ess_models.get(&Country::Cn))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CalculationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.slots_per_day(), 96);
        assert_eq!(config.interval_hours(), dec!(0.2500));
    }

    #[test]
    fn test_interval_must_divide_day() {
        let config = CalculationConfig {
            time_slot_interval_minutes: 7,
            ..CalculationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_suggestion_ratios_must_cover_fleet() {
        let config = CalculationConfig {
            pile_suggestion_ratios: [dec!(0.2), dec!(0.2), dec!(0.1)],
            ..CalculationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_country_table_fallback() {
        let config = CalculationConfig::default();
        assert_eq!(config.transformer_sizes(Country::Jp).first(), Some(&30));
        assert_eq!(config.transformer_sizes(Country::Uk).last(), Some(&2500));
        assert_eq!(config.ess_models(Country::Jp).len(), 2);
    }

    #[test]
    fn test_derate_bounds() {
        let config = CalculationConfig {
            v2g_discharge_derate: dec!(1.2),
            ..CalculationConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
