//! Transformer selection and ESS standard-module sizing.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::{CalculationConfig, EssModel};
use crate::domain::{round2, Country};

/// Smallest standard transformer covering the required load, or the
/// largest available when nothing covers it. With no table configured
/// the requirement is rounded up to the next 100 kVA.
pub fn select_transformer(
    config: &CalculationConfig,
    required_kw: Decimal,
    country: Country,
) -> Decimal {
    let sizes = config.transformer_sizes(country);
    if sizes.is_empty() {
        return (required_kw / dec!(100)).ceil() * dec!(100);
    }
    for &size in sizes {
        if Decimal::from(size) >= required_kw {
            return Decimal::from(size);
        }
    }
    Decimal::from(*sizes.last().expect("non-empty table"))
}

/// ESS max power = load peak × empirical coefficient.
pub fn ess_max_power(config: &CalculationConfig, load_peak_kw: Decimal) -> Decimal {
    round2(load_peak_kw * config.empirical_coefficient)
}

/// ESS rated power after PV peak shaving, floored at zero.
pub fn ess_rated_power(ess_max_kw: Decimal, pv_peak_kw: Decimal) -> Decimal {
    let shaved = ess_max_kw - pv_peak_kw;
    if shaved < Decimal::ZERO {
        Decimal::ZERO
    } else {
        round2(shaved)
    }
}

/// A chosen standard module and how many of it to install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EssSelection {
    pub model_power_kw: u32,
    pub model_capacity_kwh: u32,
    pub units: u32,
}

impl EssSelection {
    pub fn total_power_kw(&self) -> Decimal {
        Decimal::from(self.model_power_kw * self.units)
    }

    pub fn total_capacity_kwh(&self) -> Decimal {
        Decimal::from(self.model_capacity_kwh * self.units)
    }
}

fn units_to_cover(required: Decimal, per_unit: u32) -> u32 {
    if required <= Decimal::ZERO {
        return 1;
    }
    (required / Decimal::from(per_unit))
        .ceil()
        .to_u32()
        .unwrap_or(u32::MAX)
}

/// Round the raw power/capacity requirement up to standard modules.
///
/// Every candidate model needs `max(ceil(P/P_m), ceil(C/C_m))` units
/// (at least one); the winner uses the fewest units, ties going to the
/// smaller total capacity. An empty table degrades to a single bespoke
/// unit at the ceiled raw values.
pub fn select_ess_model(
    config: &CalculationConfig,
    required_power_kw: Decimal,
    required_capacity_kwh: Decimal,
    country: Country,
) -> EssSelection {
    let models = config.ess_models(country);
    if models.is_empty() {
        return EssSelection {
            model_power_kw: required_power_kw.ceil().to_u32().unwrap_or(0),
            model_capacity_kwh: required_capacity_kwh.ceil().to_u32().unwrap_or(0),
            units: 1,
        };
    }

    let mut best: Option<(EssSelection, u32)> = None;
    for &EssModel { power_kw, capacity_kwh } in models {
        let units = units_to_cover(required_power_kw, power_kw)
            .max(units_to_cover(required_capacity_kwh, capacity_kwh));
        let total_capacity = units * capacity_kwh;
        let candidate = EssSelection { model_power_kw: power_kw, model_capacity_kwh: capacity_kwh, units };
        let better = match &best {
            None => true,
            Some((chosen, chosen_capacity)) => {
                units < chosen.units || (units == chosen.units && total_capacity < *chosen_capacity)
            }
        };
        if better {
            best = Some((candidate, total_capacity));
        }
    }
    best.expect("non-empty model table").0
}

/// Non-fatal warning when the ESS rated power exceeds the transformer.
pub fn transformer_warning(ess_rated_kw: Decimal, transformer_kva: Decimal) -> Option<String> {
    if ess_rated_kw > transformer_kva {
        let excess = round2(ess_rated_kw - transformer_kva);
        Some(format!(
            "ESS rated power ({ess_rated_kw:.2} kW) exceeds transformer capacity \
             ({transformer_kva:.2} kVA) by {excess:.2} kW; reduce the charging fleet \
             or specify a larger transformer"
        ))
    } else {
        None
    }
}
