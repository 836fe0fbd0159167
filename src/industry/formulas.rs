//! Game formulas for material consumption, job time and installation fees.
//!
//! Every constant here is configuration so alternate rule sets can be tested.

use serde::{Deserialize, Serialize};

use super::types::{FacilityModifiers, Security};

/// When material efficiency rounding is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeRounding {
    /// Reduce the whole batch, then round up once
    #[default]
    PerBatch,
    /// Round up each run's reduced quantity, then multiply
    PerRun,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialRules {
    pub rounding: MeRounding,
}

/// Rig bonus multipliers by security band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityMultipliers {
    pub high: f64,
    pub low: f64,
    pub null: f64,
    pub wormhole: f64,
}

impl Default for SecurityMultipliers {
    fn default() -> Self {
        Self {
            high: 1.0,
            low: 1.9,
            null: 2.1,
            wormhole: 2.1,
        }
    }
}

impl SecurityMultipliers {
    pub fn for_security(&self, security: Security) -> f64 {
        match security {
            Security::High => self.high,
            Security::Low => self.low,
            Security::Null => self.null,
            Security::Wormhole => self.wormhole,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeRules {
    /// Flat surcharge on estimated item value
    pub scc_surcharge: f64,
}

impl Default for FeeRules {
    fn default() -> Self {
        Self {
            scc_surcharge: 0.04,
        }
    }
}

/// Multiplier applied to base material quantities
pub fn material_multiplier(
    material_efficiency: u8,
    modifiers: &FacilityModifiers,
    security: &SecurityMultipliers,
) -> f64 {
    let rig = modifiers.rig_material_bonus * security.for_security(modifiers.security);
    (1.0 - f64::from(material_efficiency) / 100.0)
        * (1.0 - modifiers.structure_material_bonus)
        * (1.0 - rig)
}

/// Multiplier applied to base job time
pub fn time_multiplier(
    time_efficiency: u8,
    modifiers: &FacilityModifiers,
    security: &SecurityMultipliers,
) -> f64 {
    let rig = modifiers.rig_time_bonus * security.for_security(modifiers.security);
    (1.0 - f64::from(time_efficiency) / 100.0)
        * (1.0 - modifiers.structure_time_bonus)
        * (1.0 - rig)
}

/// Total quantity of one material consumed by `runs` runs.
///
/// Never drops below one unit per run.
pub fn material_quantity(
    base_per_run: u64,
    runs: u64,
    multiplier: f64,
    rules: &MaterialRules,
) -> u64 {
    if runs == 0 || base_per_run == 0 {
        return 0;
    }
    let reduced = match rules.rounding {
        MeRounding::PerBatch => {
            let exact = round2(base_per_run as f64 * runs as f64 * multiplier);
            exact.ceil() as u64
        }
        MeRounding::PerRun => {
            let per_run = round2(base_per_run as f64 * multiplier).ceil() as u64;
            per_run.max(1) * runs
        }
    };
    reduced.max(runs)
}

/// Installation fee for a job with the given estimated item value
pub fn installation_fee(
    estimated_item_value: f64,
    cost_index: f64,
    modifiers: &FacilityModifiers,
    fees: &FeeRules,
) -> f64 {
    let rate =
        cost_index * (1.0 - modifiers.structure_cost_bonus) + modifiers.tax + fees.scc_surcharge;
    (estimated_item_value * rate).max(0.0)
}

/// Ceiling division for run counts
pub fn runs_for(quantity: u64, output_per_run: u64) -> u64 {
    if output_per_run == 0 {
        return 0;
    }
    quantity.div_ceil(output_per_run)
}

// Float noise like 89.99999999 must not round up to 91
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
