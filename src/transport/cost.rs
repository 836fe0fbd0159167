//! Pure cost functions for the three ways cargo can move.

use serde::{Deserialize, Serialize};

use super::route::JfRoute;

/// Jump Fuel Conservation rule: fuel use drops by a fixed share per level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuelRules {
    pub reduction_per_level: f64,
}

impl Default for FuelRules {
    fn default() -> Self {
        Self {
            reduction_per_level: 0.10,
        }
    }
}

impl FuelRules {
    /// Multiplier on base fuel use at a trained level (clamped to 0..=5)
    pub fn conservation_factor(&self, level: u8) -> f64 {
        (1.0 - self.reduction_per_level * f64::from(level.min(5))).max(0.0)
    }
}

/// Fuel parameters of one jump-freighter trip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpFuel {
    pub fuel_per_ly: f64,
    pub conservation_factor: f64,
    pub isotope_price: f64,
}

/// `volume × rate × jumps + collateral × collateral_rate`
pub fn gate_transport_cost(
    volume: f64,
    collateral: f64,
    jumps: u32,
    rate_per_m3_per_jump: f64,
    collateral_rate: f64,
) -> f64 {
    positive(volume) * rate_per_m3_per_jump * f64::from(jumps)
        + positive(collateral) * collateral_rate
}

/// Fuel for the whole route plus the collateral premium
pub fn jump_freighter_cost(
    route: &JfRoute,
    fuel: &JumpFuel,
    collateral: f64,
    collateral_rate: f64,
) -> f64 {
    jump_fuel_cost(route.total_distance_ly(), fuel) + positive(collateral) * collateral_rate
}

/// Isotope spend for `distance_ly` light years
pub fn jump_fuel_cost(distance_ly: f64, fuel: &JumpFuel) -> f64 {
    positive(distance_ly) * fuel.fuel_per_ly * fuel.conservation_factor * fuel.isotope_price
}

/// `volume × rate + collateral × collateral_rate`
pub fn courier_cost(volume: f64, collateral: f64, rate_per_m3: f64, collateral_rate: f64) -> f64 {
    positive(volume) * rate_per_m3 + positive(collateral) * collateral_rate
}

fn positive(value: f64) -> f64 {
    if value > 0.0 {
        value
    } else {
        0.0
    }
}
