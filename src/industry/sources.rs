//! Collaborator contracts consumed by the planner, plus in-memory versions.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::types::{Activity, LocationId, TypeId};

/// One input line of a blueprint activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueprintMaterial {
    pub type_id: TypeId,
    pub quantity: u64,
}

/// A blueprint's definition for one activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    pub blueprint_id: TypeId,
    pub activity: Activity,
    pub product_type_id: TypeId,
    pub output_per_run: u64,
    pub base_time_secs: u64,
    #[serde(default)]
    pub max_runs_per_job: Option<u64>,
    pub materials: Vec<BlueprintMaterial>,
}

/// Static blueprint and type data
pub trait BlueprintResolver {
    /// Blueprint definition for `(blueprint, activity)`
    fn blueprint(&self, blueprint_id: TypeId, activity: Activity) -> Result<Option<Blueprint>>;

    /// Any blueprint that outputs `product_type_id`
    fn blueprint_for_product(&self, product_type_id: TypeId) -> Result<Option<Blueprint>>;

    /// Packaged volume of one unit, in m3 (zero when unknown)
    fn type_volume(&self, type_id: TypeId) -> Result<f64>;
}

/// Facility cost index per location and activity
pub trait CostIndexSource {
    /// Zero when the location has no index for the activity
    fn cost_index(&self, location_id: LocationId, activity: Activity) -> Result<f64>;
}

impl CostIndexSource for HashMap<(LocationId, Activity), f64> {
    fn cost_index(&self, location_id: LocationId, activity: Activity) -> Result<f64> {
        Ok(self.get(&(location_id, activity)).copied().unwrap_or(0.0))
    }
}

/// Which market figure values bought materials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceBasis {
    Buy,
    #[default]
    Sell,
    Adjusted,
}

/// Best buy and sell orders; a side with no orders is `None`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketPrice {
    pub buy: Option<f64>,
    pub sell: Option<f64>,
}

/// Snapshot of market and adjusted prices
#[derive(Debug, Clone, Default)]
pub struct PriceSnapshot {
    pub market: HashMap<TypeId, MarketPrice>,
    pub adjusted: HashMap<TypeId, f64>,
}

impl PriceSnapshot {
    /// Unit price under `basis`, if the type is priced at all
    pub fn unit_price(&self, type_id: TypeId, basis: PriceBasis) -> Option<f64> {
        match basis {
            PriceBasis::Buy => self.market.get(&type_id).and_then(|p| p.buy),
            PriceBasis::Sell => self.market.get(&type_id).and_then(|p| p.sell),
            PriceBasis::Adjusted => self.adjusted.get(&type_id).copied(),
        }
    }

    /// Adjusted price used for fee estimation, zero when absent
    pub fn adjusted_price(&self, type_id: TypeId) -> f64 {
        self.adjusted.get(&type_id).copied().unwrap_or(0.0)
    }
}

/// Blueprint data held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryBlueprints {
    blueprints: HashMap<(TypeId, Activity), Blueprint>,
    volumes: HashMap<TypeId, f64>,
}

impl InMemoryBlueprints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, blueprint: Blueprint) {
        self.blueprints
            .insert((blueprint.blueprint_id, blueprint.activity), blueprint);
    }

    pub fn set_volume(&mut self, type_id: TypeId, volume: f64) {
        self.volumes.insert(type_id, volume);
    }
}

impl BlueprintResolver for InMemoryBlueprints {
    fn blueprint(&self, blueprint_id: TypeId, activity: Activity) -> Result<Option<Blueprint>> {
        Ok(self.blueprints.get(&(blueprint_id, activity)).cloned())
    }

    fn blueprint_for_product(&self, product_type_id: TypeId) -> Result<Option<Blueprint>> {
        // Lowest blueprint id wins so lookups are stable
        Ok(self
            .blueprints
            .values()
            .filter(|b| b.product_type_id == product_type_id)
            .min_by_key(|b| (b.blueprint_id, b.activity))
            .cloned())
    }

    fn type_volume(&self, type_id: TypeId) -> Result<f64> {
        Ok(self.volumes.get(&type_id).copied().unwrap_or(0.0))
    }
}
