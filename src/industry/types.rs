use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inventory type id (products, materials, blueprints, skills)
pub type TypeId = i64;
/// Production step id, unique within a plan
pub type StepId = i64;
/// Station, structure or solar system id
pub type LocationId = i64;

/// Production mode; each has its own skill and slot pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Manufacturing,
    Reaction,
}

impl Activity {
    /// Activity name as stored in the SDE `blueprint_*` tables
    pub fn sde_name(self) -> &'static str {
        match self {
            Activity::Manufacturing => "manufacturing",
            Activity::Reaction => "reaction",
        }
    }
}

impl std::fmt::Display for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.sde_name())
    }
}

/// Space security band of a facility, used to scale rig bonuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Security {
    #[default]
    High,
    Low,
    Null,
    Wormhole,
}

/// Facility bonuses and rates applied to a step.
///
/// Bonuses are fractions (`0.01` = 1%). `tax` is the facility owner's rate
/// charged on the estimated item value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FacilityModifiers {
    pub structure_material_bonus: f64,
    pub structure_time_bonus: f64,
    pub structure_cost_bonus: f64,
    pub rig_material_bonus: f64,
    pub rig_time_bonus: f64,
    pub security: Security,
    pub tax: f64,
}

impl FacilityModifiers {
    /// Hashable fingerprint of the modifiers, in hundredths of a basis point
    pub fn signature(&self) -> ModifierSignature {
        fn fixed(v: f64) -> i64 {
            (v * 1_000_000.0).round() as i64
        }
        ModifierSignature([
            fixed(self.structure_material_bonus),
            fixed(self.structure_time_bonus),
            fixed(self.structure_cost_bonus),
            fixed(self.rig_material_bonus),
            fixed(self.rig_time_bonus),
            self.security as i64,
            fixed(self.tax),
        ])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ModifierSignature([i64; 7]);

/// Plan-wide defaults inherited by steps that leave fields unset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanDefaults {
    pub modifiers: FacilityModifiers,
    pub location_id: Option<LocationId>,
}

/// One node of a production plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    pub plan_id: i64,
    /// `None` marks the root step
    #[serde(default)]
    pub parent_id: Option<StepId>,
    pub product_type_id: TypeId,
    pub blueprint_id: TypeId,
    pub activity: Activity,
    #[serde(default)]
    pub material_efficiency: u8,
    #[serde(default)]
    pub time_efficiency: u8,
    #[serde(default)]
    pub modifiers: Option<FacilityModifiers>,
    /// Where the step's inputs are delivered
    #[serde(default)]
    pub source_location_id: Option<LocationId>,
    /// Where the step's product is built and left
    #[serde(default)]
    pub output_location_id: Option<LocationId>,
}

/// A user's production plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: i64,
    pub owner: String,
    pub target_type_id: TypeId,
    #[serde(default)]
    pub defaults: PlanDefaults,
    /// Name of the transport profile used for cargo legs
    #[serde(default)]
    pub transport_profile: Option<String>,
    pub steps: Vec<Step>,
}

/// Identity of a deduplicated job
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MergeKey {
    pub product_type_id: TypeId,
    pub blueprint_id: TypeId,
    pub activity: Activity,
    pub material_efficiency: u8,
    pub time_efficiency: u8,
    pub modifiers: ModifierSignature,
}

/// Per-run input of a merged job, after material efficiency
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobMaterial {
    pub type_id: TypeId,
    /// Blueprint quantity for a single run, before efficiency
    pub base_per_run: u64,
    /// Quantity consumed by all runs together
    pub quantity: u64,
    /// Whether a child step builds it (otherwise it is bought)
    pub built: bool,
}

/// A production job aggregating every step that shares its key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedJob {
    pub key: MergeKey,
    pub product_type_id: TypeId,
    pub blueprint_id: TypeId,
    pub activity: Activity,
    /// Total output the contributing steps need
    pub required_quantity: u64,
    pub output_per_run: u64,
    pub runs: u64,
    pub materials: Vec<JobMaterial>,
    pub seconds_per_run: f64,
    /// Longest single job the blueprint allows, in runs
    pub max_runs_per_job: Option<u64>,
    pub estimated_cost: f64,
    pub estimated_duration_secs: u64,
    /// Deepest tree depth among contributing steps
    pub depth: u32,
    pub step_ids: Vec<StepId>,
}

impl MergedJob {
    /// Duration of `runs` runs of this job, in whole seconds
    pub fn duration_for_runs(&self, runs: u64) -> u64 {
        (self.seconds_per_run * runs as f64).ceil() as u64
    }
}

/// Resolved production figures for one step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepProductionData {
    pub step_id: StepId,
    pub product_type_id: TypeId,
    /// Output quantity the step must deliver
    pub quantity: u64,
    pub runs: u64,
    pub unit_volume: f64,
    pub depth: u32,
}

/// A material bought instead of built
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Purchase {
    pub type_id: TypeId,
    pub quantity: u64,
    pub unit_price: f64,
    pub unit_volume: f64,
}

impl Purchase {
    pub fn total_cost(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// Output of a plan compilation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeResult {
    /// Deepest jobs first
    pub jobs: Vec<MergedJob>,
    pub skipped: Vec<crate::error::Skipped>,
    pub step_production: BTreeMap<StepId, StepProductionData>,
    pub step_depths: BTreeMap<StepId, u32>,
    pub purchases: Vec<Purchase>,
}

impl MergeResult {
    /// Sum of every job's estimated cost
    pub fn total_cost(&self) -> f64 {
        self.jobs.iter().map(|j| j.estimated_cost).sum()
    }
}
