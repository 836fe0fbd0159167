//! Plan tree merger: walks the step tree post-order and folds each step
//! into a deduplicated job list.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, instrument, warn};

use super::formulas::{
    installation_fee, material_multiplier, material_quantity, runs_for, time_multiplier, FeeRules,
    MaterialRules, SecurityMultipliers,
};
use super::sources::{BlueprintResolver, CostIndexSource, PriceBasis, PriceSnapshot};
use super::tree::StepTree;
use super::types::{
    JobMaterial, MergeKey, MergeResult, MergedJob, Plan, Purchase, StepProductionData, TypeId,
};
use crate::error::{Result, SkipReason, Skipped};

/// Collaborators the merger reads from
pub struct MergeInputs<'a> {
    pub blueprints: &'a dyn BlueprintResolver,
    pub prices: &'a PriceSnapshot,
    pub cost_indices: &'a dyn CostIndexSource,
}

/// Rule set applied while merging
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeSettings {
    pub materials: MaterialRules,
    pub security: SecurityMultipliers,
    pub fees: FeeRules,
    pub price_basis: PriceBasis,
}

/// Validate `plan` and merge it for `target_quantity` units of the root product
pub fn compile_plan(
    plan: &Plan,
    target_quantity: u64,
    inputs: &MergeInputs,
    settings: &MergeSettings,
) -> Result<MergeResult> {
    let tree = StepTree::build(plan)?;
    merge_plan(&tree, target_quantity, inputs, settings)
}

/// Merge a validated tree into jobs ordered deepest first
#[instrument(
    skip_all,
    fields(plan_id = tree.plan().id, steps = tree.len(), target_quantity = target_quantity)
)]
pub fn merge_plan(
    tree: &StepTree,
    target_quantity: u64,
    inputs: &MergeInputs,
    settings: &MergeSettings,
) -> Result<MergeResult> {
    let mut walker = Walker {
        tree,
        inputs,
        settings,
        jobs: Vec::new(),
        job_index: HashMap::new(),
        skipped: Vec::new(),
        step_production: BTreeMap::new(),
        purchases: BTreeMap::new(),
        volumes: HashMap::new(),
    };
    walker.visit(tree.root(), target_quantity)?;

    let Walker {
        mut jobs,
        skipped,
        step_production,
        purchases,
        ..
    } = walker;

    // Stable: post-order is kept among jobs of equal depth
    jobs.sort_by_key(|job| std::cmp::Reverse(job.depth));

    let step_depths = step_production
        .iter()
        .map(|(id, data)| (*id, data.depth))
        .collect();

    debug!(
        jobs = jobs.len(),
        skipped = skipped.len(),
        purchases = purchases.len(),
        "plan merged"
    );

    Ok(MergeResult {
        jobs,
        skipped,
        step_production,
        step_depths,
        purchases: purchases.into_values().collect(),
    })
}

struct Walker<'t, 'a> {
    tree: &'t StepTree<'t>,
    inputs: &'t MergeInputs<'a>,
    settings: &'t MergeSettings,
    jobs: Vec<MergedJob>,
    job_index: HashMap<MergeKey, usize>,
    skipped: Vec<Skipped>,
    step_production: BTreeMap<i64, StepProductionData>,
    purchases: BTreeMap<TypeId, Purchase>,
    volumes: HashMap<TypeId, f64>,
}

impl Walker<'_, '_> {
    fn visit(&mut self, idx: usize, required: u64) -> Result<()> {
        let tree = self.tree;
        let step = tree.step(idx);
        let depth = tree.depth(idx);

        let Some(blueprint) = self
            .inputs
            .blueprints
            .blueprint(step.blueprint_id, step.activity)?
        else {
            warn!(step_id = step.id, blueprint_id = step.blueprint_id, "blueprint not found");
            self.skipped.push(Skipped {
                type_id: step.product_type_id,
                step_id: step.id,
                reason: SkipReason::NoBlueprint {
                    blueprint_id: step.blueprint_id,
                },
            });
            return Ok(());
        };
        if blueprint.product_type_id != step.product_type_id {
            warn!(
                step_id = step.id,
                step_product = step.product_type_id,
                blueprint_product = blueprint.product_type_id,
                "blueprint output differs from step product"
            );
        }

        let runs = runs_for(required, blueprint.output_per_run);
        let modifiers = tree.modifiers(idx);
        let settings = self.settings;
        let me_mult = material_multiplier(step.material_efficiency, &modifiers, &settings.security);

        let mut materials = Vec::with_capacity(blueprint.materials.len());
        let mut consumed_children = HashSet::new();
        let mut purchased_cost = 0.0;
        let mut item_value = 0.0;

        for material in &blueprint.materials {
            let quantity =
                material_quantity(material.quantity, runs, me_mult, &settings.materials);
            item_value += material.quantity as f64
                * runs as f64
                * self.inputs.prices.adjusted_price(material.type_id);

            let built = match tree.child_producing(idx, material.type_id) {
                Some(child) if consumed_children.insert(child) => {
                    self.visit(child, quantity)?;
                    true
                }
                _ => {
                    purchased_cost += self.buy(step.id, material.type_id, quantity)?;
                    false
                }
            };

            materials.push(JobMaterial {
                type_id: material.type_id,
                base_per_run: material.quantity,
                quantity,
                built,
            });
        }

        for &child in tree.children(idx) {
            if !consumed_children.contains(&child) {
                let child_step = tree.step(child);
                warn!(step_id = child_step.id, "step output is not consumed by its parent");
                self.skipped.push(Skipped {
                    type_id: child_step.product_type_id,
                    step_id: child_step.id,
                    reason: SkipReason::NotConsumed {
                        parent_step_id: step.id,
                    },
                });
            }
        }

        let cost_index = match tree.output_location(idx) {
            Some(location) => self.inputs.cost_indices.cost_index(location, step.activity)?,
            None => 0.0,
        };
        let fee = installation_fee(item_value, cost_index, &modifiers, &settings.fees);
        let seconds_per_run = blueprint.base_time_secs as f64
            * time_multiplier(step.time_efficiency, &modifiers, &settings.security);
        let unit_volume = self.volume(step.product_type_id)?;

        self.step_production.insert(
            step.id,
            StepProductionData {
                step_id: step.id,
                product_type_id: step.product_type_id,
                quantity: required,
                runs,
                unit_volume,
                depth,
            },
        );

        if runs == 0 {
            return Ok(());
        }

        let key = MergeKey {
            product_type_id: step.product_type_id,
            blueprint_id: step.blueprint_id,
            activity: step.activity,
            material_efficiency: step.material_efficiency,
            time_efficiency: step.time_efficiency,
            modifiers: modifiers.signature(),
        };

        match self.job_index.get(&key) {
            Some(&pos) => {
                let job = &mut self.jobs[pos];
                job.required_quantity += required;
                job.runs = runs_for(job.required_quantity, job.output_per_run);
                for material in materials {
                    match job.materials.iter_mut().find(|m| m.type_id == material.type_id) {
                        Some(existing) => {
                            existing.quantity += material.quantity;
                            existing.built |= material.built;
                        }
                        None => job.materials.push(material),
                    }
                }
                job.estimated_cost += purchased_cost + fee;
                job.estimated_duration_secs = job.duration_for_runs(job.runs);
                job.depth = job.depth.max(depth);
                job.step_ids.push(step.id);
            }
            None => {
                let mut job = MergedJob {
                    key,
                    product_type_id: step.product_type_id,
                    blueprint_id: step.blueprint_id,
                    activity: step.activity,
                    required_quantity: required,
                    output_per_run: blueprint.output_per_run,
                    runs,
                    materials,
                    seconds_per_run,
                    max_runs_per_job: blueprint.max_runs_per_job,
                    estimated_cost: purchased_cost + fee,
                    estimated_duration_secs: 0,
                    depth,
                    step_ids: vec![step.id],
                };
                job.estimated_duration_secs = job.duration_for_runs(runs);
                self.job_index.insert(key, self.jobs.len());
                self.jobs.push(job);
            }
        }

        Ok(())
    }

    /// Record a purchase and return its cost (zero when unpriced)
    fn buy(&mut self, step_id: i64, type_id: TypeId, quantity: u64) -> Result<f64> {
        let basis = self.settings.price_basis;
        let Some(unit_price) = self.inputs.prices.unit_price(type_id, basis) else {
            self.skipped.push(Skipped {
                type_id,
                step_id,
                reason: SkipReason::UnresolvableMaterial,
            });
            return Ok(0.0);
        };

        let unit_volume = self.volume(type_id)?;
        self.purchases
            .entry(type_id)
            .or_insert(Purchase {
                type_id,
                quantity: 0,
                unit_price,
                unit_volume,
            })
            .quantity += quantity;

        Ok(unit_price * quantity as f64)
    }

    fn volume(&mut self, type_id: TypeId) -> Result<f64> {
        if let Some(v) = self.volumes.get(&type_id) {
            return Ok(*v);
        }
        let v = self.inputs.blueprints.type_volume(type_id)?;
        self.volumes.insert(type_id, v);
        Ok(v)
    }
}
