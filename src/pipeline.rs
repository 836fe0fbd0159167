//! End-to-end planning run shared by the CLI and integration tests.

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::config::PlannerConfig;
use crate::industry::{merge_plan, MergeInputs, MergeResult, Plan, StepTree};
use crate::schedule::{
    estimate_wall_clock, simulate_assignment, worker_loads, Assignment, CharacterCapacity,
    WorkerLoad,
};
use crate::transport::{collect_transport_legs, TransportJob, TransportMethod, TransportPlanner};

const DEFAULT_PROFILE: &str = "freighter";

/// Schedule of merged jobs over a set of workers
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleReport {
    pub parallelism: usize,
    pub assignment: Assignment,
    pub wall_clock_secs: u64,
    pub workers: Vec<WorkerLoad>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub plan_id: i64,
    pub target_quantity: u64,
    pub merge: MergeResult,
    pub transport: Vec<TransportJob>,
    pub schedule: Option<ScheduleReport>,
}

impl PlanReport {
    pub fn production_cost(&self) -> f64 {
        self.merge.total_cost()
    }

    pub fn transport_cost(&self) -> f64 {
        self.transport.iter().map(|t| t.cost).sum()
    }
}

/// Merge `plan`, cost its cargo legs by courier, and optionally schedule the jobs
pub fn run_plan(
    plan: &Plan,
    target_quantity: u64,
    inputs: &MergeInputs,
    config: &PlannerConfig,
    capacities: Option<(&[CharacterCapacity], usize)>,
) -> Result<PlanReport> {
    let settings = config.merge_settings();
    let tree = StepTree::build(plan)?;
    let merge = merge_plan(&tree, target_quantity, inputs, &settings)?;

    let profile = config.profile(plan.transport_profile.as_deref().unwrap_or(DEFAULT_PROFILE))?;
    let planner = TransportPlanner {
        profile,
        prices: inputs.prices,
        price_basis: settings.price_basis,
        fuel: config.fuel,
    };
    let transport: Vec<TransportJob> = collect_transport_legs(&tree, &merge)
        .iter()
        .map(|leg| planner.plan_job(leg, &TransportMethod::Courier))
        .collect();

    let schedule = capacities.map(|(capacities, parallelism)| {
        let parallelism = parallelism.clamp(1, capacities.len().max(1));
        let assignment = simulate_assignment(&merge.jobs, capacities, parallelism);
        let participants = &capacities[..parallelism.min(capacities.len())];
        ScheduleReport {
            parallelism,
            wall_clock_secs: estimate_wall_clock(&assignment.jobs, participants),
            workers: worker_loads(&assignment.jobs, participants),
            assignment,
        }
    });

    info!(
        plan_id = plan.id,
        jobs = merge.jobs.len(),
        skipped = merge.skipped.len(),
        legs = transport.len(),
        "plan compiled"
    );

    Ok(PlanReport {
        plan_id: plan.id,
        target_quantity,
        merge,
        transport,
        schedule,
    })
}
