use serde::Serialize;
use tracing::instrument;

use super::assign::simulate_assignment;
use super::capacity::CharacterCapacity;
use super::wallclock::{estimate_wall_clock, worker_loads, WorkerLoad};
use crate::industry::MergedJob;

/// Estimated outcome of scheduling with a given number of workers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewPoint {
    pub parallelism: usize,
    pub wall_clock_secs: u64,
    pub unassigned_runs: u64,
    pub workers: Vec<WorkerLoad>,
}

/// Schedule `jobs` at every parallelism from 1 to `max_parallelism`
/// (capped at the worker count).
#[instrument(skip_all, fields(jobs = jobs.len(), max_parallelism = max_parallelism))]
pub fn preview_parallelism(
    jobs: &[MergedJob],
    capacities: &[CharacterCapacity],
    max_parallelism: usize,
) -> Vec<PreviewPoint> {
    let upper = max_parallelism.min(capacities.len());
    (1..=upper)
        .map(|parallelism| {
            let assignment = simulate_assignment(jobs, capacities, parallelism);
            let participants = &capacities[..parallelism];
            PreviewPoint {
                parallelism,
                wall_clock_secs: estimate_wall_clock(&assignment.jobs, participants),
                unassigned_runs: assignment.unassigned_runs,
                workers: worker_loads(&assignment.jobs, participants),
            }
        })
        .collect()
}
