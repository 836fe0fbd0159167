//! Greedy list scheduling of merged jobs onto workers.
//!
//! Jobs are taken deepest first, longest first within a depth, and each run
//! goes to the eligible worker with the least committed time. This is the
//! longest-processing-time heuristic: it approximates the minimal makespan
//! but does not guarantee it.

use serde::Serialize;
use std::cmp::Reverse;
use tracing::{debug, instrument};

use super::capacity::{CharacterCapacity, CharacterId};
use crate::industry::{Activity, MergeKey, MergedJob, TypeId};

/// Worker id carried by fragments nobody could take
pub const UNASSIGNED: CharacterId = 0;

/// A run-count fragment of one merged job bound to one worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignedJob {
    /// `UNASSIGNED` when no worker had a free slot
    pub character_id: CharacterId,
    /// Index of the source job in the scheduled slice
    pub job_index: usize,
    pub key: MergeKey,
    pub product_type_id: TypeId,
    pub activity: Activity,
    pub runs: u64,
    pub duration_secs: u64,
}

impl AssignedJob {
    pub fn is_assigned(&self) -> bool {
        self.character_id != UNASSIGNED
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub jobs: Vec<AssignedJob>,
    pub unassigned_runs: u64,
}

/// Assign `jobs` across the first `parallelism` workers of `capacities`.
///
/// Deterministic for identical inputs; ties go to the earlier worker.
#[instrument(
    skip_all,
    fields(jobs = jobs.len(), workers = capacities.len(), parallelism = parallelism)
)]
pub fn simulate_assignment(
    jobs: &[MergedJob],
    capacities: &[CharacterCapacity],
    parallelism: usize,
) -> Assignment {
    let workers = &capacities[..parallelism.min(capacities.len())];
    let mut committed = vec![0u64; workers.len()];
    let mut assignment = Assignment::default();

    let mut order: Vec<usize> = (0..jobs.len()).collect();
    order.sort_by_key(|&i| (Reverse(jobs[i].depth), Reverse(jobs[i].estimated_duration_secs)));

    for job_index in order {
        let job = &jobs[job_index];
        if job.runs == 0 {
            continue;
        }

        let eligible: Vec<usize> = (0..workers.len())
            .filter(|&w| workers[w].available(job.activity) > 0)
            .collect();

        if eligible.is_empty() {
            debug!(
                product_type_id = job.product_type_id,
                activity = %job.activity,
                runs = job.runs,
                "no worker with a free slot"
            );
            assignment.unassigned_runs += job.runs;
            assignment.jobs.push(fragment(job, job_index, UNASSIGNED, job.runs));
            continue;
        }

        let mut shares = vec![0u64; eligible.len()];
        for _ in 0..job.runs {
            let mut best = 0;
            let mut best_load = u64::MAX;
            for (slot, &w) in eligible.iter().enumerate() {
                let load = committed[w] + job.duration_for_runs(shares[slot] + 1);
                if load < best_load {
                    best = slot;
                    best_load = load;
                }
            }
            shares[best] += 1;
        }

        let limit = job.max_runs_per_job.filter(|&m| m > 0).unwrap_or(job.runs);
        for (slot, &w) in eligible.iter().enumerate() {
            let mut remaining = shares[slot];
            while remaining > 0 {
                let runs = remaining.min(limit);
                let piece = fragment(job, job_index, workers[w].character_id, runs);
                committed[w] += piece.duration_secs;
                assignment.jobs.push(piece);
                remaining -= runs;
            }
        }
    }

    assignment
}

fn fragment(
    job: &MergedJob,
    job_index: usize,
    character_id: CharacterId,
    runs: u64,
) -> AssignedJob {
    AssignedJob {
        character_id,
        job_index,
        key: job.key,
        product_type_id: job.product_type_id,
        activity: job.activity,
        runs,
        duration_secs: job.duration_for_runs(runs),
    }
}
