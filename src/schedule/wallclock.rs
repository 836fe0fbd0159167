use serde::Serialize;
use std::collections::HashMap;

use super::assign::AssignedJob;
use super::capacity::{CharacterCapacity, CharacterId};

/// Committed time of one worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerLoad {
    pub character_id: CharacterId,
    pub name: String,
    pub committed_secs: u64,
    pub fragments: usize,
}

/// Per-worker committed time, in `capacities` order.
///
/// Slots on one worker contend for that worker, so fragment durations add up.
pub fn worker_loads(
    assigned: &[AssignedJob],
    capacities: &[CharacterCapacity],
) -> Vec<WorkerLoad> {
    let mut totals: HashMap<CharacterId, (u64, usize)> = HashMap::new();
    for job in assigned.iter().filter(|j| j.is_assigned()) {
        let entry = totals.entry(job.character_id).or_default();
        entry.0 += job.duration_secs;
        entry.1 += 1;
    }

    capacities
        .iter()
        .map(|c| {
            let (committed_secs, fragments) =
                totals.get(&c.character_id).copied().unwrap_or_default();
            WorkerLoad {
                character_id: c.character_id,
                name: c.name.clone(),
                committed_secs,
                fragments,
            }
        })
        .collect()
}

/// Seconds until the last participating worker finishes
pub fn estimate_wall_clock(assigned: &[AssignedJob], capacities: &[CharacterCapacity]) -> u64 {
    worker_loads(assigned, capacities)
        .into_iter()
        .map(|w| w.committed_secs)
        .max()
        .unwrap_or(0)
}
