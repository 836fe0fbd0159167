use thiserror::Error;

use crate::industry::{StepId, TypeId};

/// Fatal errors raised while compiling a plan
#[derive(Error, Debug)]
pub enum PlanError {
    /// The step tree is malformed; nothing was compiled
    #[error("invalid plan tree: {0}")]
    InvalidPlanTree(String),

    /// A collaborator (blueprints, prices, cost indices) failed
    #[error(transparent)]
    Source(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PlanError>;

/// Why a product or material was left out of a compilation
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The step's blueprint has no definition for its activity
    NoBlueprint { blueprint_id: TypeId },
    /// Nothing in the plan builds the material and it has no market price
    UnresolvableMaterial,
    /// The step's product is not an input of its parent step
    NotConsumed { parent_step_id: StepId },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoBlueprint { blueprint_id } => {
                write!(f, "no blueprint data for blueprint {}", blueprint_id)
            }
            SkipReason::UnresolvableMaterial => {
                write!(f, "not built by any step and has no market price")
            }
            SkipReason::NotConsumed { parent_step_id } => {
                write!(f, "not an input of parent step {}", parent_step_id)
            }
        }
    }
}

/// A non-fatal omission recorded during a walk
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Skipped {
    pub type_id: TypeId,
    /// Step that produced or consumed the type
    pub step_id: StepId,
    pub reason: SkipReason,
}

impl Skipped {
    /// Human-readable reason
    pub fn reason_text(&self) -> String {
        self.reason.to_string()
    }
}
