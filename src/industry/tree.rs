//! Validated step tree: steps in an arena with a child index rebuilt per call.

use std::collections::{HashMap, HashSet, VecDeque};

use super::types::{FacilityModifiers, LocationId, Plan, Step, StepId, TypeId};
use crate::error::{PlanError, Result};

/// Read-only view over a plan's steps
#[derive(Debug)]
pub struct StepTree<'a> {
    plan: &'a Plan,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    depths: Vec<u32>,
    root: usize,
}

impl<'a> StepTree<'a> {
    /// Index and validate a plan's steps.
    ///
    /// Fails when the root is missing or duplicated, the root does not build
    /// the plan's target, a step belongs to another plan, a parent id is
    /// unknown, or parent links form a cycle.
    pub fn build(plan: &'a Plan) -> Result<Self> {
        let steps = &plan.steps;
        let mut by_id = HashMap::with_capacity(steps.len());

        for (idx, step) in steps.iter().enumerate() {
            if step.plan_id != plan.id {
                return Err(invalid(format!(
                    "step {} belongs to plan {}, not plan {}",
                    step.id, step.plan_id, plan.id
                )));
            }
            if by_id.insert(step.id, idx).is_some() {
                return Err(invalid(format!("duplicate step id {}", step.id)));
            }
        }

        let roots: Vec<usize> = (0..steps.len())
            .filter(|&i| steps[i].parent_id.is_none())
            .collect();
        let root = match roots.as_slice() {
            [] => return Err(invalid(format!("plan {} has no root step", plan.id))),
            [root] => *root,
            _ => {
                return Err(invalid(format!(
                    "plan {} has {} root steps",
                    plan.id,
                    roots.len()
                )))
            }
        };

        if steps[root].product_type_id != plan.target_type_id {
            return Err(invalid(format!(
                "root step {} builds type {}, but plan {} targets type {}",
                steps[root].id, steps[root].product_type_id, plan.id, plan.target_type_id
            )));
        }

        let mut parents = Vec::with_capacity(steps.len());
        for step in steps {
            match step.parent_id {
                None => parents.push(None),
                Some(parent_id) => match by_id.get(&parent_id) {
                    Some(&p) => parents.push(Some(p)),
                    None => {
                        return Err(invalid(format!(
                            "parent {} of step {} is not part of plan {}",
                            parent_id, step.id, plan.id
                        )))
                    }
                },
            }
        }

        let mut visited = HashSet::new();
        let mut temp_visited = HashSet::new();
        for idx in 0..steps.len() {
            visit_ancestors(idx, steps, &parents, &mut visited, &mut temp_visited)?;
        }

        let mut children = vec![Vec::new(); steps.len()];
        for (idx, parent) in parents.iter().enumerate() {
            if let Some(p) = parent {
                children[*p].push(idx);
            }
        }
        for list in &mut children {
            list.sort_by_key(|&i| steps[i].id);
        }

        let mut depths = vec![0; steps.len()];
        let mut queue = VecDeque::from([root]);
        while let Some(idx) = queue.pop_front() {
            for &child in &children[idx] {
                depths[child] = depths[idx] + 1;
                queue.push_back(child);
            }
        }

        Ok(Self {
            plan,
            parents,
            children,
            depths,
            root,
        })
    }

    pub fn plan(&self) -> &'a Plan {
        self.plan
    }

    pub fn root(&self) -> usize {
        self.root
    }

    pub fn len(&self) -> usize {
        self.plan.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plan.steps.is_empty()
    }

    pub fn step(&self, idx: usize) -> &'a Step {
        &self.plan.steps[idx]
    }

    pub fn parent(&self, idx: usize) -> Option<usize> {
        self.parents[idx]
    }

    /// Children ordered by step id
    pub fn children(&self, idx: usize) -> &[usize] {
        &self.children[idx]
    }

    /// Root is depth 0
    pub fn depth(&self, idx: usize) -> u32 {
        self.depths[idx]
    }

    /// First child (by step id) whose product is `type_id`
    pub fn child_producing(&self, idx: usize, type_id: TypeId) -> Option<usize> {
        self.children[idx]
            .iter()
            .copied()
            .find(|&c| self.step(c).product_type_id == type_id)
    }

    /// Step modifiers, falling back to the plan defaults
    pub fn modifiers(&self, idx: usize) -> FacilityModifiers {
        self.step(idx)
            .modifiers
            .unwrap_or(self.plan.defaults.modifiers)
    }

    pub fn output_location(&self, idx: usize) -> Option<LocationId> {
        self.step(idx)
            .output_location_id
            .or(self.plan.defaults.location_id)
    }

    pub fn source_location(&self, idx: usize) -> Option<LocationId> {
        self.step(idx)
            .source_location_id
            .or(self.plan.defaults.location_id)
    }
}

fn invalid(message: String) -> PlanError {
    PlanError::InvalidPlanTree(message)
}

fn visit_ancestors(
    idx: usize,
    steps: &[Step],
    parents: &[Option<usize>],
    visited: &mut HashSet<usize>,
    temp_visited: &mut HashSet<usize>,
) -> Result<()> {
    if temp_visited.contains(&idx) {
        return Err(invalid(format!(
            "parent cycle detected at step {}",
            steps[idx].id
        )));
    }
    if visited.contains(&idx) {
        return Ok(());
    }

    temp_visited.insert(idx);
    if let Some(parent) = parents[idx] {
        visit_ancestors(parent, steps, parents, visited, temp_visited)?;
    }
    temp_visited.remove(&idx);
    visited.insert(idx);

    Ok(())
}
