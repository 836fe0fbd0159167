use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Metres in one light year
pub const METERS_PER_LIGHT_YEAR: f64 = 9_460_730_472_580_800.0;

/// Solar system coordinates in metres
pub trait SystemLocator {
    fn system_position(&self, system_id: i64) -> Result<Option<[f64; 3]>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub system_id: i64,
    pub position: [f64; 3],
}

impl Waypoint {
    pub fn new(system_id: i64, position: [f64; 3]) -> Self {
        Self {
            system_id,
            position,
        }
    }

    /// Straight-line distance to `other`, in light years
    pub fn distance_ly(&self, other: &Waypoint) -> f64 {
        let [x1, y1, z1] = self.position;
        let [x2, y2, z2] = other.position;
        let d = ((x2 - x1).powi(2) + (y2 - y1).powi(2) + (z2 - z1).powi(2)).sqrt();
        d / METERS_PER_LIGHT_YEAR
    }
}

/// Ordered jump-freighter waypoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JfRoute {
    pub waypoints: Vec<Waypoint>,
}

impl JfRoute {
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self { waypoints }
    }

    /// Build a route by looking up each system's position
    pub fn from_systems(locator: &dyn SystemLocator, system_ids: &[i64]) -> Result<Self> {
        let waypoints = system_ids
            .iter()
            .map(|&id| {
                locator
                    .system_position(id)?
                    .map(|position| Waypoint::new(id, position))
                    .ok_or_else(|| anyhow!("Unknown solar system: {}", id))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { waypoints })
    }

    /// Sum of every leg's distance
    pub fn total_distance_ly(&self) -> f64 {
        self.waypoints
            .windows(2)
            .map(|leg| leg[0].distance_ly(&leg[1]))
            .sum()
    }

    /// Number of jumps (legs) on the route
    pub fn jumps(&self) -> usize {
        self.waypoints.len().saturating_sub(1)
    }
}
