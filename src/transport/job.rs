//! Cargo legs between production sites and their costed transport jobs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::cost::{
    courier_cost, gate_transport_cost, jump_freighter_cost, jump_fuel_cost, FuelRules, JumpFuel,
};
use super::route::JfRoute;
use crate::industry::{LocationId, MergeResult, PriceBasis, PriceSnapshot, StepTree, TypeId};

/// Vehicle or service capability used to cost a haul
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportProfile {
    pub name: String,
    /// Cargo capacity per trip, in m3
    pub cargo_m3: f64,
    pub rate_per_m3_per_jump: f64,
    pub collateral_rate: f64,
    /// Base isotope use per light year (jump freighters only)
    #[serde(default)]
    pub fuel_per_ly: f64,
    #[serde(default)]
    pub isotope_type_id: Option<TypeId>,
    #[serde(default)]
    pub courier_rate_per_m3: f64,
    #[serde(default)]
    pub courier_collateral_rate: f64,
}

impl TransportProfile {
    pub fn default_profiles() -> Vec<TransportProfile> {
        vec![
            TransportProfile {
                name: "freighter".into(),
                cargo_m3: 435_000.0,
                rate_per_m3_per_jump: 50.0,
                collateral_rate: 0.01,
                fuel_per_ly: 0.0,
                isotope_type_id: None,
                courier_rate_per_m3: 800.0,
                courier_collateral_rate: 0.01,
            },
            TransportProfile {
                name: "jump_freighter".into(),
                cargo_m3: 360_000.0,
                rate_per_m3_per_jump: 0.0,
                collateral_rate: 0.01,
                fuel_per_ly: 10_000.0,
                isotope_type_id: Some(17888),
                courier_rate_per_m3: 1_200.0,
                courier_collateral_rate: 0.01,
            },
        ]
    }
}

/// One item type carried on a leg
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegItem {
    pub type_id: TypeId,
    pub quantity: u64,
    pub unit_volume: f64,
}

/// Goods that must move from one location to another
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransportLeg {
    pub from: LocationId,
    pub to: LocationId,
    pub items: Vec<LegItem>,
}

/// Derive the legs needed to bring each step's output to its parent's inputs.
///
/// Only steps that were resolved in `merge` and have both locations known
/// produce cargo. Legs sharing endpoints are combined.
pub fn collect_transport_legs(tree: &StepTree, merge: &MergeResult) -> Vec<TransportLeg> {
    let mut legs: BTreeMap<(LocationId, LocationId), BTreeMap<TypeId, LegItem>> = BTreeMap::new();

    for idx in 0..tree.len() {
        let Some(parent) = tree.parent(idx) else {
            continue;
        };
        let step = tree.step(idx);
        let Some(production) = merge.step_production.get(&step.id) else {
            continue;
        };
        let (Some(from), Some(to)) = (tree.output_location(idx), tree.source_location(parent))
        else {
            continue;
        };
        if from == to || production.quantity == 0 {
            continue;
        }

        legs.entry((from, to))
            .or_default()
            .entry(production.product_type_id)
            .or_insert(LegItem {
                type_id: production.product_type_id,
                quantity: 0,
                unit_volume: production.unit_volume,
            })
            .quantity += production.quantity;
    }

    legs.into_iter()
        .map(|((from, to), items)| TransportLeg {
            from,
            to,
            items: items.into_values().collect(),
        })
        .collect()
}

/// How a leg is hauled
#[derive(Debug, Clone, PartialEq)]
pub enum TransportMethod {
    Gate { jumps: u32 },
    JumpFreighter { route: JfRoute, conservation_level: u8 },
    Courier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    Gate,
    JumpFreighter,
    Courier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransportJobItem {
    pub type_id: TypeId,
    pub quantity: u64,
    pub volume_m3: f64,
    pub collateral: f64,
}

/// A costed cargo-movement instruction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransportJob {
    pub from: LocationId,
    pub to: LocationId,
    pub kind: TransportKind,
    pub profile: String,
    pub items: Vec<TransportJobItem>,
    pub total_volume_m3: f64,
    pub collateral: f64,
    pub jumps: u32,
    pub distance_ly: f64,
    pub trips: u64,
    pub cost: f64,
}

/// Costs legs under one profile and price snapshot
pub struct TransportPlanner<'a> {
    pub profile: &'a TransportProfile,
    pub prices: &'a PriceSnapshot,
    pub price_basis: PriceBasis,
    pub fuel: FuelRules,
}

impl TransportPlanner<'_> {
    pub fn plan_job(&self, leg: &TransportLeg, method: &TransportMethod) -> TransportJob {
        let items: Vec<TransportJobItem> = leg
            .items
            .iter()
            .map(|item| TransportJobItem {
                type_id: item.type_id,
                quantity: item.quantity,
                volume_m3: item.unit_volume * item.quantity as f64,
                collateral: self
                    .prices
                    .unit_price(item.type_id, self.price_basis)
                    .unwrap_or(0.0)
                    * item.quantity as f64,
            })
            .collect();
        let total_volume_m3: f64 = items.iter().map(|i| i.volume_m3).sum();
        let collateral: f64 = items.iter().map(|i| i.collateral).sum();
        let trips = self.trips(total_volume_m3);
        let profile = self.profile;

        let (kind, jumps, distance_ly, cost) = match method {
            TransportMethod::Gate { jumps } => (
                TransportKind::Gate,
                *jumps,
                0.0,
                gate_transport_cost(
                    total_volume_m3,
                    collateral,
                    *jumps,
                    profile.rate_per_m3_per_jump,
                    profile.collateral_rate,
                ),
            ),
            TransportMethod::JumpFreighter {
                route,
                conservation_level,
            } => {
                let distance = route.total_distance_ly();
                let fuel = JumpFuel {
                    fuel_per_ly: profile.fuel_per_ly,
                    conservation_factor: self.fuel.conservation_factor(*conservation_level),
                    isotope_price: self.isotope_price(),
                };
                // Fuel is burned on every trip, collateral is insured once
                let cost = jump_freighter_cost(route, &fuel, collateral, profile.collateral_rate)
                    + jump_fuel_cost(distance, &fuel) * trips.saturating_sub(1) as f64;
                (
                    TransportKind::JumpFreighter,
                    route.jumps() as u32,
                    distance,
                    cost,
                )
            }
            TransportMethod::Courier => (
                TransportKind::Courier,
                0,
                0.0,
                courier_cost(
                    total_volume_m3,
                    collateral,
                    profile.courier_rate_per_m3,
                    profile.courier_collateral_rate,
                ),
            ),
        };

        debug!(from = leg.from, to = leg.to, ?kind, trips, cost, "transport job costed");

        TransportJob {
            from: leg.from,
            to: leg.to,
            kind,
            profile: profile.name.clone(),
            items,
            total_volume_m3,
            collateral,
            jumps,
            distance_ly,
            trips,
            cost,
        }
    }

    fn trips(&self, volume: f64) -> u64 {
        if volume <= 0.0 {
            0
        } else if self.profile.cargo_m3 <= 0.0 {
            1
        } else {
            (volume / self.profile.cargo_m3).ceil() as u64
        }
    }

    fn isotope_price(&self) -> f64 {
        self.profile
            .isotope_type_id
            .and_then(|id| self.prices.unit_price(id, self.price_basis))
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::industry::{MarketPrice, StepProductionData};
    use crate::industry::{Activity, Plan, PlanDefaults, Step};
    use crate::transport::route::{Waypoint, METERS_PER_LIGHT_YEAR};

    fn step(
        id: i64,
        parent: Option<i64>,
        product: TypeId,
        src: Option<i64>,
        out: Option<i64>,
    ) -> Step {
        Step {
            id,
            plan_id: 1,
            parent_id: parent,
            product_type_id: product,
            blueprint_id: product + 1,
            activity: Activity::Manufacturing,
            material_efficiency: 0,
            time_efficiency: 0,
            modifiers: None,
            source_location_id: src,
            output_location_id: out,
        }
    }

    fn production(step_id: i64, product: TypeId, quantity: u64) -> StepProductionData {
        StepProductionData {
            step_id,
            product_type_id: product,
            quantity,
            runs: quantity,
            unit_volume: 2.0,
            depth: 1,
        }
    }

    fn profile() -> TransportProfile {
        TransportProfile {
            name: "test".into(),
            cargo_m3: 100.0,
            rate_per_m3_per_jump: 10.0,
            collateral_rate: 0.01,
            fuel_per_ly: 100.0,
            isotope_type_id: Some(17888),
            courier_rate_per_m3: 5.0,
            courier_collateral_rate: 0.02,
        }
    }

    #[test]
    fn test_collect_legs_merges_by_endpoints() {
        let plan = Plan {
            id: 1,
            owner: "tester".into(),
            target_type_id: 10,
            defaults: PlanDefaults::default(),
            transport_profile: None,
            steps: vec![
                step(1, None, 10, Some(500), Some(500)),
                step(2, Some(1), 20, None, Some(600)),
                step(3, Some(1), 30, None, Some(600)),
                step(4, Some(1), 40, None, Some(500)),
                step(5, Some(2), 50, None, None),
            ],
        };
        let tree = StepTree::build(&plan).unwrap();
        let mut merge = MergeResult::default();
        for (id, product, qty) in [(2, 20, 7), (3, 30, 4), (4, 40, 9), (5, 50, 1)] {
            merge.step_production.insert(id, production(id, product, qty));
        }

        let legs = collect_transport_legs(&tree, &merge);
        assert_eq!(legs.len(), 1);
        assert_eq!((legs[0].from, legs[0].to), (600, 500));
        let items: Vec<_> = legs[0].items.iter().map(|i| (i.type_id, i.quantity)).collect();
        assert_eq!(items, vec![(20, 7), (30, 4)]);
    }

    fn planner_fixture() -> (TransportProfile, PriceSnapshot, TransportLeg) {
        let mut prices = PriceSnapshot::default();
        prices.market.insert(
            20,
            MarketPrice {
                buy: Some(90.0),
                sell: Some(100.0),
            },
        );
        prices.market.insert(
            17888,
            MarketPrice {
                buy: Some(400.0),
                sell: Some(500.0),
            },
        );
        let leg = TransportLeg {
            from: 600,
            to: 500,
            items: vec![LegItem {
                type_id: 20,
                quantity: 75,
                unit_volume: 2.0,
            }],
        };
        (profile(), prices, leg)
    }

    #[test]
    fn test_gate_and_courier_jobs() {
        let (profile, prices, leg) = planner_fixture();
        let planner = TransportPlanner {
            profile: &profile,
            prices: &prices,
            price_basis: PriceBasis::Sell,
            fuel: FuelRules::default(),
        };

        let gate = planner.plan_job(&leg, &TransportMethod::Gate { jumps: 4 });
        assert_eq!(gate.total_volume_m3, 150.0);
        assert_eq!(gate.collateral, 7500.0);
        assert_eq!(gate.trips, 2);
        assert!((gate.cost - (150.0 * 10.0 * 4.0 + 75.0)).abs() < 1e-9);

        let courier = planner.plan_job(&leg, &TransportMethod::Courier);
        assert_eq!(courier.kind, TransportKind::Courier);
        assert!((courier.cost - (150.0 * 5.0 + 150.0)).abs() < 1e-9);
    }

    #[test]
    fn test_jump_freighter_job_pays_fuel_per_trip() {
        let (profile, prices, leg) = planner_fixture();
        let planner = TransportPlanner {
            profile: &profile,
            prices: &prices,
            price_basis: PriceBasis::Sell,
            fuel: FuelRules::default(),
        };
        let route = JfRoute::new(vec![
            Waypoint::new(1, [0.0; 3]),
            Waypoint::new(2, [2.0 * METERS_PER_LIGHT_YEAR, 0.0, 0.0]),
        ]);
        let job = planner.plan_job(
            &leg,
            &TransportMethod::JumpFreighter {
                route,
                conservation_level: 5,
            },
        );
        // 2 trips * 2 ly * 100 * 0.5 * 500 + 7500 * 0.01
        assert_eq!(job.jumps, 1);
        assert!((job.cost - (2.0 * 50_000.0 + 75.0)).abs() < 1e-6);
    }

    #[test]
    fn test_weightless_cargo_still_pays_collateral() {
        let (profile, prices, mut leg) = planner_fixture();
        leg.items[0].unit_volume = 0.0;
        let planner = TransportPlanner {
            profile: &profile,
            prices: &prices,
            price_basis: PriceBasis::Sell,
            fuel: FuelRules::default(),
        };
        let route = JfRoute::new(vec![
            Waypoint::new(1, [0.0; 3]),
            Waypoint::new(2, [2.0 * METERS_PER_LIGHT_YEAR, 0.0, 0.0]),
        ]);

        let job = planner.plan_job(
            &leg,
            &TransportMethod::JumpFreighter {
                route,
                conservation_level: 5,
            },
        );
        assert_eq!(job.trips, 0);
        assert_eq!(job.collateral, 7500.0);
        // One crossing of 2 ly at half fuel, plus 1% of 7500 ISK
        assert!((job.cost - (50_000.0 + 75.0)).abs() < 1e-6);

        let gate = planner.plan_job(&leg, &TransportMethod::Gate { jumps: 4 });
        assert!((gate.cost - 75.0).abs() < 1e-9);
    }
}
