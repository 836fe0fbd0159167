//! End-to-end planning against a small SDE database on disk.
//!
//! The fixture models a three-level chain:
//! ship 700 <- component 800 <- reaction product 900.

use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

use eve_industry_planner::config::PlannerConfig;
use eve_industry_planner::error::SkipReason;
use eve_industry_planner::industry::{
    compile_plan, Activity, MergeInputs, MergeSettings, Plan, PriceBasis, PriceSnapshot,
};
use eve_industry_planner::input::{load_characters, load_plan, load_prices};
use eve_industry_planner::pipeline::run_plan;
use eve_industry_planner::schedule::{
    build_character_capacities, preview_parallelism, CharacterCapacity, UNASSIGNED,
};
use eve_industry_planner::sde::{generate_create_table, SdeDatabase, REQUIRED_TABLES};
use eve_industry_planner::transport::{JfRoute, TransportKind};

const HUB: i64 = 60003760;
const REACTOR: i64 = 1000;

// =============================================================================
// Shared fixture files
// =============================================================================

static SDE_FILE: Lazy<NamedTempFile> = Lazy::new(|| {
    let file = NamedTempFile::new().expect("Failed to create temp file");
    let conn = Connection::open(file.path()).expect("Failed to open fixture database");
    for table in REQUIRED_TABLES {
        conn.execute(&generate_create_table(table), [])
            .expect("Failed to create table");
    }
    conn.execute_batch(
        "INSERT INTO types (id, name_en, volume, packaged_volume) VALUES
             (700, 'Test Hull', 50000.0, 2500.0),
             (800, 'Test Component', 10.0, NULL),
             (900, 'Test Polymer', 1.0, NULL),
             (34, 'Tritanium', 0.01, NULL),
             (16634, 'Hydrocarbons', 0.1, NULL);
         INSERT INTO blueprints (id, max_production_limit, manufacturing_time, reaction_time) VALUES
             (701, NULL, 10000, NULL),
             (801, NULL, 600, NULL),
             (901, NULL, NULL, 3600);
         INSERT INTO blueprint_products (blueprint_id, activity, type_id, quantity) VALUES
             (701, 'manufacturing', 700, 1),
             (801, 'manufacturing', 800, 1),
             (901, 'reaction', 900, 100);
         INSERT INTO blueprint_materials (blueprint_id, activity, type_id, quantity) VALUES
             (701, 'manufacturing', 34, 1000),
             (701, 'manufacturing', 800, 10),
             (801, 'manufacturing', 34, 50),
             (801, 'manufacturing', 900, 5),
             (901, 'reaction', 16634, 100);
         INSERT INTO map_solar_systems (id, name_en, position_x, position_y, position_z) VALUES
             (1, 'Origin', 0.0, 0.0, 0.0),
             (2, 'Midpoint', 9460730472580800.0, 0.0, 0.0),
             (3, 'Destination', 9460730472580800.0, 18921460945161600.0, 0.0);",
    )
    .expect("Failed to seed fixture");
    file
});

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write temp file");
    file
}

fn sde() -> SdeDatabase {
    SdeDatabase::open(SDE_FILE.path()).expect("Failed to open fixture SDE")
}

fn plan_json() -> String {
    format!(
        r#"{{
            "id": 1,
            "owner": "Builder One",
            "target_type_id": 700,
            "defaults": {{"location_id": {hub}}},
            "steps": [
                {{"id": 1, "plan_id": 1, "product_type_id": 700, "blueprint_id": 701,
                  "activity": "manufacturing"}},
                {{"id": 2, "plan_id": 1, "parent_id": 1, "product_type_id": 800,
                  "blueprint_id": 801, "activity": "manufacturing"}},
                {{"id": 3, "plan_id": 1, "parent_id": 2, "product_type_id": 900,
                  "blueprint_id": 901, "activity": "reaction",
                  "output_location_id": {reactor}}}
            ]
        }}"#,
        hub = HUB,
        reactor = REACTOR
    )
}

fn plan() -> Plan {
    let file = write_temp(&plan_json());
    load_plan(file.path()).expect("Failed to load plan")
}

fn prices() -> PriceSnapshot {
    let file = write_temp(
        "{\"typeId\": 34, \"buy\": 4.5, \"sell\": 5.0}\n\n{\"typeId\": 16634, \"sell\": 50.0}\n",
    );
    load_prices(file.path()).expect("Failed to load prices")
}

fn capacities() -> Vec<CharacterCapacity> {
    let file = write_temp(
        r#"[
            {"id": 9002, "name": "Builder Two"},
            {"id": 9001, "name": "Builder One", "skills": {"3387": 5}}
        ]"#,
    );
    let slots = PlannerConfig::default().slots;
    let mut roster = load_characters(file.path()).expect("Failed to load characters");
    roster.retain_skills(&slots.relevant_skills());
    build_character_capacities(&roster.names, &roster.skills, &roster.slot_usage, &slots)
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_compile_chain_from_sde() {
    let sde = sde();
    let prices = prices();
    let cost_indices = HashMap::new();
    let inputs = MergeInputs {
        blueprints: &sde,
        prices: &prices,
        cost_indices: &cost_indices,
    };

    let result = compile_plan(&plan(), 2, &inputs, &MergeSettings::default()).unwrap();

    assert!(result.skipped.is_empty(), "unexpected skips: {:?}", result.skipped);
    let jobs: Vec<_> = result
        .jobs
        .iter()
        .map(|j| (j.product_type_id, j.activity, j.runs, j.depth))
        .collect();
    assert_eq!(
        jobs,
        vec![
            (900, Activity::Reaction, 1, 2),
            (800, Activity::Manufacturing, 20, 1),
            (700, Activity::Manufacturing, 2, 0),
        ]
    );

    let purchases: Vec<_> = result
        .purchases
        .iter()
        .map(|p| (p.type_id, p.quantity))
        .collect();
    assert_eq!(purchases, vec![(34, 3000), (16634, 100)]);

    assert_eq!(result.step_production[&3].quantity, 100);
    assert_eq!(result.step_depths[&3], 2);
}

#[test]
fn test_sell_only_price_is_unresolvable_on_buy_basis() {
    let sde = sde();
    let prices = prices();
    let cost_indices = HashMap::new();
    let inputs = MergeInputs {
        blueprints: &sde,
        prices: &prices,
        cost_indices: &cost_indices,
    };
    let settings = MergeSettings {
        price_basis: PriceBasis::Buy,
        ..Default::default()
    };

    let result = compile_plan(&plan(), 2, &inputs, &settings).unwrap();

    // Hydrocarbons only have sell orders in the snapshot
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].type_id, 16634);
    assert_eq!(result.skipped[0].step_id, 3);
    assert_eq!(result.skipped[0].reason, SkipReason::UnresolvableMaterial);

    let purchases: Vec<_> = result
        .purchases
        .iter()
        .map(|p| (p.type_id, p.quantity, p.unit_price))
        .collect();
    assert_eq!(purchases, vec![(34, 3000, 4.5)]);
}

#[test]
fn test_run_plan_costs_legs_and_schedules() {
    let sde = sde();
    let prices = prices();
    let cost_indices = HashMap::new();
    let inputs = MergeInputs {
        blueprints: &sde,
        prices: &prices,
        cost_indices: &cost_indices,
    };
    let capacities = capacities();
    let config = PlannerConfig::default();

    let report = run_plan(&plan(), 2, &inputs, &config, Some((&capacities, 2))).unwrap();

    // 100 units of the polymer move from the reactor to the hub by courier
    assert_eq!(report.transport.len(), 1);
    let haul = &report.transport[0];
    assert_eq!((haul.from, haul.to), (REACTOR, HUB));
    assert_eq!(haul.kind, TransportKind::Courier);
    assert_eq!(haul.total_volume_m3, 100.0);
    assert_eq!(haul.trips, 1);
    assert_eq!(haul.cost, 100.0 * 800.0);

    let schedule = report.schedule.expect("schedule requested");
    assert_eq!(schedule.parallelism, 2);
    assert_eq!(schedule.assignment.unassigned_runs, 0);
    assert!(schedule
        .assignment
        .jobs
        .iter()
        .all(|j| j.character_id != UNASSIGNED));
    assert_eq!(schedule.wall_clock_secs, 17_800);

    let ids: Vec<_> = schedule.workers.iter().map(|w| w.character_id).collect();
    assert_eq!(ids, vec![9001, 9002]);
}

#[test]
fn test_preview_curve_from_files() {
    let sde = sde();
    let prices = prices();
    let cost_indices = HashMap::new();
    let inputs = MergeInputs {
        blueprints: &sde,
        prices: &prices,
        cost_indices: &cost_indices,
    };
    let result = compile_plan(&plan(), 2, &inputs, &MergeSettings::default()).unwrap();

    let curve = preview_parallelism(&result.jobs, &capacities(), 5);
    let points: Vec<_> = curve
        .iter()
        .map(|p| (p.parallelism, p.wall_clock_secs))
        .collect();
    assert_eq!(points, vec![(1, 35_600), (2, 17_800)]);
}

#[test]
fn test_jf_route_from_sde_positions() {
    let sde = sde();
    let route = JfRoute::from_systems(&sde, &[1, 2, 3]).unwrap();
    assert_eq!(route.jumps(), 2);
    assert!((route.total_distance_ly() - 3.0).abs() < 1e-9);

    let err = JfRoute::from_systems(&sde, &[1, 42]).unwrap_err();
    assert!(err.to_string().contains("42"));
}

#[test]
fn test_missing_sde_file() {
    let dir = tempfile::tempdir().unwrap();
    let path: PathBuf = dir.path().join("absent.db");
    assert!(SdeDatabase::open(&path).is_err());
}
