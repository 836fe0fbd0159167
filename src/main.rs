use anyhow::{Context, Result};
use eve_industry_planner::{
    cli::{Cli, Commands, PlanInputs, TransportCommand},
    config::PlannerConfig,
    industry::{MergeInputs, Plan, PriceSnapshot},
    input::{load_characters, load_cost_indices, load_plan, load_prices},
    logging,
    pipeline::{run_plan, PlanReport},
    schedule::{build_character_capacities, preview_parallelism, CharacterCapacity},
    sde::SdeDatabase,
    transport::{courier_cost, gate_transport_cost, jump_freighter_cost, JfRoute, JumpFuel},
};
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    logging::init(cli.verbose);
    let config = PlannerConfig::load(cli.config)?;

    match cli.command {
        Commands::Compile {
            inputs,
            characters,
            parallelism,
            json,
        } => {
            let start = Instant::now();
            let capacities = match &characters {
                Some(path) => Some(load_capacities(path, &config)?),
                None => None,
            };
            let schedule = capacities
                .as_deref()
                .map(|c| (c, parallelism.unwrap_or(c.len())));

            let report = with_plan_inputs(&inputs, |plan, merge_inputs| {
                run_plan(plan, inputs.quantity, merge_inputs, &config, schedule)
            })?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
                println!("\nCompiled in {:.1}s", start.elapsed().as_secs_f64());
            }
        }

        Commands::Preview {
            inputs,
            characters,
            max,
            json,
        } => {
            let capacities = load_capacities(&characters, &config)?;
            let report = with_plan_inputs(&inputs, |plan, merge_inputs| {
                run_plan(plan, inputs.quantity, merge_inputs, &config, None)
            })?;
            let curve = preview_parallelism(
                &report.merge.jobs,
                &capacities,
                max.unwrap_or(capacities.len()),
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&curve)?);
            } else {
                println!("Parallelism  Wall clock    Unassigned runs");
                for point in &curve {
                    println!(
                        "  {:>9}  {:>10}  {:>15}",
                        point.parallelism,
                        format_duration(point.wall_clock_secs),
                        point.unassigned_runs
                    );
                }
            }
        }

        Commands::Transport { method } => run_transport(method, &config)?,

        Commands::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

/// Open the SDE and price files and hand a ready `MergeInputs` to `run`
fn with_plan_inputs<T>(
    inputs: &PlanInputs,
    run: impl FnOnce(&Plan, &MergeInputs) -> Result<T>,
) -> Result<T> {
    let plan = load_plan(&inputs.plan)?;
    let sde = SdeDatabase::open(&inputs.sde)?;
    let prices = load_prices(&inputs.prices)?;
    let cost_indices = match &inputs.cost_indices {
        Some(path) => load_cost_indices(path)?,
        None => HashMap::new(),
    };

    let merge_inputs = MergeInputs {
        blueprints: &sde,
        prices: &prices,
        cost_indices: &cost_indices,
    };
    run(&plan, &merge_inputs)
}

fn load_capacities(path: &Path, config: &PlannerConfig) -> Result<Vec<CharacterCapacity>> {
    let mut roster = load_characters(path)?;
    roster.retain_skills(&config.slots.relevant_skills());
    Ok(build_character_capacities(
        &roster.names,
        &roster.skills,
        &roster.slot_usage,
        &config.slots,
    ))
}

fn run_transport(method: TransportCommand, config: &PlannerConfig) -> Result<()> {
    let cost = match method {
        TransportCommand::Gate {
            volume,
            collateral,
            jumps,
            profile,
        } => {
            let profile = config.profile(&profile)?;
            gate_transport_cost(
                volume,
                collateral,
                jumps,
                profile.rate_per_m3_per_jump,
                profile.collateral_rate,
            )
        }

        TransportCommand::Courier {
            volume,
            collateral,
            profile,
        } => {
            let profile = config.profile(&profile)?;
            courier_cost(
                volume,
                collateral,
                profile.courier_rate_per_m3,
                profile.courier_collateral_rate,
            )
        }

        TransportCommand::Jf {
            collateral,
            systems,
            conservation,
            isotope_price,
            prices,
            sde,
            profile,
        } => {
            let profile = config.profile(&profile)?;
            let sde = SdeDatabase::open(&sde)?;
            let route = JfRoute::from_systems(&sde, &systems)?;

            let isotope_price = match (isotope_price, prices) {
                (Some(price), _) => price,
                (None, Some(path)) => {
                    let snapshot: PriceSnapshot = load_prices(&path)?;
                    let isotope = profile
                        .isotope_type_id
                        .with_context(|| format!("Profile {} has no isotope type", profile.name))?;
                    snapshot
                        .unit_price(isotope, config.price_basis)
                        .with_context(|| format!("No price for isotope type {}", isotope))?
                }
                (None, None) => 0.0,
            };

            let fuel = JumpFuel {
                fuel_per_ly: profile.fuel_per_ly,
                conservation_factor: config.fuel.conservation_factor(conservation),
                isotope_price,
            };
            println!(
                "Route: {} jumps, {:.2} ly",
                route.jumps(),
                route.total_distance_ly()
            );
            jump_freighter_cost(&route, &fuel, collateral, profile.collateral_rate)
        }
    };

    println!("Cost: {} ISK", format_isk(cost));
    Ok(())
}

fn print_report(report: &PlanReport) {
    let merge = &report.merge;
    println!(
        "Plan {} x{}: {} jobs, {} purchases, {} skipped",
        report.plan_id,
        report.target_quantity,
        merge.jobs.len(),
        merge.purchases.len(),
        merge.skipped.len()
    );

    println!("\nJobs (deepest first):");
    for job in &merge.jobs {
        println!(
            "  [{}] {} {:>6} runs  {:>10}  {} ISK",
            job.depth,
            job.product_type_id,
            job.runs,
            format_duration(job.estimated_duration_secs),
            format_isk(job.estimated_cost)
        );
    }

    if !merge.purchases.is_empty() {
        println!("\nPurchases:");
        for purchase in &merge.purchases {
            println!(
                "  {} x{}  {} ISK",
                purchase.type_id,
                purchase.quantity,
                format_isk(purchase.total_cost())
            );
        }
    }

    if !merge.skipped.is_empty() {
        println!("\nSkipped:");
        for skipped in &merge.skipped {
            println!(
                "  step {} (type {}): {}",
                skipped.step_id,
                skipped.type_id,
                skipped.reason_text()
            );
        }
    }

    if !report.transport.is_empty() {
        println!("\nTransport:");
        for job in &report.transport {
            println!(
                "  {} -> {}  {:.1} m3 in {} trip(s)  {} ISK",
                job.from,
                job.to,
                job.total_volume_m3,
                job.trips,
                format_isk(job.cost)
            );
        }
    }

    if let Some(schedule) = &report.schedule {
        println!(
            "\nSchedule over {} worker(s): {} wall clock",
            schedule.parallelism,
            format_duration(schedule.wall_clock_secs)
        );
        for worker in &schedule.workers {
            println!(
                "  {:<24} {:>3} job(s)  {}",
                worker.name,
                worker.fragments,
                format_duration(worker.committed_secs)
            );
        }
        if schedule.assignment.unassigned_runs > 0 {
            println!(
                "  {} run(s) could not be assigned",
                schedule.assignment.unassigned_runs
            );
        }
    }

    println!(
        "\nProduction: {} ISK, transport: {} ISK",
        format_isk(report.production_cost()),
        format_isk(report.transport_cost())
    );
}

fn format_duration(secs: u64) -> String {
    let (days, rest) = (secs / 86_400, secs % 86_400);
    let (hours, rest) = (rest / 3_600, rest % 3_600);
    let minutes = rest / 60;
    if days > 0 {
        format!("{}d {:02}h {:02}m", days, hours, minutes)
    } else {
        format!("{}h {:02}m {:02}s", hours, minutes, rest % 60)
    }
}

fn format_isk(value: f64) -> String {
    format!("{:.2}", value)
}
