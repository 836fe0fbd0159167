use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "eve-industry-planner")]
#[command(version, about = "Compile EVE Online production plans into scheduled jobs")]
pub struct Cli {
    /// Config file (defaults to the per-user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Data files shared by the planning commands
#[derive(clap::Args, Debug, Clone)]
pub struct PlanInputs {
    /// Plan definition (JSON)
    pub plan: PathBuf,

    /// SDE SQLite database built by eve-sde-to-sqlite
    #[arg(long)]
    pub sde: PathBuf,

    /// Price snapshot (JSONL, one type per line)
    #[arg(long)]
    pub prices: PathBuf,

    /// Facility cost indices (JSON array)
    #[arg(long)]
    pub cost_indices: Option<PathBuf>,

    /// Units of the root product to build
    #[arg(short, long, default_value_t = 1)]
    pub quantity: u64,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Merge a plan into jobs, purchases and cargo legs
    Compile {
        #[command(flatten)]
        inputs: PlanInputs,

        /// Characters to schedule onto (JSON array)
        #[arg(short, long)]
        characters: Option<PathBuf>,

        /// How many characters to use
        #[arg(short, long)]
        parallelism: Option<usize>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Wall-clock estimate at each parallelism level
    Preview {
        #[command(flatten)]
        inputs: PlanInputs,

        /// Characters to schedule onto (JSON array)
        #[arg(short, long)]
        characters: PathBuf,

        /// Highest parallelism to try
        #[arg(short, long)]
        max: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    /// Cost a single haul
    Transport {
        #[command(subcommand)]
        method: TransportCommand,
    },

    /// Print the effective config as JSON
    ShowConfig,
}

#[derive(Subcommand, Debug)]
pub enum TransportCommand {
    /// Freighter through stargates
    Gate {
        #[arg(long)]
        volume: f64,
        #[arg(long, default_value_t = 0.0)]
        collateral: f64,
        #[arg(long)]
        jumps: u32,
        #[arg(long, default_value = "freighter")]
        profile: String,
    },

    /// Contracted courier
    Courier {
        #[arg(long)]
        volume: f64,
        #[arg(long, default_value_t = 0.0)]
        collateral: f64,
        #[arg(long, default_value = "freighter")]
        profile: String,
    },

    /// Jump freighter along a chain of systems
    Jf {
        #[arg(long, default_value_t = 0.0)]
        collateral: f64,

        /// Solar system ids, origin first (comma-separated)
        #[arg(long, value_delimiter = ',', required = true)]
        systems: Vec<i64>,

        /// Jump Fuel Conservation level
        #[arg(long, default_value_t = 5)]
        conservation: u8,

        /// Isotope unit price (overrides --prices)
        #[arg(long)]
        isotope_price: Option<f64>,

        /// Price snapshot to read the isotope price from
        #[arg(long)]
        prices: Option<PathBuf>,

        #[arg(long)]
        sde: PathBuf,

        #[arg(long, default_value = "jump_freighter")]
        profile: String,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compile() {
        let cli = Cli::try_parse_from([
            "eve-industry-planner",
            "-vv",
            "compile",
            "plan.json",
            "--sde",
            "sde.db",
            "--prices",
            "prices.jsonl",
            "-q",
            "10",
            "--parallelism",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Compile { inputs, parallelism, json, .. } => {
                assert_eq!(inputs.quantity, 10);
                assert_eq!(parallelism, Some(3));
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_jf_systems() {
        let cli = Cli::try_parse_from([
            "eve-industry-planner",
            "transport",
            "jf",
            "--systems",
            "30000142,30002187",
            "--sde",
            "sde.db",
        ])
        .unwrap();
        match cli.command {
            Commands::Transport { method: TransportCommand::Jf { systems, conservation, .. } } => {
                assert_eq!(systems, vec![30000142, 30002187]);
                assert_eq!(conservation, 5);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
