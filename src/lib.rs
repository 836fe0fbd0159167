pub mod cli;
pub mod config;
pub mod error;
pub mod industry;
pub mod input;
pub mod logging;
pub mod pipeline;
pub mod schedule;
pub mod sde;
pub mod transport;

pub use cli::{Cli, Commands};
pub use config::PlannerConfig;
pub use error::{PlanError, Result, SkipReason, Skipped};
