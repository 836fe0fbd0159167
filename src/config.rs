use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::industry::{FeeRules, MaterialRules, MergeSettings, PriceBasis, SecurityMultipliers};
use crate::schedule::SlotConfig;
use crate::transport::{FuelRules, TransportProfile};

const CONFIG_FILE: &str = "config.json";

/// Tunable game rules and transport profiles.
///
/// Every field falls back to its default when absent from the file, so a
/// config only needs to name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub slots: SlotConfig,
    pub materials: MaterialRules,
    pub security: SecurityMultipliers,
    pub fees: FeeRules,
    pub fuel: FuelRules,
    pub price_basis: PriceBasis,
    pub transport: Vec<TransportProfile>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            slots: SlotConfig::default(),
            materials: MaterialRules::default(),
            security: SecurityMultipliers::default(),
            fees: FeeRules::default(),
            fuel: FuelRules::default(),
            price_basis: PriceBasis::default(),
            transport: TransportProfile::default_profiles(),
        }
    }
}

impl PlannerConfig {
    /// Load from `custom_path`, else the per-user config file, else defaults
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self> {
        match custom_path {
            Some(path) => Self::from_file(&path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("no config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config: {:?}", path))?;
        debug!(path = ?path, "loaded config");
        Ok(config)
    }

    pub fn merge_settings(&self) -> MergeSettings {
        MergeSettings {
            materials: self.materials,
            security: self.security,
            fees: self.fees,
            price_basis: self.price_basis,
        }
    }

    /// Transport profile by name
    pub fn profile(&self, name: &str) -> Result<&TransportProfile> {
        self.transport
            .iter()
            .find(|p| p.name == name)
            .with_context(|| {
                let known: Vec<&str> = self.transport.iter().map(|p| p.name.as_str()).collect();
                format!("Unknown transport profile: {} (known: {})", name, known.join(", "))
            })
    }
}

/// `<config dir>/eve-industry-planner/config.json` for the current user
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "eve-industry-planner")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
