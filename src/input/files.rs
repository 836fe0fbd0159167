use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::debug;

use crate::industry::{Plan, TypeId};
use crate::schedule::{CharacterId, SlotUsage};

/// Load a plan definition from JSON
pub fn load_plan(path: &Path) -> Result<Plan> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read plan: {:?}", path))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse plan: {:?}", path))
}

#[derive(Debug, Deserialize)]
struct CharacterRecord {
    id: CharacterId,
    name: String,
    #[serde(default)]
    skills: HashMap<TypeId, u8>,
    #[serde(default)]
    slots_used: SlotUsage,
}

/// Worker names, skills and live slot usage keyed by character id
#[derive(Debug, Default)]
pub struct CharacterRoster {
    pub names: HashMap<CharacterId, String>,
    pub skills: HashMap<CharacterId, HashMap<TypeId, u8>>,
    pub slot_usage: HashMap<CharacterId, SlotUsage>,
}

impl CharacterRoster {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Drop every trained skill not in `relevant`
    pub fn retain_skills(&mut self, relevant: &BTreeSet<TypeId>) {
        for trained in self.skills.values_mut() {
            trained.retain(|skill_id, _| relevant.contains(skill_id));
        }
    }
}

/// Load characters from a JSON array
pub fn load_characters(path: &Path) -> Result<CharacterRoster> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read characters: {:?}", path))?;
    let records: Vec<CharacterRecord> = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse characters: {:?}", path))?;

    let mut roster = CharacterRoster::default();
    for record in records {
        roster.names.insert(record.id, record.name);
        roster.skills.insert(record.id, record.skills);
        roster.slot_usage.insert(record.id, record.slots_used);
    }
    debug!(characters = roster.len(), "Loaded characters");
    Ok(roster)
}
