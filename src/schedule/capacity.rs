use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::industry::{Activity, TypeId};

/// Worker (character) id; `0` is reserved for unassigned work
pub type CharacterId = i64;

/// Highest trainable skill level
const MAX_SKILL_LEVEL: u8 = 5;

/// Extra slots granted per trained level of a skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillBonus {
    pub skill_type_id: TypeId,
    pub slots_per_level: u32,
}

/// Skill-to-slot formula for one activity: `min(base + Σ level × bonus, max)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRules {
    pub base: u32,
    pub bonuses: Vec<SkillBonus>,
    pub max: u32,
}

impl SlotRules {
    /// Mass Production and Advanced Mass Production
    pub fn manufacturing() -> Self {
        Self {
            base: 1,
            bonuses: vec![
                SkillBonus {
                    skill_type_id: 3387,
                    slots_per_level: 1,
                },
                SkillBonus {
                    skill_type_id: 24625,
                    slots_per_level: 1,
                },
            ],
            max: 11,
        }
    }

    /// Mass Reactions and Advanced Mass Reactions
    pub fn reaction() -> Self {
        Self {
            base: 1,
            bonuses: vec![
                SkillBonus {
                    skill_type_id: 45748,
                    slots_per_level: 1,
                },
                SkillBonus {
                    skill_type_id: 45749,
                    slots_per_level: 1,
                },
            ],
            max: 11,
        }
    }

    /// Slot maximum for a worker with the given skill levels
    pub fn max_slots(&self, skills: &HashMap<TypeId, u8>) -> u32 {
        let bonus: u32 = self
            .bonuses
            .iter()
            .map(|b| {
                let level = skills
                    .get(&b.skill_type_id)
                    .copied()
                    .unwrap_or(0)
                    .min(MAX_SKILL_LEVEL);
                u32::from(level) * b.slots_per_level
            })
            .sum();
        (self.base + bonus).min(self.max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotConfig {
    pub manufacturing: SlotRules,
    pub reaction: SlotRules,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            manufacturing: SlotRules::manufacturing(),
            reaction: SlotRules::reaction(),
        }
    }
}

impl SlotConfig {
    /// Skill type ids the slot formulas read
    pub fn relevant_skills(&self) -> BTreeSet<TypeId> {
        self.manufacturing
            .bonuses
            .iter()
            .chain(&self.reaction.bonuses)
            .map(|b| b.skill_type_id)
            .collect()
    }
}

/// Slots a worker already has occupied by live jobs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotUsage {
    pub manufacturing: u32,
    pub reaction: u32,
}

/// A worker's slot capacity at the start of simulation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterCapacity {
    pub character_id: CharacterId,
    pub name: String,
    pub manufacturing_max: u32,
    pub manufacturing_used: u32,
    pub reaction_max: u32,
    pub reaction_used: u32,
}

impl CharacterCapacity {
    /// Free slots for `activity`
    pub fn available(&self, activity: Activity) -> u32 {
        match activity {
            Activity::Manufacturing => {
                self.manufacturing_max.saturating_sub(self.manufacturing_used)
            }
            Activity::Reaction => self.reaction_max.saturating_sub(self.reaction_used),
        }
    }
}

/// Derive each named worker's capacity, ordered by character id
pub fn build_character_capacities(
    names: &HashMap<CharacterId, String>,
    skills: &HashMap<CharacterId, HashMap<TypeId, u8>>,
    slot_usage: &HashMap<CharacterId, SlotUsage>,
    rules: &SlotConfig,
) -> Vec<CharacterCapacity> {
    let no_skills = HashMap::new();
    let mut capacities: Vec<CharacterCapacity> = names
        .iter()
        .map(|(&character_id, name)| {
            let trained = skills.get(&character_id).unwrap_or(&no_skills);
            let usage = slot_usage.get(&character_id).copied().unwrap_or_default();
            CharacterCapacity {
                character_id,
                name: name.clone(),
                manufacturing_max: rules.manufacturing.max_slots(trained),
                manufacturing_used: usage.manufacturing,
                reaction_max: rules.reaction.max_slots(trained),
                reaction_used: usage.reaction,
            }
        })
        .collect();

    capacities.sort_by_key(|c| c.character_id);
    capacities
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(ids: &[CharacterId]) -> HashMap<CharacterId, String> {
        ids.iter().map(|&id| (id, format!("Pilot {}", id))).collect()
    }

    #[test]
    fn test_untrained_worker_gets_baseline() {
        let caps = build_character_capacities(
            &names(&[7]),
            &HashMap::new(),
            &HashMap::new(),
            &SlotConfig::default(),
        );
        assert_eq!(caps[0].manufacturing_max, 1);
        assert_eq!(caps[0].reaction_max, 1);
        assert_eq!(caps[0].available(Activity::Manufacturing), 1);
    }

    #[test]
    fn test_skills_add_slots_and_usage_subtracts() {
        let mut skills = HashMap::new();
        skills.insert(
            9,
            HashMap::from([(3387, 5u8), (24625, 4u8), (45748, 2u8), (1234, 5u8)]),
        );
        let usage = HashMap::from([(
            9,
            SlotUsage {
                manufacturing: 3,
                reaction: 5,
            },
        )]);
        let caps =
            build_character_capacities(&names(&[9]), &skills, &usage, &SlotConfig::default());
        let cap = &caps[0];
        assert_eq!(cap.manufacturing_max, 10);
        assert_eq!(cap.reaction_max, 3);
        assert_eq!(cap.available(Activity::Manufacturing), 7);
        assert_eq!(cap.available(Activity::Reaction), 0);
    }

    #[test]
    fn test_cap_and_level_clamp() {
        let rules = SlotRules {
            base: 2,
            bonuses: vec![SkillBonus {
                skill_type_id: 1,
                slots_per_level: 3,
            }],
            max: 12,
        };
        assert_eq!(rules.max_slots(&HashMap::from([(1, 9u8)])), 12);
        assert_eq!(rules.max_slots(&HashMap::from([(1, 2u8)])), 8);
    }

    #[test]
    fn test_ordering_is_by_id() {
        let caps = build_character_capacities(
            &names(&[30, 10, 20]),
            &HashMap::new(),
            &HashMap::new(),
            &SlotConfig::default(),
        );
        let ids: Vec<_> = caps.iter().map(|c| c.character_id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }

    #[test]
    fn test_relevant_skills() {
        let ids: Vec<_> = SlotConfig::default().relevant_skills().into_iter().collect();
        assert_eq!(ids, vec![3387, 24625, 45748, 45749]);
    }
}
