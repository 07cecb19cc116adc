//! Aggregate game state and the battle log.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::commander::{self, Commander, CommanderClass, CommanderId};
use crate::config::CampaignConfig;
use crate::economy::Resources;
use crate::map::{MapGraph, NodeId, Owner, generate_canonical_map};

const WELCOME_MESSAGE: &str = "Welcome to Ashes of Aeloria! Begin your conquest by recruiting commanders and expanding your territory.";

/// Opposing commanders placed on the map at the start of every campaign.
const STARTING_ENEMY_COMMANDERS: [(CommanderClass, NodeId); 2] = [
    (CommanderClass::Warlord, 10),
    (CommanderClass::Knight, 8),
];

/// Turn phase. `Upkeep` is entered and left inside a single `end_turn` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Player,
    Enemy,
    Upkeep,
}

impl Phase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Enemy => "enemy",
            Self::Upkeep => "upkeep",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Combat,
    Victory,
    Defeat,
    Recruitment,
}

/// One line of the player-facing battle log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleLogEntry {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub kind: LogKind,
    pub message: String,
}

impl BattleLogEntry {
    #[must_use]
    pub fn now(kind: LogKind, message: String) -> Self {
        Self {
            timestamp: chrono::Utc::now().timestamp_millis(),
            kind,
            message,
        }
    }
}

/// The aggregate root. Owned by a [`crate::Campaign`]; every component
/// borrows it for the duration of a single action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub seed: u64,
    pub turn: u32,
    pub phase: Phase,
    pub resources: Resources,
    pub commanders: Vec<Commander>,
    pub map: MapGraph,
    pub selected_node: Option<NodeId>,
    pub selected_commander: Option<CommanderId>,
    pub game_over: bool,
    pub winner: Option<Owner>,
    pub battle_log: Vec<BattleLogEntry>,
}

impl GameState {
    /// The canonical opening position.
    #[must_use]
    pub fn new_campaign(seed: u64, config: &CampaignConfig) -> Self {
        let mut state = Self {
            seed,
            turn: 1,
            phase: Phase::Player,
            resources: config.starting_resources,
            commanders: Vec::new(),
            map: generate_canonical_map(),
            selected_node: None,
            selected_commander: None,
            game_over: false,
            winner: None,
            battle_log: Vec::new(),
        };
        for (class, post) in STARTING_ENEMY_COMMANDERS {
            let id = commander::spawn(&mut state, class, config.enemy_race, Owner::Enemy);
            if let Some(placed) = state.commanders.iter_mut().find(|c| c.id == id) {
                placed.assigned_node = Some(post);
            }
        }
        state.push_log(LogKind::Info, WELCOME_MESSAGE.to_string());
        state
    }

    pub fn push_log(&mut self, kind: LogKind, message: String) {
        self.battle_log.push(BattleLogEntry::now(kind, message));
    }

    /// Drop all but the newest `cap` log entries.
    pub fn trim_log(&mut self, cap: usize) {
        let excess = self.battle_log.len().saturating_sub(cap);
        if excess > 0 {
            self.battle_log.drain(..excess);
        }
    }

    #[must_use]
    pub fn commander(&self, id: CommanderId) -> Option<&Commander> {
        self.commanders.iter().find(|commander| commander.id == id)
    }

    pub fn commanders_of(&self, owner: Owner) -> impl Iterator<Item = &Commander> {
        self.commanders
            .iter()
            .filter(move |commander| commander.owner == owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_position_matches_reference() {
        let state = GameState::new_campaign(3, &CampaignConfig::default());
        assert_eq!(state.turn, 1);
        assert_eq!(state.phase, Phase::Player);
        assert_eq!(state.resources, Resources::new(500, 100, 50));
        assert_eq!(state.map.len(), 10);
        assert_eq!(state.commanders_of(Owner::Enemy).count(), 2);
        assert_eq!(state.commanders_of(Owner::Player).count(), 0);
        assert!(
            state
                .commanders
                .iter()
                .all(|c| c.assigned_node.is_some_and(|n| state.map.node(n).unwrap().owner == Owner::Enemy))
        );
        assert_eq!(state.battle_log.len(), 1);
        assert!(!state.game_over);
    }

    #[test]
    fn trim_log_keeps_newest() {
        let mut state = GameState::new_campaign(3, &CampaignConfig::default());
        for i in 0..30 {
            state.push_log(LogKind::Info, format!("entry {i}"));
        }
        state.trim_log(20);
        assert_eq!(state.battle_log.len(), 20);
        assert_eq!(state.battle_log.first().unwrap().message, "entry 10");
        assert_eq!(state.battle_log.last().unwrap().message, "entry 29");
    }

    #[test]
    fn log_kind_serializes_lowercase() {
        let entry = BattleLogEntry {
            timestamp: 1,
            kind: LogKind::Recruitment,
            message: "hi".to_string(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "recruitment");
    }
}
