//! Resource ledger: stockpiles and per-turn income from owned nodes.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::map::{MapGraph, NodeKind, Owner};
use crate::state::{GameState, LogKind};

/// Gold, supplies and mana held by a side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resources {
    pub gold: u32,
    pub supplies: u32,
    pub mana: u32,
}

impl Resources {
    #[must_use]
    pub const fn new(gold: u32, supplies: u32, mana: u32) -> Self {
        Self {
            gold,
            supplies,
            mana,
        }
    }

    /// True when every component covers `cost`.
    #[must_use]
    pub const fn covers(&self, cost: &Self) -> bool {
        self.gold >= cost.gold && self.supplies >= cost.supplies && self.mana >= cost.mana
    }

    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self {
            gold: self.gold.saturating_add(other.gold),
            supplies: self.supplies.saturating_add(other.supplies),
            mana: self.mana.saturating_add(other.mana),
        }
    }

    /// Subtract `cost`, or `None` if any component would go negative.
    #[must_use]
    pub fn checked_sub(self, cost: Self) -> Option<Self> {
        Some(Self {
            gold: self.gold.checked_sub(cost.gold)?,
            supplies: self.supplies.checked_sub(cost.supplies)?,
            mana: self.mana.checked_sub(cost.mana)?,
        })
    }
}

impl fmt::Display for Resources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} gold, {} supplies, {} mana",
            self.gold, self.supplies, self.mana
        )
    }
}

/// Per-turn yield of a node kind.
#[must_use]
pub const fn production(kind: NodeKind) -> Resources {
    match kind {
        NodeKind::City => Resources::new(100, 50, 0),
        NodeKind::Resource => Resources::new(50, 100, 25),
        NodeKind::Fortress => Resources::new(25, 25, 0),
        NodeKind::Shrine => Resources::new(0, 0, 100),
        NodeKind::Stronghold => Resources::new(150, 75, 50),
    }
}

/// Sum the production of every node held by `owner`.
#[must_use]
pub fn income(map: &MapGraph, owner: Owner) -> Resources {
    map.nodes_owned_by(owner)
        .map(|node| production(node.kind))
        .fold(Resources::default(), Resources::saturating_add)
}

/// Credit the player's income to the ledger and log the amounts.
///
/// Runs once per full turn cycle, after the opposing turn resolves.
pub fn collect(state: &mut GameState) -> Resources {
    let gained = income(&state.map, Owner::Player);
    state.resources = state.resources.saturating_add(gained);
    log::info!("upkeep on turn {}: collected {gained}", state.turn);
    state.push_log(
        LogKind::Info,
        format!(
            "Income: +{} gold, +{} supplies, +{} mana",
            gained.gold, gained.supplies, gained.mana
        ),
    );
    gained
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CampaignConfig;
    use crate::map::generate_canonical_map;

    #[test]
    fn canonical_income_per_side() {
        let map = generate_canonical_map();
        assert_eq!(income(&map, Owner::Player), Resources::new(100, 50, 0));
        // City + Fortress + Resource + Stronghold
        assert_eq!(income(&map, Owner::Enemy), Resources::new(325, 250, 75));
    }

    #[test]
    fn collect_credits_player_and_logs_amounts() {
        let mut state = GameState::new_campaign(1, &CampaignConfig::default());
        let before = state.battle_log.len();
        let gained = collect(&mut state);
        assert_eq!(gained, Resources::new(100, 50, 0));
        assert_eq!(state.resources, Resources::new(600, 150, 50));
        assert_eq!(state.battle_log.len(), before + 1);
        let entry = state.battle_log.last().unwrap();
        assert_eq!(entry.kind, LogKind::Info);
        assert!(entry.message.contains("+100 gold"));
        assert!(entry.message.contains("+50 supplies"));
    }

    #[test]
    fn checked_sub_refuses_overdraft() {
        let wallet = Resources::new(100, 10, 0);
        assert_eq!(
            wallet.checked_sub(Resources::new(50, 10, 0)),
            Some(Resources::new(50, 0, 0))
        );
        assert!(wallet.checked_sub(Resources::new(0, 0, 1)).is_none());
        assert!(!wallet.covers(&Resources::new(101, 0, 0)));
    }
}
