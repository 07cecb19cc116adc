//! Commander roster: recruitment, stationing and the display-only garrison bonus.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::COMMANDER_LEVEL_POWER;
use crate::economy::Resources;
use crate::error::ActionError;
use crate::map::{Node, NodeId, Owner};
use crate::state::{GameState, LogKind};

/// Stable identifier of a commander.
pub type CommanderId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommanderClass {
    Knight,
    Mage,
    Ranger,
    Warlord,
}

/// Base statistics and recruitment price of a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassStats {
    pub health: u32,
    pub attack: u32,
    pub defense: u32,
    pub cost: u32,
}

impl CommanderClass {
    pub const ALL: [Self; 4] = [Self::Knight, Self::Mage, Self::Ranger, Self::Warlord];

    #[must_use]
    pub const fn stats(self) -> ClassStats {
        match self {
            Self::Knight => ClassStats {
                health: 120,
                attack: 80,
                defense: 100,
                cost: 200,
            },
            Self::Mage => ClassStats {
                health: 80,
                attack: 120,
                defense: 60,
                cost: 250,
            },
            Self::Ranger => ClassStats {
                health: 100,
                attack: 100,
                defense: 80,
                cost: 180,
            },
            Self::Warlord => ClassStats {
                health: 110,
                attack: 90,
                defense: 90,
                cost: 300,
            },
        }
    }

    /// Gold price paid by the player to recruit this class.
    #[must_use]
    pub const fn cost(self) -> u32 {
        self.stats().cost
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Knight => "Knight",
            Self::Mage => "Mage",
            Self::Ranger => "Ranger",
            Self::Warlord => "Warlord",
        }
    }
}

impl fmt::Display for CommanderClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Race {
    Human,
    Elf,
    Orc,
    Undead,
}

impl Race {
    pub const ALL: [Self; 4] = [Self::Human, Self::Elf, Self::Orc, Self::Undead];

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Human => "Human",
            Self::Elf => "Elf",
            Self::Orc => "Orc",
            Self::Undead => "Undead",
        }
    }
}

impl fmt::Display for Race {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Troops led by a commander.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Army {
    pub soldiers: u32,
    pub archers: u32,
    pub cavalry: u32,
    pub mages: u32,
}

impl Army {
    #[must_use]
    pub const fn new(soldiers: u32, archers: u32, cavalry: u32, mages: u32) -> Self {
        Self {
            soldiers,
            archers,
            cavalry,
            mages,
        }
    }

    /// Composition every freshly recruited commander starts with.
    #[must_use]
    pub const fn starting() -> Self {
        Self::new(20, 10, 5, 2)
    }

    #[must_use]
    pub const fn total(&self) -> u32 {
        self.soldiers
            .saturating_add(self.archers)
            .saturating_add(self.cavalry)
            .saturating_add(self.mages)
    }

    /// Remove casualties, never dropping below zero.
    pub fn apply_losses(&mut self, losses: &Self) {
        self.soldiers = self.soldiers.saturating_sub(losses.soldiers);
        self.archers = self.archers.saturating_sub(losses.archers);
        self.cavalry = self.cavalry.saturating_sub(losses.cavalry);
        self.mages = self.mages.saturating_sub(losses.mages);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commander {
    pub id: CommanderId,
    pub name: String,
    pub class: CommanderClass,
    pub race: Race,
    pub level: u32,
    pub experience: u32,
    pub health: u32,
    pub max_health: u32,
    pub attack: u32,
    pub defense: u32,
    #[serde(default)]
    pub assigned_node: Option<NodeId>,
    pub army: Army,
    pub owner: Owner,
}

impl Commander {
    /// A level-one commander built from the class table, not stationed anywhere.
    #[must_use]
    pub fn new(id: CommanderId, class: CommanderClass, race: Race, owner: Owner) -> Self {
        let stats = class.stats();
        Self {
            id,
            name: format!("{race} {class}"),
            class,
            race,
            level: 1,
            experience: 0,
            health: stats.health,
            max_health: stats.health,
            attack: stats.attack,
            defense: stats.defense,
            assigned_node: None,
            army: Army::starting(),
            owner,
        }
    }

    /// Contribution to the displayed garrison of the node it stands on.
    #[must_use]
    pub const fn power_level(&self) -> u32 {
        self.attack
            .saturating_add(self.defense)
            .saturating_add(self.level.saturating_mul(COMMANDER_LEVEL_POWER))
    }

    #[must_use]
    pub fn is_stationed_at(&self, node: NodeId) -> bool {
        self.assigned_node == Some(node)
    }
}

/// Garrison as shown to the player; combat never reads this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveGarrison {
    pub base: u32,
    pub commander_bonus: u32,
    pub total: u32,
}

/// Base garrison plus the power of every commander stationed at `node`.
#[must_use]
pub fn effective_garrison(node: &Node, commanders: &[Commander]) -> EffectiveGarrison {
    let commander_bonus = commanders
        .iter()
        .filter(|commander| commander.is_stationed_at(node.id))
        .map(Commander::power_level)
        .fold(0u32, u32::saturating_add);
    EffectiveGarrison {
        base: node.garrison,
        commander_bonus,
        total: node.garrison.saturating_add(commander_bonus),
    }
}

/// Number of commanders currently stationed at `node`.
#[must_use]
pub fn stationed_count(commanders: &[Commander], node: NodeId) -> usize {
    commanders
        .iter()
        .filter(|commander| commander.is_stationed_at(node))
        .count()
}

fn next_commander_id(commanders: &[Commander]) -> CommanderId {
    commanders
        .iter()
        .map(|commander| commander.id)
        .max()
        .unwrap_or(0)
        .saturating_add(1)
}

/// Recruit a player commander, paying the class cost in gold.
///
/// # Errors
///
/// Returns [`ActionError::InsufficientResources`] without touching the state
/// when the player cannot afford the class.
pub fn recruit(
    state: &mut GameState,
    class: CommanderClass,
    race: Race,
) -> Result<CommanderId, ActionError> {
    let cost = Resources::new(class.cost(), 0, 0);
    let Some(remaining) = state.resources.checked_sub(cost) else {
        return Err(ActionError::insufficient(
            format!("{} gold", cost.gold),
            format!("{} gold", state.resources.gold),
        ));
    };
    state.resources = remaining;
    let commander = Commander::new(
        next_commander_id(&state.commanders),
        class,
        race,
        Owner::Player,
    );
    let id = commander.id;
    log::debug!("recruited commander {id} ({})", commander.name);
    state.push_log(
        LogKind::Recruitment,
        format!("Recruited {} for {} gold", commander.name, cost.gold),
    );
    state.commanders.push(commander);
    Ok(id)
}

/// Add a commander for a side without charging the player ledger.
pub(crate) fn spawn(
    state: &mut GameState,
    class: CommanderClass,
    race: Race,
    owner: Owner,
) -> CommanderId {
    let commander = Commander::new(next_commander_id(&state.commanders), class, race, owner);
    let id = commander.id;
    state.commanders.push(commander);
    id
}

/// Station a player commander at a player-owned node.
///
/// Moving a commander that is already stationed elsewhere is allowed; the
/// capacity check only counts the other commanders at the target.
///
/// # Errors
///
/// Fails when either id is unknown, the commander or node is not the
/// player's, or the node is already full.
pub fn assign(
    state: &mut GameState,
    commander_id: CommanderId,
    node_id: NodeId,
) -> Result<(), ActionError> {
    station(state, commander_id, node_id, Owner::Player)
}

pub(crate) fn station(
    state: &mut GameState,
    commander_id: CommanderId,
    node_id: NodeId,
    side: Owner,
) -> Result<(), ActionError> {
    let node = state
        .map
        .node(node_id)
        .ok_or(ActionError::UnknownNode(node_id))?;
    let (kind, owner) = (node.kind, node.owner);
    let commander = state
        .commanders
        .iter()
        .find(|commander| commander.id == commander_id)
        .ok_or(ActionError::UnknownCommander(commander_id))?;
    if commander.owner != side {
        return Err(ActionError::InvalidTarget {
            reason: "commander belongs to another side",
        });
    }
    if owner != side {
        return Err(ActionError::InvalidTarget {
            reason: "node is not held by the commander's side",
        });
    }
    if commander.is_stationed_at(node_id) {
        return Ok(());
    }
    let capacity = kind.commander_capacity();
    if stationed_count(&state.commanders, node_id) >= capacity {
        return Err(ActionError::CapacityExceeded {
            node: node_id,
            capacity,
        });
    }

    let mut name = String::new();
    if let Some(commander) = state
        .commanders
        .iter_mut()
        .find(|commander| commander.id == commander_id)
    {
        commander.assigned_node = Some(node_id);
        name.clone_from(&commander.name);
    }
    if side == Owner::Player {
        state.push_log(LogKind::Info, format!("{name} stationed at {kind}"));
    }
    Ok(())
}

/// Clear a commander's station. Returns whether anything changed.
pub fn unassign(state: &mut GameState, commander_id: CommanderId) -> bool {
    let Some(commander) = state
        .commanders
        .iter_mut()
        .find(|commander| commander.id == commander_id)
    else {
        return false;
    };
    let Some(node_id) = commander.assigned_node.take() else {
        return false;
    };
    let name = commander.name.clone();
    let place = state
        .map
        .node(node_id)
        .map_or("an unknown post", |node| node.kind.display_name());
    state.push_log(LogKind::Info, format!("{name} recalled from {place}"));
    true
}

/// Unstation every commander of `former_owner` at a node that changed hands.
pub(crate) fn release_from_captured(state: &mut GameState, node_id: NodeId, former_owner: Owner) {
    for commander in &mut state.commanders {
        if commander.owner == former_owner && commander.is_stationed_at(node_id) {
            commander.assigned_node = None;
            log::debug!("commander {} lost its post at node {node_id}", commander.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CampaignConfig;

    fn fresh() -> GameState {
        GameState::new_campaign(7, &CampaignConfig::default())
    }

    #[test]
    fn knight_recruitment_costs_two_hundred() {
        let mut state = fresh();
        let id = recruit(&mut state, CommanderClass::Knight, Race::Human).unwrap();
        assert_eq!(state.resources.gold, 300);
        let knight = state.commanders.iter().find(|c| c.id == id).unwrap();
        assert_eq!(knight.level, 1);
        assert_eq!(knight.health, 120);
        assert_eq!(knight.max_health, 120);
        assert_eq!(knight.owner, Owner::Player);
        assert_eq!(knight.assigned_node, None);
        assert_eq!(knight.army, Army::new(20, 10, 5, 2));
        assert_eq!(knight.name, "Human Knight");
        assert_eq!(state.battle_log.last().unwrap().kind, LogKind::Recruitment);
    }

    #[test]
    fn unaffordable_recruitment_changes_nothing() {
        let mut state = fresh();
        state.resources.gold = 100;
        let before = state.clone();
        let err = recruit(&mut state, CommanderClass::Warlord, Race::Elf).unwrap_err();
        assert!(matches!(err, ActionError::InsufficientResources { .. }));
        assert_eq!(state, before);
    }

    #[test]
    fn ids_continue_after_highest() {
        let mut state = fresh();
        let highest = state.commanders.iter().map(|c| c.id).max().unwrap();
        let id = recruit(&mut state, CommanderClass::Ranger, Race::Elf).unwrap();
        assert_eq!(id, highest + 1);
    }

    #[test]
    fn assign_rejects_foreign_nodes() {
        let mut state = fresh();
        let id = recruit(&mut state, CommanderClass::Ranger, Race::Elf).unwrap();
        let err = assign(&mut state, id, 7).unwrap_err();
        assert!(matches!(err, ActionError::InvalidTarget { .. }));
        assert_eq!(err, ActionError::InvalidTarget {
            reason: "node is not held by the commander's side"
        });
        assert!(assign(&mut state, id, 99).is_err());
        assert!(assign(&mut state, 999, 1).is_err());
    }

    #[test]
    fn assign_respects_capacity() {
        let mut state = fresh();
        state.resources.gold = 10_000;
        // Node 2 is a resource node with room for two.
        state.map.node_mut(2).unwrap().owner = Owner::Player;
        let ids: Vec<_> = (0..3)
            .map(|_| recruit(&mut state, CommanderClass::Ranger, Race::Human).unwrap())
            .collect();
        assign(&mut state, ids[0], 2).unwrap();
        assign(&mut state, ids[1], 2).unwrap();
        let err = assign(&mut state, ids[2], 2).unwrap_err();
        assert_eq!(err, ActionError::CapacityExceeded {
            node: 2,
            capacity: 2
        });
        let third = state.commanders.iter().find(|c| c.id == ids[2]).unwrap();
        assert_eq!(third.assigned_node, None);
        assert_eq!(stationed_count(&state.commanders, 2), 2);
    }

    #[test]
    fn reassigning_in_place_is_a_no_op() {
        let mut state = fresh();
        let id = recruit(&mut state, CommanderClass::Mage, Race::Undead).unwrap();
        assign(&mut state, id, 1).unwrap();
        let log_len = state.battle_log.len();
        assign(&mut state, id, 1).unwrap();
        assert_eq!(state.battle_log.len(), log_len);
    }

    #[test]
    fn unassign_clears_only_when_set() {
        let mut state = fresh();
        let id = recruit(&mut state, CommanderClass::Mage, Race::Undead).unwrap();
        assert!(!unassign(&mut state, id));
        assign(&mut state, id, 1).unwrap();
        assert!(unassign(&mut state, id));
        assert!(state.commanders.iter().all(|c| c.id != id || c.assigned_node.is_none()));
        assert!(!unassign(&mut state, 12345));
    }

    #[test]
    fn effective_garrison_adds_power_levels() {
        let mut state = fresh();
        let id = recruit(&mut state, CommanderClass::Knight, Race::Human).unwrap();
        assign(&mut state, id, 1).unwrap();
        let node = state.map.node(1).unwrap();
        let shown = effective_garrison(node, &state.commanders);
        assert_eq!(shown.base, 100);
        // 80 attack + 100 defense + 15 per level
        assert_eq!(shown.commander_bonus, 195);
        assert_eq!(shown.total, 295);
    }

    #[test]
    fn losses_saturate_at_zero() {
        let mut army = Army::new(3, 10, 0, 1);
        army.apply_losses(&Army::new(5, 2, 1, 0));
        assert_eq!(army, Army::new(0, 8, 0, 1));
        assert_eq!(army.total(), 9);
    }
}
