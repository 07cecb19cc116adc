//! Combat resolution.
//!
//! Two rule sets coexist and are deliberately kept apart: player assaults
//! use a flat bonus against raw garrison, while the opposing side weighs
//! tiers on both ends and bleeds garrison on either outcome. Neither reads
//! the commander display bonus.

use crate::commander::{self, Army};
use crate::constants::{
    ENEMY_ATTACK_MULTIPLIER, ENEMY_ATTACKER_TIER_BONUS, ENEMY_CAPTURE_GARRISON_FACTOR,
    ENEMY_DEFEAT_ATTACKER_DECAY, ENEMY_DEFEAT_DEFENDER_DECAY, ENEMY_DEFENDER_TIER_BONUS,
    ENEMY_VICTORY_ATTACKER_DECAY, EXPERIENCE_ON_DEFEAT, EXPERIENCE_ON_VICTORY,
    PLAYER_ATTACK_FLAT_BONUS, PLAYER_CAPTURE_GARRISON_FACTOR,
};
use crate::error::ActionError;
use crate::map::{Node, NodeId, Owner};
use crate::numbers::floor_scale;
use crate::state::{GameState, LogKind};

/// Casualties taken by commanders stationed at the attacking node.
const ATTACKER_LOSSES: Army = Army::new(5, 2, 1, 0);
/// Casualties taken by commanders stationed at the defending node.
const DEFENDER_LOSSES: Army = Army::new(8, 4, 2, 1);

/// Which rule set produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatRule {
    /// Player-initiated: flat bonus versus raw garrison.
    PlayerAssault,
    /// Opposing policy: tier-weighted with garrison decay.
    OpposingAssault,
}

/// Pure result of a clash between two nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BattleOutcome {
    pub rule: CombatRule,
    pub victory: bool,
    pub attacker_strength: f64,
    pub defender_strength: f64,
    /// Garrison of the attacking node after the battle.
    pub attacker_garrison: u32,
    /// Garrison of the defending node after the battle.
    pub defender_garrison: u32,
    pub attacker_losses: Army,
    pub defender_losses: Army,
    pub experience: u32,
}

/// Player assault: `garrison + 50` must exceed the defender's raw garrison.
#[must_use]
pub fn resolve_battle(attacker: &Node, defender: &Node) -> BattleOutcome {
    let attacker_strength = attacker.garrison.saturating_add(PLAYER_ATTACK_FLAT_BONUS);
    let victory = attacker_strength > defender.garrison;
    BattleOutcome {
        rule: CombatRule::PlayerAssault,
        victory,
        attacker_strength: f64::from(attacker_strength),
        defender_strength: f64::from(defender.garrison),
        attacker_garrison: attacker.garrison,
        defender_garrison: if victory {
            floor_scale(defender.garrison, PLAYER_CAPTURE_GARRISON_FACTOR)
        } else {
            defender.garrison
        },
        attacker_losses: ATTACKER_LOSSES,
        defender_losses: DEFENDER_LOSSES,
        experience: if victory {
            EXPERIENCE_ON_VICTORY
        } else {
            EXPERIENCE_ON_DEFEAT
        },
    }
}

/// Opposing assault: tier-weighted strengths with a 10% attacker edge.
#[must_use]
pub fn resolve_opposing_attack(attacker: &Node, defender: &Node) -> BattleOutcome {
    let attacker_strength = attacker
        .garrison
        .saturating_add(u32::from(attacker.tier()) * ENEMY_ATTACKER_TIER_BONUS);
    let defender_strength = defender
        .garrison
        .saturating_add(u32::from(defender.tier()) * ENEMY_DEFENDER_TIER_BONUS);
    let attacker_strength = f64::from(attacker_strength) * ENEMY_ATTACK_MULTIPLIER;
    let defender_strength = f64::from(defender_strength);
    let victory = attacker_strength > defender_strength;
    let (attacker_garrison, defender_garrison) = if victory {
        (
            floor_scale(attacker.garrison, ENEMY_VICTORY_ATTACKER_DECAY),
            floor_scale(attacker.garrison, ENEMY_CAPTURE_GARRISON_FACTOR),
        )
    } else {
        (
            floor_scale(attacker.garrison, ENEMY_DEFEAT_ATTACKER_DECAY),
            floor_scale(defender.garrison, ENEMY_DEFEAT_DEFENDER_DECAY),
        )
    };
    BattleOutcome {
        rule: CombatRule::OpposingAssault,
        victory,
        attacker_strength,
        defender_strength,
        attacker_garrison,
        defender_garrison,
        attacker_losses: Army::default(),
        defender_losses: Army::default(),
        experience: 0,
    }
}

/// A resolved and applied battle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BattleReport {
    pub attacker: NodeId,
    pub target: NodeId,
    /// Owner of the target before the battle.
    pub former_owner: Owner,
    pub outcome: BattleOutcome,
}

/// Adjacent nodes a player-held `from` may attack, ascending by id.
///
/// Empty when `from` is unknown or not the player's.
#[must_use]
pub fn attackable_targets(state: &GameState, from: NodeId) -> Vec<NodeId> {
    if state.map.node(from).is_none_or(|node| node.owner != Owner::Player) {
        return Vec::new();
    }
    state
        .map
        .neighbors(from)
        .into_iter()
        .filter(|&id| state.map.node(id).is_some_and(|node| node.owner != Owner::Player))
        .collect()
}

/// Attack `target` from the player-held node `from`.
///
/// # Errors
///
/// Fails without mutating when either node is unknown, `from` is not the
/// player's, `target` already is, or the two are not adjacent.
pub fn player_attack(
    state: &mut GameState,
    from: NodeId,
    target: NodeId,
) -> Result<BattleReport, ActionError> {
    let attacker = state.map.node(from).ok_or(ActionError::UnknownNode(from))?;
    let defender = state
        .map
        .node(target)
        .ok_or(ActionError::UnknownNode(target))?;
    if attacker.owner != Owner::Player {
        return Err(ActionError::InvalidTarget {
            reason: "attacks must launch from a node you hold",
        });
    }
    if defender.owner == Owner::Player {
        return Err(ActionError::InvalidTarget {
            reason: "cannot attack your own node",
        });
    }
    if !state.map.is_adjacent(from, target) {
        return Err(ActionError::InvalidTarget {
            reason: "target is not adjacent",
        });
    }

    let defender_owner = defender.owner;
    let outcome = resolve_battle(attacker, defender);

    for commander in &mut state.commanders {
        if commander.owner == Owner::Player && commander.is_stationed_at(from) {
            commander.army.apply_losses(&outcome.attacker_losses);
            commander.experience = commander.experience.saturating_add(outcome.experience);
        } else if commander.owner == defender_owner && commander.is_stationed_at(target) {
            commander.army.apply_losses(&outcome.defender_losses);
        }
    }
    Ok(apply(state, from, target, Owner::Player, outcome))
}

/// Attack on behalf of the opposing side. Callers pick valid pairs.
pub(crate) fn opposing_attack(
    state: &mut GameState,
    from: NodeId,
    target: NodeId,
) -> Option<BattleReport> {
    let attacker = state.map.node(from)?;
    let defender = state.map.node(target)?;
    let outcome = resolve_opposing_attack(attacker, defender);
    Some(apply(state, from, target, Owner::Enemy, outcome))
}

fn apply(
    state: &mut GameState,
    from: NodeId,
    target: NodeId,
    side: Owner,
    outcome: BattleOutcome,
) -> BattleReport {
    let mut former_owner = Owner::Neutral;
    let mut attacker_kind = None;
    if let Some(node) = state.map.node_mut(from) {
        node.garrison = outcome.attacker_garrison;
        attacker_kind = Some(node.kind);
    }
    let mut target_kind = None;
    if let Some(node) = state.map.node_mut(target) {
        former_owner = node.owner;
        node.garrison = outcome.defender_garrison;
        if outcome.victory {
            node.owner = side;
        }
        target_kind = Some(node.kind);
    }
    if outcome.victory {
        commander::release_from_captured(state, target, former_owner);
    }

    let attacker_name = attacker_kind.map_or("unknown ground", |kind| kind.display_name());
    let target_name = target_kind.map_or("unknown ground", |kind| kind.display_name());
    log::debug!(
        "{:?}: node {from} ({:.1}) vs node {target} ({:.1}) -> victory={}",
        outcome.rule,
        outcome.attacker_strength,
        outcome.defender_strength,
        outcome.victory
    );
    let (kind, message) = match (side, outcome.victory) {
        (Owner::Enemy, true) if former_owner == Owner::Player => (
            LogKind::Defeat,
            format!("Enemy forces from the {attacker_name} captured your {target_name}!"),
        ),
        (Owner::Enemy, true) => (
            LogKind::Combat,
            format!("Enemy forces from the {attacker_name} seized the {target_name}"),
        ),
        (Owner::Enemy, false) => (
            LogKind::Combat,
            format!("Enemy assault from the {attacker_name} on the {target_name} was repelled"),
        ),
        (_, true) => (
            LogKind::Victory,
            format!("Victory! Captured the {target_name}"),
        ),
        (_, false) => (
            LogKind::Defeat,
            format!("Defeat! Your attack on the {target_name} was repelled"),
        ),
    };
    state.push_log(kind, message);

    BattleReport {
        attacker: from,
        target,
        former_owner,
        outcome,
    }
}
