//! Turn controller: phase transitions, upkeep, upgrades and victory checks.
use crate::config::CampaignConfig;
use crate::constants::{
    UPGRADE_BASE_GOLD, UPGRADE_BASE_MANA, UPGRADE_BASE_SUPPLIES, UPGRADE_COST_MULTIPLIER,
};
use crate::economy::{self, Resources};
use crate::error::ActionError;
use crate::map::{MapGraph, Node, NodeId, Owner};
use crate::numbers::{floor_scale_pow, ratio};
use crate::policy::{self, PolicyReport};
use crate::state::{GameState, LogKind, Phase};

/// Everything that happened between the player's `end_turn` and their next move.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReport {
    pub policy: PolicyReport,
    pub income: Resources,
    pub winner: Option<Owner>,
}

/// Fail with [`ActionError::InvalidPhase`] unless it is the player's move.
///
/// # Errors
///
/// Returns `InvalidPhase` outside the player phase.
pub const fn ensure_player_phase(state: &GameState) -> Result<(), ActionError> {
    match state.phase {
        Phase::Player => Ok(()),
        phase => Err(ActionError::InvalidPhase { phase }),
    }
}

/// Hand control to the opposing side, run upkeep, and start the next turn.
///
/// The opposing policy always runs to completion. If either side crosses
/// the control threshold during upkeep the game ends and the turn counter
/// stays where it was.
///
/// # Errors
///
/// Returns `InvalidPhase` when called outside the player phase and leaves
/// the state untouched.
pub fn end_turn(state: &mut GameState, config: &CampaignConfig) -> Result<TurnReport, ActionError> {
    ensure_player_phase(state)?;

    state.phase = Phase::Enemy;
    log::info!("turn {}: enemy phase", state.turn);
    state.push_log(LogKind::Info, "Enemy turn begins".to_string());
    let policy = policy::run_enemy_turn(state, config);

    state.phase = Phase::Upkeep;
    let income = economy::collect(state);
    let winner = conclude_if_decided(state, config);

    state.phase = Phase::Player;
    if winner.is_none() {
        state.turn = state.turn.saturating_add(1);
        log::info!("turn {} begins", state.turn);
        state.push_log(
            LogKind::Info,
            format!("Turn {} begins. Your move!", state.turn),
        );
    }
    Ok(TurnReport {
        policy,
        income,
        winner,
    })
}

/// Whether `owner` holds at least `threshold` of all nodes.
#[must_use]
pub fn controls_share(map: &MapGraph, owner: Owner, threshold: f64) -> bool {
    !map.is_empty() && ratio(map.count_owned(owner), map.len()) >= threshold
}

/// The player holds at least 70% of the map.
#[must_use]
pub fn check_victory_condition(map: &MapGraph) -> bool {
    controls_share(
        map,
        Owner::Player,
        CampaignConfig::default_victory_control_ratio(),
    )
}

/// The side holding at least `threshold` of the map, player checked first.
#[must_use]
pub fn determine_winner(map: &MapGraph, threshold: f64) -> Option<Owner> {
    [Owner::Player, Owner::Enemy]
        .into_iter()
        .find(|&owner| controls_share(map, owner, threshold))
}

/// Mark the game as over if a side has won. Returns the winner, if any.
pub(crate) fn conclude_if_decided(state: &mut GameState, config: &CampaignConfig) -> Option<Owner> {
    if state.game_over {
        return state.winner;
    }
    let winner = determine_winner(&state.map, config.victory_control_ratio)?;
    state.game_over = true;
    state.winner = Some(winner);
    log::info!("campaign decided on turn {}: {winner} wins", state.turn);
    let (kind, message) = if winner == Owner::Player {
        (
            LogKind::Victory,
            "Victory! Aeloria bows to your banner.".to_string(),
        )
    } else {
        (
            LogKind::Defeat,
            "Defeat! The enemy has conquered Aeloria.".to_string(),
        )
    };
    state.push_log(kind, message);
    Some(winner)
}

/// Cost to raise `node` one tier, or `None` at the cap.
#[must_use]
pub fn upgrade_cost(node: &Node) -> Option<Resources> {
    if !node.can_upgrade() {
        return None;
    }
    let steps = node.tier().saturating_sub(1);
    Some(Resources::new(
        floor_scale_pow(UPGRADE_BASE_GOLD, UPGRADE_COST_MULTIPLIER, steps),
        floor_scale_pow(UPGRADE_BASE_SUPPLIES, UPGRADE_COST_MULTIPLIER, steps),
        floor_scale_pow(UPGRADE_BASE_MANA, UPGRADE_COST_MULTIPLIER, steps),
    ))
}

/// Pay for and apply one tier on a player-held node.
///
/// # Errors
///
/// Fails without mutating when the node is unknown, not the player's,
/// already at the top tier, or the ledger cannot cover the cost.
pub fn upgrade_node(
    state: &mut GameState,
    node_id: NodeId,
    config: &CampaignConfig,
) -> Result<Resources, ActionError> {
    let node = state
        .map
        .node(node_id)
        .ok_or(ActionError::UnknownNode(node_id))?;
    if node.owner != Owner::Player {
        return Err(ActionError::InvalidTarget {
            reason: "you can only upgrade nodes you hold",
        });
    }
    let cost = upgrade_cost(node).ok_or(ActionError::TierCapped { node: node_id })?;
    let remaining = state
        .resources
        .checked_sub(cost)
        .ok_or_else(|| ActionError::insufficient(cost, state.resources))?;

    state.resources = remaining;
    let Some(node) = state.map.node_mut(node_id) else {
        return Err(ActionError::UnknownNode(node_id));
    };
    node.raise_tier();
    node.garrison = node.garrison.saturating_add(config.upgrade_garrison_bonus);
    let (kind, tier) = (node.kind, node.tier());
    log::debug!("node {node_id} upgraded to tier {tier} for {cost}");
    state.push_log(LogKind::Info, format!("Upgraded {kind} to tier {tier}"));
    Ok(cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_TIER;

    fn fresh() -> GameState {
        GameState::new_campaign(11, &CampaignConfig::default())
    }

    #[test]
    fn end_turn_cycles_back_to_player() {
        let mut state = fresh();
        let report = end_turn(&mut state, &CampaignConfig::default()).unwrap();
        assert_eq!(state.turn, 2);
        assert_eq!(state.phase, Phase::Player);
        assert_eq!(report.income, Resources::new(100, 50, 0));
        assert_eq!(state.resources, Resources::new(600, 150, 50));
        assert!(report.winner.is_none());
        let messages: Vec<&str> = state.battle_log.iter().map(|e| e.message.as_str()).collect();
        assert!(messages.contains(&"Enemy turn begins"));
        assert_eq!(messages.last(), Some(&"Turn 2 begins. Your move!"));
    }

    #[test]
    fn end_turn_outside_player_phase_is_rejected() {
        let mut state = fresh();
        state.phase = Phase::Enemy;
        let before = state.clone();
        let err = end_turn(&mut state, &CampaignConfig::default()).unwrap_err();
        assert_eq!(err, ActionError::InvalidPhase {
            phase: Phase::Enemy
        });
        assert_eq!(err.to_string(), "not your turn (phase is enemy)");
        assert_eq!(state, before);
    }

    #[test]
    fn victory_needs_seventy_percent() {
        let mut map = crate::map::generate_canonical_map();
        for id in 1..=6 {
            map.node_mut(id).unwrap().owner = Owner::Player;
        }
        assert!(!check_victory_condition(&map));
        assert_eq!(determine_winner(&map, 0.7), None);
        map.node_mut(9).unwrap().owner = Owner::Player;
        assert!(check_victory_condition(&map));
        assert_eq!(determine_winner(&map, 0.7), Some(Owner::Player));
    }

    #[test]
    fn enemy_domination_ends_the_game_at_upkeep() {
        let mut state = fresh();
        for id in 2..=6 {
            state.map.node_mut(id).unwrap().owner = Owner::Enemy;
        }
        let report = end_turn(&mut state, &CampaignConfig::default()).unwrap();
        assert_eq!(report.winner, Some(Owner::Enemy));
        assert!(state.game_over);
        assert_eq!(state.winner, Some(Owner::Enemy));
        assert_eq!(state.turn, 1);
        assert_eq!(state.battle_log.last().unwrap().kind, LogKind::Defeat);
    }

    #[test]
    fn upgrade_cost_follows_curve() {
        let state = fresh();
        let city = state.map.node(1).unwrap();
        assert_eq!(upgrade_cost(city), Some(Resources::new(100, 50, 25)));
        let stronghold = state.map.node(10).unwrap();
        assert_eq!(upgrade_cost(stronghold), Some(Resources::new(225, 112, 56)));
    }

    #[test]
    fn upgrade_raises_tier_and_garrison() {
        let mut state = fresh();
        let cost = upgrade_node(&mut state, 1, &CampaignConfig::default()).unwrap();
        assert_eq!(cost, Resources::new(100, 50, 25));
        assert_eq!(state.resources, Resources::new(400, 50, 25));
        let city = state.map.node(1).unwrap();
        assert_eq!(city.tier(), 2);
        assert_eq!(city.garrison, 130);
    }

    #[test]
    fn upgrade_failures_leave_state_untouched() {
        let mut state = fresh();
        let config = CampaignConfig::default();
        let before = state.clone();
        assert!(matches!(
            upgrade_node(&mut state, 7, &config),
            Err(ActionError::InvalidTarget { .. })
        ));
        state.resources = Resources::new(0, 0, 0);
        let poor = state.clone();
        assert!(matches!(
            upgrade_node(&mut state, 1, &config),
            Err(ActionError::InsufficientResources { .. })
        ));
        assert_eq!(state, poor);
        state = before;
        state.resources = Resources::new(10_000, 10_000, 10_000);
        for _ in 1..MAX_TIER {
            upgrade_node(&mut state, 1, &config).unwrap();
        }
        let capped = state.clone();
        assert_eq!(
            upgrade_node(&mut state, 1, &config),
            Err(ActionError::TierCapped { node: 1 })
        );
        assert_eq!(state, capped);
    }
}
