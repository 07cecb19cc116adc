use std::fmt;

use aeloria_game::commander::stationed_count;
use aeloria_game::{
    CommanderClass, CommanderId, GameState, NodeId, Owner, Race, attackable_targets,
    resolve_battle, upgrade_cost,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// One step a scripted player can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    Recruit(CommanderClass, Race),
    Assign { commander: CommanderId, node: NodeId },
    Unassign(CommanderId),
    Upgrade(NodeId),
    Attack { from: NodeId, target: NodeId },
    EndTurn,
}

impl fmt::Display for PlayerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recruit(class, race) => write!(f, "recruit {race} {class}"),
            Self::Assign { commander, node } => write!(f, "assign {commander} -> {node}"),
            Self::Unassign(commander) => write!(f, "unassign {commander}"),
            Self::Upgrade(node) => write!(f, "upgrade {node}"),
            Self::Attack { from, target } => write!(f, "attack {from} -> {target}"),
            Self::EndTurn => f.write_str("end turn"),
        }
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Pick the next action. Returning `EndTurn` hands control to the opposing side.
    fn next_action(&mut self, state: &GameState) -> PlayerAction;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameplayStrategy {
    Passive,
    Aggressive,
    Builder,
    Chaos,
}

impl GameplayStrategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Passive => "Passive",
            Self::Aggressive => "Aggressive",
            Self::Builder => "Builder",
            Self::Chaos => "Chaos",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy> {
        match self {
            Self::Passive => Box::new(PassivePolicy),
            Self::Aggressive => Box::new(AggressivePolicy { roster_cap: 4 }),
            Self::Builder => Box::new(BuilderPolicy),
            Self::Chaos => Box::new(ChaosPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct PassivePolicy;

struct AggressivePolicy {
    roster_cap: usize,
}

struct BuilderPolicy;

struct ChaosPolicy {
    rng: ChaCha20Rng,
}

impl ChaosPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed ^ 0xC4A0_5EED),
        }
    }
}

/// First attack the player-side rule predicts as a win.
fn winnable_attack(state: &GameState) -> Option<PlayerAction> {
    state.map.nodes_owned_by(Owner::Player).find_map(|from| {
        attackable_targets(state, from.id).into_iter().find_map(|target| {
            let defender = state.map.node(target)?;
            resolve_battle(from, defender)
                .victory
                .then_some(PlayerAction::Attack {
                    from: from.id,
                    target,
                })
        })
    })
}

/// An idle player commander and a held node with room for it.
fn idle_assignment(state: &GameState) -> Option<PlayerAction> {
    let commander = state
        .commanders_of(Owner::Player)
        .find(|commander| commander.assigned_node.is_none())?;
    let node = state
        .map
        .nodes_owned_by(Owner::Player)
        .filter(|node| stationed_count(&state.commanders, node.id) < node.kind.commander_capacity())
        .max_by_key(|node| node.garrison)?;
    Some(PlayerAction::Assign {
        commander: commander.id,
        node: node.id,
    })
}

/// Cheapest affordable upgrade on a held node.
fn affordable_upgrade(state: &GameState) -> Option<PlayerAction> {
    state
        .map
        .nodes_owned_by(Owner::Player)
        .filter_map(|node| upgrade_cost(node).map(|cost| (node.id, cost)))
        .filter(|(_, cost)| state.resources.covers(cost))
        .min_by_key(|(id, cost)| (cost.gold, *id))
        .map(|(id, _)| PlayerAction::Upgrade(id))
}

impl PlayerPolicy for PassivePolicy {
    fn name(&self) -> &'static str {
        "passive"
    }

    fn next_action(&mut self, _state: &GameState) -> PlayerAction {
        PlayerAction::EndTurn
    }
}

impl PlayerPolicy for AggressivePolicy {
    fn name(&self) -> &'static str {
        "aggressive"
    }

    fn next_action(&mut self, state: &GameState) -> PlayerAction {
        if let Some(attack) = winnable_attack(state) {
            return attack;
        }
        if state.commanders_of(Owner::Player).count() < self.roster_cap
            && state.resources.gold >= CommanderClass::Knight.cost()
        {
            return PlayerAction::Recruit(CommanderClass::Knight, Race::Human);
        }
        if let Some(assign) = idle_assignment(state) {
            return assign;
        }
        affordable_upgrade(state).unwrap_or(PlayerAction::EndTurn)
    }
}

impl PlayerPolicy for BuilderPolicy {
    fn name(&self) -> &'static str {
        "builder"
    }

    fn next_action(&mut self, state: &GameState) -> PlayerAction {
        if let Some(upgrade) = affordable_upgrade(state) {
            return upgrade;
        }
        if let Some(attack) = winnable_attack(state) {
            return attack;
        }
        if state.commanders_of(Owner::Player).count() < 2
            && state.resources.gold >= CommanderClass::Ranger.cost()
        {
            return PlayerAction::Recruit(CommanderClass::Ranger, Race::Elf);
        }
        idle_assignment(state).unwrap_or(PlayerAction::EndTurn)
    }
}

impl PlayerPolicy for ChaosPolicy {
    fn name(&self) -> &'static str {
        "chaos"
    }

    fn next_action(&mut self, state: &GameState) -> PlayerAction {
        let nodes: Vec<NodeId> = state.map.nodes().iter().map(|node| node.id).collect();
        let commanders: Vec<CommanderId> = state.commanders.iter().map(|c| c.id).collect();
        let pick_node = |rng: &mut ChaCha20Rng| {
            if nodes.is_empty() {
                0
            } else {
                nodes[rng.gen_range(0..nodes.len())]
            }
        };
        match self.rng.gen_range(0..8) {
            0 => {
                let class = CommanderClass::ALL[self.rng.gen_range(0..CommanderClass::ALL.len())];
                let race = Race::ALL[self.rng.gen_range(0..Race::ALL.len())];
                PlayerAction::Recruit(class, race)
            }
            1 | 2 if !commanders.is_empty() => PlayerAction::Assign {
                commander: commanders[self.rng.gen_range(0..commanders.len())],
                node: pick_node(&mut self.rng),
            },
            3 if !commanders.is_empty() => {
                PlayerAction::Unassign(commanders[self.rng.gen_range(0..commanders.len())])
            }
            4 => PlayerAction::Upgrade(pick_node(&mut self.rng)),
            5 | 6 => PlayerAction::Attack {
                from: pick_node(&mut self.rng),
                target: pick_node(&mut self.rng),
            },
            _ => PlayerAction::EndTurn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aeloria_game::CampaignConfig;

    #[test]
    fn aggressive_opens_with_a_winnable_attack() {
        let state = GameState::new_campaign(1, &CampaignConfig::default());
        let mut policy = GameplayStrategy::Aggressive.create_policy(1);
        assert_eq!(
            policy.next_action(&state),
            PlayerAction::Attack { from: 1, target: 2 }
        );
    }

    #[test]
    fn builder_prefers_upgrades() {
        let state = GameState::new_campaign(1, &CampaignConfig::default());
        let mut policy = GameplayStrategy::Builder.create_policy(1);
        assert_eq!(policy.next_action(&state), PlayerAction::Upgrade(1));
    }

    #[test]
    fn chaos_is_reproducible() {
        let state = GameState::new_campaign(1, &CampaignConfig::default());
        let mut a = GameplayStrategy::Chaos.create_policy(9);
        let mut b = GameplayStrategy::Chaos.create_policy(9);
        for _ in 0..20 {
            assert_eq!(a.next_action(&state), b.next_action(&state));
        }
    }
}
