//! Opposing-side turn procedure.
//!
//! Runs once per opposing turn in a fixed order: income budget, optional
//! recruitment, at most a configured number of attacks, optional upgrade.
//! Every step is gated and silently skipped when its gate is not met.
use hmac::{Hmac, Mac};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;

use crate::combat::{self, BattleReport};
use crate::commander::{self, CommanderClass, CommanderId, stationed_count};
use crate::config::CampaignConfig;
use crate::constants::{ENEMY_TURN_STREAM, PRIORITY_NEUTRAL_TARGET, PRIORITY_PLAYER_TARGET};
use crate::economy::{self, Resources};
use crate::map::{NodeId, Owner};
use crate::state::{GameState, LogKind};

const CONSOLIDATION_MESSAGE: &str = "Enemy forces consolidate their positions";

/// One possible opposing attack, ranked by `(priority, attacker_garrison)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackCandidate {
    pub attacker: NodeId,
    pub target: NodeId,
    pub priority: u8,
    pub attacker_garrison: u32,
}

/// What the opposing side did during one turn.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolicyReport {
    /// This turn's income. Gates recruiting and upgrading; never persisted.
    pub budget: Resources,
    pub recruited: Option<CommanderId>,
    pub battles: Vec<BattleReport>,
    pub upgraded: Option<NodeId>,
}

/// Seed for the opposing turn `turn` of a campaign seeded with `seed`.
#[must_use]
pub fn enemy_turn_seed(seed: u64, turn: u32) -> u64 {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(&seed.to_le_bytes()).expect("64-bit seed is valid key");
    mac.update(ENEMY_TURN_STREAM);
    mac.update(&turn.to_le_bytes());
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

/// Every opposing node paired with each neighbor it does not own, best first.
///
/// Sorting is stable, so equal keys keep map order.
#[must_use]
pub fn attack_candidates(state: &GameState) -> Vec<AttackCandidate> {
    let mut candidates = Vec::new();
    for node in state.map.nodes_owned_by(Owner::Enemy) {
        for target_id in state.map.neighbors(node.id) {
            let Some(target) = state.map.node(target_id) else {
                continue;
            };
            if target.owner == Owner::Enemy {
                continue;
            }
            candidates.push(AttackCandidate {
                attacker: node.id,
                target: target_id,
                priority: if target.owner == Owner::Player {
                    PRIORITY_PLAYER_TARGET
                } else {
                    PRIORITY_NEUTRAL_TARGET
                },
                attacker_garrison: node.garrison,
            });
        }
    }
    candidates.sort_by(|a, b| {
        (b.priority, b.attacker_garrison).cmp(&(a.priority, a.attacker_garrison))
    });
    candidates
}

/// Run the opposing turn against `state`. Never fails.
pub fn run_enemy_turn(state: &mut GameState, config: &CampaignConfig) -> PolicyReport {
    let mut rng = ChaCha20Rng::seed_from_u64(enemy_turn_seed(state.seed, state.turn));
    let mut report = PolicyReport {
        budget: economy::income(&state.map, Owner::Enemy),
        ..PolicyReport::default()
    };
    log::debug!("enemy budget for turn {}: {}", state.turn, report.budget);

    if state.commanders_of(Owner::Enemy).count() < config.enemy_commander_cap
        && report.budget.gold >= config.enemy_recruit_gold
    {
        let class = CommanderClass::ALL[rng.gen_range(0..CommanderClass::ALL.len())];
        report.recruited = Some(recruit_enemy(state, class, config));
    }

    let candidates = attack_candidates(state);
    if candidates.is_empty() {
        state.push_log(LogKind::Info, CONSOLIDATION_MESSAGE.to_string());
    }
    for candidate in candidates {
        if report.battles.len() >= config.enemy_attacks_per_turn {
            break;
        }
        let still_valid = state
            .map
            .node(candidate.target)
            .is_some_and(|node| node.owner != Owner::Enemy)
            && state
                .map
                .node(candidate.attacker)
                .is_some_and(|node| node.owner == Owner::Enemy);
        if !still_valid {
            log::debug!(
                "skipping stale candidate {} -> {}",
                candidate.attacker,
                candidate.target
            );
            continue;
        }
        if let Some(battle) = combat::opposing_attack(state, candidate.attacker, candidate.target) {
            report.battles.push(battle);
        }
    }

    if report.budget.gold >= config.enemy_upgrade_gold {
        report.upgraded = upgrade_weakest(state, config.upgrade_garrison_bonus);
    }
    report
}

fn recruit_enemy(
    state: &mut GameState,
    class: CommanderClass,
    config: &CampaignConfig,
) -> CommanderId {
    let id = commander::spawn(state, class, config.enemy_race, Owner::Enemy);
    let post = state
        .map
        .nodes_owned_by(Owner::Enemy)
        .filter(|node| stationed_count(&state.commanders, node.id) < node.kind.commander_capacity())
        .max_by(|a, b| a.garrison.cmp(&b.garrison).then(b.id.cmp(&a.id)))
        .map(|node| node.id);
    if let Some(post) = post
        && let Err(err) = commander::station(state, id, post, Owner::Enemy)
    {
        log::warn!("could not station enemy commander {id} at node {post}: {err}");
    }
    state.push_log(
        LogKind::Recruitment,
        format!("The enemy raised a new {} {}", config.enemy_race, class),
    );
    id
}

fn upgrade_weakest(state: &mut GameState, garrison_bonus: u32) -> Option<NodeId> {
    let id = state
        .map
        .nodes_owned_by(Owner::Enemy)
        .filter(|node| node.can_upgrade())
        .min_by_key(|node| (node.tier(), node.id))
        .map(|node| node.id)?;
    let node = state.map.node_mut(id)?;
    node.raise_tier();
    node.garrison = node.garrison.saturating_add(garrison_bonus);
    let (kind, tier) = (node.kind, node.tier());
    state.push_log(
        LogKind::Info,
        format!("The enemy fortified their {kind} to tier {tier}"),
    );
    Some(id)
}
