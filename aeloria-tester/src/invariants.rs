use aeloria_game::constants::{MAX_TIER, MIN_TIER};
use aeloria_game::{GameState, Phase};

/// Structural properties that must hold after every action.
pub fn check_state(state: &GameState) -> Vec<String> {
    let mut violations = Vec::new();
    if state.turn == 0 {
        violations.push("turn counter dropped to zero".to_string());
    }
    if state.phase != Phase::Player {
        violations.push(format!("control returned in phase {}", state.phase));
    }
    if state.game_over != state.winner.is_some() {
        violations.push("game_over and winner disagree".to_string());
    }
    for node in state.map.nodes() {
        if !(MIN_TIER..=MAX_TIER).contains(&node.tier()) {
            violations.push(format!("node {} has tier {}", node.id, node.tier()));
        }
        let stationed = state
            .commanders
            .iter()
            .filter(|commander| commander.is_stationed_at(node.id))
            .count();
        if stationed > node.kind.commander_capacity() {
            violations.push(format!(
                "node {} holds {stationed} commanders (capacity {})",
                node.id,
                node.kind.commander_capacity()
            ));
        }
        for other in state.map.neighbors(node.id) {
            if !state.map.is_adjacent(other, node.id) {
                violations.push(format!("edge {} -> {other} is one-sided", node.id));
            }
        }
    }
    for commander in &state.commanders {
        if commander.health > commander.max_health {
            violations.push(format!("commander {} exceeds max health", commander.id));
        }
        if let Some(post) = commander.assigned_node {
            match state.map.node(post) {
                Some(node) if node.owner == commander.owner => {}
                Some(_) => violations.push(format!(
                    "commander {} stationed on foreign node {post}",
                    commander.id
                )),
                None => violations.push(format!(
                    "commander {} stationed on missing node {post}",
                    commander.id
                )),
            }
        }
    }
    violations
}

/// Compare the fields a save carries; selection and trimmed log entries are ignored.
pub fn persisted_differences(before: &GameState, after: &GameState) -> Vec<String> {
    let mut differences = Vec::new();
    if before.turn != after.turn || before.phase != after.phase {
        differences.push("turn or phase".to_string());
    }
    if before.resources != after.resources {
        differences.push("resources".to_string());
    }
    if before.commanders != after.commanders {
        differences.push("commanders".to_string());
    }
    if before.map != after.map {
        differences.push("map".to_string());
    }
    if before.game_over != after.game_over || before.winner != after.winner {
        differences.push("outcome".to_string());
    }
    let keep = after.battle_log.len();
    let tail = &before.battle_log[before.battle_log.len().saturating_sub(keep)..];
    if tail != after.battle_log.as_slice() {
        differences.push("battle log".to_string());
    }
    differences
}

#[cfg(test)]
mod tests {
    use super::*;
    use aeloria_game::CampaignConfig;

    #[test]
    fn fresh_campaign_is_clean() {
        let state = GameState::new_campaign(1, &CampaignConfig::default());
        assert!(check_state(&state).is_empty());
        assert!(persisted_differences(&state, &state).is_empty());
    }

    #[test]
    fn foreign_posts_are_reported() {
        let mut state = GameState::new_campaign(1, &CampaignConfig::default());
        state.commanders[0].assigned_node = Some(1);
        let violations = check_state(&state);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("foreign node 1"));
    }
}
