use aeloria_game::Owner;

use crate::policy::GameplayStrategy;
use crate::tester::RunSummary;

pub type Expectation = fn(&RunSummary) -> Result<(), String>;

/// A scripted campaign: who plays, for how long, and what must hold at the end.
#[derive(Clone)]
pub struct TestScenario {
    pub name: &'static str,
    pub description: &'static str,
    pub strategy: GameplayStrategy,
    pub max_turns: u32,
    /// Reload the campaign from storage after every turn and compare.
    pub reload_every_turn: bool,
    pub expectations: Vec<Expectation>,
}

fn advanced_past_opening(summary: &RunSummary) -> Result<(), String> {
    if summary.turns_played == 0 {
        return Err("no turn was completed".to_string());
    }
    Ok(())
}

fn campaign_decided(summary: &RunSummary) -> Result<(), String> {
    if summary.winner.is_none() {
        return Err(format!(
            "no winner after {} turns ({} player / {} enemy nodes)",
            summary.turns_played, summary.player_nodes, summary.enemy_nodes
        ));
    }
    Ok(())
}

fn enemy_prevailed(summary: &RunSummary) -> Result<(), String> {
    match summary.winner {
        Some(Owner::Enemy) => Ok(()),
        other => Err(format!("expected the enemy to win, got {other:?}")),
    }
}

fn player_went_on_offense(summary: &RunSummary) -> Result<(), String> {
    if summary.attacks == 0 {
        return Err("no attack was carried out".to_string());
    }
    if summary.winner == Some(Owner::Enemy) && summary.turns_played < 10 {
        return Err(format!("overrun after only {} turns", summary.turns_played));
    }
    Ok(())
}

fn reloads_happened(summary: &RunSummary) -> Result<(), String> {
    if summary.reloads == 0 {
        return Err("campaign was never reloaded from storage".to_string());
    }
    Ok(())
}

#[must_use]
pub fn catalog() -> Vec<TestScenario> {
    vec![
        TestScenario {
            name: "smoke",
            description: "Three passive turns; checks the turn loop and autosave",
            strategy: GameplayStrategy::Passive,
            max_turns: 3,
            reload_every_turn: false,
            expectations: vec![advanced_past_opening],
        },
        TestScenario {
            name: "siege",
            description: "A passive player is overrun by the opposing policy",
            strategy: GameplayStrategy::Passive,
            max_turns: 60,
            reload_every_turn: false,
            expectations: vec![campaign_decided, enemy_prevailed],
        },
        TestScenario {
            name: "conquest",
            description: "Aggressive play presses attacks every turn",
            strategy: GameplayStrategy::Aggressive,
            max_turns: 80,
            reload_every_turn: false,
            expectations: vec![player_went_on_offense],
        },
        TestScenario {
            name: "builder",
            description: "Upgrade-first play; invariants only",
            strategy: GameplayStrategy::Builder,
            max_turns: 40,
            reload_every_turn: false,
            expectations: vec![advanced_past_opening],
        },
        TestScenario {
            name: "chaos",
            description: "Random and often invalid actions; refusals must not mutate state",
            strategy: GameplayStrategy::Chaos,
            max_turns: 40,
            reload_every_turn: false,
            expectations: vec![advanced_past_opening],
        },
        TestScenario {
            name: "persistence",
            description: "Reload from disk after every turn and compare saved fields",
            strategy: GameplayStrategy::Aggressive,
            max_turns: 25,
            reload_every_turn: true,
            expectations: vec![reloads_happened],
        },
    ]
}

#[must_use]
pub fn get_scenario(name: &str) -> Option<TestScenario> {
    catalog().into_iter().find(|scenario| scenario.name == name)
}

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog()
        .iter()
        .map(|scenario| (scenario.name, scenario.description))
        .collect()
}
