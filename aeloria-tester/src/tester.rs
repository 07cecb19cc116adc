use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use aeloria_game::{Campaign, CampaignConfig, EngineError, GameEngine, Owner, Resources};
use anyhow::Result;
use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::invariants::{check_state, persisted_differences};
use crate::policy::{GameplayStrategy, PlayerAction};
use crate::scenario::TestScenario;
use crate::storage::FileStorage;

/// Player actions allowed per turn before the runner forces `EndTurn`.
const MAX_ACTIONS_PER_TURN: usize = 12;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

/// What one scripted campaign did and how it ended.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub turns_played: u32,
    pub actions: usize,
    pub refused: usize,
    pub attacks: usize,
    pub reloads: usize,
    pub winner: Option<Owner>,
    pub player_nodes: usize,
    pub enemy_nodes: usize,
    pub final_resources: Resources,
    pub violations: Vec<String>,
}

impl RunSummary {
    fn new(seed: u64, strategy: GameplayStrategy) -> Self {
        Self {
            seed,
            strategy,
            turns_played: 0,
            actions: 0,
            refused: 0,
            attacks: 0,
            reloads: 0,
            winner: None,
            player_nodes: 0,
            enemy_nodes: 0,
            final_resources: Resources::default(),
            violations: Vec::new(),
        }
    }
}

pub struct LogicTester {
    verbose: bool,
    save_root: PathBuf,
    config: CampaignConfig,
}

impl LogicTester {
    pub const fn new(verbose: bool, save_root: PathBuf, config: CampaignConfig) -> Self {
        Self {
            verbose,
            save_root,
            config,
        }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.verbose {
                println!(
                    "🧪 Testing scenario: {} (strategy: {} seed: {})",
                    scenario.name.bright_white(),
                    scenario.strategy,
                    seed
                );
            }
            results.push(self.run_single_scenario(scenario, seed, iterations));
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let verdict = match self.play(scenario, iteration_seed) {
                Ok(summary) => match evaluate(scenario, &summary) {
                    Ok(()) => Ok(summary),
                    Err(err) => Err(format!("{err} | {}", describe(&summary))),
                },
                Err(err) => Err(format!("{err:#}")),
            };

            match verdict {
                Ok(summary) => {
                    successes += 1;
                    let duration = start_time.elapsed();
                    performance_data.push(duration);
                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?}) turns:{} winner:{} actions:{} refused:{}",
                            i + 1,
                            iterations,
                            summary.turns_played,
                            summary.winner.map_or_else(|| "-".to_string(), |w| w.to_string()),
                            summary.actions,
                            summary.refused
                        );
                    }
                }
                Err(err) => {
                    if self.verbose {
                        println!(
                            "  ❌ Iteration {}/{} failed: {}",
                            i + 1,
                            iterations,
                            err.clone().red()
                        );
                    }
                    failures.push(format!(
                        "Iteration {} (strategy {}, seed {iteration_seed}): {err}",
                        i + 1,
                        scenario.strategy.label()
                    ));
                }
            }
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.to_string(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration,
            performance_data,
        }
    }

    /// Play one campaign to its end or the scenario's turn limit.
    ///
    /// # Errors
    ///
    /// Returns storage failures and unreadable saves; rule violations are
    /// collected in the summary instead.
    pub fn play(&self, scenario: &TestScenario, seed: u64) -> Result<RunSummary> {
        let storage = FileStorage::new(
            self.save_root
                .join(scenario.name)
                .join(format!("seed-{seed}")),
        );
        let engine = GameEngine::new(storage, self.config.clone());
        engine.delete_save()?;
        let mut campaign = engine.load_or_create(seed)?;
        let mut policy = scenario.strategy.create_policy(seed);
        let mut summary = RunSummary::new(seed, scenario.strategy);
        let mut actions_this_turn = 0;

        log::info!(
            "playing {} with {} policy, seed {seed}",
            scenario.name,
            policy.name()
        );

        while !campaign.state().game_over && summary.turns_played < scenario.max_turns {
            let action = if actions_this_turn >= MAX_ACTIONS_PER_TURN {
                PlayerAction::EndTurn
            } else {
                policy.next_action(campaign.state())
            };
            let before = campaign.state().clone();

            match apply(&engine, &mut campaign, action) {
                Ok(()) => {
                    summary.actions += 1;
                    if matches!(action, PlayerAction::Attack { .. }) {
                        summary.attacks += 1;
                    }
                }
                Err(EngineError::Action(err)) => {
                    summary.refused += 1;
                    log::debug!("refused {action}: {err}");
                    let mut expected = before;
                    expected.selected_node = campaign.state().selected_node;
                    if &expected != campaign.state() {
                        summary.violations.push(format!(
                            "turn {}: refused {action} still changed the campaign",
                            expected.turn
                        ));
                    }
                }
                Err(other) => return Err(other.into()),
            }

            for violation in check_state(campaign.state()) {
                summary
                    .violations
                    .push(format!("turn {} after {action}: {violation}", campaign.state().turn));
            }

            if action == PlayerAction::EndTurn {
                summary.turns_played += 1;
                actions_this_turn = 0;
                if scenario.reload_every_turn {
                    self.reload(&engine, &mut campaign, &mut summary)?;
                }
            } else {
                actions_this_turn += 1;
            }
        }

        let state = campaign.state();
        summary.winner = state.winner;
        summary.player_nodes = state.map.count_owned(Owner::Player);
        summary.enemy_nodes = state.map.count_owned(Owner::Enemy);
        summary.final_resources = state.resources;
        engine.delete_save()?;
        Ok(summary)
    }

    fn reload(
        &self,
        engine: &GameEngine<FileStorage>,
        campaign: &mut Campaign,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let Some((reloaded, report)) = engine.load_game()? else {
            summary
                .violations
                .push(format!("turn {}: no save on disk", campaign.state().turn));
            return Ok(());
        };
        summary.reloads += 1;
        if report.repaired || report.dropped_references > 0 {
            summary.violations.push(format!(
                "turn {}: clean save needed repair",
                campaign.state().turn
            ));
        }
        for field in persisted_differences(campaign.state(), reloaded.state()) {
            summary.violations.push(format!(
                "turn {}: reload changed {field}",
                campaign.state().turn
            ));
        }
        if self.verbose {
            println!(
                "     ↳ reloaded turn {} from {}",
                reloaded.state().turn,
                engine.storage().root().display()
            );
        }
        *campaign = reloaded;
        Ok(())
    }
}

fn apply(
    engine: &GameEngine<FileStorage>,
    campaign: &mut Campaign,
    action: PlayerAction,
) -> Result<(), EngineError<io::Error>> {
    match action {
        PlayerAction::Recruit(class, race) => {
            engine.perform(campaign, |game| game.recruit(class, race).map(|_| ()))
        }
        PlayerAction::Assign { commander, node } => {
            engine.perform(campaign, |game| game.assign(commander, node))
        }
        PlayerAction::Unassign(commander) => {
            engine.perform(campaign, |game| game.unassign(commander).map(|_| ()))
        }
        PlayerAction::Upgrade(node) => {
            engine.perform(campaign, |game| game.upgrade_node(node).map(|_| ()))
        }
        PlayerAction::Attack { from, target } => engine.perform(campaign, |game| {
            game.select_node(Some(from))?;
            game.attack(target).map(|_| ())
        }),
        PlayerAction::EndTurn => engine.perform(campaign, |game| game.end_turn().map(|_| ())),
    }
}

fn describe(summary: &RunSummary) -> String {
    format!(
        "{} seed {} after {} turns: {} player / {} enemy nodes, {}",
        summary.strategy,
        summary.seed,
        summary.turns_played,
        summary.player_nodes,
        summary.enemy_nodes,
        summary.final_resources
    )
}

fn evaluate(scenario: &TestScenario, summary: &RunSummary) -> Result<(), String> {
    if let Some(first) = summary.violations.first() {
        return Err(format!(
            "{} violation(s), first: {first}",
            summary.violations.len()
        ));
    }
    for expectation in &scenario.expectations {
        expectation(summary)?;
    }
    Ok(())
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}
