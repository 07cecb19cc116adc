use crate::combat::{self, BattleReport};
use crate::commander::{self, CommanderClass, CommanderId, EffectiveGarrison, Race};
use crate::config::CampaignConfig;
use crate::economy::Resources;
use crate::error::ActionError;
use crate::map::{NodeId, Owner};
use crate::persistence;
use crate::state::GameState;
use crate::turn::{self, TurnReport};

/// High-level session binding campaign configuration to a mutable game state.
///
/// Every action validates before it mutates: a refused action leaves the
/// state, including the battle log, exactly as it was.
#[derive(Debug, Clone)]
pub struct Campaign {
    config: CampaignConfig,
    state: GameState,
}

impl Campaign {
    /// Start the canonical opening position.
    #[must_use]
    pub fn new(seed: u64, config: CampaignConfig) -> Self {
        let state = GameState::new_campaign(seed, &config);
        Self { config, state }
    }

    /// Resume from an existing state, e.g. one restored from a save.
    #[must_use]
    pub const fn from_state(state: GameState, config: CampaignConfig) -> Self {
        Self { config, state }
    }

    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub const fn config(&self) -> &CampaignConfig {
        &self.config
    }

    /// Apply a closure to the mutable game state, bypassing validation.
    pub fn with_state_mut<R>(&mut self, f: impl FnOnce(&mut GameState) -> R) -> R {
        f(&mut self.state)
    }

    #[must_use]
    pub fn into_state(self) -> GameState {
        self.state
    }

    const fn ensure_active(&self) -> Result<(), ActionError> {
        if self.state.game_over {
            return Err(ActionError::GameOver);
        }
        turn::ensure_player_phase(&self.state)
    }

    /// End the player's turn; the opposing side moves and upkeep runs.
    ///
    /// # Errors
    ///
    /// `GameOver` once decided, `InvalidPhase` outside the player phase.
    pub fn end_turn(&mut self) -> Result<TurnReport, ActionError> {
        if self.state.game_over {
            return Err(ActionError::GameOver);
        }
        turn::end_turn(&mut self.state, &self.config)
    }

    /// # Errors
    ///
    /// `GameOver`, `InvalidPhase` or `InsufficientResources`.
    pub fn recruit(&mut self, class: CommanderClass, race: Race) -> Result<CommanderId, ActionError> {
        self.ensure_active()?;
        commander::recruit(&mut self.state, class, race)
    }

    /// # Errors
    ///
    /// `GameOver`, `InvalidPhase`, unknown ids, foreign targets or `CapacityExceeded`.
    pub fn assign(&mut self, commander: CommanderId, node: NodeId) -> Result<(), ActionError> {
        self.ensure_active()?;
        commander::assign(&mut self.state, commander, node)
    }

    /// Recall a player commander in any phase. Returns whether it had a post.
    ///
    /// # Errors
    ///
    /// `GameOver`, or `UnknownCommander` for ids not on the player's roster.
    pub fn unassign(&mut self, commander: CommanderId) -> Result<bool, ActionError> {
        if self.state.game_over {
            return Err(ActionError::GameOver);
        }
        match self.state.commander(commander) {
            Some(found) if found.owner == Owner::Player => {}
            _ => return Err(ActionError::UnknownCommander(commander)),
        }
        Ok(commander::unassign(&mut self.state, commander))
    }

    /// Attack `target` from the selected node, then check for a winner.
    ///
    /// # Errors
    ///
    /// `GameOver`, `InvalidPhase`, or `InvalidTarget` when nothing is
    /// selected or the pair is not a legal attack.
    pub fn attack(&mut self, target: NodeId) -> Result<BattleReport, ActionError> {
        self.ensure_active()?;
        let from = self.state.selected_node.ok_or(ActionError::InvalidTarget {
            reason: "select one of your nodes to attack from",
        })?;
        let report = combat::player_attack(&mut self.state, from, target)?;
        turn::conclude_if_decided(&mut self.state, &self.config);
        Ok(report)
    }

    /// # Errors
    ///
    /// `GameOver`, `InvalidPhase`, `InvalidTarget`, `TierCapped` or `InsufficientResources`.
    pub fn upgrade_node(&mut self, node: NodeId) -> Result<Resources, ActionError> {
        self.ensure_active()?;
        turn::upgrade_node(&mut self.state, node, &self.config)
    }

    /// Select a node, or clear the selection with `None`.
    ///
    /// # Errors
    ///
    /// `UnknownNode` for ids not on the map.
    pub fn select_node(&mut self, node: Option<NodeId>) -> Result<(), ActionError> {
        if let Some(id) = node
            && !self.state.map.contains(id)
        {
            return Err(ActionError::UnknownNode(id));
        }
        self.state.selected_node = node;
        Ok(())
    }

    /// Select a commander, or clear the selection with `None`.
    ///
    /// # Errors
    ///
    /// `UnknownCommander` for ids not on the roster.
    pub fn select_commander(&mut self, commander: Option<CommanderId>) -> Result<(), ActionError> {
        if let Some(id) = commander
            && self.state.commander(id).is_none()
        {
            return Err(ActionError::UnknownCommander(id));
        }
        self.state.selected_commander = commander;
        Ok(())
    }

    /// Restore the canonical opening position, keeping the seed.
    pub fn reset_game(&mut self) {
        log::info!("resetting campaign");
        self.state = GameState::new_campaign(self.state.seed, &self.config);
    }

    /// Run the connection repair on demand. Returns whether anything changed.
    pub fn repair_map_connections(&mut self) -> bool {
        persistence::repair_if_corrupted(&mut self.state)
    }

    /// Whether the player holds enough of the map to win.
    #[must_use]
    pub fn check_victory_condition(&self) -> bool {
        turn::check_victory_condition(&self.state.map)
    }

    #[must_use]
    pub fn attackable_targets(&self, from: NodeId) -> Vec<NodeId> {
        combat::attackable_targets(&self.state, from)
    }

    #[must_use]
    pub fn upgrade_cost(&self, node: NodeId) -> Option<Resources> {
        self.state.map.node(node).and_then(turn::upgrade_cost)
    }

    /// Displayed garrison of `node`, commander bonus included.
    #[must_use]
    pub fn effective_garrison(&self, node: NodeId) -> Option<EffectiveGarrison> {
        self.state
            .map
            .node(node)
            .map(|node| commander::effective_garrison(node, &self.state.commanders))
    }
}
