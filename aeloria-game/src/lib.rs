//! Aeloria Game Engine
//!
//! Platform-agnostic core logic for the Ashes of Aeloria turn-based conquest game.
//! This crate provides all game mechanics without UI or platform-specific dependencies.

pub mod campaign;
pub mod combat;
pub mod commander;
pub mod config;
pub mod constants;
pub mod economy;
pub mod error;
pub mod map;
pub mod numbers;
pub mod persistence;
pub mod policy;
pub mod state;
pub mod turn;

// Re-export commonly used types
pub use campaign::Campaign;
pub use combat::{
    BattleOutcome, BattleReport, CombatRule, attackable_targets, player_attack, resolve_battle,
    resolve_opposing_attack,
};
pub use commander::{
    Army, ClassStats, Commander, CommanderClass, CommanderId, EffectiveGarrison, Race,
    effective_garrison,
};
pub use config::{CampaignConfig, ConfigError};
pub use constants::{SAVE_KEY, SCHEMA_VERSION};
pub use economy::{Resources, income, production};
pub use error::ActionError;
pub use map::{Edge, MapGraph, Node, NodeId, NodeKind, Owner, Position, generate_canonical_map};
pub use persistence::{Integrity, LoadReport, NodeRecord, Snapshot, SnapshotError};
pub use policy::{AttackCandidate, PolicyReport, attack_candidates, run_enemy_turn};
pub use state::{BattleLogEntry, GameState, LogKind, Phase};
pub use turn::{
    TurnReport, check_victory_condition, determine_winner, end_turn, upgrade_cost, upgrade_node,
};

use thiserror::Error;

/// Trait for abstracting save/load operations.
/// Platform-specific implementations should provide this.
pub trait GameStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist an encoded save payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be written.
    fn save_game(&self, save_name: &str, payload: &str) -> Result<(), Self::Error>;

    /// Read an encoded save payload, `None` if nothing was saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be read.
    fn load_game(&self, save_name: &str) -> Result<Option<String>, Self::Error>;

    /// Delete saved game
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    fn delete_save(&self, save_name: &str) -> Result<(), Self::Error>;
}

/// Failure of a storage-backed action.
#[derive(Debug, Error)]
pub enum EngineError<E>
where
    E: std::error::Error + 'static,
{
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error("storage failure: {0}")]
    Storage(#[source] E),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Main game engine binding campaigns to durable storage.
pub struct GameEngine<S>
where
    S: GameStorage,
{
    storage: S,
    config: CampaignConfig,
}

impl<S> GameEngine<S>
where
    S: GameStorage,
{
    /// Create a new game engine with the provided storage and configuration
    pub const fn new(storage: S, config: CampaignConfig) -> Self {
        Self { storage, config }
    }

    #[must_use]
    pub const fn config(&self) -> &CampaignConfig {
        &self.config
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Start a fresh campaign. Nothing is written until the first action.
    #[must_use]
    pub fn create_campaign(&self, seed: u64) -> Campaign {
        Campaign::new(seed, self.config.clone())
    }

    /// Write `campaign` under the fixed save key, then trim its in-memory log.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be encoded or written.
    pub fn save(&self, campaign: &mut Campaign) -> Result<(), EngineError<S::Error>> {
        let cap = self.config.battle_log_cap;
        let payload = persistence::encode(&persistence::save(campaign.state(), cap))?;
        self.storage
            .save_game(SAVE_KEY, &payload)
            .map_err(EngineError::Storage)?;
        campaign.with_state_mut(|state| state.trim_log(cap));
        log::debug!("saved campaign at turn {}", campaign.state().turn);
        Ok(())
    }

    /// Load the saved campaign, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or the save cannot be decoded.
    pub fn load_game(&self) -> Result<Option<(Campaign, LoadReport)>, anyhow::Error>
    where
        S::Error: Into<anyhow::Error>,
    {
        let Some(payload) = self.storage.load_game(SAVE_KEY).map_err(Into::into)? else {
            return Ok(None);
        };
        let (state, report) = persistence::load(&payload)?;
        Ok(Some((Campaign::from_state(state, self.config.clone()), report)))
    }

    /// Resume the saved campaign, or start a fresh one when there is no
    /// save or it cannot be decoded.
    ///
    /// # Errors
    ///
    /// Only storage failures are returned.
    pub fn load_or_create(&self, seed: u64) -> Result<Campaign, EngineError<S::Error>> {
        let Some(payload) = self
            .storage
            .load_game(SAVE_KEY)
            .map_err(EngineError::Storage)?
        else {
            return Ok(self.create_campaign(seed));
        };
        match persistence::load(&payload) {
            Ok((state, _)) => Ok(Campaign::from_state(state, self.config.clone())),
            Err(err) => {
                log::warn!("discarding unreadable save: {err}");
                Ok(self.create_campaign(seed))
            }
        }
    }

    /// Run a state-changing action and autosave when it succeeds.
    ///
    /// # Errors
    ///
    /// Returns the action's refusal unchanged, or a storage failure after a
    /// successful action.
    pub fn perform<R>(
        &self,
        campaign: &mut Campaign,
        action: impl FnOnce(&mut Campaign) -> Result<R, ActionError>,
    ) -> Result<R, EngineError<S::Error>> {
        let value = action(campaign)?;
        self.save(campaign)?;
        Ok(value)
    }

    /// Delete the saved campaign.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    pub fn delete_save(&self) -> Result<(), S::Error> {
        self.storage.delete_save(SAVE_KEY)
    }
}
