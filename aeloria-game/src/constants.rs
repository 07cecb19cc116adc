//! Centralized balance and tuning constants for the Aeloria conquest engine.
//!
//! These values define the deterministic math for the core simulation.
//! Per-campaign knobs that a designer may want to vary live in
//! [`crate::config::CampaignConfig`]; everything here is a fixed game table.

// Storage ------------------------------------------------------------------
/// Fixed storage identifier the engine writes snapshots under.
pub const SAVE_KEY: &str = "ashes-of-aeloria-game";
/// Current snapshot schema version.
pub const SCHEMA_VERSION: u32 = 1;

// Node tiers -----------------------------------------------------------------
pub const MIN_TIER: u8 = 1;
pub const MAX_TIER: u8 = 5;

// Player combat ---------------------------------------------------------------
pub(crate) const PLAYER_ATTACK_FLAT_BONUS: u32 = 50;
pub(crate) const PLAYER_CAPTURE_GARRISON_FACTOR: f64 = 0.5;
pub(crate) const EXPERIENCE_ON_VICTORY: u32 = 50;
pub(crate) const EXPERIENCE_ON_DEFEAT: u32 = 25;

// Opposing combat -------------------------------------------------------------
pub(crate) const ENEMY_ATTACKER_TIER_BONUS: u32 = 20;
pub(crate) const ENEMY_DEFENDER_TIER_BONUS: u32 = 15;
pub(crate) const ENEMY_ATTACK_MULTIPLIER: f64 = 1.1;
pub(crate) const ENEMY_CAPTURE_GARRISON_FACTOR: f64 = 0.7;
pub(crate) const ENEMY_VICTORY_ATTACKER_DECAY: f64 = 0.8;
pub(crate) const ENEMY_DEFEAT_DEFENDER_DECAY: f64 = 0.9;
pub(crate) const ENEMY_DEFEAT_ATTACKER_DECAY: f64 = 0.7;

// Opposing policy -------------------------------------------------------------
pub(crate) const PRIORITY_PLAYER_TARGET: u8 = 2;
pub(crate) const PRIORITY_NEUTRAL_TARGET: u8 = 1;

// Upgrades --------------------------------------------------------------------
pub(crate) const UPGRADE_BASE_GOLD: u32 = 100;
pub(crate) const UPGRADE_BASE_SUPPLIES: u32 = 50;
pub(crate) const UPGRADE_BASE_MANA: u32 = 25;
pub(crate) const UPGRADE_COST_MULTIPLIER: f64 = 1.5;

// Commander display bonus -----------------------------------------------------
pub(crate) const COMMANDER_LEVEL_POWER: u32 = 15;

// Random stream labels --------------------------------------------------------
pub(crate) const ENEMY_TURN_STREAM: &[u8] = b"enemy-turn";
