//! Campaign tunables with serde defaults and range validation.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::commander::Race;
use crate::economy::Resources;

/// Per-campaign configuration. Every field falls back to the reference value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignConfig {
    #[serde(default = "CampaignConfig::default_starting_resources")]
    pub starting_resources: Resources,
    #[serde(default = "CampaignConfig::default_victory_control_ratio")]
    pub victory_control_ratio: f64,
    #[serde(default = "CampaignConfig::default_battle_log_cap")]
    pub battle_log_cap: usize,
    #[serde(default = "CampaignConfig::default_enemy_commander_cap")]
    pub enemy_commander_cap: usize,
    #[serde(default = "CampaignConfig::default_enemy_recruit_gold")]
    pub enemy_recruit_gold: u32,
    #[serde(default = "CampaignConfig::default_enemy_upgrade_gold")]
    pub enemy_upgrade_gold: u32,
    #[serde(default = "CampaignConfig::default_enemy_attacks_per_turn")]
    pub enemy_attacks_per_turn: usize,
    #[serde(default = "CampaignConfig::default_upgrade_garrison_bonus")]
    pub upgrade_garrison_bonus: u32,
    #[serde(default = "CampaignConfig::default_enemy_race")]
    pub enemy_race: Race,
}

impl CampaignConfig {
    #[must_use]
    pub const fn default_starting_resources() -> Resources {
        Resources::new(500, 100, 50)
    }

    #[must_use]
    pub const fn default_victory_control_ratio() -> f64 {
        0.7
    }

    #[must_use]
    pub const fn default_battle_log_cap() -> usize {
        20
    }

    const fn default_enemy_commander_cap() -> usize {
        3
    }

    const fn default_enemy_recruit_gold() -> u32 {
        150
    }

    const fn default_enemy_upgrade_gold() -> u32 {
        400
    }

    const fn default_enemy_attacks_per_turn() -> usize {
        2
    }

    const fn default_upgrade_garrison_bonus() -> u32 {
        30
    }

    const fn default_enemy_race() -> Race {
        Race::Orc
    }

    /// Parse a JSON document, filling gaps with defaults, and validate it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.5..=1.0).contains(&self.victory_control_ratio) {
            return Err(ConfigError::RangeViolation {
                field: "victory_control_ratio",
                min: 0.5,
                max: 1.0,
                value: self.victory_control_ratio,
            });
        }
        if self.battle_log_cap == 0 {
            return Err(ConfigError::Zero {
                field: "battle_log_cap",
            });
        }
        if self.enemy_attacks_per_turn == 0 {
            return Err(ConfigError::Zero {
                field: "enemy_attacks_per_turn",
            });
        }
        Ok(())
    }
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            starting_resources: Self::default_starting_resources(),
            victory_control_ratio: Self::default_victory_control_ratio(),
            battle_log_cap: Self::default_battle_log_cap(),
            enemy_commander_cap: Self::default_enemy_commander_cap(),
            enemy_recruit_gold: Self::default_enemy_recruit_gold(),
            enemy_upgrade_gold: Self::default_enemy_upgrade_gold(),
            enemy_attacks_per_turn: Self::default_enemy_attacks_per_turn(),
            upgrade_garrison_bonus: Self::default_upgrade_garrison_bonus(),
            enemy_race: Self::default_enemy_race(),
        }
    }
}

/// Errors raised when campaign configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Parse(String),
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(CampaignConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = CampaignConfig::from_json(r#"{"enemy_recruit_gold": 90}"#).unwrap();
        assert_eq!(config.enemy_recruit_gold, 90);
        assert_eq!(config.battle_log_cap, 20);
        assert_eq!(config.enemy_race, Race::Orc);
        assert_eq!(config.starting_resources, Resources::new(500, 100, 50));
    }

    #[test]
    fn out_of_range_ratio_is_rejected() {
        let err = CampaignConfig::from_json(r#"{"victory_control_ratio": 0.2}"#).unwrap_err();
        assert!(matches!(err, ConfigError::RangeViolation { field: "victory_control_ratio", .. }));
        assert!(matches!(
            CampaignConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn zero_log_cap_is_rejected() {
        let config = CampaignConfig {
            battle_log_cap: 0,
            ..CampaignConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Zero {
                field: "battle_log_cap"
            })
        );
    }
}
