//! Engine tuning loaded from TOML.
//!
//! ```toml
//! max_bench = 5
//! prize_count = 6
//! coin_flip_completion = "both_players"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// When an ATTACK-context coin flip counts as resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
    /// Both players must approve before the attack resolves.
    #[default]
    BothPlayers,
    /// The first approval resolves the attack.
    FirstApproval,
}

/// Rule constants for one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bench slots per player.
    pub max_bench: usize,
    /// Prize cards set aside per player.
    pub prize_count: usize,
    /// Opening hand size.
    pub opening_hand: usize,
    /// Redraws allowed while the opening hand has no basic Pokémon.
    pub mulligan_limit: u32,
    /// Poison damage when the applying effect gives no amount.
    pub default_poison_damage: u32,
    /// Burn damage between turns.
    pub burn_damage: u32,
    /// Upper bound for FIXED flip counts.
    pub max_fixed_flips: u32,
    /// Upper bound for UNTIL_TAILS sequences.
    pub until_tails_limit: u32,
    /// Upper bound for VARIABLE flip counts.
    pub max_variable_flips: u32,
    pub coin_flip_completion: CompletionPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_bench: 5,
            prize_count: 6,
            opening_hand: 7,
            mulligan_limit: 10,
            default_poison_damage: 10,
            burn_damage: 20,
            max_fixed_flips: 10,
            until_tails_limit: 10,
            max_variable_flips: 10,
            coin_flip_completion: CompletionPolicy::BothPlayers,
        }
    }
}

impl EngineConfig {
    /// Parse a config from TOML text; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> EngineResult<Self> {
        let config: EngineConfig =
            toml::from_str(text).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file from disk.
    pub fn load(path: &Path) -> EngineResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> EngineResult<()> {
        if self.max_fixed_flips == 0 {
            return Err(EngineError::Config("max_fixed_flips must be at least 1".into()));
        }
        if self.until_tails_limit == 0 {
            return Err(EngineError::Config("until_tails_limit must be at least 1".into()));
        }
        Ok(())
    }
}
