use core::time::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::*;

/// Upper bound for every duration in a [`GameConfig`].
pub const MAX_CONFIG_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not parse game config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] GameError),
}

/// Board size and timing of one game.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub board: BoardConfig,
    pub time_limit: Duration,
    /// Flip animation before a revealed face becomes visible.
    pub reveal_delay: Duration,
    /// How long a mismatched pair stays face up.
    pub mismatch_delay: Duration,
    pub tick_interval: Duration,
}

impl GameConfig {
    pub fn new(board: BoardConfig, time_limit: Duration) -> Self {
        Self {
            board,
            time_limit,
            ..Self::default()
        }
    }

    pub fn validate(self) -> Result<Self> {
        self.board.validate()?;
        if self.tick_interval.is_zero() {
            return Err(GameError::InvalidConfig("tick interval must be positive"));
        }
        if self.time_limit.is_zero() {
            return Err(GameError::InvalidConfig("time limit must be positive"));
        }
        let durations = [
            self.time_limit,
            self.reveal_delay,
            self.mismatch_delay,
            self.tick_interval,
        ];
        if durations.iter().any(|&d| d > MAX_CONFIG_DURATION) {
            return Err(GameError::InvalidConfig("durations must not exceed one day"));
        }
        Ok(self)
    }

    pub fn from_json(json: &str) -> core::result::Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.validate()?)
    }

    pub fn to_json(&self) -> core::result::Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board: BoardConfig::default(),
            time_limit: Duration::from_secs(60),
            reveal_delay: Duration::from_millis(200),
            mismatch_delay: Duration::from_millis(1000),
            tick_interval: Duration::from_secs(1),
        }
    }
}
