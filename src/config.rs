//! Simulator settings.
//!
//! Settings can be loaded from a JSON file; missing keys take their
//! defaults:
//!
//! ```json
//! { "memory_size": 4096, "max_cycles": 100000 }
//! ```

use crate::cpu::memory::MEMORY_SIZE;
use serde::{Serialize, Deserialize};
use std::path::Path;
use thiserror::Error;

/// Default cycle budget for bounded runs.
pub const DEFAULT_MAX_CYCLES: u64 = 100_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Number of addressable halfwords, at most 4096.
    pub memory_size: usize,
    /// Upper bound for bounded runs.
    pub max_cycles: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            memory_size: MEMORY_SIZE,
            max_cycles: DEFAULT_MAX_CYCLES,
        }
    }
}

impl SimConfig {
    /// Load and validate settings from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(text)
            .map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.memory_size == 0 || self.memory_size > MEMORY_SIZE {
            return Err(ConfigError::Invalid(format!(
                "memory_size must be between 1 and {}, got {}",
                MEMORY_SIZE, self.memory_size
            )));
        }
        if self.max_cycles == 0 {
            return Err(ConfigError::Invalid("max_cycles must be positive".into()));
        }
        Ok(())
    }
}

/// Errors that can occur while loading settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("invalid JSON: {0}")]
    Json(String),

    #[error("invalid setting: {0}")]
    Invalid(String),
}
