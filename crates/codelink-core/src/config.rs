//! Engine configuration
//!
//! Read once by the caller and handed to the evaluator and undo history.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CodeLinkError, Result};

/// Default values for engine configuration
pub mod defaults {
    /// Retries a sampling node may spend before giving up
    pub const MAX_SAMPLE_ATTEMPTS: usize = 10_000;
    /// Longest list a generator node may produce
    pub const MAX_LIST_LENGTH: usize = 1_000_000;
    /// Convert evaluator panics into evaluation errors
    pub const CATCH_PANICS: bool = true;
    /// Snapshots kept by the undo history
    pub const UNDO_DEPTH: usize = 100;
    /// zstd level for undo snapshots
    pub const SNAPSHOT_COMPRESSION_LEVEL: i32 = 3;
}

/// Tunables for evaluation and history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Iteration cap for sampling-style nodes before `ResourceExhausted`
    pub max_sample_attempts: usize,
    /// Upper bound on the length of lists built by generator nodes
    pub max_list_length: usize,
    /// Whether the engine catches panics raised by evaluation functions
    pub catch_panics: bool,
    /// Maximum number of undo snapshots
    pub undo_depth: usize,
    /// zstd compression level for undo snapshots
    pub snapshot_compression_level: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_sample_attempts: defaults::MAX_SAMPLE_ATTEMPTS,
            max_list_length: defaults::MAX_LIST_LENGTH,
            catch_panics: defaults::CATCH_PANICS,
            undo_depth: defaults::UNDO_DEPTH,
            snapshot_compression_level: defaults::SNAPSHOT_COMPRESSION_LEVEL,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CodeLinkError::Config(e.to_string()))
    }

    /// Load from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CodeLinkError::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_json_str(&contents)?;
        log::debug!("Loaded engine config from {}", path.display());
        Ok(config)
    }
}
