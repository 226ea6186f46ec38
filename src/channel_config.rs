// =============================================================================
// Channel Configuration — channel parameters with atomic save
// =============================================================================
//
// The four parameters that shape the trail channel.  They are fixed once a
// channel is constructed; a different parameter set means a different
// channel instance.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.  All fields carry `#[serde(default)]` so that a partial (or empty)
// config file still loads.
//
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ChannelError;

/// Smallest accepted `max_look_back`.  The trail recursion reads up to four
/// bars behind the current one, so the warm-up window must hold at least five.
pub const MIN_LOOK_BACK: usize = 5;

/// Largest accepted `max_look_back`.  Keeps the clean-range window
/// (`2 * max_look_back`) and the replay history allocation sane.
pub const MAX_LOOK_BACK: usize = 10_000;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_max_look_back() -> usize {
    15
}

fn default_threshold_factor() -> f64 {
    0.9
}

fn default_buffer_factor() -> f64 {
    0.05
}

fn default_max_dist_factor() -> f64 {
    2.0
}

// =============================================================================
// ChannelConfig
// =============================================================================

/// Parameters of the trail channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Warm-up window skipped by the scanner, and the cap on the bars-since-
    /// reset counters.  The volatility estimate spans twice this many bars.
    #[serde(default = "default_max_look_back")]
    pub max_look_back: usize,

    /// Clean-range multiple an excursion must exceed to reset a trail.
    #[serde(default = "default_threshold_factor")]
    pub threshold_factor: f64,

    /// Clean-range multiple kept as a margin below/above the recent extreme.
    #[serde(default = "default_buffer_factor")]
    pub buffer_factor: f64,

    /// Clean-range multiple bounding how far a trail may lag the extreme.
    #[serde(default = "default_max_dist_factor")]
    pub max_dist_factor: f64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            max_look_back: default_max_look_back(),
            threshold_factor: default_threshold_factor(),
            buffer_factor: default_buffer_factor(),
            max_dist_factor: default_max_dist_factor(),
        }
    }
}

impl std::fmt::Display for ChannelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TrailChannel({},{},{},{})",
            self.max_look_back, self.threshold_factor, self.buffer_factor, self.max_dist_factor
        )
    }
}

impl ChannelConfig {
    /// Check every parameter is usable.
    pub fn validate(&self) -> std::result::Result<(), ChannelError> {
        if self.max_look_back < MIN_LOOK_BACK {
            return Err(ChannelError::invalid_config(format!(
                "max_look_back must be at least {MIN_LOOK_BACK}, got {}",
                self.max_look_back
            )));
        }
        if self.max_look_back > MAX_LOOK_BACK {
            return Err(ChannelError::invalid_config(format!(
                "max_look_back must be at most {MAX_LOOK_BACK}, got {}",
                self.max_look_back
            )));
        }

        let factors = [
            ("threshold_factor", self.threshold_factor),
            ("buffer_factor", self.buffer_factor),
            ("max_dist_factor", self.max_dist_factor),
        ];
        for (name, value) in factors {
            if !value.is_finite() || value < 0.0 {
                return Err(ChannelError::invalid_config(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }

        Ok(())
    }

    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read channel config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse channel config from {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("invalid channel config in {}", path.display()))?;

        info!(path = %path.display(), channel = %config, "channel config loaded");

        Ok(config)
    }

    /// Persist the configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise channel config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "channel config saved (atomic)");
        Ok(())
    }
}
