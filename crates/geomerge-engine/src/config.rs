//! Session configuration.
//!
//! Every field of [`GameConfig`] has a default, so a config file only needs to
//! name what it changes:
//!
//! ```
//! use geomerge_engine::config::{GameConfig, PickupPolicy};
//!
//! let config = GameConfig::from_json_str(r#"{
//!     "interaction_radius": 8,
//!     "pickup_policy": "reject",
//!     "world": { "spawn_probability": 0.25 }
//! }"#).unwrap();
//!
//! assert_eq!(config.interaction_radius, 8);
//! assert_eq!(config.pickup_policy, PickupPolicy::Reject);
//! assert_eq!(config.world.spawn_probability, 0.25);
//! assert_eq!(config.world.max_initial_power, 2);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use geomerge_world::coord::DistanceMetric;
use geomerge_world::world::WorldConfig;
use geomerge_world::WorldError;
use serde::{Deserialize, Serialize};

use crate::projection::{GridProjection, LatLng};

/// Largest accepted `viewport_radius`. Every cell of the viewport is decided
/// and stored when viewed, so a 256-cell radius already covers 263 169 cells.
pub const MAX_VIEWPORT_RADIUS: u64 = 256;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors produced while loading or validating a [`GameConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config text is not valid JSON for [`GameConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A session-level value is out of range.
    #[error("invalid config: {reason}")]
    Invalid { reason: String },

    /// The embedded world configuration is out of range.
    #[error(transparent)]
    World(#[from] WorldError),
}

// ---------------------------------------------------------------------------
// PickupPolicy
// ---------------------------------------------------------------------------

/// What happens when the player clicks a token of a different value while
/// already holding one.
///
/// Equal values always merge; the policy only covers the mismatch case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupPolicy {
    /// The held token is put down on the cell and the cell's token is picked up.
    #[default]
    Swap,
    /// Nothing changes; the player must put their token down first.
    Reject,
}

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Constants for one game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Geographic position of cell `(0, 0)`'s south-west corner.
    pub origin: LatLng,
    /// Cell edge length in degrees, shared by both axes.
    pub cell_size: f64,
    /// Maximum distance, in cells, at which the player can touch tokens.
    pub interaction_radius: u64,
    /// Metric used for the interaction range test.
    pub distance_metric: DistanceMetric,
    /// Behaviour on clicking a mismatched token with a full hand.
    pub pickup_policy: PickupPolicy,
    /// Procedural generator parameters.
    pub world: WorldConfig,
    /// A token worth at least this much anywhere in the world wins the game.
    pub winning_threshold: u64,
    /// Half-width, in cells, of the viewport reported around the player. At
    /// most [`MAX_VIEWPORT_RADIUS`].
    pub viewport_radius: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            origin: LatLng::NULL_ISLAND,
            cell_size: 1e-4,
            interaction_radius: 3,
            distance_metric: DistanceMetric::Chebyshev,
            pickup_policy: PickupPolicy::Swap,
            world: WorldConfig::default(),
            winning_threshold: 16,
            viewport_radius: 12,
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and any error from
    /// [`validate`](Self::validate).
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_json_str`](Self::from_json_str).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        tracing::info!(path = %path.display(), "loaded game config");
        Ok(config)
    }

    /// Check every value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a non-finite origin, a cell size
    /// that is not positive and finite, a zero radius or threshold, or a
    /// viewport radius above [`MAX_VIEWPORT_RADIUS`], and
    /// [`ConfigError::World`] if the generator parameters are out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.origin.is_finite() {
            return Err(invalid(format!(
                "origin must be finite, got ({}, {})",
                self.origin.lat, self.origin.lng
            )));
        }
        if !(self.cell_size > 0.0 && self.cell_size.is_finite()) {
            return Err(invalid(format!(
                "cell_size must be positive and finite, got {}",
                self.cell_size
            )));
        }
        if self.interaction_radius == 0 {
            return Err(invalid("interaction_radius must be at least 1".to_owned()));
        }
        if self.winning_threshold == 0 {
            return Err(invalid("winning_threshold must be at least 1".to_owned()));
        }
        if self.viewport_radius > MAX_VIEWPORT_RADIUS {
            return Err(invalid(format!(
                "viewport_radius must be at most {MAX_VIEWPORT_RADIUS}, got {}",
                self.viewport_radius
            )));
        }
        self.world.validate()?;
        Ok(())
    }

    /// The projection described by `origin` and `cell_size`.
    pub fn projection(&self) -> GridProjection {
        GridProjection::new(self.origin, self.cell_size)
    }
}

fn invalid(reason: String) -> ConfigError {
    ConfigError::Invalid { reason }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
