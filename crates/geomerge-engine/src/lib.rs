//! Geomerge Engine -- the game session built on [`geomerge_world`].
//!
//! This crate wires the world-persistence kernel into a playable session: a
//! [`Player`](player::Player) with a single-slot hand, a
//! [`GridProjection`](projection::GridProjection) that quantizes geographic
//! positions into grid cells, a message channel for position updates, an
//! [`EventJournal`](journal::EventJournal) for user-facing notifications, and
//! integrity-checked save files.
//!
//! # Quick Start
//!
//! ```
//! use geomerge_engine::prelude::*;
//!
//! let config = GameConfig {
//!     world: WorldConfig { spawn_probability: 1.0, max_initial_power: 1 },
//!     winning_threshold: 2,
//!     ..Default::default()
//! };
//! let mut game = Game::new(config).unwrap();
//!
//! // Every cell holds a 1; pick one up and merge it into its neighbour.
//! assert!(matches!(game.interact(GridCoord::new(0, 0)), Interaction::PickedUp { .. }));
//! assert!(matches!(game.interact(GridCoord::new(0, 1)), Interaction::Combined { value: 2, .. }));
//! assert!(game.is_won());
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod game;
pub mod journal;
pub mod movement;
pub mod player;
pub mod projection;
pub mod save;

use geomerge_world::WorldError;

use crate::config::ConfigError;
use crate::save::SaveError;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the world crate for convenience.
pub use geomerge_world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while creating or restoring a game session.
///
/// Gameplay itself never fails: out-of-range clicks and moves after a win
/// are reported as [`Interaction`](game::Interaction) outcomes, not errors.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The session configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The world rejected its configuration or data.
    #[error(transparent)]
    World(#[from] WorldError),

    /// A save file could not be read, written, or trusted.
    #[error(transparent)]
    Save(#[from] SaveError),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    // Re-export everything from the world prelude.
    pub use geomerge_world::prelude::*;

    // Engine-specific exports.
    pub use crate::config::{ConfigError, GameConfig, PickupPolicy};
    pub use crate::game::{CellView, Game, Interaction};
    pub use crate::journal::{EventJournal, GameEvent, JournalEntry};
    pub use crate::movement::{
        position_channel, ChannelClosed, Direction, MoveCommand, PositionReceiver,
        PositionSender, RandomWalk,
    };
    pub use crate::player::Player;
    pub use crate::projection::{CellBounds, CellRect, GridProjection, LatLng};
    pub use crate::save::{PlayerRecord, SaveError, SaveGame, SAVE_FORMAT_VERSION};
    pub use crate::GameError;
}
