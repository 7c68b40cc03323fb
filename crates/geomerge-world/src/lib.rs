//! Geomerge World -- sparse, deterministically regenerating token grid.
//!
//! This crate is the persistence kernel of the geomerge game. The grid is
//! unbounded in every direction, yet only the cells a player has looked at or
//! touched are stored. Three pieces cooperate:
//!
//! - a deterministic hash ([`hash`]) decides whether an undecided cell holds a
//!   token and which value it has,
//! - a flyweight cache ([`token::TokenCache`]) hands out one shared
//!   [`Token`](token::Token) instance per value,
//! - a memento map ([`world::World`]) records the decided state of each
//!   visited cell so that the generator never runs twice for the same cell.
//!
//! # Quick Start
//!
//! ```
//! use geomerge_world::prelude::*;
//!
//! let config = WorldConfig { spawn_probability: 1.0, max_initial_power: 1 };
//! let mut world = World::new(config).unwrap();
//!
//! let origin = GridCoord::new(0, 0);
//! let token = world.query_or_spawn(origin).expect("probability 1.0 always spawns");
//! assert_eq!(token.value(), 1);
//!
//! world.place(origin, &token.combine());
//! assert_eq!(world.cell_state(origin), CellState::Spawned(2));
//! assert!(world.has_winning_token(2));
//! ```

#![deny(unsafe_code)]

pub mod coord;
pub mod hash;
pub mod snapshot;
pub mod token;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by world construction and memento import.
///
/// None of the grid operations themselves can fail; errors only arise from
/// invalid configuration or malformed persisted data.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The world configuration is out of range.
    #[error("invalid world configuration: {reason}")]
    InvalidConfig { reason: String },

    /// A persisted coordinate key could not be parsed back into a coordinate.
    #[error("malformed coordinate key '{key}': expected \"row,col\"")]
    MalformedKey { key: String },

    /// A persisted memento carried a token value that no token can have.
    #[error("memento for cell {key} has invalid token value {value} (must be >= 1)")]
    InvalidTokenValue { key: String, value: u64 },

    /// The same coordinate appeared more than once in an import payload.
    #[error("duplicate memento for cell {key}")]
    DuplicateMemento { key: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::coord::{DistanceMetric, GridCoord};
    pub use crate::hash::{unit_hash, Blake3Hasher, SpawnHasher};
    pub use crate::snapshot::MementoRecord;
    pub use crate::token::{Token, TokenCache, TokenRef};
    pub use crate::world::{CellState, Memento, World, WorldConfig};
    pub use crate::WorldError;
}
