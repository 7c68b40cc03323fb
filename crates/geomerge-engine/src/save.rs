//! Save files with BLAKE3 integrity hashing.
//!
//! A [`SaveGame`] holds everything needed to resume a session: the player's
//! cell and held token value, plus every memento the world has recorded. The
//! generator is not saved; it is a pure function of configuration, so any
//! cell missing from the save regenerates exactly as it would have.
//!
//! The `hash` field is the BLAKE3 hex digest of the canonical JSON of the
//! other fields. [`SaveGame::verify`] recomputes it, so a hand-edited or
//! truncated file is rejected instead of silently producing a different world.
//!
//! ```
//! use geomerge_engine::prelude::*;
//!
//! let config = GameConfig::default();
//! let mut game = Game::new(config.clone()).unwrap();
//! game.visible_cells(game.viewport());
//!
//! let save = game.capture_save();
//! assert_eq!(save.hash.len(), 64);
//!
//! let json = save.to_json();
//! let restored = Game::from_save(config, &SaveGame::from_json(&json).unwrap()).unwrap();
//! assert_eq!(restored.world().memento_count(), game.world().memento_count());
//! ```
//!
//! # What Is NOT Saved
//!
//! - **Configuration** -- the caller supplies it on restore. Restoring with a
//!   different world config keeps every saved cell but changes the fallback
//!   for cells the save does not mention.
//! - **The won flag** -- recomputed from the restored mementos.
//! - **The event journal** -- notifications are transient.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use geomerge_world::coord::GridCoord;
use geomerge_world::snapshot::MementoRecord;
use geomerge_world::WorldError;
use serde::{Deserialize, Serialize};

/// Current on-disk format version.
pub const SAVE_FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// SaveError
// ---------------------------------------------------------------------------

/// Errors produced while reading, writing, or trusting a save.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// The file could not be read or written.
    #[error("save file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The text is not a well-formed save (bad JSON, missing fields,
    /// non-integer values).
    #[error("malformed save data: {0}")]
    Json(#[from] serde_json::Error),

    /// Written by an incompatible version of the game.
    #[error("unsupported save format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// The recorded hash does not match the contents.
    #[error("save hash mismatch: recorded {recorded} but recomputed {computed}")]
    HashMismatch { recorded: String, computed: String },

    /// The player's held token has value zero.
    #[error("save holds an inventory token of value 0")]
    InvalidInventory,

    /// A memento record is malformed.
    #[error("invalid world data in save: {0}")]
    World(#[from] WorldError),
}

impl SaveError {
    /// `true` if this error means the save file simply does not exist yet.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SaveError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

// ---------------------------------------------------------------------------
// SaveGame
// ---------------------------------------------------------------------------

/// Persisted player state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub row: i64,
    pub col: i64,
    /// Value of the held token, `None` for an empty hand.
    pub inventory: Option<u64>,
}

impl PlayerRecord {
    /// The saved position.
    pub fn position(&self) -> GridCoord {
        GridCoord::new(self.row, self.col)
    }
}

/// A complete, integrity-checked save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveGame {
    pub version: u32,
    pub player: PlayerRecord,
    /// Every decided cell, sorted row-major.
    pub mementos: Vec<MementoRecord>,
    /// BLAKE3 hex digest (64 lowercase hex chars) of the fields above.
    pub hash: String,
}

impl SaveGame {
    /// Assemble a save at the current format version and stamp its hash.
    pub fn new(player: PlayerRecord, mementos: Vec<MementoRecord>) -> Self {
        let hash = compute_hash(SAVE_FORMAT_VERSION, &player, &mementos);
        Self {
            version: SAVE_FORMAT_VERSION,
            player,
            mementos,
            hash,
        }
    }

    /// Check the version, the hash, and the inventory value.
    ///
    /// Memento records are validated later, atomically, by the world import.
    ///
    /// # Errors
    ///
    /// [`SaveError::UnsupportedVersion`], [`SaveError::HashMismatch`], or
    /// [`SaveError::InvalidInventory`].
    pub fn verify(&self) -> Result<(), SaveError> {
        if self.version != SAVE_FORMAT_VERSION {
            return Err(SaveError::UnsupportedVersion {
                found: self.version,
                expected: SAVE_FORMAT_VERSION,
            });
        }
        let computed = compute_hash(self.version, &self.player, &self.mementos);
        if computed != self.hash {
            return Err(SaveError::HashMismatch {
                recorded: self.hash.clone(),
                computed,
            });
        }
        if self.player.inventory == Some(0) {
            return Err(SaveError::InvalidInventory);
        }
        Ok(())
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("SaveGame should always be JSON-serializable")
    }

    /// Parse a save. The result is not yet verified.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::Json`] for malformed input.
    pub fn from_json(text: &str) -> Result<Self, SaveError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Write the save to `path`.
    ///
    /// The JSON goes to a sibling temporary file first and is then renamed
    /// over `path`, so an interrupted write never leaves a truncated save.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::Io`] if either step fails.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), SaveError> {
        let path = path.as_ref();
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, self.to_json()).map_err(|source| SaveError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, path).map_err(|source| SaveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    /// Read and parse a save from `path`. The result is not yet verified.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::Io`] if the file cannot be read and
    /// [`SaveError::Json`] if it does not parse.
    pub fn read_from(path: impl AsRef<Path>) -> Result<Self, SaveError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SaveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }
}

// ---------------------------------------------------------------------------
// Hashing helpers
// ---------------------------------------------------------------------------

/// BLAKE3 hex digest of everything in a save except the hash itself.
fn compute_hash(version: u32, player: &PlayerRecord, mementos: &[MementoRecord]) -> String {
    #[derive(Serialize)]
    struct HashableSave<'a> {
        version: u32,
        player: &'a PlayerRecord,
        mementos: &'a [MementoRecord],
    }

    let hashable = HashableSave {
        version,
        player,
        mementos,
    };
    let json_bytes =
        serde_json::to_vec(&hashable).expect("save contents should always be JSON-serializable");
    blake3::hash(&json_bytes).to_hex().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
