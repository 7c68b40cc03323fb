//! Event journal for everything that happens in a session.
//!
//! The [`EventJournal`] records one [`GameEvent`] per state change the game
//! performs. A front end drains it after each frame to show notifications
//! ("You combined two 4s!", "Save failed") and tests query it to assert on
//! what the game did rather than only on where it ended up.
//!
//! Entries carry a sequence number that keeps increasing across
//! [`drain`](EventJournal::drain) calls, so consumers can tell whether they
//! missed anything.
//!
//! The journal holds at most [`capacity`](EventJournal::capacity) pending
//! entries (default [`DEFAULT_JOURNAL_CAPACITY`]). A front end is expected to
//! drain it regularly. If it does not, the oldest entries are discarded, which
//! shows up as a gap in the sequence numbers and in
//! [`dropped`](EventJournal::dropped).
//!
//! # Example
//!
//! ```
//! use geomerge_engine::journal::{EventJournal, GameEvent};
//! use geomerge_world::coord::GridCoord;
//!
//! let mut journal = EventJournal::new();
//! journal.record(GameEvent::TokenPickedUp { cell: GridCoord::new(0, 1), value: 2 });
//! journal.record(GameEvent::GameSaved { mementos: 12 });
//!
//! assert_eq!(journal.len(), 2);
//! assert_eq!(journal.count_matching(|e| matches!(e, GameEvent::GameSaved { .. })), 1);
//!
//! let drained = journal.drain();
//! assert_eq!(drained[1].seq, 1);
//! assert!(journal.is_empty());
//! ```

use std::collections::VecDeque;

use geomerge_world::coord::GridCoord;
use serde::{Deserialize, Serialize};

/// Pending entries kept by [`EventJournal::new`].
pub const DEFAULT_JOURNAL_CAPACITY: usize = 4096;

// ---------------------------------------------------------------------------
// GameEvent
// ---------------------------------------------------------------------------

/// Something the game did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameEvent {
    /// The player changed cells.
    PlayerMoved { from: GridCoord, to: GridCoord },
    /// A token moved from a cell into the empty hand.
    TokenPickedUp { cell: GridCoord, value: u64 },
    /// The held token was put down on an empty cell.
    TokenPlaced { cell: GridCoord, value: u64 },
    /// Two equal tokens merged; `value` is the new cell value.
    TokensCombined { cell: GridCoord, value: u64 },
    /// The held token and the cell token traded places.
    TokensSwapped {
        cell: GridCoord,
        picked_up: u64,
        dropped: u64,
    },
    /// A mismatched pickup was refused.
    PickupRejected {
        cell: GridCoord,
        held: u64,
        found: u64,
    },
    /// A decided cell reached the winning threshold.
    GameWon {
        threshold: u64,
        cells: Vec<GridCoord>,
    },
    /// The session was written to disk.
    GameSaved { mementos: usize },
    /// Writing the session failed.
    SaveFailed { reason: String },
    /// A save could not be restored; a fresh game was started instead.
    LoadFailed { reason: String },
}

impl GameEvent {
    /// `true` for events a player should be told about. Moves and routine
    /// pickups are visible on the map already.
    pub fn is_notification(&self) -> bool {
        matches!(
            self,
            GameEvent::TokensCombined { .. }
                | GameEvent::PickupRejected { .. }
                | GameEvent::GameWon { .. }
                | GameEvent::SaveFailed { .. }
                | GameEvent::LoadFailed { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// EventJournal
// ---------------------------------------------------------------------------

/// A recorded event and its position in the session's event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub seq: u64,
    pub event: GameEvent,
}

/// Bounded event log with a session-wide sequence counter.
#[derive(Debug, Clone)]
pub struct EventJournal {
    entries: VecDeque<JournalEntry>,
    capacity: usize,
    next_seq: u64,
    dropped: u64,
}

impl Default for EventJournal {
    fn default() -> Self {
        Self::new()
    }
}

impl EventJournal {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_JOURNAL_CAPACITY)
    }

    /// A journal that keeps at most `capacity` pending entries. A capacity of
    /// zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            next_seq: 0,
            dropped: 0,
        }
    }

    /// Append `event` and return its sequence number. Discards the oldest
    /// pending entry when the journal is full.
    pub fn record(&mut self, event: GameEvent) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        if self.entries.len() == self.capacity {
            if let Some(oldest) = self.entries.pop_front() {
                self.dropped += 1;
                tracing::warn!(
                    seq = oldest.seq,
                    capacity = self.capacity,
                    "journal full, dropping oldest event"
                );
            }
        }
        self.entries.push_back(JournalEntry { seq, event });
        seq
    }

    /// Maximum number of pending entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries discarded so far because the journal was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Pending entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return every pending entry. Sequence numbers continue.
    pub fn drain(&mut self) -> Vec<JournalEntry> {
        self.entries.drain(..).collect()
    }

    /// Number of pending entries whose event satisfies `predicate`.
    pub fn count_matching(&self, predicate: impl Fn(&GameEvent) -> bool) -> usize {
        self.entries.iter().filter(|e| predicate(&e.event)).count()
    }

    /// Pending entries worth showing to the player.
    pub fn notifications(&self) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter().filter(|e| e.event.is_notification())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
