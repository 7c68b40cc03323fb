//! Position updates as messages.
//!
//! Whatever moves the player (keyboard, a geolocation watcher, a scripted
//! walk) runs on its own schedule and talks to the game only through a
//! [`PositionSender`]. The game drains the matching [`PositionReceiver`] on its
//! own thread and applies updates one at a time, in arrival order.

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use geomerge_world::coord::GridCoord;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::projection::{GridProjection, LatLng};

// ---------------------------------------------------------------------------
// Direction / MoveCommand
// ---------------------------------------------------------------------------

/// One-cell step on the grid. North increases the row (latitude).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// `(d_row, d_col)` for this direction.
    pub const fn delta(self) -> (i64, i64) {
        match self {
            Direction::North => (1, 0),
            Direction::South => (-1, 0),
            Direction::East => (0, 1),
            Direction::West => (0, -1),
        }
    }
}

/// A request to move the player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoveCommand {
    /// Move one cell.
    Step { direction: Direction },
    /// Jump to a cell.
    Teleport { cell: GridCoord },
    /// Jump to the cell containing a geographic position.
    Geo { position: LatLng },
}

impl MoveCommand {
    /// The cell the player ends up in when starting from `from`.
    pub fn resolve(&self, from: GridCoord, projection: &GridProjection) -> GridCoord {
        match *self {
            MoveCommand::Step { direction } => {
                let (d_row, d_col) = direction.delta();
                from.offset(d_row, d_col)
            }
            MoveCommand::Teleport { cell } => cell,
            MoveCommand::Geo { position } => projection.to_cell(position),
        }
    }
}

impl From<Direction> for MoveCommand {
    fn from(direction: Direction) -> Self {
        MoveCommand::Step { direction }
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// The receiving half of the position channel was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("position channel closed")]
pub struct ChannelClosed;

/// Producer side of the position channel. Cheap to clone; one per source.
#[derive(Debug, Clone)]
pub struct PositionSender {
    tx: Sender<MoveCommand>,
}

impl PositionSender {
    /// Queue a move.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelClosed`] if the game side has gone away.
    pub fn send(&self, command: MoveCommand) -> Result<(), ChannelClosed> {
        self.tx.send(command).map_err(|_| ChannelClosed)
    }
}

/// Consumer side of the position channel, owned by whoever drives the game.
#[derive(Debug)]
pub struct PositionReceiver {
    rx: Receiver<MoveCommand>,
}

impl PositionReceiver {
    /// Every queued command, oldest first, without blocking.
    pub fn drain(&self) -> impl Iterator<Item = MoveCommand> + '_ {
        self.rx.try_iter()
    }

    /// Block until the next command arrives.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelClosed`] once every sender is dropped and the queue
    /// is empty.
    pub fn recv(&self) -> Result<MoveCommand, ChannelClosed> {
        self.rx.recv().map_err(|_| ChannelClosed)
    }

    /// The next command if one is queued.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelClosed`] if the queue is empty and every sender has
    /// been dropped. An empty queue with live senders is `Ok(None)`.
    pub fn try_recv(&self) -> Result<Option<MoveCommand>, ChannelClosed> {
        match self.rx.try_recv() {
            Ok(command) => Ok(Some(command)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(ChannelClosed),
        }
    }

    /// Number of queued commands.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Create an unbounded position channel.
pub fn position_channel() -> (PositionSender, PositionReceiver) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (PositionSender { tx }, PositionReceiver { rx })
}

// ---------------------------------------------------------------------------
// RandomWalk
// ---------------------------------------------------------------------------

/// Seeded stream of random one-cell steps.
///
/// Stands in for a live position source in headless runs and tests. The same
/// seed always yields the same walk.
#[derive(Debug, Clone)]
pub struct RandomWalk {
    rng: Pcg64,
}

impl RandomWalk {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    /// Send the next `steps` moves into `sender`.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelClosed`] as soon as a send fails.
    pub fn feed(&mut self, sender: &PositionSender, steps: usize) -> Result<(), ChannelClosed> {
        for command in self.by_ref().take(steps) {
            sender.send(command)?;
        }
        Ok(())
    }
}

impl Iterator for RandomWalk {
    type Item = MoveCommand;

    fn next(&mut self) -> Option<MoveCommand> {
        let direction = Direction::ALL[self.rng.gen_range(0..Direction::ALL.len())];
        Some(direction.into())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
