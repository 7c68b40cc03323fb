//! The player: a grid position and a single-slot hand.

use geomerge_world::coord::{DistanceMetric, GridCoord};
use geomerge_world::token::TokenRef;

/// The avatar the game moves around the grid.
///
/// The hand holds at most one token. Tokens in the hand are the same shared
/// instances the world hands out, so a held token and a cell token of equal
/// value are pointer-equal.
#[derive(Debug, Clone, Default)]
pub struct Player {
    position: GridCoord,
    inventory: Option<TokenRef>,
}

impl Player {
    /// A player standing at `position` with an empty hand.
    pub fn new(position: GridCoord) -> Self {
        Self {
            position,
            inventory: None,
        }
    }

    /// Current cell.
    #[inline]
    pub fn position(&self) -> GridCoord {
        self.position
    }

    /// Jump to `position`.
    pub fn set_position(&mut self, position: GridCoord) {
        self.position = position;
    }

    /// Move by a relative offset and return the new position.
    pub fn move_by(&mut self, d_row: i64, d_col: i64) -> GridCoord {
        self.position = self.position.offset(d_row, d_col);
        self.position
    }

    /// The held token, if any.
    #[inline]
    pub fn holding(&self) -> Option<&TokenRef> {
        self.inventory.as_ref()
    }

    /// `true` if `coord` is within `radius` cells of the player under `metric`.
    pub fn is_in_range(&self, coord: GridCoord, radius: u64, metric: DistanceMetric) -> bool {
        metric.is_within(&self.position, &coord, radius)
    }

    /// Put `token` in the hand and return whatever was there before.
    pub fn pick_up_token(&mut self, token: TokenRef) -> Option<TokenRef> {
        self.inventory.replace(token)
    }

    /// Empty the hand and return what it held.
    pub fn place_token(&mut self) -> Option<TokenRef> {
        self.inventory.take()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
