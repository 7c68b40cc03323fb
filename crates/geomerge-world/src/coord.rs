//! Discrete grid addresses.
//!
//! A [`GridCoord`] names one cell of the unbounded world grid. Rows grow with
//! latitude and columns with longitude; both may be negative because the grid
//! is centred on an arbitrary origin. The canonical string form returned by
//! [`GridCoord::key`] is what the generator hashes and what save files store.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::WorldError;

// ---------------------------------------------------------------------------
// GridCoord
// ---------------------------------------------------------------------------

/// An immutable `(row, col)` cell address.
///
/// Ordering is row-major, which gives exports and diagnostics a stable order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct GridCoord {
    pub row: i64,
    pub col: i64,
}

impl GridCoord {
    /// Construct a coordinate. Any pair of integers is valid.
    #[inline]
    pub const fn new(row: i64, col: i64) -> Self {
        Self { row, col }
    }

    /// Canonical key `"{row},{col}"`.
    ///
    /// Injective over integer pairs: the comma cannot occur inside a decimal
    /// integer, and the sign stays attached to its own component.
    pub fn key(&self) -> String {
        format!("{},{}", self.row, self.col)
    }

    /// Parse a key produced by [`key`](Self::key).
    ///
    /// Only the canonical spelling is accepted, so `"+1,2"` or `"01,2"` are
    /// rejected even though they would parse as integers.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::MalformedKey`] if `key` is not of the form
    /// `"{row},{col}"`.
    pub fn from_key(key: &str) -> Result<Self, WorldError> {
        let malformed = || WorldError::MalformedKey {
            key: key.to_owned(),
        };
        let (row, col) = key.split_once(',').ok_or_else(malformed)?;
        let row = row.parse::<i64>().map_err(|_| malformed())?;
        let col = col.parse::<i64>().map_err(|_| malformed())?;
        let coord = Self::new(row, col);
        if coord.key() != key {
            return Err(malformed());
        }
        Ok(coord)
    }

    /// The coordinate shifted by `(d_row, d_col)`, saturating at the edges of
    /// the integer range.
    #[inline]
    pub fn offset(self, d_row: i64, d_col: i64) -> Self {
        Self::new(self.row.saturating_add(d_row), self.col.saturating_add(d_col))
    }

    /// Chebyshev distance: the number of king moves between two cells.
    #[inline]
    pub fn distance_to(&self, other: &GridCoord) -> u64 {
        self.row.abs_diff(other.row).max(self.col.abs_diff(other.col))
    }

    /// `true` if `other` lies within `radius` cells (Chebyshev).
    #[inline]
    pub fn is_within(&self, other: &GridCoord, radius: u64) -> bool {
        self.distance_to(other) <= radius
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

// ---------------------------------------------------------------------------
// DistanceMetric
// ---------------------------------------------------------------------------

/// The metric used for interaction range tests.
///
/// The two choices disagree only near the corners of the range: a cell at
/// `(3, 3)` is within radius 3 under Chebyshev but not under Euclidean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// `max(|dr|, |dc|)` -- a square range.
    #[default]
    Chebyshev,
    /// `sqrt(dr^2 + dc^2)` -- a round range.
    Euclidean,
}

impl DistanceMetric {
    /// `true` if `b` is within `radius` cells of `a` under this metric.
    ///
    /// The Euclidean case compares squared integer distances, so the boundary
    /// is exact. Squares saturate rather than wrap for extreme coordinates.
    pub fn is_within(self, a: &GridCoord, b: &GridCoord, radius: u64) -> bool {
        match self {
            DistanceMetric::Chebyshev => a.is_within(b, radius),
            DistanceMetric::Euclidean => {
                let dr = a.row.abs_diff(b.row) as u128;
                let dc = a.col.abs_diff(b.col) as u128;
                let r = radius as u128;
                dr.saturating_mul(dr).saturating_add(dc.saturating_mul(dc)) <= r * r
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
