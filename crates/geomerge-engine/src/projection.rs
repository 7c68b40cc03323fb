//! Mapping between geographic positions and grid cells.
//!
//! The grid is a fixed-size quantization anchored at an origin: cell
//! `(row, col)` covers latitudes `[origin.lat + row * size, origin.lat +
//! (row + 1) * size)` and the matching band of longitudes. The same
//! `cell_size` is used in both directions, so [`GridProjection::to_cell`]
//! and [`GridProjection::cell_bounds`] are exact inverses on cell corners.

use geomerge_world::coord::GridCoord;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// LatLng
// ---------------------------------------------------------------------------

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Null Island, the default grid origin.
    pub const NULL_ISLAND: LatLng = LatLng::new(0.0, 0.0);

    /// `true` if both components are finite.
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

// ---------------------------------------------------------------------------
// GridProjection
// ---------------------------------------------------------------------------

/// South-west and north-east corners of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

/// Quantizes positions into cells and back.
///
/// Construction is unchecked; [`GameConfig::validate`](crate::config::GameConfig::validate)
/// guarantees a positive, finite `cell_size` and a finite origin before a
/// projection is built from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridProjection {
    pub origin: LatLng,
    pub cell_size: f64,
}

impl GridProjection {
    pub const fn new(origin: LatLng, cell_size: f64) -> Self {
        Self { origin, cell_size }
    }

    /// The cell containing `position`: `floor((value - origin) / cell_size)`
    /// per axis.
    ///
    /// Positions beyond the `i64` range saturate (`as` casts from `f64` are
    /// saturating), and NaN maps to 0.
    pub fn to_cell(&self, position: LatLng) -> GridCoord {
        GridCoord::new(
            ((position.lat - self.origin.lat) / self.cell_size).floor() as i64,
            ((position.lng - self.origin.lng) / self.cell_size).floor() as i64,
        )
    }

    /// Geographic extent of `cell`.
    pub fn cell_bounds(&self, cell: GridCoord) -> CellBounds {
        CellBounds {
            south_west: self.corner(cell.row, cell.col),
            north_east: self.corner(cell.row.saturating_add(1), cell.col.saturating_add(1)),
        }
    }

    /// Geographic centre of `cell`.
    pub fn cell_center(&self, cell: GridCoord) -> LatLng {
        LatLng::new(
            self.origin.lat + (cell.row as f64 + 0.5) * self.cell_size,
            self.origin.lng + (cell.col as f64 + 0.5) * self.cell_size,
        )
    }

    fn corner(&self, row: i64, col: i64) -> LatLng {
        LatLng::new(
            self.origin.lat + row as f64 * self.cell_size,
            self.origin.lng + col as f64 * self.cell_size,
        )
    }
}

// ---------------------------------------------------------------------------
// CellRect
// ---------------------------------------------------------------------------

/// An inclusive rectangle of cells, typically the renderer's viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRect {
    pub min: GridCoord,
    pub max: GridCoord,
}

impl CellRect {
    /// The rectangle spanning `a` and `b`, in either order.
    pub fn spanning(a: GridCoord, b: GridCoord) -> Self {
        Self {
            min: GridCoord::new(a.row.min(b.row), a.col.min(b.col)),
            max: GridCoord::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    /// The square of cells within `radius` of `center` (Chebyshev).
    pub fn around(center: GridCoord, radius: u64) -> Self {
        let r = i64::try_from(radius).unwrap_or(i64::MAX);
        Self {
            min: center.offset(-r, -r),
            max: center.offset(r, r),
        }
    }

    /// `true` if `cell` lies inside the rectangle.
    pub fn contains(&self, cell: GridCoord) -> bool {
        (self.min.row..=self.max.row).contains(&cell.row)
            && (self.min.col..=self.max.col).contains(&cell.col)
    }

    /// Number of cells covered.
    pub fn len(&self) -> u128 {
        let rows = self.max.row.abs_diff(self.min.row) as u128 + 1;
        let cols = self.max.col.abs_diff(self.min.col) as u128 + 1;
        rows.saturating_mul(cols)
    }

    /// Always `false`: a rectangle covers at least one cell.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = GridCoord> {
        let (min, max) = (self.min, self.max);
        (min.row..=max.row)
            .flat_map(move |row| (min.col..=max.col).map(move |col| GridCoord::new(row, col)))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn projection() -> GridProjection {
        GridProjection::new(LatLng::new(36.9895, -122.0628), 1e-4)
    }

    #[test]
    fn origin_maps_to_zero() {
        let p = projection();
        assert_eq!(p.to_cell(p.origin), GridCoord::new(0, 0));
    }

    #[test]
    fn floor_sends_negative_offsets_down() {
        let p = GridProjection::new(LatLng::NULL_ISLAND, 1.0);
        assert_eq!(p.to_cell(LatLng::new(-0.5, 0.5)), GridCoord::new(-1, 0));
        assert_eq!(p.to_cell(LatLng::new(2.999, -3.0)), GridCoord::new(2, -3));
    }

    #[test]
    fn cell_center_maps_back_to_its_cell() {
        let p = projection();
        for cell in CellRect::around(GridCoord::new(-7, 12), 5).iter() {
            assert_eq!(p.to_cell(p.cell_center(cell)), cell);
        }
    }

    #[test]
    fn bounds_share_edges_with_neighbours() {
        let p = GridProjection::new(LatLng::NULL_ISLAND, 0.5);
        let a = p.cell_bounds(GridCoord::new(0, 0));
        let b = p.cell_bounds(GridCoord::new(1, 1));
        assert_eq!(a.north_east, b.south_west);
        assert_eq!(a.south_west, LatLng::new(0.0, 0.0));
        assert_eq!(a.north_east, LatLng::new(0.5, 0.5));
    }

    #[test]
    fn rect_around_covers_square() {
        let rect = CellRect::around(GridCoord::new(0, 0), 2);
        assert_eq!(rect.len(), 25);
        assert_eq!(rect.iter().count(), 25);
        assert!(rect.contains(GridCoord::new(-2, 2)));
        assert!(!rect.contains(GridCoord::new(3, 0)));
        assert_eq!(rect.iter().next(), Some(GridCoord::new(-2, -2)));
    }

    #[test]
    fn spanning_normalizes_corners() {
        let rect = CellRect::spanning(GridCoord::new(3, -1), GridCoord::new(-1, 4));
        assert_eq!(rect.min, GridCoord::new(-1, -1));
        assert_eq!(rect.max, GridCoord::new(3, 4));
    }
}
