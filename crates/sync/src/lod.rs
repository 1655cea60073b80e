//! Zoom range estimation for imagery providers.
//!
//! The 3D engine tiles the globe geographically: two tiles wide and one
//! tile high at level 0, doubling along both axes per level. The 2D tile
//! grid of a layer says how many of its own tiles an extent spans; the
//! estimate picks the engine levels whose tiling spans the extent in a
//! comparable way.

use foundation::{Extent, Projection};
use layers::TileGrid;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_LEVEL: u32 = 20;

/// Deepest level the geographic tiling is evaluated at.
pub const LEVEL_LIMIT: u32 = 30;

/// Grid resolution the reference tile spread is measured at.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LodReference {
    #[default]
    Coarsest,
    Finest,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LodOptions {
    pub max_level: u32,
    pub reference: LodReference,
}

impl Default for LodOptions {
    fn default() -> Self {
        Self {
            max_level: DEFAULT_MAX_LEVEL,
            reference: LodReference::Coarsest,
        }
    }
}

/// Tile column/row of `[lon, lat]` at `level`, clamped to the tiling.
pub fn geographic_tile_xy(lon_lat: [f64; 2], level: u32) -> [i64; 2] {
    let level = level.min(LEVEL_LIMIT);
    let x_tiles = 2_i64 << level;
    let y_tiles = 1_i64 << level;
    let width = 360.0 / x_tiles as f64;
    let height = 180.0 / y_tiles as f64;
    let x = ((lon_lat[0] + 180.0) / width).floor() as i64;
    let y = ((90.0 - lon_lat[1]) / height).floor() as i64;
    [x.clamp(0, x_tiles - 1), y.clamp(0, y_tiles - 1)]
}

/// Horizontal and vertical tile spread of an extent's corners.
fn spread(tiles: [[i64; 2]; 4]) -> [i64; 2] {
    [
        (tiles[0][0] - tiles[1][0]).abs(),
        (tiles[0][1] - tiles[3][1]).abs(),
    ]
}

/// Estimates `[minimum_level, maximum_level]` for imagery covering
/// `extent` (in `projection`) that is served through `grid`.
///
/// The minimum is the deepest level at which the extent still fits in a
/// one-tile spread. The maximum is the shallowest level whose spread is
/// not smaller than the grid's own spread at the reference resolution.
/// Returns `None` when the grid has no resolutions.
pub fn min_max_level(
    grid: &TileGrid,
    extent: &Extent,
    projection: &Projection,
    options: &LodOptions,
) -> Option<[u32; 2]> {
    let resolution = match options.reference {
        LodReference::Coarsest => grid.coarsest_resolution()?,
        LodReference::Finest => grid.finest_resolution()?,
    };
    let corners = extent.corners();
    let [local_x, local_y] =
        spread(corners.map(|c| grid.tile_coord_for_coord_and_resolution(c, resolution)));
    let lon_lat = corners.map(|c| projection.to_lon_lat(c));
    let spread_at = |level: u32| spread(lon_lat.map(|c| geographic_tile_xy(c, level)));

    let cap = options.max_level.min(LEVEL_LIMIT);
    let mut min_level = 0;
    let mut max_level = cap;
    while min_level < max_level {
        let [dx, dy] = spread_at(min_level);
        if dx > 1 || dy > 1 {
            min_level = min_level.saturating_sub(1);
            break;
        }
        min_level += 1;
    }
    while max_level > min_level {
        let [dx, dy] = spread_at(max_level);
        if dx < local_x || dy < local_y {
            max_level = (max_level + 1).min(cap);
            break;
        }
        max_level -= 1;
    }
    Some([min_level, max_level])
}
