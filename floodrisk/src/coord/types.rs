//! Coordinate types and Web Mercator constants.

use std::fmt;

use thiserror::Error;

/// Latitude range covered by the square Web Mercator plane
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Zoom levels served by the common slippy-map basemap providers
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 19;

/// Edge length of a basemap tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// Semi-major axis of the WGS84 ellipsoid, used as the sphere radius
/// of Web Mercator (EPSG:3857).
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Half the width of the Web Mercator plane in meters.
pub const MERCATOR_HALF_EXTENT: f64 = std::f64::consts::PI * EARTH_RADIUS;

/// Tile coordinates in the Web Mercator / Slippy Map system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// Y coordinate (north-south), 0 at north
    pub row: u32,
    /// X coordinate (east-west), 0 at west
    pub col: u32,
    /// Zoom level (0-19)
    pub zoom: u8,
}

impl TileCoord {
    /// Number of tiles along one axis at this tile's zoom level.
    #[inline]
    pub fn tiles_per_axis(&self) -> u32 {
        1u32 << self.zoom
    }
}

impl fmt::Display for TileCoord {
    /// Formats as `z/x/y`, the path order used by tile servers.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.col, self.row)
    }
}

/// Errors raised by coordinate conversions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    #[error("latitude {0} is outside {min}..={max}", min = MIN_LAT, max = MAX_LAT)]
    InvalidLatitude(f64),

    #[error("longitude {0} is outside {min}..={max}", min = MIN_LON, max = MAX_LON)]
    InvalidLongitude(f64),

    #[error("zoom level {0} is outside {min}..={max}", min = MIN_ZOOM, max = MAX_ZOOM)]
    InvalidZoom(u8),
}
