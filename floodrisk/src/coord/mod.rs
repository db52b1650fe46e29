//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude),
//! spherical Web Mercator meters (EPSG:3857) and slippy-map tile coordinates
//! used by basemap tile servers.

mod types;

pub use types::{
    CoordError, TileCoord, EARTH_RADIUS, MAX_LAT, MAX_LON, MAX_ZOOM, MERCATOR_HALF_EXTENT,
    MIN_LAT, MIN_LON, MIN_ZOOM, TILE_SIZE,
};

use std::f64::consts::PI;

use geo::{coord, Coord, Rect};

/// Projects longitude/latitude degrees onto the spherical Web Mercator plane.
pub fn lon_lat_to_mercator(lon: f64, lat: f64) -> Result<Coord<f64>, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }

    Ok(mercator_forward(lon, lat))
}

/// Spherical Mercator forward formula without the tile system's range
/// limits. Latitudes past the poles give a non-finite `y`.
pub fn mercator_forward(lon: f64, lat: f64) -> Coord<f64> {
    let x = EARTH_RADIUS * lon.to_radians();
    let y = EARTH_RADIUS * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
    coord! { x: x, y: y }
}

/// Inverse of [`lon_lat_to_mercator`]. Returns `(lon, lat)` in degrees.
pub fn mercator_to_lon_lat(x: f64, y: f64) -> Coord<f64> {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    coord! { x: lon, y: lat }
}

/// Web Mercator bounds of a tile in meters.
pub fn tile_bounds(tile: &TileCoord) -> Rect<f64> {
    let n = tile.tiles_per_axis() as f64;
    let span = 2.0 * MERCATOR_HALF_EXTENT / n;

    let min_x = -MERCATOR_HALF_EXTENT + tile.col as f64 * span;
    let max_y = MERCATOR_HALF_EXTENT - tile.row as f64 * span;

    Rect::new(
        coord! { x: min_x, y: max_y - span },
        coord! { x: min_x + span, y: max_y },
    )
}

/// Returns every tile at `zoom` that overlaps a Web Mercator extent,
/// in row-major order (north to south, west to east).
pub fn tiles_covering(extent: &Rect<f64>, zoom: u8) -> Result<Vec<TileCoord>, CoordError> {
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let n = 1u32 << zoom;
    let span = 2.0 * MERCATOR_HALF_EXTENT / n as f64;
    let index = |offset: f64| -> u32 { (offset / span).floor().clamp(0.0, (n - 1) as f64) as u32 };

    let col_min = index(extent.min().x + MERCATOR_HALF_EXTENT);
    let col_max = index(extent.max().x + MERCATOR_HALF_EXTENT);
    // Rows count down from the north edge
    let row_min = index(MERCATOR_HALF_EXTENT - extent.max().y);
    let row_max = index(MERCATOR_HALF_EXTENT - extent.min().y);

    let count = (row_max - row_min + 1) * (col_max - col_min + 1);
    let mut tiles = Vec::with_capacity(count as usize);
    for row in row_min..=row_max {
        for col in col_min..=col_max {
            tiles.push(TileCoord { row, col, zoom });
        }
    }
    Ok(tiles)
}
