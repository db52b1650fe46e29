//! Built-in projection definitions and the coordinate projector.
//!
//! Every transformation pivots through WGS84 longitude/latitude degrees.
//! WGS84 and Web Mercator are handled in closed form; everything else is
//! delegated to `proj4rs` using the proj strings below.

use geo::{coord, Coord};
use proj4rs::transform::transform;
use proj4rs::Proj;

use super::{Crs, CrsError, CrsResult};
use crate::coord::{mercator_forward, mercator_to_lon_lat};

const WGS84_PROJ: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// A projection definition known to the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    /// WGS84 longitude/latitude degrees (the pivot CRS).
    Wgs84,
    /// Spherical Web Mercator meters.
    WebMercator,
    /// Any other CRS, described as a proj string.
    Proj4 {
        /// proj.4 definition string
        proj: String,
        /// True when coordinates are longitude/latitude degrees
        geographic: bool,
    },
}

/// Look up the definition of an EPSG code.
///
/// Returns `None` for codes outside the built-in table.
pub fn definition(crs: Crs) -> Option<Definition> {
    let geographic = |proj: &str| Definition::Proj4 {
        proj: proj.to_string(),
        geographic: true,
    };
    let projected = |proj: &str| Definition::Proj4 {
        proj: proj.to_string(),
        geographic: false,
    };

    let def = match crs.epsg() {
        4326 => Definition::Wgs84,
        3857 => Definition::WebMercator,
        // ETRS89
        4258 => geographic("+proj=longlat +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +no_defs"),
        // NAD83
        4269 => geographic("+proj=longlat +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +no_defs"),
        // World Mercator
        3395 => projected("+proj=merc +lon_0=0 +k=1 +x_0=0 +y_0=0 +datum=WGS84 +units=m +no_defs"),
        // British National Grid
        27700 => projected(
            "+proj=tmerc +lat_0=49 +lon_0=-2 +k=0.9996012717 +x_0=400000 +y_0=-100000 \
             +ellps=airy +towgs84=446.448,-125.157,542.06,0.15,0.247,0.842,-20.489 \
             +units=m +no_defs",
        ),
        // RGF93 / Lambert-93
        2154 => projected(
            "+proj=lcc +lat_0=46.5 +lon_0=3 +lat_1=49 +lat_2=44 +x_0=700000 +y_0=6600000 \
             +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs",
        ),
        // ETRS89 / LAEA Europe
        3035 => projected(
            "+proj=laea +lat_0=52 +lon_0=10 +x_0=4321000 +y_0=3210000 \
             +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs",
        ),
        code @ 32601..=32660 => projected(&format!(
            "+proj=utm +zone={} +datum=WGS84 +units=m +no_defs",
            code - 32600
        )),
        code @ 32701..=32760 => projected(&format!(
            "+proj=utm +zone={} +south +datum=WGS84 +units=m +no_defs",
            code - 32700
        )),
        _ => return None,
    };
    Some(def)
}

/// A definition resolved into something that can move coordinates.
enum Projection {
    Wgs84,
    WebMercator,
    Proj4 { proj: Proj, geographic: bool },
}

impl Projection {
    fn resolve(crs: Crs) -> CrsResult<Self> {
        match definition(crs).ok_or(CrsError::Unsupported(crs))? {
            Definition::Wgs84 => Ok(Self::Wgs84),
            Definition::WebMercator => Ok(Self::WebMercator),
            Definition::Proj4 { proj, geographic } => {
                let proj = Proj::from_proj_string(&proj).map_err(|e| CrsError::Definition {
                    crs,
                    message: e.to_string(),
                })?;
                Ok(Self::Proj4 { proj, geographic })
            }
        }
    }

    fn needs_pivot(&self) -> bool {
        matches!(self, Self::Proj4 { .. })
    }
}

/// Projects coordinates from a source CRS into a target CRS.
pub struct Projector {
    source: Projection,
    target: Projection,
    source_crs: Crs,
    target_crs: Crs,
    pivot: Option<Proj>,
}

impl Projector {
    /// Build a projector between two CRS with known definitions.
    pub fn new(source_crs: Crs, target_crs: Crs) -> CrsResult<Self> {
        let source = Projection::resolve(source_crs)?;
        let target = Projection::resolve(target_crs)?;

        let pivot = if source.needs_pivot() || target.needs_pivot() {
            Some(
                Proj::from_proj_string(WGS84_PROJ).map_err(|e| CrsError::Definition {
                    crs: Crs::WGS84,
                    message: e.to_string(),
                })?,
            )
        } else {
            None
        };

        Ok(Self {
            source,
            target,
            source_crs,
            target_crs,
            pivot,
        })
    }

    /// Project a single coordinate.
    pub fn project(&self, c: Coord<f64>) -> CrsResult<Coord<f64>> {
        let lon_lat = self.source_to_wgs84(c)?;
        let out = self.wgs84_to_target(lon_lat)?;

        if !(out.x.is_finite() && out.y.is_finite()) {
            return Err(self.failure(c, "result is not finite".to_string()));
        }
        Ok(out)
    }

    fn source_to_wgs84(&self, c: Coord<f64>) -> CrsResult<Coord<f64>> {
        match &self.source {
            Projection::Wgs84 => Ok(c),
            Projection::WebMercator => Ok(mercator_to_lon_lat(c.x, c.y)),
            Projection::Proj4 { proj, geographic } => {
                let mut point = if *geographic {
                    (c.x.to_radians(), c.y.to_radians(), 0.0)
                } else {
                    (c.x, c.y, 0.0)
                };
                let pivot = self.pivot()?;
                transform(proj, pivot, &mut point).map_err(|e| self.failure(c, e.to_string()))?;
                Ok(coord! { x: point.0.to_degrees(), y: point.1.to_degrees() })
            }
        }
    }

    fn wgs84_to_target(&self, c: Coord<f64>) -> CrsResult<Coord<f64>> {
        match &self.target {
            Projection::Wgs84 => Ok(c),
            Projection::WebMercator => Ok(mercator_forward(c.x, c.y)),
            Projection::Proj4 { proj, geographic } => {
                let mut point = (c.x.to_radians(), c.y.to_radians(), 0.0);
                let pivot = self.pivot()?;
                transform(pivot, proj, &mut point).map_err(|e| self.failure(c, e.to_string()))?;
                if *geographic {
                    Ok(coord! { x: point.0.to_degrees(), y: point.1.to_degrees() })
                } else {
                    Ok(coord! { x: point.0, y: point.1 })
                }
            }
        }
    }

    fn pivot(&self) -> CrsResult<&Proj> {
        self.pivot.as_ref().ok_or(CrsError::Definition {
            crs: Crs::WGS84,
            message: "pivot projection not initialized".to_string(),
        })
    }

    fn failure(&self, c: Coord<f64>, message: String) -> CrsError {
        CrsError::Projection {
            from: self.source_crs,
            to: self.target_crs,
            x: c.x,
            y: c.y,
            message,
        }
    }
}
