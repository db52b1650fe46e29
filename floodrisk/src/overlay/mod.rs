//! Spatial overlay engine.
//!
//! Computes the feature-wise intersection of a base layer (properties) with
//! a clip layer (flood-risk areas). Every overlapping (base, clip) pair
//! produces one output feature carrying the intersection geometry and the
//! attributes of both sides. Features that overlap nothing are dropped.
//!
//! The result keeps the dimension of the base geometry: points stay points,
//! lines stay lines and polygons stay polygons. Lower-dimensional
//! by-products, such as two polygons sharing only an edge, are discarded.

mod attributes;
mod geometry;

pub use attributes::{merge_properties, CollisionPolicy};

use geo::{BoundingRect, Intersects, MultiPolygon, Rect};
use thiserror::Error;
use tracing::{debug, warn};

use crate::crs::Crs;
use crate::feature::{Feature, FeatureCollection};

/// Errors raised by the overlay engine.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// The operands are not in the same CRS
    #[error("overlay operands have different CRS: base {base:?}, clip {clip:?}")]
    CrsMismatch {
        base: Option<Crs>,
        clip: Option<Crs>,
    },

    /// A clip feature is not polygonal
    #[error("clip feature {index} is a {kind}; only polygonal clip layers are supported")]
    UnsupportedGeometry { index: usize, kind: &'static str },
}

/// Convenience alias for overlay results.
pub type OverlayResult<T> = Result<T, OverlayError>;

/// A clip feature prepared for repeated intersection tests.
struct ClipShape<'a> {
    feature: &'a Feature,
    polygons: MultiPolygon<f64>,
    bounds: Rect<f64>,
}

/// Intersect `base` with `clip`.
///
/// Output order is base features in order, and for each base feature the
/// clip features it overlaps in order. The result carries the shared CRS.
///
/// # Errors
///
/// * [`OverlayError::CrsMismatch`] if the operands' CRS tags differ
/// * [`OverlayError::UnsupportedGeometry`] if a clip feature is not polygonal
pub fn intersect(
    base: &FeatureCollection,
    clip: &FeatureCollection,
    policy: CollisionPolicy,
) -> OverlayResult<FeatureCollection> {
    if base.crs != clip.crs {
        return Err(OverlayError::CrsMismatch {
            base: base.crs,
            clip: clip.crs,
        });
    }

    let shapes = prepare_clip(clip)?;
    let mut features = Vec::new();
    let mut candidates = 0usize;

    for base_feature in base {
        let Some(base_geometry) = &base_feature.geometry else {
            continue;
        };
        let Some(base_bounds) = base_geometry.bounding_rect() else {
            continue;
        };

        for shape in shapes.iter().filter(|s| s.bounds.intersects(&base_bounds)) {
            candidates += 1;
            if let Some(geometry) = geometry::intersection(base_geometry, &shape.polygons) {
                features.push(Feature {
                    geometry: Some(geometry),
                    properties: merge_properties(
                        &base_feature.properties,
                        &shape.feature.properties,
                        policy,
                    ),
                });
            }
        }
    }

    debug!(
        base = base.len(),
        clip = clip.len(),
        candidates,
        intersecting = features.len(),
        "Overlay complete"
    );
    Ok(FeatureCollection::with_features(features, base.crs))
}

fn prepare_clip(clip: &FeatureCollection) -> OverlayResult<Vec<ClipShape<'_>>> {
    let mut shapes = Vec::with_capacity(clip.len());

    for (index, feature) in clip.iter().enumerate() {
        let Some(geometry) = &feature.geometry else {
            warn!(index, "Skipping clip feature without geometry");
            continue;
        };
        let polygons = geometry::polygonal(geometry).ok_or(OverlayError::UnsupportedGeometry {
            index,
            kind: geometry::kind(geometry),
        })?;
        if let Some(bounds) = polygons.bounding_rect() {
            shapes.push(ClipShape {
                feature,
                polygons,
                bounds,
            });
        }
    }

    Ok(shapes)
}
