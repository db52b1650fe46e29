//! CRS normalization.
//!
//! Reprojects a feature collection into a target CRS so that overlay
//! operands share one coordinate space. The risk layer's CRS is the
//! canonical target; the asset layer is moved into it.

mod definitions;
mod types;

pub use definitions::{definition, Definition, Projector};
pub use types::Crs;

use geo::MapCoords;
use thiserror::Error;
use tracing::debug;

use crate::feature::{Feature, FeatureCollection};

/// Errors raised while normalizing coordinate reference systems.
#[derive(Debug, Error)]
pub enum CrsError {
    /// The collection to reproject has no CRS
    #[error("layer has no coordinate reference system; cannot reproject to {target}")]
    Missing { target: Crs },

    /// The layer that defines the target CRS has none
    #[error("layer has no coordinate reference system to normalize the other layer into")]
    UndefinedTarget,

    /// No built-in definition exists for the CRS
    #[error("unsupported coordinate reference system: {0}")]
    Unsupported(Crs),

    /// The projection library rejected a definition
    #[error("invalid definition for {crs}: {message}")]
    Definition { crs: Crs, message: String },

    /// A coordinate could not be projected
    #[error("cannot project ({x}, {y}) from {from} to {to}: {message}")]
    Projection {
        from: Crs,
        to: Crs,
        x: f64,
        y: f64,
        message: String,
    },
}

/// Convenience alias for CRS results.
pub type CrsResult<T> = Result<T, CrsError>;

/// Reproject every geometry of `collection` into `target`.
///
/// The result is tagged with `target`. A collection already in `target`
/// is returned as an unchanged copy.
///
/// # Errors
///
/// * [`CrsError::Missing`] if the collection's CRS is undefined
/// * [`CrsError::Unsupported`] if either CRS has no built-in definition
/// * [`CrsError::Projection`] if any coordinate cannot be projected
pub fn reproject(collection: &FeatureCollection, target: Crs) -> CrsResult<FeatureCollection> {
    let source = collection.crs.ok_or(CrsError::Missing { target })?;

    if source == target {
        debug!(crs = %target, "Layer already in target CRS");
        return Ok(collection.clone());
    }

    debug!(from = %source, to = %target, features = collection.len(), "Reprojecting layer");
    let projector = Projector::new(source, target)?;

    let features = collection
        .iter()
        .map(|feature| {
            let geometry = feature
                .geometry
                .as_ref()
                .map(|g| g.try_map_coords(|c| projector.project(c)))
                .transpose()?;
            Ok(Feature {
                geometry,
                properties: feature.properties.clone(),
            })
        })
        .collect::<CrsResult<Vec<_>>>()?;

    Ok(FeatureCollection::with_features(features, Some(target)))
}
