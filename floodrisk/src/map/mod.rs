//! Map rendering.
//!
//! Draws the risk layer, every asset and the at-risk subset over basemap
//! tiles and encodes the result as a PNG or JPEG image.
//!
//! # Example
//!
//! ```ignore
//! use floodrisk::map::{MapConfig, MapLayers, MapRenderer, NoBasemap};
//!
//! let renderer = MapRenderer::new(MapConfig::default(), Box::new(NoBasemap));
//! renderer.render(&layers, Path::new("Flood Risk Map"))?;
//! ```

mod figure;
mod format;
mod renderer;
mod style;
mod text;
mod tiles;

pub use figure::{Figure, LegendEntry, Swatch, Symbol, Viewport};
pub use format::ImageFormat;
pub use renderer::{choose_zoom, MapLayers, MapRenderer, RenderSummary};
pub use style::{MapConfig, MapSettings, MapStyle, Rgba};
pub use tiles::{tile_url, BasemapFetchError, HttpTileFetcher, NoBasemap, TileFetcher};

#[cfg(test)]
pub(crate) use tiles::tests::MockTileFetcher;

use std::path::PathBuf;

use thiserror::Error;

use crate::crs::CrsError;

/// Errors raised while drawing or encoding a map.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The output path is empty.
    #[error("output image path is empty")]
    EmptyPath,

    /// The output path names an image format that cannot be written.
    #[error("unsupported image format '.{extension}' for {path}")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// A layer could not be projected to Web Mercator.
    #[error("failed to project layer for drawing: {0}")]
    Projection(#[from] CrsError),

    /// The canvas could not be allocated.
    #[error("cannot create a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },

    /// Image encoding failed.
    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The output file could not be created.
    #[error("failed to create {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from [`MapRenderer::render`].
#[derive(Debug, Error)]
pub enum MapError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("basemap unavailable: {0}")]
    Basemap(#[from] BasemapFetchError),
}
