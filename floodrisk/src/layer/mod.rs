//! Vector layer loading and writing.
//!
//! Layers are read into a [`FeatureCollection`] tagged with the CRS named in
//! the document's `crs` member (WGS84 when the member is absent) and written
//! back out as a GeoJSON `FeatureCollection`.
//!
//! # Example
//!
//! ```ignore
//! use floodrisk::layer::{load_layer, write_layer, VectorFormat};
//!
//! let zones = load_layer("flood_zones.geojson".as_ref())?;
//! write_layer(&zones, "copy.json".as_ref(), VectorFormat::GeoJson)?;
//! ```

mod format;
mod geojson_io;

pub use format::VectorFormat;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::feature::FeatureCollection;

/// Errors raised while reading or writing vector layers.
#[derive(Debug, Error)]
pub enum LayerError {
    /// The layer file could not be read
    #[error("failed to read layer {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not in a supported vector format
    #[error("unsupported vector format for {path}")]
    UnsupportedFormat { path: PathBuf },

    /// The content could not be parsed
    #[error("malformed layer {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    /// The layer could not be written
    #[error("failed to write layer {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias for layer results.
pub type LayerResult<T> = Result<T, LayerError>;

/// Load every feature of a vector file together with its CRS.
///
/// The format is resolved from the extension, falling back to content
/// sniffing.
///
/// # Errors
///
/// * [`LayerError::Read`] if the file is missing or unreadable
/// * [`LayerError::UnsupportedFormat`] if the format cannot be resolved
/// * [`LayerError::Malformed`] if the content does not parse
pub fn load_layer(path: &Path) -> LayerResult<FeatureCollection> {
    let content = fs::read(path).map_err(|e| LayerError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    let format = VectorFormat::detect(path, &content).ok_or_else(|| {
        LayerError::UnsupportedFormat {
            path: path.to_path_buf(),
        }
    })?;

    let collection = match format {
        VectorFormat::GeoJson => geojson_io::parse(&content),
    }
    .map_err(|message| LayerError::Malformed {
        path: path.to_path_buf(),
        message,
    })?;

    debug!(
        path = %path.display(),
        format = format.name(),
        features = collection.len(),
        crs = ?collection.crs,
        "Loaded layer"
    );
    Ok(collection)
}

/// Write a collection to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns [`LayerError::Write`] on any I/O failure (missing parent
/// directory, permissions, full disk).
pub fn write_layer(
    collection: &FeatureCollection,
    path: &Path,
    format: VectorFormat,
) -> LayerResult<()> {
    let write_err = |e: std::io::Error| LayerError::Write {
        path: path.to_path_buf(),
        source: e,
    };

    let file = File::create(path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);

    match format {
        VectorFormat::GeoJson => geojson_io::write(collection, &mut writer).map_err(write_err)?,
    }
    writer.flush().map_err(write_err)?;

    debug!(
        path = %path.display(),
        format = format.name(),
        features = collection.len(),
        "Wrote layer"
    );
    Ok(())
}
