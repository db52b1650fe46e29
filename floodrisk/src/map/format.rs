//! Output image formats.

use std::path::Path;

use super::RenderError;

/// Raster formats the renderer can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Lossless PNG, also used when the path has no extension.
    Png,
    /// JPEG at quality 90.
    Jpeg,
}

impl ImageFormat {
    /// Resolve the format for an output path.
    ///
    /// A path without an extension gets PNG, the default figure format.
    /// Any extension other than `png`, `jpg` or `jpeg` is an error, as is
    /// an empty path.
    pub fn from_path(path: &Path) -> Result<Self, RenderError> {
        if path.as_os_str().is_empty() {
            return Err(RenderError::EmptyPath);
        }

        let Some(ext) = path.extension() else {
            return Ok(Self::Png);
        };

        match ext.to_string_lossy().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            other => Err(RenderError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: other.to_string(),
            }),
        }
    }
}
