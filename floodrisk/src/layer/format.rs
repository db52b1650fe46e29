//! Vector file formats.

use std::path::Path;

/// Vector formats the loader and writer understand.
///
/// Resolved once from the file extension at the I/O boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorFormat {
    /// RFC 7946 GeoJSON (plus the legacy `crs` member)
    GeoJson,
}

impl VectorFormat {
    /// Resolve the format from a path's extension.
    ///
    /// `.geojson` and `.json` map to GeoJSON (case-insensitive). Returns
    /// `None` for any other extension, including none at all.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "geojson" | "json" => Some(Self::GeoJson),
            _ => None,
        }
    }

    /// Resolve the format of a file from its extension, falling back to
    /// sniffing the content when the extension is not recognized.
    pub fn detect(path: &Path, content: &[u8]) -> Option<Self> {
        Self::from_path(path).or_else(|| Self::sniff(content))
    }

    /// Guess the format from the first non-whitespace byte.
    pub fn sniff(content: &[u8]) -> Option<Self> {
        // UTF-8 byte order mark bytes are skipped along with whitespace
        let first = content
            .iter()
            .find(|b| !(b.is_ascii_whitespace() || matches!(b, 0xEF | 0xBB | 0xBF)))?;
        (*first == b'{').then_some(Self::GeoJson)
    }

    /// Human-readable name of the format.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GeoJson => "GeoJSON",
        }
    }
}
