//! Job descriptors.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Extension appended to the plot title to name the vector output.
pub const VECTOR_OUTPUT_EXTENSION: &str = ".json";

/// One configured overlay job.
///
/// Each field is independent; absent fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobDescriptor {
    /// Path to the flood-risk polygon layer.
    pub risk_layer_path: String,
    /// Path to the property layer.
    pub asset_layer_path: String,
    /// Prefix printed before the at-risk count.
    pub command_read_out: String,
    /// Map title; also names both output files.
    pub plot_title: String,
}

impl JobDescriptor {
    /// Path of the at-risk GeoJSON output: the title plus `.json`.
    pub fn vector_output_path(&self) -> PathBuf {
        PathBuf::from(format!("{}{}", self.plot_title, VECTOR_OUTPUT_EXTENSION))
    }

    /// Path of the rendered map: the title with nothing appended.
    pub fn image_output_path(&self) -> PathBuf {
        PathBuf::from(&self.plot_title)
    }
}
