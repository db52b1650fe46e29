//! Error types for the job driver.
//!
//! Every module error is wrapped in a [`PipelineError`] variant, and each
//! variant maps to the [`Stage`] the job was trying to reach when it failed.

use std::fmt;

use thiserror::Error;

use super::Stage;
use crate::config::ConfigError;
use crate::crs::CrsError;
use crate::layer::LayerError;
use crate::map::{BasemapFetchError, MapError, RenderError};
use crate::overlay::OverlayError;

/// Which input a layer error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerRole {
    Risk,
    Assets,
}

impl fmt::Display for LayerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Risk => write!(f, "risk"),
            Self::Assets => write!(f, "asset"),
        }
    }
}

/// Errors that stop a job.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The configuration file could not be read or parsed
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The configuration lists no jobs
    #[error("configuration contains no jobs")]
    NoJobs,

    /// An input layer could not be loaded
    #[error("{role} layer: {source}")]
    Load {
        role: LayerRole,
        #[source]
        source: LayerError,
    },

    /// The asset layer could not be brought into the risk layer's CRS
    #[error("{role} layer: {source}")]
    Crs {
        role: LayerRole,
        #[source]
        source: CrsError,
    },

    /// The overlay rejected its inputs
    #[error(transparent)]
    Overlay(#[from] OverlayError),

    /// The at-risk layer could not be written
    #[error(transparent)]
    Write(LayerError),

    /// The count line could not be printed
    #[error("failed to print report: {0}")]
    Report(#[source] std::io::Error),

    /// The map could not be drawn or encoded
    #[error("failed to render map: {0}")]
    Render(#[from] RenderError),

    /// Basemap tiles could not be fetched
    #[error("basemap unavailable: {0}")]
    Basemap(#[from] BasemapFetchError),
}

impl PipelineError {
    /// Stage the job was trying to reach when it failed.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Config(_) | Self::NoJobs => Stage::ConfigLoaded,
            Self::Load { .. } => Stage::LayersLoaded,
            Self::Crs { .. } => Stage::Normalized,
            Self::Overlay(_) => Stage::Overlaid,
            Self::Write(_) => Stage::Written,
            Self::Report(_) => Stage::Reported,
            Self::Render(_) | Self::Basemap(_) => Stage::Rendered,
        }
    }
}

impl From<MapError> for PipelineError {
    fn from(err: MapError) -> Self {
        match err {
            MapError::Render(e) => Self::Render(e),
            MapError::Basemap(e) => Self::Basemap(e),
        }
    }
}
