//! Job stages.

use std::fmt;

/// Stage of a job run. Jobs move through the stages in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Nothing has run yet
    Init,
    /// The job configuration has been read
    ConfigLoaded,
    /// Both input layers are in memory
    LayersLoaded,
    /// The asset layer shares the risk layer's CRS
    Normalized,
    /// The at-risk collection has been computed
    Overlaid,
    /// The at-risk collection is on disk
    Written,
    /// The count line has been printed
    Reported,
    /// The map image is on disk
    Rendered,
    /// Job completed successfully
    Done,
}

impl Stage {
    /// Returns the stage name for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::ConfigLoaded => "config_loaded",
            Self::LayersLoaded => "layers_loaded",
            Self::Normalized => "normalized",
            Self::Overlaid => "overlaid",
            Self::Written => "written",
            Self::Reported => "reported",
            Self::Rendered => "rendered",
            Self::Done => "done",
        }
    }

    /// Returns true if this is the terminal stage.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
