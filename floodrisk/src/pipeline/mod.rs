//! Job driver.
//!
//! Runs one configured job through a fixed sequence of stages:
//!
//! ```text
//! Init → ConfigLoaded → LayersLoaded → Normalized → Overlaid
//!      → Written → Reported → Rendered → Done
//! ```
//!
//! There is no retry and no rollback. A failure stops the job with a
//! [`PipelineError`] naming the stage it could not reach; artifacts written
//! by earlier stages stay on disk.

mod error;
mod runner;
mod stage;

pub use error::{LayerRole, PipelineError};
pub use runner::{run, select_jobs, JobOutcome, JobRunner, JobSelection, RunOptions};
pub use stage::Stage;
