//! CLI runner for common setup and operations.
//!
//! Owns the logging guard for the lifetime of the process and drives the
//! configured jobs.

use std::io;
use std::path::{Path, PathBuf};

use floodrisk::logging::{init_logging, LoggingGuard};
use floodrisk::pipeline::{self, JobOutcome, RunOptions};
use tracing::{error, info};

use crate::error::CliError;

/// Runner that manages CLI lifecycle.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
}

impl CliRunner {
    /// Initialize logging into `log_dir`.
    ///
    /// # Arguments
    ///
    /// * `debug_mode` - When true, enables debug-level logging unless RUST_LOG is set
    pub fn new(log_dir: &Path, debug_mode: bool) -> Result<Self, CliError> {
        let logging_guard =
            init_logging(log_dir, floodrisk::logging::DEFAULT_LOG_FILE, debug_mode)
                .map_err(CliError::LoggingInit)?;

        info!("floodrisk v{}", floodrisk::VERSION);
        Ok(Self { logging_guard })
    }

    /// Run the jobs configured in `config_path`, printing report lines to stdout.
    pub fn run(
        &self,
        config_path: &Path,
        options: &RunOptions,
    ) -> Result<Vec<JobOutcome>, CliError> {
        let stdout = io::stdout();
        let mut out = stdout.lock();

        pipeline::run(config_path, options, &mut out)
            .inspect(|outcomes| info!(jobs = outcomes.len(), "All jobs complete"))
            .map_err(|e| {
                error!(stage = %e.stage(), error = %e, "Job failed");
                CliError::from(e)
            })
    }
}

/// Resolve the log directory: explicit flag, else `logs` under the working directory.
pub fn log_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.unwrap_or_else(|| PathBuf::from(floodrisk::logging::DEFAULT_LOG_DIR))
}
