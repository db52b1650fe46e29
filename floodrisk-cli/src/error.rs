//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use floodrisk::map::RenderError;
use floodrisk::pipeline::PipelineError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(std::io::Error),
    /// A job failed
    Job(PipelineError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Job(PipelineError::Config(_)) => {
                eprintln!();
                eprintln!("The job file is read from ./config.json unless --config is given.");
                eprintln!("Each entry in \"inputs\" takes risk_layer_path, asset_layer_path,");
                eprintln!("command_read_out and plot_title.");
            }
            CliError::Job(PipelineError::Basemap(_)) => {
                eprintln!();
                eprintln!("The at-risk layer was written before the map failed.");
                eprintln!("Re-run with --no-basemap to render without tiles.");
            }
            CliError::Job(PipelineError::Render(RenderError::UnsupportedFormat { .. })) => {
                eprintln!();
                eprintln!("The map is saved under the plot title. Use a title without an");
                eprintln!("extension, or one ending in .png, .jpg or .jpeg.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Job(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::Job(e) => Some(e),
        }
    }
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> Self {
        CliError::Job(e)
    }
}
