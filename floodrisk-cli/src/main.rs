//! floodrisk CLI - Command-line interface
//!
//! Runs the flood-risk overlay jobs described in a JSON configuration file.

mod error;
mod runner;

use std::path::PathBuf;

use clap::Parser;
use floodrisk::config::DEFAULT_CONFIG_PATH;
use floodrisk::overlay::CollisionPolicy;
use floodrisk::pipeline::{JobSelection, RunOptions};

use crate::runner::CliRunner;

#[derive(Debug, Parser)]
#[command(name = "floodrisk")]
#[command(version = floodrisk::VERSION)]
#[command(about = "Find properties inside flood-risk areas and map them", long_about = None)]
struct Args {
    /// Job configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Run every configured job instead of only the last one
    #[arg(long)]
    all_jobs: bool,

    /// Render maps without basemap tiles
    #[arg(long)]
    no_basemap: bool,

    /// Keep both values of shared attribute names as `<name>_1` and `<name>_2`
    /// (overrides the config's `collision` key)
    #[arg(long)]
    suffix_collisions: bool,

    /// Enable debug-level logging
    #[arg(long)]
    debug: bool,

    /// Directory for the log file (default: ./logs)
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Args {
    fn run_options(&self) -> RunOptions {
        RunOptions {
            selection: if self.all_jobs {
                JobSelection::All
            } else {
                JobSelection::Last
            },
            basemap: !self.no_basemap,
            policy: self.suffix_collisions.then_some(CollisionPolicy::Suffix),
        }
    }
}

fn main() {
    let args = Args::parse();

    let runner = match CliRunner::new(&runner::log_dir(args.log_dir.clone()), args.debug) {
        Ok(runner) => runner,
        Err(e) => e.exit(),
    };

    if let Err(e) = runner.run(&args.config, &args.run_options()) {
        // Flush the log file before exiting
        drop(runner);
        e.exit();
    }
}
