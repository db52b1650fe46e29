//! floodrisk - flood-risk overlay for property locations
//!
//! Overlays a flood-risk polygon layer with an asset layer, counts and
//! saves the assets that fall inside a risk area, and renders a map of
//! the result over basemap tiles.
//!
//! # High-Level API
//!
//! The [`pipeline`] module runs configured jobs end to end:
//!
//! ```ignore
//! use floodrisk::pipeline::{run, RunOptions};
//!
//! let outcomes = run(Path::new("config.json"), &RunOptions::default(), &mut std::io::stdout())?;
//! ```
//!
//! The individual steps are available on their own:
//! [`layer::load_layer`], [`crs::reproject`], [`overlay::intersect`],
//! [`layer::write_layer`], [`report::print_report`] and
//! [`map::MapRenderer`].

pub mod config;
pub mod coord;
pub mod crs;
pub mod feature;
pub mod layer;
pub mod logging;
pub mod map;
pub mod overlay;
pub mod pipeline;
pub mod report;

/// Version of the floodrisk library and CLI.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
