//! Job configuration.
//!
//! A run is driven entirely by a JSON file (`config.json` by default):
//!
//! ```json
//! {
//!     "inputs": [
//!         {
//!             "risk_layer_path": "data/flood_zones.geojson",
//!             "asset_layer_path": "data/properties.geojson",
//!             "command_read_out": "At-risk properties: ",
//!             "plot_title": "Flood Risk Map"
//!         }
//!     ],
//!     "map": { "style": "light", "basemap": true },
//!     "collision": "clip_wins"
//! }
//! ```
//!
//! Every field is optional. Missing job fields default to an empty string
//! and a missing `inputs` key yields no jobs.

mod job;

pub use job::JobDescriptor;

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::{Error as _, Unexpected};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::map::MapSettings;
use crate::overlay::CollisionPolicy;

/// Default location of the job configuration, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON of the expected shape
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Parsed contents of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Jobs in configured order.
    pub inputs: Vec<JobDescriptor>,
    /// Map rendering settings shared by every job.
    pub map: MapSettings,
    /// How attribute names present on both layers are resolved.
    pub collision: CollisionPolicy,
}

impl JobConfig {
    /// Load and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config = Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        debug!(path = %path.display(), jobs = config.inputs.len(), "Loaded configuration");
        Ok(config)
    }

    /// Parse configuration from a JSON string.
    ///
    /// The document and every entry of `inputs` must be JSON objects;
    /// arrays in field order are rejected.
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(content)?;
        expect_object(&value, "a configuration object")?;
        if let Some(Value::Array(inputs)) = value.get("inputs") {
            for input in inputs {
                expect_object(input, "a job object")?;
            }
        }
        serde_json::from_value(value)
    }
}

fn expect_object(value: &Value, expected: &'static str) -> Result<(), serde_json::Error> {
    let unexpected = match value {
        Value::Object(_) => return Ok(()),
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Number(_) => Unexpected::Other("number"),
        Value::String(s) => Unexpected::Str(s),
        Value::Array(_) => Unexpected::Seq,
    };
    Err(serde_json::Error::invalid_type(unexpected, &expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::MapStyle;
    use tempfile::TempDir;

    #[test]
    fn test_full_config() {
        let config = JobConfig::parse(
            r#"{"inputs": [{
                "risk_layer_path": "zones.geojson",
                "asset_layer_path": "homes.geojson",
                "command_read_out": "At-risk properties: ",
                "plot_title": "Flood Risk Map"
            }]}"#,
        )
        .unwrap();

        assert_eq!(
            config.inputs,
            vec![JobDescriptor {
                risk_layer_path: "zones.geojson".to_string(),
                asset_layer_path: "homes.geojson".to_string(),
                command_read_out: "At-risk properties: ".to_string(),
                plot_title: "Flood Risk Map".to_string(),
            }]
        );
        assert_eq!(config.map, MapSettings::default());
    }

    #[test]
    fn test_missing_inputs_is_empty() {
        let config = JobConfig::parse("{}").unwrap();
        assert!(config.inputs.is_empty());
    }

    #[test]
    fn test_partial_descriptor_defaults_to_empty_strings() {
        let config =
            JobConfig::parse(r#"{"inputs": [{"risk_layer_path": "zones.geojson"}, {}]}"#).unwrap();

        assert_eq!(config.inputs.len(), 2);
        assert_eq!(config.inputs[0].risk_layer_path, "zones.geojson");
        assert_eq!(config.inputs[0].plot_title, "");
        assert_eq!(config.inputs[1], JobDescriptor::default());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config =
            JobConfig::parse(r#"{"version": 2, "inputs": [{"plot_title": "A", "extra": 1}]}"#)
                .unwrap();
        assert_eq!(config.inputs[0].plot_title, "A");
    }

    #[test]
    fn test_map_settings() {
        let config = JobConfig::parse(
            r#"{"map": {"style": "dark", "width": 800, "basemap": false, "timeout_secs": 5}}"#,
        )
        .unwrap();

        assert_eq!(config.map.style, MapStyle::Dark);
        assert_eq!(config.map.width, 800);
        assert_eq!(config.map.height, MapSettings::default().height);
        assert!(!config.map.basemap);
        assert_eq!(config.map.timeout_secs, 5);
    }

    #[test]
    fn test_wrong_shapes_are_parse_errors() {
        assert!(JobConfig::parse(r#"{"inputs": {}}"#).is_err());
        assert!(JobConfig::parse(r#"{"inputs": [{"plot_title": 3}]}"#).is_err());
        assert!(JobConfig::parse(r#"[]"#).is_err());
        assert!(JobConfig::parse("null").is_err());
    }

    #[test]
    fn test_array_document_is_rejected() {
        let err = JobConfig::parse(
            r#"[[{"plot_title": "Leeds", "risk_layer_path": "r.geojson"}]]"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("a configuration object"));
    }

    #[test]
    fn test_array_job_entry_is_rejected() {
        let err = JobConfig::parse(r#"{"inputs": [["r.geojson", "a.geojson", "", "Leeds"]]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("a job object"));
    }

    #[test]
    fn test_collision_policy() {
        assert_eq!(
            JobConfig::parse("{}").unwrap().collision,
            CollisionPolicy::ClipWins
        );
        assert_eq!(
            JobConfig::parse(r#"{"collision": "suffix"}"#).unwrap().collision,
            CollisionPolicy::Suffix
        );
        assert!(JobConfig::parse(r#"{"collision": "merge"}"#).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = JobConfig::load(&dir.path().join("config.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{\"inputs\": [").unwrap();

        let result = JobConfig::load(&path);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"inputs": [{"plot_title": "Leeds"}]}"#).unwrap();

        let config = JobConfig::load(&path).unwrap();
        assert_eq!(config.inputs[0].plot_title, "Leeds");
    }
}
