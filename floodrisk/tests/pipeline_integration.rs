//! Integration tests for the flood-risk job pipeline.
//!
//! These tests drive whole jobs through `JobRunner` and `pipeline::run`:
//! - Loading layers and normalizing the asset CRS
//! - Overlay, result file and report line
//! - Map rendering with and without basemap tiles
//! - Job selection and failure stages

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use floodrisk::config::JobDescriptor;
use floodrisk::coord::{lon_lat_to_mercator, TileCoord};
use floodrisk::crs::{Crs, CrsError};
use floodrisk::layer::load_layer;
use floodrisk::map::{BasemapFetchError, MapConfig, MapRenderer, NoBasemap, TileFetcher};
use floodrisk::overlay::CollisionPolicy;
use floodrisk::pipeline::{self, JobRunner, JobSelection, PipelineError, RunOptions, Stage};
use geo::Geometry;
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

/// Serves solid-color PNG tiles and counts requests.
struct CountingFetcher {
    requests: Arc<AtomicUsize>,
    fail: bool,
}

impl TileFetcher for CountingFetcher {
    fn fetch(&self, tile: TileCoord) -> Result<Vec<u8>, BasemapFetchError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(BasemapFetchError::Http {
                url: tile.to_string(),
                message: "connection refused".to_string(),
            });
        }
        let img = image::RgbaImage::from_pixel(256, 256, image::Rgba([220, 220, 220, 255]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        Ok(buf.into_inner())
    }

    fn name(&self) -> &str {
        "counting"
    }
}

fn small_map() -> MapConfig {
    MapConfig {
        width: 320,
        height: 260,
        ..MapConfig::default()
    }
}

fn offline_runner() -> JobRunner {
    JobRunner::new(MapRenderer::new(small_map(), Box::new(NoBasemap)))
}

fn write_json(path: &Path, value: &Value) {
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn point_feature(x: f64, y: f64, id: &str) -> Value {
    json!({
        "type": "Feature",
        "geometry": { "type": "Point", "coordinates": [x, y] },
        "properties": { "id": id }
    })
}

/// Square risk zone (0,0)-(10,10) in WGS84 (no `crs` member).
fn risk_square() -> Value {
    json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]]]
            },
            "properties": { "zone": "A", "return_period": 100 }
        }]
    })
}

fn assets_wgs84() -> Value {
    json!({
        "type": "FeatureCollection",
        "features": [
            point_feature(2.0, 2.0, "p1"),
            point_feature(8.0, 8.0, "p2"),
            point_feature(20.0, 20.0, "p3"),
        ]
    })
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn layer(&self, name: &str, value: &Value) -> String {
        let path = self.path(name);
        write_json(&path, value);
        path.to_string_lossy().into_owned()
    }

    fn job(&self, risk: &Value, assets: &Value, title: &str) -> JobDescriptor {
        JobDescriptor {
            risk_layer_path: self.layer("risk.geojson", risk),
            asset_layer_path: self.layer("assets.geojson", assets),
            command_read_out: "At-risk properties: ".to_string(),
            plot_title: self.path(title).to_string_lossy().into_owned(),
        }
    }
}

/// Decode a rendered map. Titles often carry no extension, so the format
/// comes from the file's magic bytes.
fn decode_map(path: &Path) -> image::DynamicImage {
    image::ImageReader::open(path)
        .unwrap()
        .with_guessed_format()
        .unwrap()
        .decode()
        .unwrap()
}

fn ids(path: &Path) -> Vec<String> {
    load_layer(path)
        .unwrap()
        .iter()
        .map(|f| f.properties["id"].as_str().unwrap().to_string())
        .collect()
}

// =============================================================================
// End-to-end jobs
// =============================================================================

#[test]
fn test_points_inside_square_are_at_risk() {
    let fx = Fixture::new();
    let job = fx.job(&risk_square(), &assets_wgs84(), "Flood Risk Map");
    let mut out = Vec::new();

    let outcome = offline_runner().run(&job, &mut out).unwrap();

    assert_eq!(outcome.at_risk_count, 2);
    assert_eq!(String::from_utf8(out).unwrap(), "At-risk properties: 2\n");
    assert_eq!(outcome.vector_path, fx.path("Flood Risk Map.json"));
    assert_eq!(outcome.image_path, fx.path("Flood Risk Map"));

    assert_eq!(ids(&outcome.vector_path), vec!["p1", "p2"]);
    let written = load_layer(&outcome.vector_path).unwrap();
    assert_eq!(written.crs, Some(Crs::WGS84));
    // Attributes from both sides
    assert_eq!(written.features[0].properties["zone"], json!("A"));
    assert_eq!(written.features[0].properties["return_period"], json!(100));

    let img = decode_map(&outcome.image_path);
    assert_eq!((img.width(), img.height()), (320, 260));
}

#[test]
fn test_mercator_assets_match_wgs84_result() {
    let fx = Fixture::new();
    let features: Vec<Value> = [(2.0, 2.0, "p1"), (8.0, 8.0, "p2"), (20.0, 20.0, "p3")]
        .iter()
        .map(|&(lon, lat, id)| {
            let c = lon_lat_to_mercator(lon, lat).unwrap();
            point_feature(c.x, c.y, id)
        })
        .collect();
    let assets = json!({
        "type": "FeatureCollection",
        "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::3857" } },
        "features": features
    });
    let job = fx.job(&risk_square(), &assets, "mercator");
    let mut out = Vec::new();

    let outcome = offline_runner().run(&job, &mut out).unwrap();

    assert_eq!(outcome.at_risk_count, 2);
    assert_eq!(ids(&outcome.vector_path), vec!["p1", "p2"]);

    let written = load_layer(&outcome.vector_path).unwrap();
    assert_eq!(written.crs, Some(Crs::WGS84));
    match &written.features[1].geometry {
        Some(Geometry::Point(p)) => {
            assert!((p.x() - 8.0).abs() < 1e-6);
            assert!((p.y() - 8.0).abs() < 1e-6);
        }
        other => panic!("expected a point, got {:?}", other),
    }
}

#[test]
fn test_empty_intersection_writes_empty_collection() {
    let fx = Fixture::new();
    let assets = json!({
        "type": "FeatureCollection",
        "features": [point_feature(50.0, 50.0, "far")]
    });
    let job = fx.job(&risk_square(), &assets, "empty");
    let mut out = Vec::new();

    let outcome = offline_runner().run(&job, &mut out).unwrap();

    assert_eq!(outcome.at_risk_count, 0);
    assert_eq!(String::from_utf8(out).unwrap(), "At-risk properties: 0\n");

    let raw: Value = serde_json::from_str(&fs::read_to_string(&outcome.vector_path).unwrap()).unwrap();
    assert_eq!(raw["type"], json!("FeatureCollection"));
    assert_eq!(raw["features"], json!([]));
    assert!(outcome.image_path.exists());
}

#[test]
fn test_polygon_assets_are_clipped() {
    let fx = Fixture::new();
    let assets = json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[5.0, 5.0], [15.0, 5.0], [15.0, 15.0], [5.0, 15.0], [5.0, 5.0]]]
            },
            "properties": { "id": "parcel", "zone": "unzoned" }
        }]
    });
    let job = fx.job(&risk_square(), &assets, "parcels");
    let mut out = Vec::new();

    let outcome = offline_runner().run(&job, &mut out).unwrap();
    assert_eq!(outcome.at_risk_count, 1);

    let written = load_layer(&outcome.vector_path).unwrap();
    let feature = &written.features[0];
    // Risk attributes win on collision
    assert_eq!(feature.properties["zone"], json!("A"));
    assert_eq!(feature.properties["id"], json!("parcel"));

    use geo::Area;
    let area = feature.geometry.as_ref().unwrap().unsigned_area();
    assert!((area - 25.0).abs() < 1e-9);
}

#[test]
fn test_basemap_tiles_are_fetched() {
    let fx = Fixture::new();
    let job = fx.job(&risk_square(), &assets_wgs84(), "with-tiles.png");
    let requests = Arc::new(AtomicUsize::new(0));
    let fetcher = CountingFetcher {
        requests: requests.clone(),
        fail: false,
    };
    let runner = JobRunner::new(MapRenderer::new(small_map(), Box::new(fetcher)));
    let mut out = Vec::new();

    let outcome = runner.run(&job, &mut out).unwrap();

    assert!(outcome.render.zoom.is_some());
    assert!(outcome.render.tiles > 0);
    assert!(outcome.render.tiles <= small_map().max_tiles);
    assert_eq!(requests.load(Ordering::SeqCst), outcome.render.tiles);
    assert!(image::open(fx.path("with-tiles.png")).is_ok());
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_basemap_failure_keeps_written_layer() {
    let fx = Fixture::new();
    let job = fx.job(&risk_square(), &assets_wgs84(), "offline");
    let fetcher = CountingFetcher {
        requests: Arc::new(AtomicUsize::new(0)),
        fail: true,
    };
    let runner = JobRunner::new(MapRenderer::new(small_map(), Box::new(fetcher)));
    let mut out = Vec::new();

    let err = runner.run(&job, &mut out).unwrap_err();

    assert!(matches!(err, PipelineError::Basemap(_)));
    assert_eq!(err.stage(), Stage::Rendered);
    // Earlier stages already completed
    assert!(fx.path("offline.json").exists());
    assert_eq!(String::from_utf8(out).unwrap(), "At-risk properties: 2\n");
    assert!(!fx.path("offline").exists());
}

#[test]
fn test_undefined_asset_crs_fails_normalization() {
    let fx = Fixture::new();
    let assets = json!({
        "type": "FeatureCollection",
        "crs": null,
        "features": [point_feature(2.0, 2.0, "p1")]
    });
    let job = fx.job(&risk_square(), &assets, "nocrs");
    let mut out = Vec::new();

    let err = offline_runner().run(&job, &mut out).unwrap_err();

    assert_eq!(err.stage(), Stage::Normalized);
    assert!(out.is_empty());
    assert!(!fx.path("nocrs.json").exists());
}

#[test]
fn test_undefined_risk_crs_fails_normalization() {
    let fx = Fixture::new();
    let mut risk = risk_square();
    risk["crs"] = Value::Null;
    let job = fx.job(&risk, &assets_wgs84(), "norisk");
    let mut out = Vec::new();

    let err = offline_runner().run(&job, &mut out).unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Crs {
            source: CrsError::UndefinedTarget,
            ..
        }
    ));
    assert_eq!(err.stage(), Stage::Normalized);
    assert!(err.to_string().starts_with("risk layer:"));
    assert!(!err.to_string().contains("cannot reproject"));
    assert!(out.is_empty());
}

#[test]
fn test_assets_beyond_tile_latitudes_reach_mercator_risk_layer() {
    let fx = Fixture::new();
    let corner = |lon: f64, lat: f64| {
        let c = lon_lat_to_mercator(lon, lat).unwrap();
        json!([c.x, c.y])
    };
    let risk = json!({
        "type": "FeatureCollection",
        "crs": { "type": "name", "properties": { "name": "EPSG:3857" } },
        "features": [{
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    corner(0.0, 0.0), corner(10.0, 0.0), corner(10.0, 10.0),
                    corner(0.0, 10.0), corner(0.0, 0.0)
                ]]
            },
            "properties": { "zone": "A" }
        }]
    });
    let assets = json!({
        "type": "FeatureCollection",
        "features": [
            point_feature(2.0, 2.0, "inside"),
            point_feature(10.0, 86.0, "arctic"),
            point_feature(180.5, 10.0, "antimeridian"),
        ]
    });
    let job = fx.job(&risk, &assets, "polar");
    let mut out = Vec::new();

    let outcome = offline_runner().run(&job, &mut out).unwrap();

    assert_eq!(outcome.at_risk_count, 1);
    assert_eq!(ids(&outcome.vector_path), vec!["inside"]);
}

#[test]
fn test_missing_layer_fails_loading() {
    let fx = Fixture::new();
    let mut job = fx.job(&risk_square(), &assets_wgs84(), "missing");
    job.asset_layer_path = fx.path("nowhere.geojson").to_string_lossy().into_owned();
    let mut out = Vec::new();

    let err = offline_runner().run(&job, &mut out).unwrap_err();

    assert_eq!(err.stage(), Stage::LayersLoaded);
    assert!(err.to_string().starts_with("asset layer:"));
}

#[test]
fn test_unsupported_image_extension_fails_rendering() {
    let fx = Fixture::new();
    let job = fx.job(&risk_square(), &assets_wgs84(), "map.tiff");
    let mut out = Vec::new();

    let err = offline_runner().run(&job, &mut out).unwrap_err();

    assert!(matches!(err, PipelineError::Render(_)));
    assert!(fx.path("map.tiff.json").exists());
}

#[test]
fn test_missing_title_derives_bare_paths() {
    let config = floodrisk::config::JobConfig::parse(
        r#"{"inputs": [{"risk_layer_path": "r.geojson", "asset_layer_path": "a.geojson"}]}"#,
    )
    .unwrap();
    let job = &config.inputs[0];

    assert_eq!(job.plot_title, "");
    assert_eq!(job.command_read_out, "");
    assert_eq!(job.vector_output_path(), PathBuf::from(".json"));
    assert_eq!(job.image_output_path(), PathBuf::new());
}

// =============================================================================
// Configuration-driven runs
// =============================================================================

fn two_job_config(fx: &Fixture) -> PathBuf {
    let risk = fx.layer("risk.geojson", &risk_square());
    let assets = fx.layer("assets.geojson", &assets_wgs84());
    let config = json!({
        "inputs": [
            {
                "risk_layer_path": risk,
                "asset_layer_path": assets,
                "command_read_out": "first:",
                "plot_title": fx.path("first").to_string_lossy()
            },
            {
                "risk_layer_path": risk,
                "asset_layer_path": assets,
                "command_read_out": "second:",
                "plot_title": fx.path("second").to_string_lossy()
            }
        ],
        "map": { "width": 200, "height": 160, "basemap": false }
    });
    let path = fx.path("config.json");
    write_json(&path, &config);
    path
}

#[test]
fn test_only_last_job_runs_by_default() {
    let fx = Fixture::new();
    let config = two_job_config(&fx);
    let mut out = Vec::new();

    let outcomes = pipeline::run(&config, &RunOptions::default(), &mut out).unwrap();

    assert_eq!(outcomes.len(), 1);
    assert_eq!(String::from_utf8(out).unwrap(), "second:2\n");
    assert!(!fx.path("first.json").exists());
    assert!(fx.path("second.json").exists());

    let img = decode_map(&fx.path("second"));
    assert_eq!((img.width(), img.height()), (200, 160));
}

#[test]
fn test_all_jobs_run_in_order() {
    let fx = Fixture::new();
    let config = two_job_config(&fx);
    let options = RunOptions {
        selection: JobSelection::All,
        basemap: false,
        ..RunOptions::default()
    };
    let mut out = Vec::new();

    let outcomes = pipeline::run(&config, &options, &mut out).unwrap();

    assert_eq!(outcomes.len(), 2);
    assert_eq!(String::from_utf8(out).unwrap(), "first:2\nsecond:2\n");
    assert!(fx.path("first.json").exists());
    assert!(fx.path("second.json").exists());
}

#[test]
fn test_config_without_jobs() {
    let fx = Fixture::new();
    let path = fx.path("config.json");
    fs::write(&path, r#"{"inputs": []}"#).unwrap();
    let mut out = Vec::new();

    let err = pipeline::run(&path, &RunOptions::default(), &mut out).unwrap_err();

    assert!(matches!(err, PipelineError::NoJobs));
    assert_eq!(err.stage(), Stage::ConfigLoaded);
}

#[test]
fn test_malformed_config() {
    let fx = Fixture::new();
    let path = fx.path("config.json");
    fs::write(&path, r#"{"inputs": {"risk_layer_path": "r"}}"#).unwrap();
    let mut out = Vec::new();

    let err = pipeline::run(&path, &RunOptions::default(), &mut out).unwrap_err();

    assert!(matches!(err, PipelineError::Config(_)));
}

#[test]
fn test_collision_key_selects_suffix_policy() {
    let fx = Fixture::new();
    let assets = json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [2.0, 2.0] },
            "properties": { "id": "p1", "zone": "residential" }
        }]
    });
    let config = json!({
        "inputs": [{
            "risk_layer_path": fx.layer("risk.geojson", &risk_square()),
            "asset_layer_path": fx.layer("assets.geojson", &assets),
            "plot_title": fx.path("suffix").to_string_lossy()
        }],
        "map": { "width": 200, "height": 160, "basemap": false },
        "collision": "suffix"
    });
    let path = fx.path("config.json");
    write_json(&path, &config);
    let mut out = Vec::new();

    pipeline::run(&path, &RunOptions::default(), &mut out).unwrap();

    let written = load_layer(&fx.path("suffix.json")).unwrap();
    let properties = &written.features[0].properties;
    assert_eq!(properties["zone_1"], json!("residential"));
    assert_eq!(properties["zone_2"], json!("A"));
    assert!(!properties.contains_key("zone"));

    // An explicit policy in the run options overrides the config
    let options = RunOptions {
        policy: Some(CollisionPolicy::ClipWins),
        ..RunOptions::default()
    };
    pipeline::run(&path, &options, &mut Vec::new()).unwrap();

    let written = load_layer(&fx.path("suffix.json")).unwrap();
    assert_eq!(written.features[0].properties["zone"], json!("A"));
}
