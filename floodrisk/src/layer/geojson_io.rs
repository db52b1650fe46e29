//! GeoJSON reading and writing.

use std::io::Write;

use geo::Geometry;
use geojson::{GeoJson, JsonObject};
use serde_json::{json, Value};

use crate::crs::Crs;
use crate::feature::{Feature, FeatureCollection};

/// Parse a GeoJSON document.
///
/// Accepts a `FeatureCollection`, a single `Feature` or a bare geometry;
/// the latter two become a one-feature collection.
pub(super) fn parse(content: &[u8]) -> Result<FeatureCollection, String> {
    let text = std::str::from_utf8(content).map_err(|e| format!("invalid UTF-8: {}", e))?;
    let value: Value = serde_json::from_str(text.trim_start_matches('\u{feff}'))
        .map_err(|e| format!("invalid JSON: {}", e))?;

    let crs = crs_from_member(value.get("crs"))?;

    let features = match GeoJson::from_json_value(value).map_err(|e| e.to_string())? {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(geometry) => vec![geojson::Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: None,
            foreign_members: None,
        }],
    };

    let features = features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| {
            let geometry = feature
                .geometry
                .map(Geometry::<f64>::try_from)
                .transpose()
                .map_err(|e| format!("feature {}: {}", index, e))?;
            Ok(Feature {
                geometry,
                properties: feature.properties.unwrap_or_default(),
            })
        })
        .collect::<Result<Vec<_>, String>>()?;

    Ok(FeatureCollection::with_features(features, crs))
}

/// Serialize a collection as a GeoJSON `FeatureCollection`.
pub(super) fn write<W: Write>(collection: &FeatureCollection, writer: W) -> std::io::Result<()> {
    let features = collection
        .iter()
        .map(|feature| geojson::Feature {
            bbox: None,
            geometry: feature
                .geometry
                .as_ref()
                .map(|g| geojson::Geometry::new(geojson::Value::from(g))),
            id: None,
            properties: Some(feature.properties.clone()),
            foreign_members: None,
        })
        .collect();

    let mut foreign_members = JsonObject::new();
    foreign_members.insert("crs".to_string(), crs_member(collection.crs));

    let document = geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(foreign_members),
    };

    serde_json::to_writer(writer, &document)?;
    Ok(())
}

/// Resolve the legacy GeoJSON `crs` member.
///
/// An absent member means WGS84; an explicit `null` means undefined.
fn crs_from_member(member: Option<&Value>) -> Result<Option<Crs>, String> {
    let member = match member {
        None => return Ok(Some(Crs::WGS84)),
        Some(Value::Null) => return Ok(None),
        Some(member) => member,
    };

    let properties = &member["properties"];
    let crs = match member["type"].as_str() {
        Some("name") => properties["name"].as_str().and_then(Crs::parse),
        Some("EPSG") => properties["code"]
            .as_u64()
            .and_then(|code| u32::try_from(code).ok())
            .map(Crs::from_epsg),
        _ => None,
    };

    crs.map(Some)
        .ok_or_else(|| format!("unrecognized crs member: {}", member))
}

/// Build the `crs` member naming a CRS.
fn crs_member(crs: Option<Crs>) -> Value {
    match crs {
        Some(crs) => json!({
            "type": "name",
            "properties": { "name": crs.urn() }
        }),
        None => Value::Null,
    }
}
