//! In-memory feature collections.

use geo::{coord, BoundingRect, Geometry, Rect};
use serde_json::{Map, Value};

use crate::crs::Crs;

/// Attribute fields of a feature.
pub type Properties = Map<String, Value>;

/// One geometry plus its attribute fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Geometry, `None` for features stored with a null geometry.
    pub geometry: Option<Geometry<f64>>,
    /// Attribute fields in document order.
    pub properties: Properties,
}

impl Feature {
    /// Create a feature from a geometry and its attributes.
    pub fn new(geometry: impl Into<Geometry<f64>>, properties: Properties) -> Self {
        Self {
            geometry: Some(geometry.into()),
            properties,
        }
    }
}

/// An ordered set of features sharing one coordinate reference system.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureCollection {
    /// Features in load order.
    pub features: Vec<Feature>,
    /// CRS of every geometry in the collection; `None` when undefined.
    pub crs: Option<Crs>,
}

impl FeatureCollection {
    /// Create an empty collection tagged with a CRS.
    pub fn new(crs: Option<Crs>) -> Self {
        Self {
            features: Vec::new(),
            crs,
        }
    }

    /// Create a collection from features and a CRS.
    pub fn with_features(features: Vec<Feature>, crs: Option<Crs>) -> Self {
        Self { features, crs }
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// True when the collection holds no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Iterate over the features.
    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    /// Iterate over the non-null geometries.
    pub fn geometries(&self) -> impl Iterator<Item = &Geometry<f64>> {
        self.features.iter().filter_map(|f| f.geometry.as_ref())
    }

    /// Bounding rectangle of every geometry, `None` if there is none.
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        union_rects(self.geometries().filter_map(|g| g.bounding_rect()))
    }
}

impl<'a> IntoIterator for &'a FeatureCollection {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

/// Smallest rectangle containing every input rectangle.
pub fn union_rects(rects: impl IntoIterator<Item = Rect<f64>>) -> Option<Rect<f64>> {
    rects.into_iter().reduce(|a, b| {
        Rect::new(
            coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
            coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
        )
    })
}
