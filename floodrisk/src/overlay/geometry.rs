//! Geometry-level intersection against polygonal clip shapes.

use geo::{
    Area, BooleanOps, Geometry, GeometryCollection, Intersects, LineString, MultiLineString,
    MultiPoint, MultiPolygon, Point, Polygon,
};

/// Name of a geometry variant for error messages.
pub(super) fn kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// View a geometry as a multipolygon, `None` if it is not polygonal.
///
/// A geometry collection is polygonal when every member is.
pub(super) fn polygonal(geometry: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Some(mp.clone()),
        Geometry::Rect(r) => Some(MultiPolygon::new(vec![r.to_polygon()])),
        Geometry::Triangle(t) => Some(MultiPolygon::new(vec![t.to_polygon()])),
        Geometry::GeometryCollection(gc) => {
            let mut polygons = Vec::new();
            for member in gc.iter() {
                polygons.extend(polygonal(member)?.0);
            }
            Some(MultiPolygon::new(polygons))
        }
        _ => None,
    }
}

/// Intersect one base geometry with a clip multipolygon.
///
/// Returns `None` when nothing of the base geometry's dimension remains.
pub(super) fn intersection(
    base: &Geometry<f64>,
    clip: &MultiPolygon<f64>,
) -> Option<Geometry<f64>> {
    match base {
        Geometry::Point(p) => clip.intersects(p).then_some(Geometry::Point(*p)),
        Geometry::MultiPoint(mp) => points(mp.iter().copied(), clip),
        Geometry::Line(line) => lines(
            MultiLineString::new(vec![LineString::from(vec![line.start, line.end])]),
            clip,
        ),
        Geometry::LineString(ls) => lines(MultiLineString::new(vec![ls.clone()]), clip),
        Geometry::MultiLineString(mls) => lines(mls.clone(), clip),
        Geometry::Polygon(p) => polygons(&MultiPolygon::new(vec![p.clone()]), clip),
        Geometry::MultiPolygon(mp) => polygons(mp, clip),
        Geometry::Rect(r) => polygons(&MultiPolygon::new(vec![r.to_polygon()]), clip),
        Geometry::Triangle(t) => polygons(&MultiPolygon::new(vec![t.to_polygon()]), clip),
        Geometry::GeometryCollection(gc) => {
            let members: Vec<_> = gc.iter().filter_map(|g| intersection(g, clip)).collect();
            match members.len() {
                0 => None,
                1 => members.into_iter().next(),
                _ => Some(Geometry::GeometryCollection(GeometryCollection::from(members))),
            }
        }
    }
}

fn points(
    candidates: impl Iterator<Item = Point<f64>>,
    clip: &MultiPolygon<f64>,
) -> Option<Geometry<f64>> {
    let mut kept: Vec<Point<f64>> = candidates.filter(|p| clip.intersects(p)).collect();
    match kept.len() {
        0 => None,
        1 => kept.pop().map(Geometry::Point),
        _ => Some(Geometry::MultiPoint(MultiPoint::new(kept))),
    }
}

fn lines(base: MultiLineString<f64>, clip: &MultiPolygon<f64>) -> Option<Geometry<f64>> {
    let mut kept: Vec<LineString<f64>> = clip
        .clip(&base, false)
        .0
        .into_iter()
        .filter(|ls| ls.0.len() >= 2)
        .collect();
    match kept.len() {
        0 => None,
        1 => kept.pop().map(Geometry::LineString),
        _ => Some(Geometry::MultiLineString(MultiLineString::new(kept))),
    }
}

fn polygons(base: &MultiPolygon<f64>, clip: &MultiPolygon<f64>) -> Option<Geometry<f64>> {
    let mut kept: Vec<Polygon<f64>> = base
        .intersection(clip)
        .0
        .into_iter()
        .filter(|p| p.unsigned_area() > 0.0)
        .collect();
    match kept.len() {
        0 => None,
        1 => kept.pop().map(Geometry::Polygon),
        _ => Some(Geometry::MultiPolygon(MultiPolygon::new(kept))),
    }
}
