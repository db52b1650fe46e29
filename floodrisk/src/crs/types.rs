//! Coordinate reference system identifiers.

use std::fmt;

/// A coordinate reference system identified by its EPSG code.
///
/// GeoJSON always stores coordinates in x/y (longitude/latitude) order,
/// so `EPSG:4326` and `OGC:CRS84` resolve to the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Crs {
    code: u32,
}

impl Crs {
    /// WGS84 longitude/latitude, the GeoJSON default.
    pub const WGS84: Crs = Crs { code: 4326 };

    /// Spherical Web Mercator, the projection of slippy-map basemaps.
    pub const WEB_MERCATOR: Crs = Crs { code: 3857 };

    /// Create a CRS from an EPSG code.
    pub fn from_epsg(code: u32) -> Self {
        match code {
            // Legacy identifiers for the same Web Mercator projection
            900913 | 3785 | 102100 | 102113 => Self::WEB_MERCATOR,
            _ => Self { code },
        }
    }

    /// The EPSG code of this CRS.
    pub fn epsg(&self) -> u32 {
        self.code
    }

    /// Parse a CRS name as found in a GeoJSON `crs` member.
    ///
    /// Accepts `EPSG:<code>`, `urn:ogc:def:crs:EPSG::<code>`,
    /// `urn:ogc:def:crs:EPSG:<version>:<code>`, `urn:ogc:def:crs:OGC:1.3:CRS84`
    /// and `CRS84`. Matching is case-insensitive.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        let lower = name.to_ascii_lowercase();

        if lower == "crs84"
            || (lower.starts_with("urn:ogc:def:crs:ogc:") && lower.ends_with(":crs84"))
        {
            return Some(Self::WGS84);
        }

        let code = if let Some(rest) = lower.strip_prefix("epsg:") {
            rest
        } else if let Some(rest) = lower.strip_prefix("urn:ogc:def:crs:epsg:") {
            // Optional version segment between the authority and the code
            rest.rsplit(':').next().unwrap_or_default()
        } else {
            return None;
        };

        code.parse::<u32>().ok().map(Self::from_epsg)
    }

    /// The OGC URN used when writing this CRS into a GeoJSON `crs` member.
    pub fn urn(&self) -> String {
        if *self == Self::WGS84 {
            "urn:ogc:def:crs:OGC:1.3:CRS84".to_string()
        } else {
            format!("urn:ogc:def:crs:EPSG::{}", self.code)
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_epsg_forms() {
        assert_eq!(Crs::parse("EPSG:27700"), Some(Crs::from_epsg(27700)));
        assert_eq!(Crs::parse("epsg:3857"), Some(Crs::WEB_MERCATOR));
        assert_eq!(
            Crs::parse("urn:ogc:def:crs:EPSG::32630"),
            Some(Crs::from_epsg(32630))
        );
        assert_eq!(
            Crs::parse("urn:ogc:def:crs:EPSG:6.6:4326"),
            Some(Crs::WGS84)
        );
    }

    #[test]
    fn test_parse_crs84_is_wgs84() {
        assert_eq!(Crs::parse("urn:ogc:def:crs:OGC:1.3:CRS84"), Some(Crs::WGS84));
        assert_eq!(Crs::parse("CRS84"), Some(Crs::WGS84));
    }

    #[test]
    fn test_parse_rejects_unknown_names() {
        assert_eq!(Crs::parse("ESRI:54030"), None);
        assert_eq!(Crs::parse("EPSG:abc"), None);
        assert_eq!(Crs::parse(""), None);
    }

    #[test]
    fn test_legacy_mercator_codes() {
        assert_eq!(Crs::from_epsg(900913), Crs::WEB_MERCATOR);
        assert_eq!(Crs::parse("EPSG:102100"), Some(Crs::WEB_MERCATOR));
    }

    #[test]
    fn test_urn_roundtrip() {
        for crs in [Crs::WGS84, Crs::WEB_MERCATOR, Crs::from_epsg(27700)] {
            assert_eq!(Crs::parse(&crs.urn()), Some(crs));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Crs::from_epsg(2154).to_string(), "EPSG:2154");
    }
}
