//! Map styles and rendering settings.

use serde::Deserialize;

/// RGBA color.
pub type Rgba = (u8, u8, u8, u8);

/// Map style/theme for the base layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapStyle {
    /// Standard OpenStreetMap tiles (light theme).
    #[default]
    Light,
    /// CartoDB Dark Matter tiles (dark theme).
    Dark,
}

impl MapStyle {
    /// Get the tile server URL template for this style.
    pub fn url_template(&self) -> &'static str {
        match self {
            MapStyle::Light => "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
            MapStyle::Dark => "https://a.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}.png",
        }
    }
}

/// Map settings as read from the `map` section of the job configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    /// Color theme and default tile server.
    pub style: MapStyle,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Whether to draw basemap tiles under the layers.
    pub basemap: bool,
    /// Tile URL template overriding the style's server.
    pub tile_url: Option<String>,
    /// Tile request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            style: MapStyle::default(),
            // 12x10 inch figure at 100 dpi
            width: 1200,
            height: 1000,
            basemap: true,
            tile_url: None,
            timeout_secs: 30,
        }
    }
}

impl MapSettings {
    /// Tile URL template to fetch from.
    pub fn tile_url(&self) -> &str {
        self.tile_url
            .as_deref()
            .unwrap_or_else(|| self.style.url_template())
    }

    /// Build the renderer configuration for these settings.
    pub fn to_config(&self) -> MapConfig {
        let base = match self.style {
            MapStyle::Light => MapConfig::default(),
            MapStyle::Dark => MapConfig::dark(),
        };
        MapConfig {
            width: self.width,
            height: self.height,
            ..base
        }
    }
}

/// Configuration for map rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    /// Width of the output image in pixels.
    pub width: u32,
    /// Height of the output image in pixels.
    pub height: u32,
    /// Map style (light or dark theme).
    pub style: MapStyle,
    /// Canvas color outside the map frame.
    pub background: Rgba,
    /// Title and legend text color.
    pub text_color: Rgba,
    /// Risk-area fill.
    pub risk_fill: Rgba,
    /// Risk-area outline.
    pub risk_edge: Rgba,
    /// Risk-area outline width in pixels.
    pub risk_edge_width: f32,
    /// Color of every asset.
    pub asset_color: Rgba,
    /// Marker radius of every asset in pixels.
    pub asset_radius: f32,
    /// Color of at-risk assets.
    pub at_risk_color: Rgba,
    /// Marker radius of at-risk assets in pixels.
    pub at_risk_radius: f32,
    /// Stroke width for line assets in pixels.
    pub line_width: f32,
    /// Upper bound on basemap tiles fetched for one map.
    pub max_tiles: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 1000,
            style: MapStyle::Light,
            background: (255, 255, 255, 255),
            text_color: (0, 0, 0, 255),
            // Blue at 40% opacity with a black edge
            risk_fill: (0, 0, 255, 102),
            risk_edge: (0, 0, 0, 255),
            risk_edge_width: 1.0,
            asset_color: (128, 128, 128, 255),
            asset_radius: 2.5,
            at_risk_color: (255, 0, 0, 255),
            at_risk_radius: 4.0,
            line_width: 1.5,
            max_tiles: 64,
        }
    }
}

impl MapConfig {
    /// Create a dark mode configuration with adjusted colors for visibility.
    pub fn dark() -> Self {
        Self {
            style: MapStyle::Dark,
            background: (24, 24, 24, 255),
            text_color: (235, 235, 235, 255),
            risk_fill: (100, 180, 255, 110),
            risk_edge: (220, 220, 220, 255),
            asset_color: (170, 170, 170, 255),
            at_risk_color: (255, 90, 90, 255),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = MapSettings::default();
        assert_eq!(settings.width, 1200);
        assert_eq!(settings.height, 1000);
        assert!(settings.basemap);
        assert_eq!(settings.tile_url(), MapStyle::Light.url_template());
    }

    #[test]
    fn test_tile_url_override() {
        let settings = MapSettings {
            tile_url: Some("http://localhost:8080/{z}/{x}/{y}.png".to_string()),
            ..MapSettings::default()
        };
        assert_eq!(settings.tile_url(), "http://localhost:8080/{z}/{x}/{y}.png");
    }

    #[test]
    fn test_dark_settings_use_dark_palette() {
        let settings = MapSettings {
            style: MapStyle::Dark,
            width: 640,
            ..MapSettings::default()
        };
        let config = settings.to_config();
        assert_eq!(config.style, MapStyle::Dark);
        assert_eq!(config.width, 640);
        assert_eq!(config.background, MapConfig::dark().background);
    }

    #[test]
    fn test_at_risk_markers_stand_out() {
        let config = MapConfig::default();
        assert!(config.at_risk_radius > config.asset_radius);
        assert_ne!(config.at_risk_color, config.asset_color);
    }
}
