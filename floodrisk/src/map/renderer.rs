//! Map composition.

use std::path::Path;

use geo::{Coord, Rect};
use tracing::{debug, info};

use super::figure::{Figure, LegendEntry, Swatch, Symbol, Viewport};
use super::format::ImageFormat;
use super::style::{MapConfig, MapSettings};
use super::text::text_height;
use super::tiles::{BasemapFetchError, HttpTileFetcher, NoBasemap, TileFetcher};
use super::{MapError, RenderError};
use crate::coord::{
    tile_bounds, tiles_covering, MAX_ZOOM, MERCATOR_HALF_EXTENT, MIN_ZOOM, TILE_SIZE,
};
use crate::crs::{reproject, Crs};
use crate::feature::{union_rects, FeatureCollection};

/// Title glyph scale (8 px font cells).
const TITLE_SCALE: u32 = 3;
/// Legend glyph scale.
const LEGEND_SCALE: u32 = 2;
/// Blank border around the map frame in pixels.
const OUTER_MARGIN: u32 = 16;

/// Legend labels, bottom layer first.
pub const RISK_LABEL: &str = "Risk areas";
pub const ASSETS_LABEL: &str = "Assets";
pub const AT_RISK_LABEL: &str = "At-risk assets";

/// Layers drawn on one map.
#[derive(Debug, Clone, Copy)]
pub struct MapLayers<'a> {
    /// Risk polygons, drawn first.
    pub risk: &'a FeatureCollection,
    /// Every asset.
    pub assets: &'a FeatureCollection,
    /// Assets inside a risk area, drawn last.
    pub at_risk: &'a FeatureCollection,
    /// Title shown above the map.
    pub title: &'a str,
}

/// What a render produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSummary {
    /// Basemap zoom level, `None` when no basemap was drawn.
    pub zoom: Option<u8>,
    /// Number of basemap tiles drawn.
    pub tiles: usize,
    pub width: u32,
    pub height: u32,
}

/// Renders flood-risk maps to image files.
pub struct MapRenderer {
    config: MapConfig,
    fetcher: Box<dyn TileFetcher>,
}

impl MapRenderer {
    /// Create a renderer drawing basemap tiles from `fetcher`.
    pub fn new(config: MapConfig, fetcher: Box<dyn TileFetcher>) -> Self {
        Self { config, fetcher }
    }

    /// Create a renderer from configuration settings.
    ///
    /// Uses an HTTP tile fetcher when the basemap is enabled and
    /// [`NoBasemap`] otherwise.
    pub fn from_settings(settings: &MapSettings) -> Result<Self, BasemapFetchError> {
        let fetcher: Box<dyn TileFetcher> = if settings.basemap {
            Box::new(HttpTileFetcher::new(
                settings.tile_url(),
                settings.timeout_secs,
            )?)
        } else {
            Box::new(NoBasemap)
        };
        Ok(Self::new(settings.to_config(), fetcher))
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Render `layers` and write the image to `output`.
    ///
    /// The image format is resolved from `output` before anything is
    /// drawn, so a bad path fails without touching the tile server.
    pub fn render(
        &self,
        layers: &MapLayers<'_>,
        output: &Path,
    ) -> Result<RenderSummary, MapError> {
        let format = ImageFormat::from_path(output)?;
        let (figure, summary) = self.compose(layers)?;
        figure.save(output, format)?;

        info!(
            path = %output.display(),
            format = ?format,
            width = summary.width,
            height = summary.height,
            tiles = summary.tiles,
            "Map written"
        );
        Ok(summary)
    }

    /// Draw `layers` onto a new figure without encoding it.
    pub fn compose(&self, layers: &MapLayers<'_>) -> Result<(Figure, RenderSummary), MapError> {
        let risk = reproject(layers.risk, Crs::WEB_MERCATOR).map_err(RenderError::from)?;
        let assets = reproject(layers.assets, Crs::WEB_MERCATOR).map_err(RenderError::from)?;
        let at_risk = reproject(layers.at_risk, Crs::WEB_MERCATOR).map_err(RenderError::from)?;

        let data = union_rects(
            [&risk, &assets, &at_risk]
                .into_iter()
                .filter_map(FeatureCollection::bounding_rect),
        )
        .unwrap_or_else(world_extent);

        let width = self.config.width;
        let height = self.config.height;
        let title_band = text_height(TITLE_SCALE) + 2 * OUTER_MARGIN;
        let frame_w = width.saturating_sub(2 * OUTER_MARGIN);
        let frame_h = height.saturating_sub(title_band + OUTER_MARGIN);
        if frame_w == 0 || frame_h == 0 {
            return Err(RenderError::Canvas { width, height }.into());
        }

        let viewport = Viewport::fit(
            data,
            OUTER_MARGIN as f64,
            title_band as f64,
            frame_w as f64,
            frame_h as f64,
        );
        let mut figure = Figure::new(width, height, viewport, self.config.background)?;

        let (zoom, tiles) = if self.fetcher.is_enabled() {
            let (zoom, tiles) = self.draw_basemap(&mut figure)?;
            (Some(zoom), tiles)
        } else {
            debug!("Basemap disabled");
            (None, 0)
        };

        let config = &self.config;
        let risk_symbol = Symbol {
            fill: config.risk_fill,
            edge: config.risk_edge,
            edge_width: config.risk_edge_width,
            marker_radius: config.asset_radius,
            line_width: config.line_width,
        };
        let asset_symbol = Symbol {
            fill: config.asset_color,
            edge: config.asset_color,
            edge_width: 0.0,
            marker_radius: config.asset_radius,
            line_width: config.line_width,
        };
        let at_risk_symbol = Symbol {
            fill: config.at_risk_color,
            edge: config.at_risk_color,
            edge_width: 0.0,
            marker_radius: config.at_risk_radius,
            line_width: config.line_width * 2.0,
        };

        for (layer, symbol) in [
            (&risk, &risk_symbol),
            (&assets, &asset_symbol),
            (&at_risk, &at_risk_symbol),
        ] {
            for geometry in layer.geometries() {
                figure.draw_geometry(geometry, symbol);
            }
        }

        figure.mask_outside_frame(config.background);
        figure.draw_title(layers.title, OUTER_MARGIN as f32, TITLE_SCALE, config.text_color);
        figure.draw_legend(
            &self.legend(),
            LEGEND_SCALE,
            config.text_color,
            config.background,
        );

        debug!(
            risk = risk.len(),
            assets = assets.len(),
            at_risk = at_risk.len(),
            zoom = ?zoom,
            "Map composed"
        );

        let summary = RenderSummary {
            zoom,
            tiles,
            width,
            height,
        };
        Ok((figure, summary))
    }

    fn legend(&self) -> Vec<LegendEntry> {
        vec![
            LegendEntry {
                label: RISK_LABEL.to_string(),
                swatch: Swatch::Patch {
                    fill: self.config.risk_fill,
                    edge: self.config.risk_edge,
                },
            },
            LegendEntry {
                label: ASSETS_LABEL.to_string(),
                swatch: Swatch::Marker {
                    color: self.config.asset_color,
                    radius: self.config.asset_radius,
                },
            },
            LegendEntry {
                label: AT_RISK_LABEL.to_string(),
                swatch: Swatch::Marker {
                    color: self.config.at_risk_color,
                    radius: self.config.at_risk_radius,
                },
            },
        ]
    }

    fn draw_basemap(&self, figure: &mut Figure) -> Result<(u8, usize), BasemapFetchError> {
        let viewport = *figure.viewport();
        let zoom = choose_zoom(&viewport.extent, viewport.scale, self.config.max_tiles);
        let tiles = tiles_covering(&viewport.extent, zoom).unwrap_or_default();

        debug!(
            fetcher = self.fetcher.name(),
            zoom,
            tiles = tiles.len(),
            "Drawing basemap"
        );

        for tile in &tiles {
            let bytes = self.fetcher.fetch(*tile)?;
            let image = image::load_from_memory(&bytes)
                .map_err(|e| BasemapFetchError::Decode {
                    tile: *tile,
                    message: e.to_string(),
                })?
                .to_rgba8();
            figure.draw_tile(&image, tile_bounds(tile));
        }

        Ok((zoom, tiles.len()))
    }
}

/// Whole Web Mercator square, used when every layer is empty.
fn world_extent() -> Rect<f64> {
    Rect::new(
        Coord {
            x: -MERCATOR_HALF_EXTENT,
            y: -MERCATOR_HALF_EXTENT,
        },
        Coord {
            x: MERCATOR_HALF_EXTENT,
            y: MERCATOR_HALF_EXTENT,
        },
    )
}

/// Pick the basemap zoom for a viewport.
///
/// Starts at the smallest zoom whose tiles are at least as detailed as the
/// canvas (`scale` is pixels per metre), then steps down while the extent
/// needs more than `max_tiles` tiles.
pub fn choose_zoom(extent: &Rect<f64>, scale: f64, max_tiles: usize) -> u8 {
    let world_px = scale * 2.0 * MERCATOR_HALF_EXTENT;
    let ideal = (world_px / TILE_SIZE as f64).log2().ceil();
    let mut zoom = if ideal.is_finite() {
        ideal.clamp(MIN_ZOOM as f64, MAX_ZOOM as f64) as u8
    } else {
        MIN_ZOOM
    };

    let tile_count = |z: u8| tiles_covering(extent, z).map_or(usize::MAX, |t| t.len());
    while zoom > MIN_ZOOM && tile_count(zoom) > max_tiles {
        zoom -= 1;
    }
    zoom
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Feature;
    use crate::map::{MapError, MockTileFetcher, NoBasemap};
    use geo::{point, polygon};
    use serde_json::Map;

    fn layers() -> (FeatureCollection, FeatureCollection, FeatureCollection) {
        let risk = FeatureCollection::with_features(
            vec![Feature::new(
                polygon![
                    (x: 0.0, y: 0.0),
                    (x: 10.0, y: 0.0),
                    (x: 10.0, y: 10.0),
                    (x: 0.0, y: 10.0),
                ],
                Map::new(),
            )],
            Some(Crs::WGS84),
        );
        let assets = FeatureCollection::with_features(
            vec![
                Feature::new(point!(x: 2.0, y: 2.0), Map::new()),
                Feature::new(point!(x: 20.0, y: 20.0), Map::new()),
            ],
            Some(Crs::WGS84),
        );
        let at_risk = FeatureCollection::with_features(
            vec![Feature::new(point!(x: 2.0, y: 2.0), Map::new())],
            Some(Crs::WGS84),
        );
        (risk, assets, at_risk)
    }

    fn small_config() -> MapConfig {
        MapConfig {
            width: 300,
            height: 250,
            ..MapConfig::default()
        }
    }

    #[test]
    fn test_choose_zoom_world() {
        let extent = world_extent();
        // 512 px across the world is zoom 1
        let scale = 512.0 / (2.0 * MERCATOR_HALF_EXTENT);
        assert_eq!(choose_zoom(&extent, scale, 64), 1);
    }

    #[test]
    fn test_choose_zoom_respects_tile_cap() {
        let extent = world_extent();
        let scale = 4096.0 / (2.0 * MERCATOR_HALF_EXTENT);
        // Zoom 4 would need 256 tiles, zoom 3 needs 64
        assert_eq!(choose_zoom(&extent, scale, 64), 3);
        assert_eq!(choose_zoom(&extent, scale, 1), 0);
    }

    #[test]
    fn test_choose_zoom_is_capped_at_max() {
        let extent = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 });
        assert_eq!(choose_zoom(&extent, 1_000.0, 64), MAX_ZOOM);
    }

    #[test]
    fn test_from_settings_without_basemap() {
        let settings = MapSettings {
            basemap: false,
            width: 400,
            ..MapSettings::default()
        };
        let renderer = MapRenderer::from_settings(&settings).unwrap();
        assert!(!renderer.fetcher.is_enabled());
        assert_eq!(renderer.config().width, 400);
    }

    #[test]
    fn test_render_without_basemap() {
        let dir = tempfile::tempdir().unwrap();
        let (risk, assets, at_risk) = layers();
        let renderer = MapRenderer::new(small_config(), Box::new(NoBasemap));
        let output = dir.path().join("Flood Risk Map");

        let summary = renderer
            .render(
                &MapLayers {
                    risk: &risk,
                    assets: &assets,
                    at_risk: &at_risk,
                    title: "Flood Risk Map",
                },
                &output,
            )
            .unwrap();

        assert_eq!(summary.zoom, None);
        assert_eq!(summary.tiles, 0);
        // No extension on the title, so detect the format from content
        let decoded = image::ImageReader::open(&output)
            .unwrap()
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap();
        assert_eq!(decoded.width(), 300);
        assert_eq!(decoded.height(), 250);
    }

    #[test]
    fn test_render_fetches_tiles() {
        let (risk, assets, at_risk) = layers();
        let fetcher = std::sync::Arc::new(MockTileFetcher::new());
        let renderer = MapRenderer::new(small_config(), Box::new(SharedFetcher(fetcher.clone())));

        let (_, summary) = renderer
            .compose(&MapLayers {
                risk: &risk,
                assets: &assets,
                at_risk: &at_risk,
                title: "t",
            })
            .unwrap();

        assert!(summary.zoom.is_some());
        assert!(summary.tiles > 0);
        assert!(summary.tiles <= 64);
        assert_eq!(fetcher.request_count(), summary.tiles);
    }

    #[test]
    fn test_tile_failure_is_a_basemap_error() {
        let (risk, assets, at_risk) = layers();
        let renderer = MapRenderer::new(small_config(), Box::new(MockTileFetcher::failing(503)));
        let result = renderer.compose(&MapLayers {
            risk: &risk,
            assets: &assets,
            at_risk: &at_risk,
            title: "t",
        });
        assert!(matches!(
            result,
            Err(MapError::Basemap(BasemapFetchError::Status { status: 503, .. }))
        ));
    }

    #[test]
    fn test_empty_layers_render() {
        let empty = FeatureCollection::new(Some(Crs::WGS84));
        let renderer = MapRenderer::new(small_config(), Box::new(NoBasemap));
        let (figure, _) = renderer
            .compose(&MapLayers {
                risk: &empty,
                assets: &empty,
                at_risk: &empty,
                title: "",
            })
            .unwrap();
        assert!(figure.viewport().extent.width() >= 2.0 * MERCATOR_HALF_EXTENT);
    }

    #[test]
    fn test_empty_path_fails_before_drawing() {
        let (risk, assets, at_risk) = layers();
        let fetcher = std::sync::Arc::new(MockTileFetcher::new());
        let renderer = MapRenderer::new(small_config(), Box::new(SharedFetcher(fetcher.clone())));
        let result = renderer.render(
            &MapLayers {
                risk: &risk,
                assets: &assets,
                at_risk: &at_risk,
                title: "",
            },
            Path::new(""),
        );
        assert!(matches!(result, Err(MapError::Render(RenderError::EmptyPath))));
        assert_eq!(fetcher.request_count(), 0);
    }

    #[test]
    fn test_canvas_too_small() {
        let (risk, assets, at_risk) = layers();
        let config = MapConfig {
            width: 20,
            height: 20,
            ..MapConfig::default()
        };
        let renderer = MapRenderer::new(config, Box::new(NoBasemap));
        let result = renderer.compose(&MapLayers {
            risk: &risk,
            assets: &assets,
            at_risk: &at_risk,
            title: "t",
        });
        assert!(matches!(result, Err(MapError::Render(RenderError::Canvas { .. }))));
    }

    #[test]
    fn test_undefined_crs_is_a_render_error() {
        let (risk, assets, _) = layers();
        let undefined = FeatureCollection::with_features(
            vec![Feature::new(point!(x: 2.0, y: 2.0), Map::new())],
            None,
        );
        let renderer = MapRenderer::new(small_config(), Box::new(NoBasemap));
        let result = renderer.compose(&MapLayers {
            risk: &risk,
            assets: &assets,
            at_risk: &undefined,
            title: "t",
        });
        assert!(matches!(
            result,
            Err(MapError::Render(RenderError::Projection(_)))
        ));
    }

    /// Lets a test keep a handle on the fetcher owned by the renderer.
    struct SharedFetcher(std::sync::Arc<MockTileFetcher>);

    impl TileFetcher for SharedFetcher {
        fn fetch(&self, tile: crate::coord::TileCoord) -> Result<Vec<u8>, BasemapFetchError> {
            self.0.fetch(tile)
        }

        fn name(&self) -> &str {
            "shared-mock"
        }
    }
}
