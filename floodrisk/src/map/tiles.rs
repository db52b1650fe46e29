//! Basemap tile fetching.
//!
//! Rendering only sees the [`TileFetcher`] trait so that tests can serve
//! tiles from memory and offline runs can skip the basemap entirely.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::coord::TileCoord;

/// Errors raised while obtaining basemap tiles.
#[derive(Debug, Error)]
pub enum BasemapFetchError {
    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    /// The request failed before a response arrived (DNS, connect, timeout).
    #[error("request for {url} failed: {message}")]
    Http { url: String, message: String },

    /// The tile server answered with a non-success status.
    #[error("tile server returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// The tile body is not a decodable image.
    #[error("tile {tile} could not be decoded: {message}")]
    Decode { tile: TileCoord, message: String },
}

/// Source of basemap tile images.
pub trait TileFetcher: Send + Sync {
    /// Fetch the encoded image bytes of one tile.
    fn fetch(&self, tile: TileCoord) -> Result<Vec<u8>, BasemapFetchError>;

    /// Whether this fetcher provides tiles at all.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Short name for log messages.
    fn name(&self) -> &str;
}

/// Fetches tiles over HTTP from a `{z}/{x}/{y}` URL template.
#[derive(Debug, Clone)]
pub struct HttpTileFetcher {
    client: reqwest::blocking::Client,
    url_template: String,
}

/// User-Agent sent with tile requests. OpenStreetMap rejects anonymous clients.
const USER_AGENT: &str = concat!("floodrisk/", env!("CARGO_PKG_VERSION"));

impl HttpTileFetcher {
    /// Create a fetcher for `url_template` with the given request timeout.
    pub fn new(
        url_template: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, BasemapFetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| BasemapFetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url_template: url_template.into(),
        })
    }

    /// URL for a given tile.
    pub fn tile_url(&self, tile: TileCoord) -> String {
        tile_url(&self.url_template, tile)
    }
}

impl TileFetcher for HttpTileFetcher {
    fn fetch(&self, tile: TileCoord) -> Result<Vec<u8>, BasemapFetchError> {
        let url = self.tile_url(tile);
        debug!(url = %url, "Fetching basemap tile");

        let response = self.client.get(&url).send().map_err(|e| {
            warn!(url = %url, is_timeout = e.is_timeout(), error = %e, "Tile request failed");
            BasemapFetchError::Http {
                url: url.clone(),
                message: e.to_string(),
            }
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            warn!(url = %url, status, "HTTP error status");
            return Err(BasemapFetchError::Status { url, status });
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| BasemapFetchError::Http {
                url,
                message: format!("failed to read body: {}", e),
            })
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Fetcher used when the basemap is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBasemap;

impl TileFetcher for NoBasemap {
    fn fetch(&self, tile: TileCoord) -> Result<Vec<u8>, BasemapFetchError> {
        Err(BasemapFetchError::Http {
            url: tile.to_string(),
            message: "basemap disabled".to_string(),
        })
    }

    fn is_enabled(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Expand `{z}`, `{x}` and `{y}` in a tile URL template.
pub fn tile_url(template: &str, tile: TileCoord) -> String {
    template
        .replace("{z}", &tile.zoom.to_string())
        .replace("{x}", &tile.col.to_string())
        .replace("{y}", &tile.row.to_string())
}
