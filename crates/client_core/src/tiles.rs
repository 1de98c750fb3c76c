use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::debug;

pub const OSM_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const OSM_ATTRIBUTION: &str = "© OpenStreetMap contributors";
pub const OSM_ATTRIBUTION_URL: &str = "http://osm.org/copyright";
pub const MAX_CONCURRENT_TILE_REQUESTS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl std::fmt::Display for TileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Raster tile provider described by a `{s}`/`{z}`/`{x}`/`{y}` URL template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSource {
    pub url_template: String,
    pub subdomains: Vec<String>,
    pub attribution: String,
    pub attribution_url: Option<String>,
}

impl TileSource {
    pub fn openstreetmap() -> Self {
        Self {
            url_template: OSM_TILE_URL.to_string(),
            subdomains: vec!["a".into(), "b".into(), "c".into()],
            attribution: OSM_ATTRIBUTION.to_string(),
            attribution_url: Some(OSM_ATTRIBUTION_URL.to_string()),
        }
    }

    /// Subdomain for a tile. Picked from the tile coordinate so the same
    /// tile always resolves to the same host.
    pub fn subdomain_for(&self, tile: TileId) -> Option<&str> {
        if self.subdomains.is_empty() {
            return None;
        }
        let index = (u64::from(tile.x) + u64::from(tile.y)) % self.subdomains.len() as u64;
        self.subdomains.get(index as usize).map(String::as_str)
    }

    pub fn tile_url(&self, tile: TileId) -> String {
        let mut url = self
            .url_template
            .replace("{z}", &tile.zoom.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string());
        if let Some(subdomain) = self.subdomain_for(tile) {
            url = url.replace("{s}", subdomain);
        }
        url
    }
}

impl Default for TileSource {
    fn default() -> Self {
        Self::openstreetmap()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TileError {
    #[error("tile {tile} request failed: {reason}")]
    Transport { tile: TileId, reason: String },
    #[error("tile {tile} returned HTTP {status}")]
    Status { tile: TileId, status: u16 },
}

/// Downloads tile images, capping the number of requests in flight.
#[derive(Clone)]
pub struct TileFetcher {
    http: Client,
    source: Arc<TileSource>,
    permits: Arc<Semaphore>,
}

impl TileFetcher {
    pub fn new(http: Client, source: TileSource) -> Self {
        Self::with_concurrency(http, source, MAX_CONCURRENT_TILE_REQUESTS)
    }

    pub fn with_concurrency(http: Client, source: TileSource, max_in_flight: usize) -> Self {
        Self {
            http,
            source: Arc::new(source),
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    pub async fn fetch(&self, tile: TileId) -> Result<Vec<u8>, TileError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|err| TileError::Transport {
                tile,
                reason: err.to_string(),
            })?;

        let url = self.source.tile_url(tile);
        debug!(%tile, %url, "fetching tile");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| TileError::Transport {
                tile,
                reason: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TileError::Status {
                tile,
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|err| TileError::Transport {
            tile,
            reason: err.to_string(),
        })?;
        Ok(bytes.to_vec())
    }
}
