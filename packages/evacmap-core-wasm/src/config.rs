use serde::{Deserialize, Serialize};

use crate::error::{EvacError, Result};

/// Runtime settings for the evacuation-site source, replaceable from JS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EvacConfig {
    /// Vector tile URL with `{z}`, `{x}` and `{y}` placeholders.
    pub tile_url_template: String,
    pub source_layer: String,
    pub min_zoom: u32,
    pub max_zoom: u32,
    pub max_cached_tiles: usize,
}

impl Default for EvacConfig {
    fn default() -> Self {
        EvacConfig {
            tile_url_template: "./evacuation-sites/{z}/{x}/{y}.pbf".to_string(),
            source_layer: "evacuation".to_string(),
            min_zoom: 5,
            max_zoom: 8,
            max_cached_tiles: 100,
        }
    }
}

impl EvacConfig {
    pub fn validate(&self) -> Result<()> {
        if !["{z}", "{x}", "{y}"].iter().all(|p| self.tile_url_template.contains(p)) {
            return Err(EvacError::InvalidInput(format!(
                "tileUrlTemplate must contain {{z}}, {{x}} and {{y}}: {}",
                self.tile_url_template
            )));
        }
        if self.source_layer.is_empty() {
            return Err(EvacError::InvalidInput("sourceLayer must not be empty".to_string()));
        }
        if self.min_zoom > self.max_zoom || self.max_zoom > 22 {
            return Err(EvacError::InvalidInput(format!(
                "Invalid zoom range {}..={}",
                self.min_zoom, self.max_zoom
            )));
        }
        if self.max_cached_tiles == 0 {
            return Err(EvacError::InvalidInput("maxCachedTiles must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Whether both configs read tiles from the same URL and layer.
    pub fn same_source(&self, other: &EvacConfig) -> bool {
        self.tile_url_template == other.tile_url_template && self.source_layer == other.source_layer
    }

    /// Whether the source publishes tiles at this map zoom. Below `min_zoom`
    /// the map shows no evacuation sites; above `max_zoom` tiles overzoom.
    pub fn shows_sites_at(&self, map_zoom: f64) -> bool {
        map_zoom.is_finite() && map_zoom.floor() >= self.min_zoom as f64
    }

    /// Clamp a map zoom to the zoom levels the tile source publishes.
    pub fn source_zoom(&self, map_zoom: f64) -> u32 {
        let zoom = if map_zoom.is_finite() { map_zoom.floor().max(0.0) as u32 } else { self.min_zoom };
        zoom.clamp(self.min_zoom, self.max_zoom)
    }
}
