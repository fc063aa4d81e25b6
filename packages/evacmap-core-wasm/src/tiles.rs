// Slippy-map tile addressing for the evacuation vector tiles.
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::geo_point::BoundingBox;

/// Web Mercator cuts off at this latitude.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileKey {
    pub z: u32,
    pub x: u32,
    pub y: u32,
}

impl TileKey {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        TileKey { z, x, y }
    }

    /// Substitute `{z}`, `{x}` and `{y}` in a tile URL template.
    pub fn url(&self, template: &str) -> String {
        template
            .replace("{z}", &self.z.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
    }

    /// Convert a tile-local position (0..extent) to longitude/latitude.
    pub fn to_lng_lat(&self, px: f64, py: f64, extent: u32) -> (f64, f64) {
        let n = 2_f64.powi(self.z as i32);
        let extent = extent.max(1) as f64;

        let normalized_x = (self.x as f64 + px / extent) / n;
        let normalized_y = (self.y as f64 + py / extent) / n;

        let lng = (normalized_x * 360.0 - 180.0).clamp(-180.0, 180.0);
        let lat = (PI * (1.0 - 2.0 * normalized_y)).sinh().atan().to_degrees();
        (lng, lat)
    }
}

impl std::fmt::Display for TileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

fn tiles_per_side(zoom: u32) -> u32 {
    1 << zoom
}

// Convert longitude to tile X coordinate
fn lng_to_tile_x(lng: f64, zoom: u32) -> u32 {
    let n = tiles_per_side(zoom) as f64;
    let x = ((lng + 180.0) / 360.0 * n).floor();
    (x.max(0.0) as u32).min(tiles_per_side(zoom) - 1)
}

// Convert latitude to tile Y coordinate
fn lat_to_tile_y(lat: f64, zoom: u32) -> u32 {
    let lat_rad = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let n = tiles_per_side(zoom) as f64;
    let y = ((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n).floor();
    (y.max(0.0) as u32).min(tiles_per_side(zoom) - 1)
}

/// Tile containing a position at `zoom`.
pub fn tile_for_point(lng: f64, lat: f64, zoom: u32) -> TileKey {
    TileKey::new(zoom, lng_to_tile_x(lng, zoom), lat_to_tile_y(lat, zoom))
}

/// Tiles covering a bounding box, row by row from the north-west corner.
pub fn tiles_for_bbox(bbox: &BoundingBox, zoom: u32) -> Vec<TileKey> {
    let min_x = lng_to_tile_x(bbox.min_lng, zoom);
    let max_x = lng_to_tile_x(bbox.max_lng, zoom);
    // y grows southwards
    let min_y = lat_to_tile_y(bbox.max_lat, zoom);
    let max_y = lat_to_tile_y(bbox.min_lat, zoom);

    let mut tiles = Vec::with_capacity(((max_x - min_x + 1) * (max_y - min_y + 1)) as usize);
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            tiles.push(TileKey::new(zoom, x, y));
        }
    }
    tiles
}
