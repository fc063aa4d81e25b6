// In-memory feature source: evacuation sites decoded from vector tiles,
// keyed by tile so candidate order is stable between queries.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::bbox_filter::point_in_bbox;
use crate::error::Result;
use crate::evacuation_site::EvacuationSite;
use crate::geo_point::{BoundingBox, GeoPoint};
use crate::hazard::HazardCategory;
use crate::nearest::{find_nearest, NearestResult};
use crate::tiles::TileKey;

/// Which sites count as visible: the active category inside the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateQuery {
    pub category: HazardCategory,
    pub bbox: BoundingBox,
}

/// Supplies the currently visible evacuation sites.
pub trait FeatureSource {
    fn candidates(&self, query: &CandidateQuery) -> Vec<&EvacuationSite>;

    /// Nearest visible site to `reference`.
    fn nearest(&self, reference: GeoPoint, query: &CandidateQuery) -> Result<Option<NearestResult<&EvacuationSite>>> {
        find_nearest(reference, self.candidates(query))
    }
}

fn is_visible(site: &EvacuationSite, query: &CandidateQuery) -> bool {
    site.is_designated_for(query.category) && point_in_bbox(&site.location, &query.bbox)
}

impl FeatureSource for [EvacuationSite] {
    fn candidates(&self, query: &CandidateQuery) -> Vec<&EvacuationSite> {
        self.iter().filter(|site| is_visible(site, query)).collect()
    }
}

struct StoredTile {
    sites: Vec<EvacuationSite>,
    // Insertion sequence, used to evict the oldest tile
    seq: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub tiles_count: usize,
    pub sites_count: usize,
    pub max_tiles: usize,
    pub total_requests: usize,
    pub hit_rate: f64,
}

pub struct SiteStore {
    tiles: BTreeMap<TileKey, StoredTile>,
    max_tiles: usize,
    next_seq: u64,
    cache_hits: usize,
    cache_misses: usize,
}

impl SiteStore {
    pub fn new(max_tiles: usize) -> Self {
        SiteStore {
            tiles: BTreeMap::new(),
            max_tiles: max_tiles.max(1),
            next_seq: 0,
            cache_hits: 0,
            cache_misses: 0,
        }
    }

    // If we're at capacity, remove the oldest tile
    fn evict_oldest(&mut self) {
        let oldest = self
            .tiles
            .iter()
            .min_by_key(|(_, tile)| tile.seq)
            .map(|(key, _)| *key);
        if let Some(key) = oldest {
            self.tiles.remove(&key);
        }
    }

    pub fn max_tiles(&self) -> usize {
        self.max_tiles
    }

    pub fn set_max_tiles(&mut self, max_tiles: usize) {
        self.max_tiles = max_tiles.max(1);
        while self.tiles.len() > self.max_tiles {
            self.evict_oldest();
        }
    }

    /// Store the sites decoded from one tile, replacing any earlier copy.
    pub fn store_tile(&mut self, key: TileKey, sites: Vec<EvacuationSite>) {
        if self.tiles.len() >= self.max_tiles && !self.tiles.contains_key(&key) {
            self.evict_oldest();
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tiles.insert(key, StoredTile { sites, seq });
    }

    /// Whether a tile is cached; counts towards the hit rate.
    pub fn has_tile(&mut self, key: &TileKey) -> bool {
        if self.tiles.contains_key(key) {
            self.cache_hits += 1;
            true
        } else {
            self.cache_misses += 1;
            false
        }
    }

    pub fn tile_sites(&self, key: &TileKey) -> Option<&[EvacuationSite]> {
        self.tiles.get(key).map(|tile| tile.sites.as_slice())
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
        self.cache_hits = 0;
        self.cache_misses = 0;
    }

    pub fn stats(&self) -> CacheStats {
        let total_requests = self.cache_hits + self.cache_misses;
        let hit_rate = if total_requests > 0 {
            self.cache_hits as f64 / total_requests as f64
        } else {
            0.0
        };
        CacheStats {
            tiles_count: self.tiles.len(),
            sites_count: self.tiles.values().map(|tile| tile.sites.len()).sum(),
            max_tiles: self.max_tiles,
            total_requests,
            hit_rate,
        }
    }
}

impl FeatureSource for SiteStore {
    /// Sites may sit in the buffer of neighbouring tiles; the first copy in
    /// tile order wins.
    fn candidates(&self, query: &CandidateQuery) -> Vec<&EvacuationSite> {
        let mut seen: HashSet<(u64, u64, &str)> = HashSet::new();
        self.tiles
            .values()
            .flat_map(|tile| tile.sites.iter())
            .filter(|site| is_visible(site, query))
            .filter(|&site| {
                seen.insert((
                    site.location.lng.to_bits(),
                    site.location.lat.to_bits(),
                    site.name.as_str(),
                ))
            })
            .collect()
    }
}
