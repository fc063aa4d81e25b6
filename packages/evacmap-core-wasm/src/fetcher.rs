use futures::future::join_all;
use js_sys::Uint8Array;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::config::EvacConfig;
use crate::error::{EvacError, Result};
use crate::evacuation_site::EvacuationSite;
use crate::evacuation_tiles::decode_evacuation_tile;
use crate::geo_point::BoundingBox;
use crate::models::{FetchSummary, FetchTilesInput};
use crate::module_state::ModuleState;
use crate::site_store::SiteStore;
use crate::tiles::{tiles_for_bbox, TileKey};
use crate::{console_log, fetch, to_js};

/// Tiles to load for one viewport.
#[derive(Debug, Default, PartialEq)]
pub struct FetchPlan {
    pub zoom: u32,
    pub cached: Vec<TileKey>,
    pub missing: Vec<TileKey>,
    /// Tiles under the viewport left out because the store cannot hold them.
    pub skipped: usize,
}

/// Tiles to cover `bbox` at the source zoom, split into cached and missing.
///
/// Empty below the source's minimum zoom. The plan never holds more tiles
/// than the store can keep.
pub fn plan_fetch(store: &mut SiteStore, config: &EvacConfig, bbox: &BoundingBox, map_zoom: f64) -> FetchPlan {
    let zoom = config.source_zoom(map_zoom);
    if !config.shows_sites_at(map_zoom) {
        return FetchPlan { zoom, ..Default::default() };
    }

    let mut tiles = tiles_for_bbox(bbox, zoom);
    let capacity = store.max_tiles();
    let mut skipped = 0;
    if tiles.len() > capacity {
        console_log!(
            "Viewport needs {} evacuation tiles at z{}, the cache holds {}; loading the first {}",
            tiles.len(),
            zoom,
            capacity,
            capacity
        );
        skipped = tiles.len() - capacity;
        tiles.truncate(capacity);
    }

    let (cached, missing): (Vec<TileKey>, Vec<TileKey>) = tiles.into_iter().partition(|key| store.has_tile(key));
    FetchPlan {
        zoom,
        cached,
        missing,
        skipped,
    }
}

type TileResult = (TileKey, Result<Vec<EvacuationSite>>);

/// Keep the fetched tiles, unless the source changed while they were in flight.
pub fn store_fetched(state: &mut ModuleState, source: &EvacConfig, results: Vec<TileResult>, summary: &mut FetchSummary) {
    if !state.config.same_source(source) {
        console_log!(
            "Evacuation source changed during fetch; dropping {} tiles from {}",
            results.len(),
            source.tile_url_template
        );
        summary.failed += results.len();
        return;
    }

    for (key, result) in results {
        match result {
            Ok(sites) => {
                summary.fetched += 1;
                summary.sites += sites.len();
                state.store.store_tile(key, sites);
            }
            Err(e) => {
                summary.failed += 1;
                console_log!("Skipping evacuation tile {}: {}", key, e);
            }
        }
    }
}

async fn fetch_tile_bytes(url: &str) -> Result<Vec<u8>> {
    let promise = fetch(url).map_err(|e| EvacError::Fetch(format!("{}: {:?}", url, e)))?;
    let response = JsFuture::from(promise)
        .await
        .map_err(|e| EvacError::Fetch(format!("{}: {:?}", url, e)))?;
    Ok(Uint8Array::new(&response).to_vec())
}

async fn load_tile(key: TileKey, template: &str, layer: &str) -> TileResult {
    let url = key.url(template);
    let result = match fetch_tile_bytes(&url).await {
        Ok(bytes) => decode_evacuation_tile(&bytes, key, layer),
        Err(e) => Err(e),
    };
    (key, result)
}

/// Fetch and decode the evacuation tiles covering a viewport.
///
/// Already cached tiles are not requested again. A tile that fails is
/// logged and counted; the others are still stored.
#[wasm_bindgen]
pub async fn fetch_evacuation_tiles(input_js: JsValue) -> std::result::Result<JsValue, JsValue> {
    let input: FetchTilesInput = serde_wasm_bindgen::from_value(input_js).map_err(EvacError::from)?;

    // No lock is held across the awaits below
    let (config, plan) = ModuleState::with_mut(|state| {
        let config = state.config.clone();
        let plan = plan_fetch(&mut state.store, &config, &input.bbox, input.zoom);
        (config, plan)
    });

    console_log!(
        "Fetching {} evacuation tiles at z{} ({} cached)",
        plan.missing.len(),
        plan.zoom,
        plan.cached.len()
    );

    let results = join_all(
        plan.missing
            .iter()
            .map(|key| load_tile(*key, &config.tile_url_template, &config.source_layer)),
    )
    .await;

    let mut summary = FetchSummary {
        zoom: plan.zoom,
        requested: plan.cached.len() + plan.missing.len(),
        cached: plan.cached.len(),
        skipped: plan.skipped,
        ..Default::default()
    };
    ModuleState::with_mut(|state| store_fetched(state, &config, results, &mut summary));

    to_js(&summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evacuation_tiles::test_support::sample_tile_bytes;

    #[test]
    fn plan_splits_cached_and_missing() {
        let config = EvacConfig::default();
        let mut store = SiteStore::new(10);
        let bbox = BoundingBox::new(139.0, 35.0, 140.5, 36.0).unwrap();

        let plan = plan_fetch(&mut store, &config, &bbox, 12.0);
        assert_eq!(plan.zoom, 8);
        assert!(plan.cached.is_empty());
        assert!(!plan.missing.is_empty());

        store.store_tile(plan.missing[0], Vec::new());
        let again = plan_fetch(&mut store, &config, &bbox, 12.0);
        assert_eq!(again.cached, vec![plan.missing[0]]);
        assert_eq!(again.missing.len(), plan.missing.len() - 1);
    }

    #[test]
    fn nothing_is_planned_below_source_min_zoom() {
        let config = EvacConfig::default();
        let mut store = SiteStore::new(10);
        let plan = plan_fetch(&mut store, &config, &BoundingBox::world(), 2.0);
        assert_eq!(plan.zoom, 5);
        assert!(plan.cached.is_empty());
        assert!(plan.missing.is_empty());
        assert_eq!(plan.skipped, 0);
    }

    #[test]
    fn plan_is_capped_at_store_capacity() {
        let config = EvacConfig::default();
        let mut store = SiteStore::new(config.max_cached_tiles);
        // The whole world at z5 is 32 x 32 tiles
        let plan = plan_fetch(&mut store, &config, &BoundingBox::world(), 5.0);
        assert_eq!(plan.missing.len(), 100);
        assert_eq!(plan.skipped, 1024 - 100);
        assert!(plan.missing.iter().all(|key| key.z == 5));
    }

    fn sample_results() -> Vec<TileResult> {
        let key = TileKey::new(1, 1, 1);
        let sites = crate::evacuation_tiles::decode_evacuation_tile(&sample_tile_bytes(), key, "evacuation");
        vec![
            (key, sites),
            (TileKey::new(1, 0, 0), Err(EvacError::Fetch("404".to_string()))),
        ]
    }

    #[test]
    fn fetched_tiles_are_stored_and_counted() {
        let config = EvacConfig::default();
        let mut state = ModuleState::new(config.clone());
        let mut summary = FetchSummary::default();

        store_fetched(&mut state, &config, sample_results(), &mut summary);
        assert_eq!(summary.fetched, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.sites, 2);
        assert_eq!(state.store.stats().tiles_count, 1);
    }

    #[test]
    fn results_from_a_replaced_source_are_dropped() {
        let old = EvacConfig::default();
        let mut state = ModuleState::new(old.clone());
        state
            .apply_config(EvacConfig {
                tile_url_template: "https://tiles.example/{z}/{x}/{y}.pbf".to_string(),
                ..Default::default()
            })
            .unwrap();
        let mut summary = FetchSummary::default();

        store_fetched(&mut state, &old, sample_results(), &mut summary);
        assert_eq!(summary.fetched, 0);
        assert_eq!(summary.failed, 2);
        assert_eq!(state.store.stats().tiles_count, 0);
    }
}
