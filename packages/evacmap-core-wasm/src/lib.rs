use wasm_bindgen::prelude::*;
use serde::Serialize;

// Create a console module for logging
pub mod console;
// Error type shared by every module
pub mod error;
// Runtime configuration
pub mod config;
// Coordinates and viewport boxes
pub mod geo_point;
// Hazard overlays and evacuation categories
pub mod hazard;
// Evacuation site model
pub mod evacuation_site;
// Nearest-site search
pub mod nearest;
// Route line handed to the map
pub mod route;
// Tile addressing
pub mod tiles;
// Evacuation vector tile decoding
pub mod evacuation_tiles;
// Viewport filtering
mod bbox_filter;
// Feature source backed by decoded tiles
pub mod site_store;
// Import our module state management
mod module_state;
// Request and response shapes of the JS surface
pub mod models;
// Query handlers
mod queries;
// Tile fetching through the JS helper
mod fetcher;

use error::EvacError;
use evacuation_site::EvacuationSite;
use models::{FindNearestInput, VisibleNearestInput};
use module_state::ModuleState;
use tiles::TileKey;

// Enable better panic messages in console during development
#[cfg(feature = "console_error_panic_hook")]
pub use console_error_panic_hook::set_once as set_panic_hook;

#[wasm_bindgen]
extern "C" {
    // JavaScript function to fetch data from URL; resolves to an ArrayBuffer or Uint8Array
    #[wasm_bindgen(js_namespace = wasmJsHelpers, catch)]
    pub fn fetch(url: &str) -> Result<js_sys::Promise, JsValue>;
}

// Use the macro from our console module
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => ($crate::console::log(&format!($($t)*)))
}

// Serialize maps as plain JS objects rather than `Map`, so GeoJSON stays usable
pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value
        .serialize(&serializer)
        .map_err(|e| JsValue::from(EvacError::from(e)))
}

fn from_js<T: serde::de::DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from(EvacError::from(e)))
}

use std::sync::Once;
static INIT: Once = Once::new();

// This sets up the wasm_bindgen start functionality
#[wasm_bindgen(start)]
pub fn start() {
    INIT.call_once(|| {
        // Set the panic hook for better error messages
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        let max_tiles = ModuleState::with(|state| state.config.max_cached_tiles);
        console_log!("Evacuation map module initialized (tile cache: {} tiles)", max_tiles);
    });
}

/// Replace the evacuation source configuration. Missing fields take defaults.
#[wasm_bindgen]
pub fn configure(config_js: JsValue) -> Result<(), JsValue> {
    let config: config::EvacConfig = from_js(config_js)?;
    ModuleState::with_mut(|state| state.apply_config(config))?;
    Ok(())
}

#[wasm_bindgen]
pub fn get_config() -> Result<JsValue, JsValue> {
    let config = ModuleState::with(|state| state.config.clone());
    to_js(&config)
}

/// Nearest site among the candidates passed in, or `null` when there are none.
#[wasm_bindgen]
pub fn find_nearest_site(input_js: JsValue) -> Result<JsValue, JsValue> {
    let input: FindNearestInput = from_js(input_js)?;
    match queries::nearest_among(&input)? {
        Some(response) => to_js(&response),
        None => Ok(JsValue::NULL),
    }
}

/// Nearest site of the active category within the viewport, from the decoded tiles.
#[wasm_bindgen]
pub fn nearest_visible_site(input_js: JsValue) -> Result<JsValue, JsValue> {
    let input: VisibleNearestInput = from_js(input_js)?;
    let response = ModuleState::with(|state| queries::nearest_visible(state, &input))?;
    match response {
        Some(response) => to_js(&response),
        None => Ok(JsValue::NULL),
    }
}

/// Route line as a GeoJSON string, ready for `GeoJSONSource.setData`.
#[wasm_bindgen]
pub fn route_line_geojson(input_js: JsValue) -> Result<String, JsValue> {
    let input: VisibleNearestInput = from_js(input_js)?;
    let geojson = ModuleState::with(|state| queries::visible_route_geojson(state, &input))?;
    Ok(geojson.to_string())
}

/// Decode one evacuation vector tile and keep its sites. Returns the site count.
#[wasm_bindgen]
pub fn store_evacuation_tile(z: u32, x: u32, y: u32, data: &[u8]) -> Result<u32, JsValue> {
    let key = TileKey::new(z, x, y);
    let layer = ModuleState::with(|state| state.config.source_layer.clone());
    let sites = evacuation_tiles::decode_evacuation_tile(data, key, &layer)?;
    let count = sites.len() as u32;
    ModuleState::with_mut(|state| state.store.store_tile(key, sites));
    Ok(count)
}

#[wasm_bindgen]
pub fn has_evacuation_tile(z: u32, x: u32, y: u32) -> bool {
    ModuleState::with_mut(|state| state.store.has_tile(&TileKey::new(z, x, y)))
}

// Function to get cache statistics
#[wasm_bindgen]
pub fn get_cache_stats() -> Result<JsValue, JsValue> {
    let stats = ModuleState::with(|state| state.store.stats());
    to_js(&stats)
}

// Function to clear all caches
#[wasm_bindgen]
pub fn clear_caches() -> bool {
    ModuleState::with_mut(|state| state.store.clear());
    true
}

/// Hazard overlays and evacuation categories for building the map style and controls.
#[wasm_bindgen]
pub fn hazard_catalog() -> Result<JsValue, JsValue> {
    to_js(&hazard::hazard_catalog())
}

/// Popup data for a site: name, address, remarks and every category marked.
#[wasm_bindgen]
pub fn site_summary(site_js: JsValue) -> Result<JsValue, JsValue> {
    let site: EvacuationSite = from_js(site_js)?;
    to_js(&site.summary())
}

pub use fetcher::fetch_evacuation_tiles;
