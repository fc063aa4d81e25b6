//! Browser tests for the JS surface. Run with `wasm-pack test --headless --firefox`.
#![cfg(target_arch = "wasm32")]

use evacmap_core_wasm::*;
use js_sys::{Array, Reflect};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn parse(json: &str) -> JsValue {
    js_sys::JSON::parse(json).unwrap()
}

fn get(value: &JsValue, key: &str) -> JsValue {
    Reflect::get(value, &JsValue::from_str(key)).unwrap()
}

#[wasm_bindgen_test]
fn nearest_site_returns_closest_candidate() {
    let input = parse(
        r#"{"reference": [139.0, 35.0],
            "candidates": [
                {"location": [140.0, 35.0], "name": "far"},
                {"location": [139.1, 35.0], "name": "near"}
            ]}"#,
    );
    let response = find_nearest_site(input).unwrap();
    let site = get(&response, "site");
    assert_eq!(get(&site, "name").as_string().as_deref(), Some("near"));

    let route = get(&response, "route");
    let coordinates = get(&get(&route, "geometry"), "coordinates");
    assert_eq!(Array::from(&coordinates).length(), 2);
}

#[wasm_bindgen_test]
fn empty_candidates_return_null() {
    let response = find_nearest_site(parse(r#"{"reference": [139.0, 35.0], "candidates": []}"#)).unwrap();
    assert!(response.is_null());
}

#[wasm_bindgen_test]
fn out_of_range_reference_is_rejected() {
    let error = find_nearest_site(parse(r#"{"reference": [139.0, 90.0001], "candidates": []}"#)).unwrap_err();
    assert!(error.as_string().unwrap().contains("Invalid coordinate"));
}

#[wasm_bindgen_test]
fn catalog_exposes_categories() {
    let catalog = hazard_catalog().unwrap();
    let categories = Array::from(&get(&catalog, "categories"));
    assert_eq!(categories.length(), 8);
    assert_eq!(
        get(&categories.get(0), "layerId").as_string().as_deref(),
        Some("evacuation-flood-layer")
    );
}

#[wasm_bindgen_test]
fn empty_store_clears_route() {
    clear_caches();
    let geojson = route_line_geojson(parse(r#"{"reference": [139.0, 35.0], "category": "tsunami"}"#)).unwrap();
    assert!(geojson.contains("FeatureCollection"));
}

#[wasm_bindgen_test]
fn configure_rejects_bad_template() {
    assert!(configure(parse(r#"{"tileUrlTemplate": "no-placeholders.pbf"}"#)).is_err());
    assert!(configure(parse(r#"{"maxCachedTiles": 50}"#)).is_ok());
    let config = get_config().unwrap();
    assert_eq!(get(&config, "maxCachedTiles").as_f64(), Some(50.0));
}
