// Query handlers behind the wasm exports, kept free of JS types.
use crate::error::Result;
use crate::models::{FindNearestInput, NearestSiteResponse, VisibleNearestInput};
use crate::module_state::ModuleState;
use crate::nearest::find_nearest;
use crate::route::{route_geojson, route_line};
use crate::site_store::FeatureSource;

pub fn nearest_among(input: &FindNearestInput) -> Result<Option<NearestSiteResponse>> {
    let nearest = find_nearest(input.reference, &input.candidates)?;
    Ok(nearest.map(|n| NearestSiteResponse::from_result(input.reference, &n)))
}

pub fn nearest_visible(state: &ModuleState, input: &VisibleNearestInput) -> Result<Option<NearestSiteResponse>> {
    let query = input.query()?;
    let nearest = state.store.nearest(input.reference, &query)?;
    Ok(nearest.map(|n| NearestSiteResponse::from_result(input.reference, &n)))
}

/// GeoJSON for the route line source; an empty collection when nothing is visible.
pub fn visible_route_geojson(state: &ModuleState, input: &VisibleNearestInput) -> Result<serde_json::Value> {
    let query = input.query()?;
    let nearest = state.store.nearest(input.reference, &query)?;
    let route = route_line(input.reference, nearest.as_ref());
    Ok(route_geojson(route.as_ref()))
}
