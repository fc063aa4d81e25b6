// This is the models module containing the request and response shapes of
// the JS surface
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::evacuation_site::EvacuationSite;
use crate::geo_point::{BoundingBox, GeoPoint};
use crate::hazard::HazardCategory;
use crate::nearest::NearestResult;
use crate::route::{route_geojson, route_line};
use crate::site_store::CandidateQuery;

/// Nearest query over caller-supplied candidates.
#[derive(Debug, Deserialize)]
pub struct FindNearestInput {
    pub reference: GeoPoint,
    #[serde(default)]
    pub candidates: Vec<EvacuationSite>,
}

/// Nearest query over the sites held in the module store.
#[derive(Debug, Deserialize)]
pub struct VisibleNearestInput {
    pub reference: GeoPoint,
    /// Current viewport; the whole store when omitted.
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
    /// Category key (`flood`) or evacuation layer id (`evacuation-flood-layer`).
    pub category: String,
}

impl VisibleNearestInput {
    pub fn query(&self) -> Result<CandidateQuery> {
        Ok(CandidateQuery {
            category: HazardCategory::from_layer_id(&self.category)?,
            bbox: self.bbox.unwrap_or_else(BoundingBox::world),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearestSiteResponse {
    pub site: EvacuationSite,
    pub distance_km: f64,
    /// GeoJSON `Feature` with the line from the reference to the site.
    pub route: serde_json::Value,
}

impl NearestSiteResponse {
    pub fn from_result(reference: GeoPoint, nearest: &NearestResult<&EvacuationSite>) -> Self {
        let route = route_line(reference, Some(nearest));
        NearestSiteResponse {
            site: nearest.feature.clone(),
            distance_km: nearest.distance_km,
            route: route_geojson(route.as_ref()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchTilesInput {
    pub bbox: BoundingBox,
    /// Map zoom; clamped to the zoom range of the evacuation tiles.
    pub zoom: f64,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FetchSummary {
    pub zoom: u32,
    pub requested: usize,
    pub cached: usize,
    pub fetched: usize,
    pub failed: usize,
    /// Tiles under the viewport beyond the cache capacity.
    pub skipped: usize,
    pub sites: usize,
}
