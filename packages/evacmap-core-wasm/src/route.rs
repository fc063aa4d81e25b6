// Line from the user's position to the chosen evacuation site, shaped for a
// GeoJSON line source on the map.
use std::borrow::Borrow;

use geo_types::{Coord, LineString};
use serde_json::{json, Value};

use crate::evacuation_site::EvacuationSite;
use crate::geo_point::GeoPoint;
use crate::nearest::NearestResult;

#[derive(Debug, Clone, PartialEq)]
pub struct RouteLine {
    pub from: GeoPoint,
    pub to: GeoPoint,
    pub site_name: String,
    pub distance_km: f64,
}

impl RouteLine {
    pub fn line_string(&self) -> LineString<f64> {
        LineString::new(vec![
            Coord { x: self.from.lng, y: self.from.lat },
            Coord { x: self.to.lng, y: self.to.lat },
        ])
    }

    pub fn to_geojson(&self) -> Value {
        let coordinates: Vec<[f64; 2]> = self.line_string().coords().map(|c| [c.x, c.y]).collect();
        json!({
            "type": "Feature",
            "geometry": {
                "type": "LineString",
                "coordinates": coordinates
            },
            "properties": {
                "name": self.site_name,
                "distance_km": self.distance_km
            }
        })
    }
}

pub fn route_line<S>(reference: GeoPoint, nearest: Option<&NearestResult<S>>) -> Option<RouteLine>
where
    S: Borrow<EvacuationSite>,
{
    nearest.map(|n| {
        let site = n.feature.borrow();
        RouteLine {
            from: reference,
            to: site.location,
            site_name: site.name.clone(),
            distance_km: n.distance_km,
        }
    })
}

/// GeoJSON for the line source: the route feature, or an empty collection
/// so the previous line is cleared when no site is visible.
pub fn route_geojson(route: Option<&RouteLine>) -> Value {
    match route {
        Some(route) => route.to_geojson(),
        None => json!({
            "type": "FeatureCollection",
            "features": []
        }),
    }
}
