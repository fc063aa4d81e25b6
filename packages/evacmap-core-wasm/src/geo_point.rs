use geo_types::Point;
use serde::{Deserialize, Serialize};

use crate::error::{EvacError, Result};

/// A WGS84 position in degrees.
///
/// Serialized as a GeoJSON-style `[lng, lat]` pair. Deserialization does not
/// range-check; call [`GeoPoint::validate`] (the finder does) before relying
/// on the value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct GeoPoint {
    pub lng: f64,
    pub lat: f64,
}

impl GeoPoint {
    /// Build a point, failing when either component is out of range.
    pub fn new(lng: f64, lat: f64) -> Result<Self> {
        let point = GeoPoint { lng, lat };
        point.validate()?;
        Ok(point)
    }

    pub fn is_valid(&self) -> bool {
        // Range checks are false for NaN, so NaN is rejected too
        (-180.0..=180.0).contains(&self.lng) && (-90.0..=90.0).contains(&self.lat)
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(EvacError::InvalidCoordinate {
                lng: self.lng,
                lat: self.lat,
            })
        }
    }
}

impl From<[f64; 2]> for GeoPoint {
    fn from(pair: [f64; 2]) -> Self {
        GeoPoint {
            lng: pair[0],
            lat: pair[1],
        }
    }
}

impl From<GeoPoint> for [f64; 2] {
    fn from(point: GeoPoint) -> Self {
        [point.lng, point.lat]
    }
}

impl From<GeoPoint> for Point<f64> {
    fn from(point: GeoPoint) -> Self {
        Point::new(point.lng, point.lat)
    }
}

/// Viewport rectangle `[minLng, minLat, maxLng, maxLat]`.
///
/// Deserialized through [`BoundingBox::from_viewport`], so raw map bounds
/// are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 4]")]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Result<Self> {
        let min = GeoPoint::new(min_lng, min_lat)?;
        let max = GeoPoint::new(max_lng, max_lat)?;
        if min.lng > max.lng || min.lat > max.lat {
            return Err(EvacError::InvalidInput(format!(
                "Invalid bbox: min ({}, {}) exceeds max ({}, {})",
                min.lng, min.lat, max.lng, max.lat
            )));
        }
        Ok(BoundingBox {
            min_lng,
            min_lat,
            max_lng,
            max_lat,
        })
    }

    /// Box from map bounds, which may run past ±180° when the view wraps
    /// around the world or past ±90° at low zoom. Components are clamped to
    /// the valid range; a view at least 360° wide covers every longitude.
    pub fn from_viewport(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Result<Self> {
        let (min_lng, max_lng) = if max_lng - min_lng >= 360.0 {
            (-180.0, 180.0)
        } else {
            (min_lng.clamp(-180.0, 180.0), max_lng.clamp(-180.0, 180.0))
        };
        BoundingBox::new(min_lng, min_lat.clamp(-90.0, 90.0), max_lng, max_lat.clamp(-90.0, 90.0))
    }

    /// Whole-world box, used when the caller does not restrict the viewport.
    pub fn world() -> Self {
        BoundingBox {
            min_lng: -180.0,
            min_lat: -90.0,
            max_lng: 180.0,
            max_lat: 90.0,
        }
    }
}

impl TryFrom<Vec<f64>> for BoundingBox {
    type Error = EvacError;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        if values.len() != 4 {
            return Err(EvacError::InvalidInput(
                "Invalid bbox: must contain [minLng, minLat, maxLng, maxLat]".to_string(),
            ));
        }
        BoundingBox::from_viewport(values[0], values[1], values[2], values[3])
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(bbox: BoundingBox) -> Self {
        [bbox.min_lng, bbox.min_lat, bbox.max_lng, bbox.max_lat]
    }
}
