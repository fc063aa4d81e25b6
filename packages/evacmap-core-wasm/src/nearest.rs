// Nearest-site lookup: a linear scan by great-circle distance.
use geo::{Distance, Haversine};
use geo_types::Point;
use serde::Serialize;

use crate::error::Result;
use crate::evacuation_site::EvacuationSite;
use crate::geo_point::GeoPoint;

/// Anything with a position that can take part in a nearest query.
pub trait Located {
    fn location(&self) -> GeoPoint;
}

impl Located for GeoPoint {
    fn location(&self) -> GeoPoint {
        *self
    }
}

impl Located for EvacuationSite {
    fn location(&self) -> GeoPoint {
        self.location
    }
}

impl<T: Located + ?Sized> Located for &T {
    fn location(&self) -> GeoPoint {
        (**self).location()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestResult<T> {
    pub feature: T,
    pub distance_km: f64,
}

/// Great-circle distance in kilometers on a spherical Earth.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    Haversine::distance(Point::from(a), Point::from(b)) / 1000.0
}

/// Closest candidate to `reference`, or `None` for an empty candidate set.
///
/// Ties go to the candidate seen first. Every coordinate, the reference and
/// each candidate, is range-checked; the first invalid one aborts the query.
pub fn find_nearest<T, I>(reference: GeoPoint, candidates: I) -> Result<Option<NearestResult<T>>>
where
    T: Located,
    I: IntoIterator<Item = T>,
{
    reference.validate()?;

    let mut best: Option<NearestResult<T>> = None;
    for candidate in candidates {
        let location = candidate.location();
        location.validate()?;
        let distance = distance_km(reference, location);
        // Strict comparison keeps the earlier candidate on ties
        let closer = best.as_ref().map_or(true, |b| distance < b.distance_km);
        if closer {
            best = Some(NearestResult {
                feature: candidate,
                distance_km: distance,
            });
        }
    }
    Ok(best)
}
