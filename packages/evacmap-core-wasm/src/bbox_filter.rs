use crate::geo_point::{BoundingBox, GeoPoint};

// Function to check if a point is inside a bounding box (edges included)
pub fn point_in_bbox(point: &GeoPoint, bbox: &BoundingBox) -> bool {
    point.lng >= bbox.min_lng
        && point.lng <= bbox.max_lng
        && point.lat >= bbox.min_lat
        && point.lat <= bbox.max_lat
}
