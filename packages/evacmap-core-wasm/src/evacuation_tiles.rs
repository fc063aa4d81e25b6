use flate2::read::GzDecoder;
use geozero::mvt::tile::{self, GeomType};
use geozero::mvt::{Message, Tile};
use geozero::ToGeo;
use geo_types::{Coord, Geometry};
use std::io::Read;

use crate::console_log;
use crate::error::{EvacError, Result};
use crate::evacuation_site::EvacuationSite;
use crate::geo_point::GeoPoint;
use crate::hazard::{flag_is_set, HazardCategory, HazardFlags};
use crate::tiles::TileKey;

/// Extent assumed when a layer does not declare one.
pub const DEFAULT_EXTENT: u32 = 4096;

// Function to detect if data is gzipped (checking for gzip magic number)
fn is_gzipped(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0x1F && data[1] == 0x8B
}

fn decompress_gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| EvacError::TileDecode(format!("Error decompressing gzip data: {}", e)))?;
    Ok(decompressed)
}

/// MoveTo command header for `count` points.
fn move_to_header(count: usize) -> u32 {
    ((count as u32) << 3) | 1
}

// The geozero reader slices the command stream without bounds checks
fn has_complete_point_stream(geometry: &[u32]) -> bool {
    let Some(&header) = geometry.first() else {
        return false;
    };
    let count = (header >> 3) as usize;
    count > 0 && header == move_to_header(count) && geometry.len() == 1 + 2 * count
}

/// Tile-local positions of a point or multipoint feature, `None` when malformed.
fn point_positions(feature: &tile::Feature) -> Option<Vec<Coord<f64>>> {
    if !has_complete_point_stream(&feature.geometry) {
        return None;
    }
    match feature.to_geo() {
        Ok(Geometry::Point(point)) => Some(vec![point.0]),
        Ok(Geometry::MultiPoint(points)) => Some(points.0.into_iter().map(|p| p.0).collect()),
        _ => None,
    }
}

fn tile_value_to_json(value: &tile::Value) -> serde_json::Value {
    match value {
        tile::Value { string_value: Some(s), .. } => serde_json::Value::String(s.clone()),
        tile::Value { int_value: Some(i), .. } => serde_json::Value::from(*i),
        tile::Value { uint_value: Some(u), .. } => serde_json::Value::from(*u),
        tile::Value { sint_value: Some(s), .. } => serde_json::Value::from(*s),
        tile::Value { float_value: Some(f), .. } => serde_json::Number::from_f64(*f as f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        tile::Value { double_value: Some(d), .. } => serde_json::Number::from_f64(*d)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        tile::Value { bool_value: Some(b), .. } => serde_json::Value::Bool(*b),
        _ => serde_json::Value::Null,
    }
}

fn feature_properties(layer: &tile::Layer, feature: &tile::Feature) -> serde_json::Map<String, serde_json::Value> {
    let mut properties = serde_json::Map::new();
    for pair in feature.tags.chunks_exact(2) {
        if let (Some(key), Some(value)) = (
            layer.keys.get(pair[0] as usize),
            layer.values.get(pair[1] as usize),
        ) {
            properties.insert(key.clone(), tile_value_to_json(value));
        }
    }
    properties
}

fn string_property(properties: &serde_json::Map<String, serde_json::Value>, key: &str) -> Option<String> {
    match properties.get(key)? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn site_flags(properties: &serde_json::Map<String, serde_json::Value>) -> HazardFlags {
    HazardCategory::ALL
        .into_iter()
        .filter(|c| properties.get(c.key()).map(flag_is_set).unwrap_or(false))
        .collect()
}

/// Decode the evacuation sites of one vector tile.
///
/// `data` may be gzip-compressed. Returns an empty list when the tile has no
/// layer named `layer_name`.
pub fn decode_evacuation_tile(data: &[u8], key: TileKey, layer_name: &str) -> Result<Vec<EvacuationSite>> {
    let data = if is_gzipped(data) {
        decompress_gzip(data)?
    } else {
        data.to_vec()
    };

    let tile = Tile::decode(data.as_slice())
        .map_err(|e| EvacError::TileDecode(format!("Failed to decode MVT tile {}: {}", key, e)))?;

    let Some(layer) = tile.layers.iter().find(|l| l.name == layer_name) else {
        console_log!("Source layer '{}' not found in tile {}", layer_name, key);
        return Ok(Vec::new());
    };
    let extent = layer.extent.unwrap_or(DEFAULT_EXTENT);

    let mut sites = Vec::new();
    let mut skipped = 0usize;
    for feature in &layer.features {
        if feature.r#type != Some(GeomType::Point as i32) {
            skipped += 1;
            continue;
        }
        let Some(positions) = point_positions(feature) else {
            skipped += 1;
            continue;
        };

        let properties = feature_properties(layer, feature);
        let name = string_property(&properties, "name").unwrap_or_default();
        let address = string_property(&properties, "address").unwrap_or_default();
        let remarks = string_property(&properties, "remarks");
        let categories = site_flags(&properties);

        for position in positions {
            let (lng, lat) = key.to_lng_lat(position.x, position.y, extent);
            sites.push(EvacuationSite {
                location: GeoPoint { lng, lat },
                name: name.clone(),
                address: address.clone(),
                remarks: remarks.clone(),
                categories,
            });
        }
    }

    if skipped > 0 {
        console_log!("Skipped {} non-point or malformed features in tile {}", skipped, key);
    }
    Ok(sites)
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn multipoint_feature_yields_one_site_per_position() {
        let keys = vec!["name".to_string(), "tsunami".to_string()];
        let values = vec![
            tile::Value { string_value: Some("避難タワー".to_string()), ..Default::default() },
            tile::Value { bool_value: Some(true), ..Default::default() },
        ];
        let tower = multipoint_feature(&[(2048, 2048), (1024, 3072)], vec![0, 0, 1, 1]);
        let bytes = tile_bytes(vec![tower], keys, values);

        let key = TileKey::new(1, 1, 1);
        let sites = decode_evacuation_tile(&bytes, key, "evacuation").unwrap();
        assert_eq!(sites.len(), 2);
        assert!(sites.iter().all(|s| s.name == "避難タワー"));
        assert!(sites.iter().all(|s| s.is_designated_for(HazardCategory::Tsunami)));
        let (lng, lat) = key.to_lng_lat(1024.0, 3072.0, 4096);
        assert_eq!(sites[1].location, GeoPoint { lng, lat });
    }

    #[test]
    fn truncated_point_geometry_is_skipped() {
        let mut truncated = point_feature(2048, 2048, vec![]);
        truncated.geometry.pop();
        let mut empty = point_feature(1024, 1024, vec![]);
        empty.geometry.clear();
        let mut line_header = point_feature(1024, 1024, vec![]);
        line_header.geometry[0] = (1 << 3) | 2;
        let valid = point_feature(512, 512, vec![]);

        let bytes = tile_bytes(vec![truncated, empty, line_header, valid], Vec::new(), Vec::new());
        let sites = decode_evacuation_tile(&bytes, TileKey::new(1, 1, 1), "evacuation").unwrap();
        assert_eq!(sites.len(), 1);
    }

    #[test]
    fn decodes_sites_with_properties_and_flags() {
        let key = TileKey::new(1, 1, 1);
        let sites = decode_evacuation_tile(&sample_tile_bytes(), key, "evacuation").unwrap();
        assert_eq!(sites.len(), 2, "line feature is skipped");

        let school = &sites[0];
        assert_eq!(school.name, "第一小学校");
        assert_eq!(school.address, "千代田区1-1");
        assert_eq!(school.remarks.as_deref(), Some("体育館"));
        assert!(school.is_designated_for(HazardCategory::Flood));
        assert!(!school.is_designated_for(HazardCategory::Earthquake));
        assert!((school.location.lng - 90.0).abs() < 1e-9);
        assert!((school.location.lat - -66.513_260_443).abs() < 1e-6);

        let park = &sites[1];
        assert_eq!(park.remarks, None);
        assert_eq!(park.categories.iter().collect::<Vec<_>>(), vec![HazardCategory::Fire]);
    }

    #[test]
    fn gzip_payload_is_transparent() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&sample_tile_bytes()).unwrap();
        let gz = encoder.finish().unwrap();

        let key = TileKey::new(1, 1, 1);
        let plain = decode_evacuation_tile(&sample_tile_bytes(), key, "evacuation").unwrap();
        let unzipped = decode_evacuation_tile(&gz, key, "evacuation").unwrap();
        assert_eq!(plain, unzipped);
    }

    #[test]
    fn missing_layer_yields_no_sites() {
        let sites = decode_evacuation_tile(&sample_tile_bytes(), TileKey::new(1, 1, 1), "shelters").unwrap();
        assert!(sites.is_empty());
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let result = decode_evacuation_tile(&[0xff, 0xff, 0xff, 0x01], TileKey::new(0, 0, 0), "evacuation");
        assert!(matches!(result, Err(EvacError::TileDecode(_))));
    }
}
