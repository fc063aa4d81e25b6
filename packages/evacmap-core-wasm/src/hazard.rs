// Hazard catalog: the raster overlays published by the GSI hazard map portal
// and the categories an evacuation site can be designated for.
use serde::{Deserialize, Serialize};

use crate::error::{EvacError, Result};

const HAZARD_ATTRIBUTION: &str = "&copy; <a href=\"https://disaportal.gsi.go.jp/hazardmap/copyright/opendata.html\">ハザードマップポータルサイト</a>";

/// Disaster type an evacuation site is designated for.
///
/// The serialized form is the property key used in the evacuation vector tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardCategory {
    Flood,
    Dosekiryu,
    Hightide,
    Earthquake,
    Tsunami,
    Fire,
    Inlandflood,
    Volcano,
}

impl HazardCategory {
    /// Display order of the evacuation layer control.
    pub const ALL: [HazardCategory; 8] = [
        HazardCategory::Flood,
        HazardCategory::Dosekiryu,
        HazardCategory::Hightide,
        HazardCategory::Earthquake,
        HazardCategory::Tsunami,
        HazardCategory::Fire,
        HazardCategory::Inlandflood,
        HazardCategory::Volcano,
    ];

    pub fn key(self) -> &'static str {
        match self {
            HazardCategory::Flood => "flood",
            HazardCategory::Dosekiryu => "dosekiryu",
            HazardCategory::Hightide => "hightide",
            HazardCategory::Earthquake => "earthquake",
            HazardCategory::Tsunami => "tsunami",
            HazardCategory::Fire => "fire",
            HazardCategory::Inlandflood => "inlandflood",
            HazardCategory::Volcano => "volcano",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HazardCategory::Flood => "洪水",
            HazardCategory::Dosekiryu => "崖崩れ/土石流/地滑り",
            HazardCategory::Hightide => "高潮",
            HazardCategory::Earthquake => "地震",
            HazardCategory::Tsunami => "津波",
            HazardCategory::Fire => "大規模な火事",
            HazardCategory::Inlandflood => "内水氾濫",
            HazardCategory::Volcano => "火山現象",
        }
    }

    /// MapLibre layer id of the evacuation circles for this category.
    pub fn layer_id(self) -> String {
        format!("evacuation-{}-layer", self.key())
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }

    pub fn from_key(key: &str) -> Result<Self> {
        HazardCategory::ALL
            .into_iter()
            .find(|c| c.key() == key)
            .ok_or_else(|| EvacError::UnknownCategory(key.to_string()))
    }

    /// Accepts either the bare key or the `evacuation-<key>-layer` id.
    pub fn from_layer_id(id: &str) -> Result<Self> {
        let key = id
            .strip_prefix("evacuation-")
            .and_then(|rest| rest.strip_suffix("-layer"))
            .unwrap_or(id);
        HazardCategory::from_key(key).map_err(|_| EvacError::UnknownCategory(id.to_string()))
    }
}

/// Set of categories a site is designated for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct HazardFlags(u8);

impl HazardFlags {
    pub fn empty() -> Self {
        HazardFlags(0)
    }

    pub fn insert(&mut self, category: HazardCategory) {
        self.0 |= category.bit();
    }

    pub fn contains(self, category: HazardCategory) -> bool {
        self.0 & category.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = HazardCategory> {
        HazardCategory::ALL
            .into_iter()
            .filter(move |c| self.contains(*c))
    }
}

impl FromIterator<HazardCategory> for HazardFlags {
    fn from_iter<I: IntoIterator<Item = HazardCategory>>(iter: I) -> Self {
        let mut flags = HazardFlags::empty();
        for category in iter {
            flags.insert(category);
        }
        flags
    }
}

impl Serialize for HazardFlags {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for HazardFlags {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let categories = Vec::<HazardCategory>::deserialize(deserializer)?;
        Ok(categories.into_iter().collect())
    }
}

/// Whether a tile property value marks a category as designated.
///
/// The published tiles encode flags as `1`/`0`; booleans and `"1"` strings
/// are accepted as well.
pub fn flag_is_set(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64() == Some(1.0),
        serde_json::Value::String(s) => s.trim() == "1",
        _ => false,
    }
}

/// Raster hazard overlay drawn under the evacuation sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardOverlay {
    Flood,
    Hightide,
    Tsunami,
    Dosekiryu,
    Kyukeisha,
    Jisuberi,
}

impl HazardOverlay {
    pub const ALL: [HazardOverlay; 6] = [
        HazardOverlay::Flood,
        HazardOverlay::Hightide,
        HazardOverlay::Tsunami,
        HazardOverlay::Dosekiryu,
        HazardOverlay::Kyukeisha,
        HazardOverlay::Jisuberi,
    ];

    pub const MIN_ZOOM: u32 = 2;
    pub const MAX_ZOOM: u32 = 17;
    pub const TILE_SIZE: u32 = 256;
    pub const DEFAULT_OPACITY: f64 = 0.7;

    pub fn key(self) -> &'static str {
        match self {
            HazardOverlay::Flood => "flood",
            HazardOverlay::Hightide => "hightide",
            HazardOverlay::Tsunami => "tsunami",
            HazardOverlay::Dosekiryu => "dosekiryu",
            HazardOverlay::Kyukeisha => "kyukeisha",
            HazardOverlay::Jisuberi => "jisuberi",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HazardOverlay::Flood => "洪水浸水想定区域（想定最大規模）",
            HazardOverlay::Hightide => "高潮浸水想定区域",
            HazardOverlay::Tsunami => "津波浸水想定",
            HazardOverlay::Dosekiryu => "土砂災害警戒区域（土石流）",
            HazardOverlay::Kyukeisha => "土砂災害警戒区域（急傾斜地の崩壊）",
            HazardOverlay::Jisuberi => "土砂災害警戒区域（地すべり）",
        }
    }

    fn dataset(self) -> &'static str {
        match self {
            HazardOverlay::Flood => "01_flood_l2_shinsuishin_data",
            HazardOverlay::Hightide => "03_hightide_l2_shinsuishin_data",
            HazardOverlay::Tsunami => "04_tsunami_newlegend_data",
            HazardOverlay::Dosekiryu => "05_dosekiryukeikaikuiki",
            HazardOverlay::Kyukeisha => "05_kyukeishakeikaikuiki",
            HazardOverlay::Jisuberi => "05_jisuberikeikaikuiki",
        }
    }

    pub fn tile_url_template(self) -> String {
        format!(
            "https://disaportaldata.gsi.go.jp/raster/{}/{{z}}/{{x}}/{{y}}.png",
            self.dataset()
        )
    }

    pub fn layer_id(self) -> String {
        format!("{}-layer", self.key())
    }
}

// Plain-data views handed to the front end

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayInfo {
    pub key: String,
    pub layer_id: String,
    pub label: String,
    pub tiles: Vec<String>,
    pub min_zoom: u32,
    pub max_zoom: u32,
    pub tile_size: u32,
    pub opacity: f64,
    pub attribution: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInfo {
    pub key: String,
    pub layer_id: String,
    pub label: String,
}

#[derive(Serialize, Deserialize)]
pub struct HazardCatalog {
    pub overlays: Vec<OverlayInfo>,
    pub categories: Vec<CategoryInfo>,
}

pub fn hazard_catalog() -> HazardCatalog {
    let overlays = HazardOverlay::ALL
        .into_iter()
        .map(|o| OverlayInfo {
            key: o.key().to_string(),
            layer_id: o.layer_id(),
            label: o.label().to_string(),
            tiles: vec![o.tile_url_template()],
            min_zoom: HazardOverlay::MIN_ZOOM,
            max_zoom: HazardOverlay::MAX_ZOOM,
            tile_size: HazardOverlay::TILE_SIZE,
            opacity: HazardOverlay::DEFAULT_OPACITY,
            attribution: HAZARD_ATTRIBUTION.to_string(),
        })
        .collect();
    let categories = HazardCategory::ALL
        .into_iter()
        .map(|c| CategoryInfo {
            key: c.key().to_string(),
            layer_id: c.layer_id(),
            label: c.label().to_string(),
        })
        .collect();
    HazardCatalog {
        overlays,
        categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_keys_round_trip_through_layer_ids() {
        for category in HazardCategory::ALL {
            assert_eq!(HazardCategory::from_key(category.key()), Ok(category));
            assert_eq!(HazardCategory::from_layer_id(&category.layer_id()), Ok(category));
        }
        assert_eq!(
            HazardCategory::from_layer_id("evacuation-typhoon-layer"),
            Err(EvacError::UnknownCategory("evacuation-typhoon-layer".to_string()))
        );
    }

    #[test]
    fn flags_track_membership() {
        let flags: HazardFlags = [HazardCategory::Tsunami, HazardCategory::Flood]
            .into_iter()
            .collect();
        assert!(flags.contains(HazardCategory::Flood));
        assert!(!flags.contains(HazardCategory::Fire));
        // Iteration follows display order, not insertion order
        assert_eq!(
            flags.iter().collect::<Vec<_>>(),
            vec![HazardCategory::Flood, HazardCategory::Tsunami]
        );
        assert_eq!(
            serde_json::to_string(&flags).unwrap(),
            r#"["flood","tsunami"]"#
        );
    }

    #[test]
    fn flag_values_follow_tile_encoding() {
        assert!(flag_is_set(&serde_json::json!(1)));
        assert!(flag_is_set(&serde_json::json!(1.0)));
        assert!(flag_is_set(&serde_json::json!(true)));
        assert!(flag_is_set(&serde_json::json!("1")));
        assert!(!flag_is_set(&serde_json::json!(0)));
        assert!(!flag_is_set(&serde_json::json!(null)));
    }

    #[test]
    fn catalog_lists_every_overlay_and_category() {
        let catalog = hazard_catalog();
        assert_eq!(catalog.overlays.len(), 6);
        assert_eq!(catalog.categories.len(), 8);
        assert_eq!(
            catalog.overlays[2].tiles[0],
            "https://disaportaldata.gsi.go.jp/raster/04_tsunami_newlegend_data/{z}/{x}/{y}.png"
        );
        assert_eq!(catalog.categories[1].layer_id, "evacuation-dosekiryu-layer");
    }
}
