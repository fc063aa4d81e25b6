use serde::{Deserialize, Serialize};

use crate::geo_point::GeoPoint;
use crate::hazard::{HazardCategory, HazardFlags};

/// A designated emergency evacuation site (指定緊急避難場所).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvacuationSite {
    pub location: GeoPoint,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub categories: HazardFlags,
}

impl EvacuationSite {
    pub fn is_designated_for(&self, category: HazardCategory) -> bool {
        self.categories.contains(category)
    }

    /// Plain data behind the site popup.
    pub fn summary(&self) -> SiteSummary {
        SiteSummary {
            name: self.name.clone(),
            address: self.address.clone(),
            remarks: self.remarks.clone().unwrap_or_default(),
            categories: HazardCategory::ALL
                .into_iter()
                .map(|category| CategoryBadge {
                    key: category.key().to_string(),
                    label: category.label().to_string(),
                    designated: self.categories.contains(category),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBadge {
    pub key: String,
    pub label: String,
    pub designated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSummary {
    pub name: String,
    pub address: String,
    pub remarks: String,
    pub categories: Vec<CategoryBadge>,
}
