//! Service offering model.

use serde::{Deserialize, Serialize};

use super::{is_blank, Collection, Draft};
use crate::icons::ServiceIcon;

/// A service the consultancy offers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceDraft {
    pub title: String,
    pub description: String,
    /// Bullet points in display order.
    pub features: Vec<String>,
    /// Stored icon name, see [`ServiceIcon`].
    pub icon: String,
    pub sort_order: i32,
    pub active: bool,
}

impl Default for ServiceDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            features: Vec::new(),
            icon: String::new(),
            sort_order: 0,
            active: true,
        }
    }
}

impl ServiceDraft {
    pub fn icon(&self) -> ServiceIcon {
        ServiceIcon::from_tag(&self.icon)
    }
}

impl Draft for ServiceDraft {
    const COLLECTION: Collection = Collection::Services;

    fn invalid_fields(&self) -> Vec<&'static str> {
        let mut invalid = Vec::new();
        if is_blank(&self.title) {
            invalid.push("title");
        }
        if is_blank(&self.description) {
            invalid.push("description");
        }
        invalid
    }
}
