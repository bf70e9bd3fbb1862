//! Team member model.

use serde::{Deserialize, Serialize};

use super::{is_blank, Collection, Draft};

/// A person shown on the team page and in the team network.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamMemberDraft {
    pub name: String,
    pub role: String,
    pub department: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Position on the team page, ascending.
    pub display_order: i32,
}

impl Draft for TeamMemberDraft {
    const COLLECTION: Collection = Collection::TeamMembers;

    fn invalid_fields(&self) -> Vec<&'static str> {
        let mut invalid = Vec::new();
        if is_blank(&self.name) {
            invalid.push("name");
        }
        if is_blank(&self.role) {
            invalid.push("role");
        }
        invalid
    }
}
