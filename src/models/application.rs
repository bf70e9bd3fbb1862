//! Job application model.

use serde::{Deserialize, Serialize};

use super::{is_blank, Collection, Draft};

/// An application submitted through the apply page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationDraft {
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    pub message: String,
}

impl Draft for ApplicationDraft {
    const COLLECTION: Collection = Collection::Applications;

    fn invalid_fields(&self) -> Vec<&'static str> {
        let mut invalid = Vec::new();
        if is_blank(&self.name) {
            invalid.push("name");
        }
        if is_blank(&self.email) {
            invalid.push("email");
        }
        if is_blank(&self.role) {
            invalid.push("role");
        }
        invalid
    }
}
