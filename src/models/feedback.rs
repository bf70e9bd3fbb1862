//! Client feedback model.

use serde::{Deserialize, Serialize};

use super::{is_blank, Collection, Draft};

/// Rating bounds, inclusive.
pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// A testimonial. Only approved entries are shown publicly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedbackDraft {
    pub name: String,
    pub email: String,
    pub rating: u8,
    pub message: String,
    pub approved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

impl Default for FeedbackDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            rating: MAX_RATING,
            message: String::new(),
            approved: false,
            project_id: None,
        }
    }
}

impl Draft for FeedbackDraft {
    const COLLECTION: Collection = Collection::Feedback;

    fn invalid_fields(&self) -> Vec<&'static str> {
        let mut invalid = Vec::new();
        if is_blank(&self.name) {
            invalid.push("name");
        }
        if is_blank(&self.message) {
            invalid.push("message");
        }
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            invalid.push("rating");
        }
        invalid
    }
}
