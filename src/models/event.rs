//! Event model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{is_blank, Collection, Draft};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Upcoming,
    Ongoing,
    Completed,
}

/// A workshop, talk or meetup listed on the events page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub date: Option<NaiveDate>,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub category: String,
    pub status: EventStatus,
    pub featured: bool,
    pub organizers: Vec<String>,
    pub tags: Vec<String>,
}

impl Draft for EventDraft {
    const COLLECTION: Collection = Collection::Events;

    fn invalid_fields(&self) -> Vec<&'static str> {
        let mut invalid = Vec::new();
        if is_blank(&self.title) {
            invalid.push("title");
        }
        if self.date.is_none() {
            invalid.push("date");
        }
        if is_blank(&self.location) {
            invalid.push("location");
        }
        invalid
    }
}
