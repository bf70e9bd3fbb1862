//! Activity feed model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{is_blank, Collection, Draft};

/// What an activity entry is about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Project,
    Member,
    #[default]
    Announcement,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Project => "project",
            ActivityKind::Member => "member",
            ActivityKind::Announcement => "announcement",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "project" => Ok(ActivityKind::Project),
            "member" => Ok(ActivityKind::Member),
            "announcement" => Ok(ActivityKind::Announcement),
            other => Err(format!(
                "Unknown activity type '{}' (expected project, member or announcement)",
                other
            )),
        }
    }
}

/// One line of the activity feed. The creation timestamp is stamped by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityDraft {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub title: String,
}

impl ActivityDraft {
    pub fn new(kind: ActivityKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
        }
    }
}

impl Draft for ActivityDraft {
    const COLLECTION: Collection = Collection::Activity;

    fn invalid_fields(&self) -> Vec<&'static str> {
        if is_blank(&self.title) {
            vec!["title"]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_as_type() {
        let draft = ActivityDraft::new(ActivityKind::Project, "Launched v2");
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value["type"], "project");
        assert_eq!(value["title"], "Launched v2");
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("member".parse::<ActivityKind>(), Ok(ActivityKind::Member));
        assert!("release".parse::<ActivityKind>().is_err());
    }
}
