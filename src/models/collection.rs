//! Entity collections exposed by the data service.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    ActivityDraft, ApplicationDraft, Draft, EventDraft, FeedbackDraft, NetworkMemberDraft,
    ProjectDraft, ServiceDraft, TeamMemberDraft,
};
use crate::query::QueryKey;

/// One entity collection, addressed as `/api/{collection}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Collection {
    TeamMembers,
    Services,
    Projects,
    Activity,
    Network,
    Events,
    Applications,
    Feedback,
}

impl Collection {
    pub const ALL: [Collection; 8] = [
        Collection::TeamMembers,
        Collection::Services,
        Collection::Projects,
        Collection::Activity,
        Collection::Network,
        Collection::Events,
        Collection::Applications,
        Collection::Feedback,
    ];

    /// Path segment used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::TeamMembers => "team-members",
            Collection::Services => "services",
            Collection::Projects => "projects",
            Collection::Activity => "activity",
            Collection::Network => "network",
            Collection::Events => "events",
            Collection::Applications => "applications",
            Collection::Feedback => "feedback",
        }
    }

    /// `/api/{collection}`
    pub fn path(&self) -> String {
        format!("/api/{}", self.as_str())
    }

    /// `/api/{collection}/{id}`
    pub fn item_path(&self, id: &str) -> String {
        format!("/api/{}/{}", self.as_str(), id)
    }

    /// Cache key holding the whole collection.
    pub fn query_key(&self) -> QueryKey {
        QueryKey::new([self.as_str()])
    }

    /// Check that a JSON body has the shape of this collection's draft and that every
    /// required field is filled in.
    pub fn validate_draft(&self, body: &Value) -> Result<(), String> {
        match self {
            Collection::TeamMembers => check::<TeamMemberDraft>(body),
            Collection::Services => check::<ServiceDraft>(body),
            Collection::Projects => check::<ProjectDraft>(body),
            Collection::Activity => check::<ActivityDraft>(body),
            Collection::Network => check::<NetworkMemberDraft>(body),
            Collection::Events => check::<EventDraft>(body),
            Collection::Applications => check::<ApplicationDraft>(body),
            Collection::Feedback => check::<FeedbackDraft>(body),
        }
    }
}

fn check<D: Draft>(body: &Value) -> Result<(), String> {
    let draft: D = serde_json::from_value(body.clone())
        .map_err(|e| format!("Invalid {} payload: {}", D::COLLECTION, e))?;

    let invalid = draft.invalid_fields();
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(format!("Missing or invalid fields: {}", invalid.join(", ")))
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown collection '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trips_through_path_segment() {
        for collection in Collection::ALL {
            assert_eq!(collection.as_str().parse::<Collection>(), Ok(collection));
        }
        assert!("topics".parse::<Collection>().is_err());
    }

    #[test]
    fn test_paths() {
        assert_eq!(Collection::TeamMembers.path(), "/api/team-members");
        assert_eq!(Collection::Activity.item_path("abc"), "/api/activity/abc");
    }

    #[test]
    fn test_validate_draft_reports_missing_fields() {
        let err = Collection::Activity
            .validate_draft(&json!({ "type": "project", "title": "  " }))
            .unwrap_err();
        assert!(err.contains("title"));

        assert!(Collection::Activity
            .validate_draft(&json!({ "type": "project", "title": "Launched v2" }))
            .is_ok());
    }

    #[test]
    fn test_validate_draft_rejects_wrong_shape() {
        let err = Collection::Projects
            .validate_draft(&json!({ "title": "Site", "description": "x", "status": "paused" }))
            .unwrap_err();
        assert!(err.starts_with("Invalid projects payload"));
    }
}
