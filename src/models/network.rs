//! Network partner model.

use serde::{Deserialize, Serialize};

use super::{is_blank, Collection, Draft};

/// How a network member relates to the consultancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkRelation {
    #[default]
    Partner,
    Client,
    Mentor,
    Alumni,
}

/// An outside person or organization in the team network.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkMemberDraft {
    pub name: String,
    pub organization: String,
    pub relation: NetworkRelation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Team member this contact is connected to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_to: Option<String>,
}

impl Draft for NetworkMemberDraft {
    const COLLECTION: Collection = Collection::Network;

    fn invalid_fields(&self) -> Vec<&'static str> {
        if is_blank(&self.name) {
            vec!["name"]
        } else {
            Vec::new()
        }
    }
}
