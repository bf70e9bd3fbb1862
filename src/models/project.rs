//! Portfolio project model.

use serde::{Deserialize, Serialize};

use super::{is_blank, Collection, Draft};

/// Delivery status of a project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    InProgress,
}

/// A project shown in the portfolio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectDraft {
    pub title: String,
    pub description: String,
    pub status: ProjectStatus,
    pub tech_stack: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    pub featured: bool,
}

impl Draft for ProjectDraft {
    const COLLECTION: Collection = Collection::Projects;

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
