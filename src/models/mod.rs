//! Data models for the portfolio site content.
//!
//! Every entity is stored by the data service as a [`Record`]: the service stamps `id` and
//! `createdAt`, the rest of the object is the entity's draft fields. Drafts are what admin
//! forms edit and what `POST /api/{collection}` accepts.

mod activity;
mod application;
mod collection;
mod event;
mod feedback;
mod network;
mod project;
mod service;
mod team;

pub use activity::*;
pub use application::*;
pub use collection::*;
pub use event::*;
pub use feedback::*;
pub use network::*;
pub use project::*;
pub use service::*;
pub use team::*;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A stored entity: service-generated identity plus the entity's own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<D> {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: D,
}

/// Editable fields of an entity belonging to one collection.
pub trait Draft: std::fmt::Debug + Clone + Default + Serialize + DeserializeOwned + 'static {
    /// Collection the entity lives in.
    const COLLECTION: Collection;

    /// Names of fields that are required but empty, or otherwise out of range.
    fn invalid_fields(&self) -> Vec<&'static str>;

    fn is_valid(&self) -> bool {
        self.invalid_fields().is_empty()
    }
}

pub type TeamMember = Record<TeamMemberDraft>;
pub type Service = Record<ServiceDraft>;
pub type Project = Record<ProjectDraft>;
pub type ActivityEntry = Record<ActivityDraft>;
pub type NetworkMember = Record<NetworkMemberDraft>;
pub type Event = Record<EventDraft>;
pub type Application = Record<ApplicationDraft>;
pub type Feedback = Record<FeedbackDraft>;

/// True when a required text field has no visible content.
pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
