//! Admin list-and-edit screens.
//!
//! One [`AdminScreen`] per entity collection. The list comes from the query cache; adding,
//! editing and deleting go through the mutation executor, so the list only changes once the
//! service has committed the write and the refetch has returned.
//!
//! ```text
//! Idle -> Loading -> Loaded | LoadFailed
//! Loaded -> AddingNew -> Submitting -> Loaded | AddFailed
//! Loaded -> Editing -> Submitting -> Loaded | EditFailed
//! Loaded -> Submitting (delete) -> Loaded
//! ```

use std::collections::HashMap;

use super::{collection_query, records};
use crate::client::ApiClient;
use crate::errors::ClientError;
use crate::models::{Draft, Record};
use crate::query::{MutationExecutor, QueryStatus, QuerySubscription};

#[derive(Debug, Clone, PartialEq)]
pub enum ScreenState<D> {
    Idle,
    Loading,
    Loaded,
    LoadFailed { message: String },
    AddingNew { draft: D },
    Editing { id: String, draft: D },
    Submitting,
    AddFailed { draft: D, message: String },
    EditFailed { id: String, draft: D, message: String },
}

/// State of one admin screen. Draft state is private to the screen.
pub struct AdminScreen<D: Draft> {
    client: ApiClient,
    mutations: MutationExecutor,
    subscription: QuerySubscription,
    state: ScreenState<D>,
    row_errors: HashMap<String, String>,
}

impl<D: Draft> AdminScreen<D> {
    pub fn new(client: ApiClient, mutations: MutationExecutor) -> Self {
        let subscription = mutations.cache().subscribe(&D::COLLECTION.query_key());
        Self {
            client,
            mutations,
            subscription,
            state: ScreenState::Idle,
            row_errors: HashMap::new(),
        }
    }

    pub fn state(&self) -> &ScreenState<D> {
        &self.state
    }

    /// Start (or reuse) the collection query.
    pub fn load(&mut self) -> &ScreenState<D> {
        collection_query::<D>(self.mutations.cache(), &self.client);
        self.sync();
        &self.state
    }

    /// Wait until the collection query has settled, then update the screen.
    pub async fn refreshed(&mut self) -> &ScreenState<D> {
        self.subscription.settled().await;
        self.sync();
        &self.state
    }

    /// Follow the cache while the screen shows the list. Forms and in-flight submissions are
    /// left alone.
    pub fn sync(&mut self) {
        if !matches!(
            self.state,
            ScreenState::Idle
                | ScreenState::Loading
                | ScreenState::Loaded
                | ScreenState::LoadFailed { .. }
        ) {
            return;
        }

        let cache = self.subscription.state();
        self.state = match cache.status {
            QueryStatus::Idle => ScreenState::Idle,
            QueryStatus::Loading => ScreenState::Loading,
            QueryStatus::Loaded => ScreenState::Loaded,
            // Stale rows stay usable; the error is shown next to the list.
            QueryStatus::LoadFailed if cache.data.is_some() => ScreenState::Loaded,
            QueryStatus::LoadFailed => ScreenState::LoadFailed {
                message: cache
                    .error
                    .map(|err| err.to_string())
                    .unwrap_or_else(|| "Failed to load".to_string()),
            },
        };
    }

    /// Rows to display: the last data the cache holds, even after a failed refresh.
    pub fn items(&self) -> Vec<Record<D>> {
        records::<D>(&self.subscription.state())
    }

    /// Message of the latest failed refresh.
    pub fn load_error(&self) -> Option<String> {
        self.subscription.state().error.map(|err| err.to_string())
    }

    /// Message of the latest failed delete of a row.
    pub fn row_error(&self, id: &str) -> Option<&str> {
        self.row_errors.get(id).map(String::as_str)
    }

    pub fn begin_add(&mut self) -> bool {
        if !matches!(self.state, ScreenState::Loaded) {
            return false;
        }
        self.state = ScreenState::AddingNew {
            draft: D::default(),
        };
        true
    }

    pub fn begin_edit(&mut self, id: &str) -> bool {
        if !matches!(self.state, ScreenState::Loaded) {
            return false;
        }
        let Some(record) = self.items().into_iter().find(|record| record.id == id) else {
            return false;
        };
        self.state = ScreenState::Editing {
            id: record.id,
            draft: record.fields,
        };
        true
    }

    pub fn draft(&self) -> Option<&D> {
        match &self.state {
            ScreenState::AddingNew { draft }
            | ScreenState::Editing { draft, .. }
            | ScreenState::AddFailed { draft, .. }
            | ScreenState::EditFailed { draft, .. } => Some(draft),
            _ => None,
        }
    }

    pub fn draft_mut(&mut self) -> Option<&mut D> {
        match &mut self.state {
            ScreenState::AddingNew { draft }
            | ScreenState::Editing { draft, .. }
            | ScreenState::AddFailed { draft, .. }
            | ScreenState::EditFailed { draft, .. } => Some(draft),
            _ => None,
        }
    }

    /// The submit control is enabled only for a complete draft.
    pub fn can_submit(&self) -> bool {
        self.draft().is_some_and(|draft| draft.is_valid())
    }

    /// Leave the form without saving.
    pub fn cancel(&mut self) {
        if self.draft().is_some() {
            self.state = ScreenState::Loaded;
            self.sync();
        }
    }

    /// Save the open form. Incomplete drafts fail validation without a request; outside of a
    /// form (including while a submission is running) this does nothing.
    pub async fn submit(&mut self) -> Result<(), ClientError> {
        let (id, draft) = match &self.state {
            ScreenState::AddingNew { draft } | ScreenState::AddFailed { draft, .. } => {
                (None, draft.clone())
            }
            ScreenState::Editing { id, draft } | ScreenState::EditFailed { id, draft, .. } => {
                (Some(id.clone()), draft.clone())
            }
            _ => {
                tracing::debug!("Ignoring submit on {} screen without a form", D::COLLECTION);
                return Ok(());
            }
        };

        let invalid = draft.invalid_fields();
        if !invalid.is_empty() {
            return Err(ClientError::validation(invalid));
        }

        self.state = ScreenState::Submitting;
        let result = match &id {
            None => self
                .mutations
                .create(&self.client, &draft)
                .await
                .map(|record| tracing::info!("Created {} {}", D::COLLECTION, record.id)),
            Some(id) => self
                .mutations
                .update(&self.client, id, &draft)
                .await
                .map(|record| tracing::info!("Updated {} {}", D::COLLECTION, record.id)),
        };

        match result {
            Ok(()) => {
                self.state = ScreenState::Loaded;
                self.sync();
                Ok(())
            }
            Err(err) => {
                let message = err.to_string();
                self.state = match id {
                    None => ScreenState::AddFailed { draft, message },
                    Some(id) => ScreenState::EditFailed { id, draft, message },
                };
                Err(err)
            }
        }
    }

    /// Delete a row immediately. There is no confirmation step.
    pub async fn delete(&mut self, id: &str) -> Result<(), ClientError> {
        if !matches!(self.state, ScreenState::Loaded) {
            tracing::debug!("Ignoring delete on {} screen while busy", D::COLLECTION);
            return Ok(());
        }

        self.state = ScreenState::Submitting;
        let result = self.mutations.delete::<D>(&self.client, id).await;
        self.state = ScreenState::Loaded;

        match &result {
            Ok(()) => {
                tracing::info!("Deleted {} {}", D::COLLECTION, id);
                self.row_errors.remove(id);
            }
            Err(err) => {
                self.row_errors.insert(id.to_string(), err.to_string());
            }
        }
        self.sync();
        result
    }
}
