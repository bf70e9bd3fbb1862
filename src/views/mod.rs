//! Views over the query cache.
//!
//! `admin` holds the list-and-edit screen state machine used by the admin panel; `public`
//! derives the read-only sections of the public pages.

mod admin;
mod public;

pub use admin::*;
pub use public::*;

use crate::client::ApiClient;
use crate::models::{Draft, Record};
use crate::query::{QueryClient, QueryState};

/// Query a whole collection through the cache.
pub fn collection_query<D: Draft>(cache: &QueryClient, client: &ApiClient) -> QueryState {
    cache.query(
        &D::COLLECTION.query_key(),
        client.collection_fetcher(D::COLLECTION),
    )
}

/// Records held by a cache entry. Data that does not decode is logged and treated as empty.
pub fn records<D: Draft>(state: &QueryState) -> Vec<Record<D>> {
    match state.data_as::<Vec<Record<D>>>() {
        Some(Ok(records)) => records,
        Some(Err(err)) => {
            tracing::warn!("Cached {} data does not decode: {}", D::COLLECTION, err);
            Vec::new()
        }
        None => Vec::new(),
    }
}
