//! Mutation executor.
//!
//! Runs exactly one write against the data service and, only when it succeeds, invalidates
//! the query keys that depend on it. Nothing is applied to cached data optimistically: views
//! see the change once the server has committed it and the refetch has come back.

use std::future::Future;

use super::{QueryClient, QueryKey};
use crate::client::ApiClient;
use crate::errors::ClientError;
use crate::models::{Draft, Record};
use crate::session::AuthContext;

/// Performs writes and invalidates dependent queries.
#[derive(Clone)]
pub struct MutationExecutor {
    cache: QueryClient,
    auth: Option<AuthContext>,
}

impl MutationExecutor {
    pub fn new(cache: QueryClient) -> Self {
        Self { cache, auth: None }
    }

    /// Report rejected sessions to `auth`, so guarded views redirect to login.
    pub fn with_auth(mut self, auth: AuthContext) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn cache(&self) -> &QueryClient {
        &self.cache
    }

    /// Await `operation`; on success invalidate every key in `invalidates` before returning.
    /// Failures are returned as-is for the caller to display. There is no retry.
    pub async fn mutate<T, Fut>(&self, operation: Fut, invalidates: &[QueryKey]) -> Result<T, ClientError>
    where
        Fut: Future<Output = Result<T, ClientError>>,
    {
        match operation.await {
            Ok(value) => {
                for key in invalidates {
                    self.cache.invalidate(key);
                }
                Ok(value)
            }
            Err(err) => {
                tracing::warn!("Mutation failed: {}", err);
                if err.is_unauthorized() {
                    if let Some(auth) = &self.auth {
                        auth.expire();
                    }
                }
                Err(err)
            }
        }
    }

    /// Create a record and refresh its collection.
    pub async fn create<D: Draft>(&self, client: &ApiClient, draft: &D) -> Result<Record<D>, ClientError> {
        self.mutate(client.create(draft), &[D::COLLECTION.query_key()])
            .await
    }

    /// Update a record and refresh its collection.
    pub async fn update<D: Draft>(
        &self,
        client: &ApiClient,
        id: &str,
        draft: &D,
    ) -> Result<Record<D>, ClientError> {
        self.mutate(client.update(id, draft), &[D::COLLECTION.query_key()])
            .await
    }

    /// Delete a record and refresh its collection.
    pub async fn delete<D: Draft>(&self, client: &ApiClient, id: &str) -> Result<(), ClientError> {
        self.mutate(
            client.delete(D::COLLECTION, id),
            &[D::COLLECTION.query_key()],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    use serde_json::json;
    use tokio::task::LocalSet;

    use crate::query::fetcher;

    #[tokio::test]
    async fn test_success_invalidates_keys() {
        LocalSet::new()
            .run_until(async {
                let cache = QueryClient::new();
                let executor = MutationExecutor::new(cache.clone());
                let key = QueryKey::new(["activity"]);
                let calls = Rc::new(Cell::new(0));
                let counter = calls.clone();
                let fetch = fetcher(move || {
                    counter.set(counter.get() + 1);
                    async { Ok(json!([])) }
                });

                let mut subscription = cache.subscribe(&key);
                cache.query(&key, fetch);
                subscription.settled().await;

                let result = executor
                    .mutate(async { Ok::<_, ClientError>(7) }, &[key.clone()])
                    .await;
                assert_eq!(result, Ok(7));
                subscription.settled().await;
                assert_eq!(calls.get(), 2);
            })
            .await;
    }

    #[tokio::test]
    async fn test_failure_does_not_invalidate() {
        LocalSet::new()
            .run_until(async {
                let cache = QueryClient::new();
                let executor = MutationExecutor::new(cache.clone());
                let key = QueryKey::new(["activity"]);

                let subscription = cache.subscribe(&key);
                cache
                    .fetch(&key, fetcher(|| async { Ok(json!(["a"])) }))
                    .await
                    .unwrap();

                let err = ClientError::Network {
                    status: Some(500),
                    message: "write failed".to_string(),
                };
                let result = executor
                    .mutate(async { Err::<(), _>(err.clone()) }, &[key.clone()])
                    .await;

                assert_eq!(result, Err(err));
                let state = subscription.state();
                assert!(!state.is_stale);
                assert!(!state.is_fetching);
            })
            .await;
    }
}
