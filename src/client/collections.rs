//! Collection endpoints: `GET/POST /api/{collection}`, `GET/PUT/DELETE /api/{collection}/{id}`.

use reqwest::Method;
use serde_json::Value;

use super::ApiClient;
use crate::errors::ClientError;
use crate::models::{Collection, Draft, Record};
use crate::query::{fetcher, Fetcher};

impl ApiClient {
    /// All records of a collection, in insertion order.
    pub async fn list<D: Draft>(&self) -> Result<Vec<Record<D>>, ClientError> {
        self.request(Method::GET, &D::COLLECTION.path(), None).await
    }

    pub async fn get_record<D: Draft>(&self, id: &str) -> Result<Record<D>, ClientError> {
        self.request(Method::GET, &D::COLLECTION.item_path(id), None)
            .await
    }

    pub async fn create<D: Draft>(&self, draft: &D) -> Result<Record<D>, ClientError> {
        let body = serde_json::to_value(draft)?;
        self.request(Method::POST, &D::COLLECTION.path(), Some(&body))
            .await
    }

    /// Replace the editable fields of a record.
    pub async fn update<D: Draft>(&self, id: &str, draft: &D) -> Result<Record<D>, ClientError> {
        let body = serde_json::to_value(draft)?;
        self.request(Method::PUT, &D::COLLECTION.item_path(id), Some(&body))
            .await
    }

    pub async fn delete(&self, collection: Collection, id: &str) -> Result<(), ClientError> {
        self.request(Method::DELETE, &collection.item_path(id), None)
            .await
    }

    /// Untyped listing, as cached by the query cache.
    pub async fn list_raw(&self, collection: Collection) -> Result<Value, ClientError> {
        self.request(Method::GET, &collection.path(), None).await
    }

    /// Query-cache fetcher for a whole collection.
    pub fn collection_fetcher(&self, collection: Collection) -> Fetcher {
        let client = self.clone();
        fetcher(move || {
            let client = client.clone();
            async move { client.list_raw(collection).await }
        })
    }
}
