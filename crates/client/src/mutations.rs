use api_types::mutation::MutationResponse;
use async_trait::async_trait;
use engine::{MutationSink, RemoteError};
use reqwest::Method;
use serde::{Serialize, de::DeserializeOwned};

use crate::{api::ApiClient, error::Result};

impl ApiClient {
    pub async fn create_entity<B, T>(&self, path: &str, body: &B) -> Result<MutationResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::POST, path, body).await
    }

    /// `PUT {path}/{id}`.
    pub async fn update_entity<B, T>(
        &self,
        path: &str,
        id: i64,
        body: &B,
    ) -> Result<MutationResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let path = format!("{}/{id}", path.trim_end_matches('/'));
        self.send_json(Method::PUT, &path, body).await
    }

    /// `DELETE {path}/{id}`.
    pub async fn delete_entity(
        &self,
        path: &str,
        id: i64,
    ) -> Result<MutationResponse<serde_json::Value>> {
        let path = format!("{}/{id}", path.trim_end_matches('/'));
        self.send_empty(Method::DELETE, &path).await
    }
}

#[async_trait]
impl MutationSink for ApiClient {
    async fn create(
        &self,
        endpoint: &str,
        body: serde_json::Value,
    ) -> std::result::Result<MutationResponse<serde_json::Value>, RemoteError> {
        Ok(self.create_entity(endpoint, &body).await?)
    }

    async fn update(
        &self,
        endpoint: &str,
        id: i64,
        body: serde_json::Value,
    ) -> std::result::Result<MutationResponse<serde_json::Value>, RemoteError> {
        Ok(self.update_entity(endpoint, id, &body).await?)
    }

    async fn delete(
        &self,
        endpoint: &str,
        id: i64,
    ) -> std::result::Result<MutationResponse<serde_json::Value>, RemoteError> {
        Ok(self.delete_entity(endpoint, id).await?)
    }
}
