use std::marker::PhantomData;

use api_types::page::PageResponse;
use async_trait::async_trait;
use engine::{ListResource, ListSource, Page, Query, RemoteError};
use serde::de::DeserializeOwned;

use crate::{api::ApiClient, error::Result};

impl ApiClient {
    /// `GET {path}?pageNumber&pageSize&…` with the filters the resource declares.
    pub async fn list<T: DeserializeOwned>(
        &self,
        resource: &ListResource,
        query: &Query,
    ) -> Result<PageResponse<T>> {
        let params = resource.manifest.build_params(query);
        self.get_json(resource.path, &params).await
    }
}

/// A list endpoint seen as a [`ListSource`] for the controller.
pub struct RemoteList<T> {
    client: ApiClient,
    resource: ListResource,
    _row: PhantomData<fn() -> T>,
}

impl<T> RemoteList<T> {
    pub fn new(client: ApiClient, resource: ListResource) -> Self {
        Self {
            client,
            resource,
            _row: PhantomData,
        }
    }

    pub fn resource(&self) -> &ListResource {
        &self.resource
    }
}

#[async_trait]
impl<T> ListSource<T> for RemoteList<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn fetch(&self, query: &Query) -> std::result::Result<Page<T>, RemoteError> {
        let res = self.client.list::<T>(&self.resource, query).await?;
        tracing::debug!(
            path = self.resource.path,
            rows = res.data.len(),
            total = res.total_count,
            "list page received"
        );
        Ok(Page::from(res))
    }
}
