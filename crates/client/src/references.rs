use api_types::reference::{ReferenceKind, ReferenceOption};
use async_trait::async_trait;
use engine::{ReferenceSource, RemoteError};

use crate::{api::ApiClient, error::Result};

impl ApiClient {
    /// `GET reference/{kind}`.
    pub async fn reference_options(&self, kind: ReferenceKind) -> Result<Vec<ReferenceOption>> {
        let path = format!("reference/{}", kind.path());
        self.get_json(&path, &[]).await
    }
}

#[async_trait]
impl ReferenceSource for ApiClient {
    async fn references(
        &self,
        kind: ReferenceKind,
    ) -> std::result::Result<Vec<ReferenceOption>, RemoteError> {
        Ok(self.reference_options(kind).await?)
    }
}
