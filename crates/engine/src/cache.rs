//! Shared reference data (area offices, feeders, roles, ...).
//!
//! One [`ReferenceCache`] is created by the composition root and handed to
//! every screen that needs dropdown options, so each kind is fetched once
//! until it is explicitly cleared.
use std::{collections::HashMap, sync::Arc};

use api_types::reference::{ReferenceKind, ReferenceOption};
use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::RemoteError;

#[async_trait]
pub trait ReferenceSource: Send + Sync {
    async fn references(&self, kind: ReferenceKind) -> Result<Vec<ReferenceOption>, RemoteError>;
}

#[derive(Debug, Default, Clone)]
pub struct ReferenceCache {
    entries: Arc<RwLock<HashMap<ReferenceKind, Arc<Vec<ReferenceOption>>>>>,
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: ReferenceKind) -> Option<Arc<Vec<ReferenceOption>>> {
        self.entries.read().get(&kind).cloned()
    }

    /// Cached options for `kind`, loading them on first use.
    ///
    /// Failures are returned and not cached.
    pub async fn get_or_fetch(
        &self,
        kind: ReferenceKind,
        source: &dyn ReferenceSource,
    ) -> Result<Arc<Vec<ReferenceOption>>, RemoteError> {
        if let Some(options) = self.get(kind) {
            return Ok(options);
        }

        let options = Arc::new(source.references(kind).await?);
        tracing::debug!(?kind, count = options.len(), "reference data loaded");

        let mut entries = self.entries.write();
        // A concurrent load may have landed first; keep the existing entry.
        let entry = entries.entry(kind).or_insert(options);
        Ok(Arc::clone(entry))
    }

    /// Name of option `id`, when `kind` is cached.
    pub fn label(&self, kind: ReferenceKind, id: i64) -> Option<String> {
        self.get(kind)?
            .iter()
            .find(|option| option.id == id)
            .map(|option| option.name.clone())
    }

    pub fn clear(&self, kind: ReferenceKind) {
        self.entries.write().remove(&kind);
    }

    pub fn clear_all(&self) {
        self.entries.write().clear();
    }
}
