// SPDX-License-Identifier: PMPL-1.0-or-later
//! Evidence blob storage.
//!
//! Evidence images are opaque to the audit workflow: they are written once
//! at submission and referenced from the log by [`EvidenceRef`].

use assetcheck_storage::{StorageBackend, StorageError};
use async_trait::async_trait;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::model::EvidenceRef;
use crate::proposal::EvidenceImage;

#[async_trait]
pub trait EvidenceStore: Send + Sync {
    /// Persist `image` and return a reference to it.
    async fn store(&self, image: &EvidenceImage) -> Result<EvidenceRef, StorageError>;

    async fn load(&self, id: Uuid) -> Result<Option<Vec<u8>>, StorageError>;

    /// Remove a blob. Returns whether it existed.
    async fn remove(&self, id: Uuid) -> Result<bool, StorageError>;
}

/// [`EvidenceStore`] writing raw bytes to a [`StorageBackend`] under
/// `evidence:{id}`.
#[derive(Debug, Clone)]
pub struct BackendEvidenceStore<B: StorageBackend> {
    backend: B,
}

impl<B: StorageBackend> BackendEvidenceStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    fn key(id: Uuid) -> Vec<u8> {
        format!("evidence:{}", id).into_bytes()
    }
}

#[async_trait]
impl<B: StorageBackend> EvidenceStore for BackendEvidenceStore<B> {
    #[instrument(skip(self, image), fields(file = %image.file_name, size = image.bytes.len()))]
    async fn store(&self, image: &EvidenceImage) -> Result<EvidenceRef, StorageError> {
        let id = Uuid::new_v4();
        self.backend.put(&Self::key(id), &image.bytes).await?;
        debug!(evidence_id = %id, backend = self.backend.name(), "Evidence stored");

        Ok(EvidenceRef {
            id,
            file_name: image.file_name.clone(),
            content_type: image.content_type.clone(),
            size: image.bytes.len() as u64,
        })
    }

    async fn load(&self, id: Uuid) -> Result<Option<Vec<u8>>, StorageError> {
        self.backend.get(&Self::key(id)).await
    }

    async fn remove(&self, id: Uuid) -> Result<bool, StorageError> {
        self.backend.delete(&Self::key(id)).await
    }
}
