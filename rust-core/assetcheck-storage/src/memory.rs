// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory storage backend.
//
// A `BTreeMap` behind a tokio `RwLock`. Ordered keys give prefix scans for
// free; holding the write guard across compare and insert makes
// `compare_and_swap` atomic.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::backend::StorageBackend;
use crate::error::StorageError;

/// An in-memory backend. Clones share the same map.
///
/// # Example
///
/// ```rust
/// use assetcheck_storage::memory::InMemoryBackend;
/// use assetcheck_storage::backend::StorageBackend;
///
/// # tokio_test::block_on(async {
/// let store = InMemoryBackend::new();
/// store.put(b"user:42", b"{}").await.unwrap();
/// assert!(!store.compare_and_swap(b"user:42", None, b"[]").await.unwrap());
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    data: Arc<RwLock<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl InMemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    /// True when no keys are stored.
    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }
}

#[async_trait]
impl StorageBackend for InMemoryBackend {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.data.write().await.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> Result<bool, StorageError> {
        Ok(self.data.write().await.remove(key).is_some())
    }

    async fn exists(&self, key: &[u8]) -> Result<bool, StorageError> {
        Ok(self.data.read().await.contains_key(key))
    }

    async fn scan_prefix(
        &self,
        prefix: &[u8],
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        let map = self.data.read().await;
        Ok(map
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .take(limit)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        new: &[u8],
    ) -> Result<bool, StorageError> {
        let mut map = self.data.write().await;
        let current = map.get(key).map(Vec::as_slice);
        if current != expected {
            debug!(key = %String::from_utf8_lossy(key), "compare-and-swap precondition failed");
            return Ok(false);
        }
        map.insert(key.to_vec(), new.to_vec());
        Ok(true)
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
