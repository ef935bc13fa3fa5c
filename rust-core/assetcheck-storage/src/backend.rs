// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core storage backend trait.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StorageError;

/// A pluggable key-value storage backend.
///
/// Keys and values are opaque bytes; [`crate::typed::TypedStore`] layers JSON
/// encoding and namespacing on top.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Retrieve the value stored under `key`, or `Ok(None)` if absent.
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store `value` under `key`, overwriting any previous value.
    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError>;

    /// Remove `key`. Returns whether it existed.
    async fn delete(&self, key: &[u8]) -> Result<bool, StorageError>;

    /// Check whether `key` is present.
    async fn exists(&self, key: &[u8]) -> Result<bool, StorageError>;

    /// Return up to `limit` entries whose keys start with `prefix`, in
    /// lexicographic key order.
    async fn scan_prefix(
        &self,
        prefix: &[u8],
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError>;

    /// Atomically replace the value under `key` with `new` if and only if
    /// the current value equals `expected` (`None` meaning "absent").
    ///
    /// Returns `Ok(false)` without writing when the precondition fails.
    /// The comparison and the write must not be interleaved with any other
    /// write to the same key.
    async fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        new: &[u8],
    ) -> Result<bool, StorageError>;

    /// A human-readable name for this backend, used in logging.
    fn name(&self) -> &str;
}

/// Type-erased handle used when the backend is chosen at runtime.
pub type SharedBackend = Arc<dyn StorageBackend>;

#[async_trait]
impl<B: StorageBackend + ?Sized> StorageBackend for Arc<B> {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).get(key).await
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        (**self).put(key, value).await
    }

    async fn delete(&self, key: &[u8]) -> Result<bool, StorageError> {
        (**self).delete(key).await
    }

    async fn exists(&self, key: &[u8]) -> Result<bool, StorageError> {
        (**self).exists(key).await
    }

    async fn scan_prefix(
        &self,
        prefix: &[u8],
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        (**self).scan_prefix(prefix, limit).await
    }

    async fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        new: &[u8],
    ) -> Result<bool, StorageError> {
        (**self).compare_and_swap(key, expected, new).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
