// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Typed storage wrapper.
//
// JSON-encodes values and prefixes every key with `"{namespace}:"` so that
// audit logs, permission sets and evidence can share one physical backend.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::backend::StorageBackend;
use crate::error::StorageError;

/// A namespaced, JSON-encoded view over a [`StorageBackend`].
///
/// ```rust
/// use assetcheck_storage::{InMemoryBackend, TypedStore};
///
/// # tokio_test::block_on(async {
/// let store = TypedStore::new(InMemoryBackend::new(), "users");
/// store.put("u1", &vec!["dashboard:view"]).await.unwrap();
/// let grants: Vec<String> = store.get("u1").await.unwrap().unwrap();
/// assert_eq!(grants, vec!["dashboard:view".to_string()]);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct TypedStore<B: StorageBackend> {
    backend: B,
    namespace: String,
}

impl<B: StorageBackend> TypedStore<B> {
    /// Wrap `backend`, prefixing keys with `"{namespace}:"`.
    pub fn new(backend: B, namespace: &str) -> Self {
        Self {
            backend,
            namespace: namespace.to_string(),
        }
    }

    fn prefixed_key(&self, key: &str) -> Vec<u8> {
        format!("{}:{}", self.namespace, key).into_bytes()
    }

    fn encode<T: Serialize>(key: &str, value: &T) -> Result<Vec<u8>, StorageError> {
        serde_json::to_vec(value).map_err(|err| {
            StorageError::Serialization(format!("failed to serialize value for key '{}': {}", key, err))
        })
    }

    fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<T, StorageError> {
        serde_json::from_slice(bytes).map_err(|err| {
            StorageError::Serialization(format!(
                "failed to deserialize value for key '{}': {}",
                key, err
            ))
        })
    }

    /// Fetch and decode the value under `key`, or `Ok(None)` if absent.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.backend.get(&self.prefixed_key(key)).await? {
            Some(bytes) => Self::decode(key, &bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Encode and store `value` under `key`.
    pub async fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let bytes = Self::encode(key, value)?;
        self.backend.put(&self.prefixed_key(key), &bytes).await
    }

    /// Store `value` only if `key` is not yet present. Returns whether the
    /// value was written.
    pub async fn insert_new<T: Serialize>(&self, key: &str, value: &T) -> Result<bool, StorageError> {
        let bytes = Self::encode(key, value)?;
        self.backend
            .compare_and_swap(&self.prefixed_key(key), None, &bytes)
            .await
    }

    /// Replace the value under `key` with `new` only if the stored value is
    /// still `expected`.
    ///
    /// `expected` must be the value previously read through this store: the
    /// comparison is made on the JSON encoding, which is deterministic for a
    /// given value of a given type.
    pub async fn compare_and_swap<T: Serialize>(
        &self,
        key: &str,
        expected: &T,
        new: &T,
    ) -> Result<bool, StorageError> {
        let expected = Self::encode(key, expected)?;
        let new = Self::encode(key, new)?;
        self.backend
            .compare_and_swap(&self.prefixed_key(key), Some(expected.as_slice()), &new)
            .await
    }

    pub async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        self.backend.delete(&self.prefixed_key(key)).await
    }

    pub async fn contains(&self, key: &str) -> Result<bool, StorageError> {
        self.backend.exists(&self.prefixed_key(key)).await
    }

    /// Decode every entry of this namespace whose logical key starts with
    /// `key_prefix`, up to `limit` entries, in key order.
    pub async fn scan_prefix<T: DeserializeOwned>(
        &self,
        key_prefix: &str,
        limit: usize,
    ) -> Result<Vec<(String, T)>, StorageError> {
        let ns_len = self.namespace.len() + 1;
        let raw = self
            .backend
            .scan_prefix(&self.prefixed_key(key_prefix), limit)
            .await?;

        raw.into_iter()
            .map(|(raw_key, raw_value)| {
                let logical_key = String::from_utf8_lossy(raw_key.get(ns_len..).unwrap_or(&raw_key[..]))
                    .into_owned();
                let value = Self::decode(&logical_key, &raw_value)?;
                Ok((logical_key, value))
            })
            .collect()
    }

    /// Decode every entry in this namespace.
    pub async fn values<T: DeserializeOwned>(&self) -> Result<Vec<T>, StorageError> {
        Ok(self
            .scan_prefix("", usize::MAX)
            .await?
            .into_iter()
            .map(|(_, value)| value)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBackend;
    use serde::Deserialize;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Ticket {
        status: String,
        remark: Option<String>,
    }

    fn pending() -> Ticket {
        Ticket {
            status: "pending".to_string(),
            remark: None,
        }
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = TypedStore::new(InMemoryBackend::new(), "tickets");
        store.put("t1", &pending()).await.unwrap();

        let back: Ticket = store.get("t1").await.unwrap().unwrap();
        assert_eq!(back, pending());
        assert!(store.contains("t1").await.unwrap());
        assert!(store.get::<Ticket>("t2").await.unwrap().is_none());

        assert!(store.delete("t1").await.unwrap());
        assert!(!store.contains("t1").await.unwrap());
    }

    #[tokio::test]
    async fn test_namespaces_do_not_collide() {
        let backend = InMemoryBackend::new();
        let logs = TypedStore::new(backend.clone(), "audit_logs");
        let perms = TypedStore::new(backend.clone(), "permissions");

        logs.put("k", &1u32).await.unwrap();
        perms.put("k", &2u32).await.unwrap();

        assert_eq!(logs.get::<u32>("k").await.unwrap(), Some(1));
        assert_eq!(perms.get::<u32>("k").await.unwrap(), Some(2));
        assert_eq!(logs.values::<u32>().await.unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_compare_and_swap_against_read_value() {
        let store = TypedStore::new(InMemoryBackend::new(), "tickets");
        store.put("t1", &pending()).await.unwrap();

        let read: Ticket = store.get("t1").await.unwrap().unwrap();
        let approved = Ticket {
            status: "approved".to_string(),
            remark: None,
        };
        let rejected = Ticket {
            status: "rejected".to_string(),
            remark: Some("blurry photo".to_string()),
        };

        assert!(store.compare_and_swap("t1", &read, &approved).await.unwrap());
        // Second writer still holds the stale pending value.
        assert!(!store.compare_and_swap("t1", &read, &rejected).await.unwrap());
        assert_eq!(store.get::<Ticket>("t1").await.unwrap(), Some(approved));
    }

    #[tokio::test]
    async fn test_insert_new_refuses_overwrite() {
        let store = TypedStore::new(InMemoryBackend::new(), "tickets");
        assert!(store.insert_new("t1", &pending()).await.unwrap());
        assert!(!store.insert_new("t1", &pending()).await.unwrap());
    }

    #[tokio::test]
    async fn test_scan_prefix_strips_namespace() {
        let store = TypedStore::new(InMemoryBackend::new(), "items");
        store.put("asset:1", &10u32).await.unwrap();
        store.put("asset:2", &20u32).await.unwrap();
        store.put("user:1", &30u32).await.unwrap();

        let assets: Vec<(String, u32)> = store.scan_prefix("asset:", 10).await.unwrap();
        assert_eq!(
            assets,
            vec![("asset:1".to_string(), 10), ("asset:2".to_string(), 20)]
        );
    }

    #[tokio::test]
    async fn test_decode_error_is_reported() {
        let backend = InMemoryBackend::new();
        backend.put(b"bad:broken", b"not json").await.unwrap();
        let store = TypedStore::new(backend, "bad");

        match store.get::<Ticket>("broken").await {
            Err(StorageError::Serialization(msg)) => assert!(msg.contains("broken")),
            other => panic!("expected serialization error, got {:?}", other),
        }
    }
}
