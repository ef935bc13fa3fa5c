// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// AssetCheck storage layer.
//
// Audit logs, permission sets and evidence blobs all live behind the
// `StorageBackend` trait. The review workflow relies on one primitive in
// particular: `compare_and_swap`, which every backend must apply atomically
// so that two reviewers racing on the same audit log cannot both win.
//
// # Modules
//
// - [`backend`] -- the `StorageBackend` trait and the shared-handle impl.
// - [`error`] -- `StorageError`.
// - [`memory`] -- `BTreeMap` backend for tests and single-node runs.
// - [`typed`] -- JSON values under a namespace prefix.
// - [`redb_backend`] -- persistent backend (feature `redb-backend`).
//
// # Example
//
// ```rust
// use assetcheck_storage::{InMemoryBackend, TypedStore};
//
// # tokio_test::block_on(async {
// let store = TypedStore::new(InMemoryBackend::new(), "audit_logs");
// store.put("log-1", &"pending".to_string()).await.unwrap();
//
// let swapped = store
//     .compare_and_swap("log-1", &"pending".to_string(), &"approved".to_string())
//     .await
//     .unwrap();
// assert!(swapped);
// # });
// ```

pub mod backend;
pub mod error;
pub mod memory;
pub mod typed;

#[cfg(feature = "redb-backend")]
pub mod redb_backend;

pub use backend::{SharedBackend, StorageBackend};
pub use error::StorageError;
pub use memory::InMemoryBackend;
pub use typed::TypedStore;

#[cfg(feature = "redb-backend")]
pub use redb_backend::RedbBackend;
