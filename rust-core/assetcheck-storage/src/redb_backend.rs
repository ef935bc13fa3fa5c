// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>
//
// redb-backed persistent storage backend.
//
// One database file, one table of byte keys to byte values. Reads use read
// transactions; every mutation, including the compare-and-swap used by the
// review workflow, runs inside a single write transaction. redb serialises
// write transactions, so the read-compare-write of `compare_and_swap` cannot
// interleave with another writer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use tracing::debug;

use crate::backend::StorageBackend;
use crate::error::StorageError;

const MAIN_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("main");

/// A persistent backend stored in a single redb file.
///
/// ```rust,no_run
/// use assetcheck_storage::redb_backend::RedbBackend;
/// use assetcheck_storage::backend::StorageBackend;
///
/// # tokio_test::block_on(async {
/// let store = RedbBackend::open("/var/lib/assetcheck/store.redb").unwrap();
/// store.put(b"permissions:u1", b"[]").await.unwrap();
/// # });
/// ```
pub struct RedbBackend {
    db: Arc<Database>,
    path: PathBuf,
}

impl RedbBackend {
    /// Open or create the database at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(&path).map_err(|e| {
            StorageError::BackendUnavailable(format!("failed to open redb at {}: {}", path.display(), e))
        })?;

        debug!(path = %path.display(), "opened redb backend");

        Ok(Self {
            db: Arc::new(db),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` on the blocking pool with a handle to the database.
    async fn blocking<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T, StorageError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| StorageError::BackendUnavailable(format!("task join: {e}")))?
    }
}

impl std::fmt::Debug for RedbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbBackend")
            .field("path", &self.path)
            .finish()
    }
}

fn unavailable(context: &'static str) -> impl Fn(redb::Error) -> StorageError {
    move |e| StorageError::BackendUnavailable(format!("{context}: {e}"))
}

fn corrupted(context: &'static str) -> impl Fn(redb::Error) -> StorageError {
    move |e| StorageError::CorruptedData(format!("{context}: {e}"))
}

/// Read one key in a fresh read transaction. A missing table means nothing
/// has been written yet.
fn read_value(db: &Database, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
    let txn = db.begin_read().map_err(|e| unavailable("read txn")(e.into()))?;
    let table = match txn.open_table(MAIN_TABLE) {
        Ok(t) => t,
        Err(_) => return Ok(None),
    };
    let value = table.get(key).map_err(|e| corrupted("get")(e.into()))?;
    Ok(value.map(|v| v.value().to_vec()))
}

#[async_trait]
impl StorageBackend for RedbBackend {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let key = key.to_vec();
        self.blocking(move |db| read_value(db, &key)).await
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let key = key.to_vec();
        let value = value.to_vec();
        self.blocking(move |db| {
            let txn = db.begin_write().map_err(|e| unavailable("write txn")(e.into()))?;
            {
                let mut table = txn
                    .open_table(MAIN_TABLE)
                    .map_err(|e| unavailable("open table")(e.into()))?;
                table
                    .insert(key.as_slice(), value.as_slice())
                    .map_err(|e| corrupted("insert")(e.into()))?;
            }
            txn.commit().map_err(|e| corrupted("commit")(e.into()))
        })
        .await
    }

    async fn delete(&self, key: &[u8]) -> Result<bool, StorageError> {
        let key = key.to_vec();
        self.blocking(move |db| {
            let txn = db.begin_write().map_err(|e| unavailable("write txn")(e.into()))?;
            let existed = {
                let mut table = txn
                    .open_table(MAIN_TABLE)
                    .map_err(|e| unavailable("open table")(e.into()))?;
                let removed = table
                    .remove(key.as_slice())
                    .map_err(|e| corrupted("remove")(e.into()))?;
                removed.is_some()
            };
            txn.commit().map_err(|e| corrupted("commit")(e.into()))?;
            Ok(existed)
        })
        .await
    }

    async fn exists(&self, key: &[u8]) -> Result<bool, StorageError> {
        Ok(self.get(key).await?.is_some())
    }

    async fn scan_prefix(
        &self,
        prefix: &[u8],
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        let prefix = prefix.to_vec();
        self.blocking(move |db| {
            let txn = db.begin_read().map_err(|e| unavailable("read txn")(e.into()))?;
            let table = match txn.open_table(MAIN_TABLE) {
                Ok(t) => t,
                Err(_) => return Ok(Vec::new()),
            };

            let mut results = Vec::new();
            let iter = table
                .range(prefix.as_slice()..)
                .map_err(|e| corrupted("range scan")(e.into()))?;
            for entry in iter {
                if results.len() >= limit {
                    break;
                }
                let (k, v) = entry.map_err(|e| corrupted("scan entry")(e.into()))?;
                let k = k.value().to_vec();
                if !k.starts_with(&prefix) {
                    break;
                }
                results.push((k, v.value().to_vec()));
            }
            Ok(results)
        })
        .await
    }

    async fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        new: &[u8],
    ) -> Result<bool, StorageError> {
        let key = key.to_vec();
        let expected = expected.map(<[u8]>::to_vec);
        let new = new.to_vec();
        self.blocking(move |db| {
            let txn = db.begin_write().map_err(|e| unavailable("write txn")(e.into()))?;
            let swapped = {
                let mut table = txn
                    .open_table(MAIN_TABLE)
                    .map_err(|e| unavailable("open table")(e.into()))?;
                let current = table
                    .get(key.as_slice())
                    .map_err(|e| corrupted("get")(e.into()))?
                    .map(|v| v.value().to_vec());
                if current == expected {
                    table
                        .insert(key.as_slice(), new.as_slice())
                        .map_err(|e| corrupted("insert")(e.into()))?;
                    true
                } else {
                    false
                }
            };
            if swapped {
                txn.commit().map_err(|e| corrupted("commit")(e.into()))?;
            } else {
                txn.abort().map_err(|e| corrupted("abort")(e.into()))?;
                debug!(key = %String::from_utf8_lossy(&key), "compare-and-swap precondition failed");
            }
            Ok(swapped)
        })
        .await
    }

    fn name(&self) -> &str {
        "redb"
    }
}
