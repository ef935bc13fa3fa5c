// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Storage error types.

use thiserror::Error;

/// Errors raised by a storage backend or the typed wrapper.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred in the underlying storage layer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The stored bytes are unreadable by the backend itself.
    #[error("corrupted data: {0}")]
    CorruptedData(String),

    /// The backend cannot serve requests (file lock, closed handle, ...).
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
}
