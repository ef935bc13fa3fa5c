// SPDX-License-Identifier: PMPL-1.0-or-later
//! Audit workflow errors.

use assetcheck_storage::StorageError;
use thiserror::Error;
use uuid::Uuid;

use crate::model::ReviewStatus;

#[derive(Error, Debug)]
pub enum AuditError {
    /// Missing or malformed input (no asset id, blank rejection remark,
    /// unparseable year, oversized evidence)
    #[error("validation failed: {0}")]
    Validation(String),

    /// The log is no longer pending, either because it was reviewed before
    /// or because a concurrent review won the compare-and-swap
    #[error("audit log {id} is already {status}")]
    InvalidTransition { id: Uuid, status: ReviewStatus },

    #[error("not found: {0}")]
    NotFound(String),

    /// Passed through from the storage layer unmodified
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl AuditError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        AuditError::Validation(msg.into())
    }
}
