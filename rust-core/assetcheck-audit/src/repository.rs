// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Audit log persistence and queries.
//!
//! Reviews are written with [`TypedStore::compare_and_swap`] against the
//! record that was read, so of two reviewers racing on one pending log only
//! the first write lands. The loser gets [`AuditError::InvalidTransition`]
//! carrying the status it lost to; nothing is retried.

use assetcheck_storage::{StorageBackend, TypedStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::AuditError;
use crate::model::{AuditLog, ReviewStatus, StatusCounts};
use crate::review::{self, ReviewDecision};

const NAMESPACE: &str = "audit_logs";

/// Default page size for [`AuditQuery`].
pub const DEFAULT_PAGE_SIZE: usize = 50;
/// Largest page a caller may ask for.
pub const MAX_PAGE_SIZE: usize = 500;

/// Listing filter. Results come back newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    #[serde(default)]
    pub status: Option<ReviewStatus>,
    #[serde(default)]
    pub asset_id: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

impl AuditQuery {
    pub fn with_status(status: ReviewStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    fn matches(&self, log: &AuditLog) -> bool {
        self.status.map_or(true, |s| log.review_status == s)
            && self.asset_id.as_deref().map_or(true, |id| log.asset_id == id)
    }

    fn page_size(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE)
    }
}

/// One page of a listing plus the number of logs matching the filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditPage {
    pub total: usize,
    pub logs: Vec<AuditLog>,
}

#[derive(Debug, Clone)]
pub struct AuditLogRepository<B: StorageBackend> {
    logs: TypedStore<B>,
}

impl<B: StorageBackend> AuditLogRepository<B> {
    pub fn new(backend: B) -> Self {
        Self {
            logs: TypedStore::new(backend, NAMESPACE),
        }
    }

    /// Persist a new log. Fails if a log with the same id already exists.
    #[instrument(skip(self, log), fields(id = %log.id, asset_id = %log.asset_id))]
    pub async fn create(&self, log: &AuditLog) -> Result<(), AuditError> {
        if !log.is_pending() {
            return Err(AuditError::Validation(format!(
                "new audit logs must be pending, got {}",
                log.review_status
            )));
        }
        if !self.logs.insert_new(&log.id.to_string(), log).await? {
            return Err(AuditError::Validation(format!("audit log {} already exists", log.id)));
        }
        debug!("Audit log created");
        Ok(())
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<AuditLog>, AuditError> {
        Ok(self.logs.get(&id.to_string()).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<AuditLog, AuditError> {
        self.find(id)
            .await?
            .ok_or_else(|| AuditError::NotFound(format!("audit log {}", id)))
    }

    /// Apply a review decision atomically.
    ///
    /// Validation and state errors from the state machine come back as-is.
    /// If the stored record changed between read and write, the current
    /// status is reported as an invalid transition.
    #[instrument(skip(self, decision), fields(target = %decision.target()))]
    pub async fn review(
        &self,
        id: Uuid,
        decision: &ReviewDecision,
        reviewer: &str,
        at: DateTime<Utc>,
    ) -> Result<AuditLog, AuditError> {
        let key = id.to_string();
        let current = self.get(id).await?;
        let next = review::apply(&current, decision, reviewer, at)?;

        if self.logs.compare_and_swap(&key, &current, &next).await? {
            info!(
                id = %id,
                reviewer = %reviewer,
                status = %next.review_status,
                "Audit log reviewed"
            );
            return Ok(next);
        }

        let status = self.get(id).await?.review_status;
        warn!(
            id = %id,
            reviewer = %reviewer,
            status = %status,
            "Review lost to a concurrent write"
        );
        Err(AuditError::InvalidTransition { id, status })
    }

    async fn all(&self) -> Result<Vec<AuditLog>, AuditError> {
        Ok(self.logs.values().await?)
    }

    pub async fn list(&self, query: &AuditQuery) -> Result<AuditPage, AuditError> {
        let mut matching: Vec<AuditLog> = self
            .all()
            .await?
            .into_iter()
            .filter(|log| query.matches(log))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        let total = matching.len();
        let logs = matching
            .into_iter()
            .skip(query.offset)
            .take(query.page_size())
            .collect();
        Ok(AuditPage { total, logs })
    }

    /// Number of logs in `status`, or of all logs for `None`.
    pub async fn count(&self, status: Option<ReviewStatus>) -> Result<usize, AuditError> {
        let counts = self.status_counts().await?;
        Ok(status.map_or(counts.total, |s| counts.get(s)))
    }

    pub async fn status_counts(&self) -> Result<StatusCounts, AuditError> {
        let mut counts = StatusCounts::default();
        for log in self.all().await? {
            counts.record(log.review_status);
        }
        Ok(counts)
    }
}
