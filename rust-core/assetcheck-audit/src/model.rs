// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Audit log records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuditError;
use crate::proposal::ProposedChanges;

/// Review state of an audit log.
///
/// `Pending` is the only state with outgoing transitions; the two terminal
/// states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub const ALL: [ReviewStatus; 3] = [
        ReviewStatus::Pending,
        ReviewStatus::Approved,
        ReviewStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(self) -> bool {
        self != ReviewStatus::Pending
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReviewStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AuditError::Validation(format!("unknown review status: {}", s)))
    }
}

/// Pointer to an evidence image held by an [`crate::EvidenceStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceRef {
    pub id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
}

/// One proposed-change submission for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: Uuid,
    /// The asset the changes are proposed for
    pub asset_id: String,
    /// Submitting auditor
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub review_status: ReviewStatus,
    /// Field name to new value; never holds empty strings or nulls
    pub proposed_changes: ProposedChanges,
    pub auditor_remark: String,
    /// Set iff `review_status` is `Rejected`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_remark: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_asset_image: Option<EvidenceRef>,
    #[serde(default)]
    pub audit_images: Vec<EvidenceRef>,
    /// Set together with `reviewed_at` by the review transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl AuditLog {
    /// A fresh `pending` log with no evidence attached.
    pub fn new(
        asset_id: impl Into<String>,
        created_by: impl Into<String>,
        proposed_changes: ProposedChanges,
        auditor_remark: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            asset_id: asset_id.into(),
            created_by: created_by.into(),
            created_at: Utc::now(),
            review_status: ReviewStatus::Pending,
            proposed_changes,
            auditor_remark: auditor_remark.into(),
            rejected_remark: None,
            current_asset_image: None,
            audit_images: Vec::new(),
            reviewed_by: None,
            reviewed_at: None,
        }
    }

    pub fn with_evidence(mut self, current: Option<EvidenceRef>, audit: Vec<EvidenceRef>) -> Self {
        self.current_asset_image = current;
        self.audit_images = audit;
        self
    }

    pub fn is_pending(&self) -> bool {
        self.review_status == ReviewStatus::Pending
    }

    /// The proposed changes, but only once an administrator approved them.
    ///
    /// Applying them to the asset record is left to whoever observes the
    /// approval.
    pub fn approved_changes(&self) -> Option<&ProposedChanges> {
        match self.review_status {
            ReviewStatus::Approved => Some(&self.proposed_changes),
            _ => None,
        }
    }

    /// Every evidence reference on this log.
    pub fn evidence(&self) -> impl Iterator<Item = &EvidenceRef> {
        self.current_asset_image.iter().chain(self.audit_images.iter())
    }
}

/// Per-status totals for dashboards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub total: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: ReviewStatus) {
        match status {
            ReviewStatus::Pending => self.pending += 1,
            ReviewStatus::Approved => self.approved += 1,
            ReviewStatus::Rejected => self.rejected += 1,
        }
        self.total += 1;
    }

    pub fn get(&self, status: ReviewStatus) -> usize {
        match status {
            ReviewStatus::Pending => self.pending,
            ReviewStatus::Approved => self.approved,
            ReviewStatus::Rejected => self.rejected,
        }
    }
}
