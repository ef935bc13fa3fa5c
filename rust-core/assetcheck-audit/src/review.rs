// SPDX-License-Identifier: PMPL-1.0-or-later
//! Review state machine.
//!
//! ```text
//! pending --approve--> approved
//! pending --reject(remark)--> rejected
//! ```
//!
//! Both terminal states are final. The functions here only compute the next
//! record; persisting it atomically is the repository's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuditError;
use crate::model::{AuditLog, ReviewStatus};

/// An administrator's verdict, in the shape the review endpoint accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reviewStatus", rename_all = "lowercase")]
pub enum ReviewDecision {
    Approved,
    Rejected {
        #[serde(rename = "rejectedRemark", default)]
        rejected_remark: String,
    },
}

impl ReviewDecision {
    pub fn target(&self) -> ReviewStatus {
        match self {
            ReviewDecision::Approved => ReviewStatus::Approved,
            ReviewDecision::Rejected { .. } => ReviewStatus::Rejected,
        }
    }
}

fn ensure_pending(log: &AuditLog) -> Result<(), AuditError> {
    if log.is_pending() {
        Ok(())
    } else {
        Err(AuditError::InvalidTransition {
            id: log.id,
            status: log.review_status,
        })
    }
}

pub fn approve(log: &AuditLog, reviewer: &str, at: DateTime<Utc>) -> Result<AuditLog, AuditError> {
    ensure_pending(log)?;
    Ok(AuditLog {
        review_status: ReviewStatus::Approved,
        reviewed_by: Some(reviewer.to_string()),
        reviewed_at: Some(at),
        ..log.clone()
    })
}

/// Reject with a remark. A blank remark is refused before the state is
/// checked. The stored remark is trimmed.
pub fn reject(
    log: &AuditLog,
    remark: &str,
    reviewer: &str,
    at: DateTime<Utc>,
) -> Result<AuditLog, AuditError> {
    let remark = remark.trim();
    if remark.is_empty() {
        return Err(AuditError::validation("rejectedRemark is required when rejecting"));
    }
    ensure_pending(log)?;
    Ok(AuditLog {
        review_status: ReviewStatus::Rejected,
        rejected_remark: Some(remark.to_string()),
        reviewed_by: Some(reviewer.to_string()),
        reviewed_at: Some(at),
        ..log.clone()
    })
}

pub fn apply(
    log: &AuditLog,
    decision: &ReviewDecision,
    reviewer: &str,
    at: DateTime<Utc>,
) -> Result<AuditLog, AuditError> {
    match decision {
        ReviewDecision::Approved => approve(log, reviewer, at),
        ReviewDecision::Rejected { rejected_remark } => reject(log, rejected_remark, reviewer, at),
    }
}
