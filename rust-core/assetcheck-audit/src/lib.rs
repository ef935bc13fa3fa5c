// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! AssetCheck content audit.
//!
//! An auditor who does not own an asset proposes changes to its record and
//! attaches photo evidence; an administrator approves or rejects the
//! proposal.
//!
//! # Architecture
//!
//! - **proposal**: sanitizes the auditor's form into an
//!   [`AuditSubmissionPayload`] (blank fields dropped, `year` reduced to an
//!   integer, evidence checked against [`ProposalLimits`]).
//! - **review**: the `pending -> approved | rejected` state machine.
//! - **repository**: persists [`AuditLog`]s and applies reviews with
//!   compare-and-swap so concurrent reviewers cannot both win.
//! - **evidence**: the [`EvidenceStore`] seam for image blobs.
//! - **service**: [`AuditService`], the entry point used by the API.
//!
//! Approval records the decision only. Merging `proposedChanges` into the
//! asset is up to whoever consumes approved logs, via
//! [`AuditLog::approved_changes`].

pub mod error;
pub mod evidence;
pub mod model;
pub mod proposal;
pub mod repository;
pub mod review;
pub mod service;

pub use error::AuditError;
pub use evidence::{BackendEvidenceStore, EvidenceStore};
pub use model::{AuditLog, EvidenceRef, ReviewStatus, StatusCounts};
pub use proposal::{
    build_proposal, normalize_year, AuditSubmissionPayload, EvidenceImage, ProposalDraft,
    ProposalLimits, ProposedChanges, SubmittedEvidence, DEFAULT_MAX_IMAGE_BYTES, MAX_AUDIT_IMAGES,
};
pub use repository::{AuditLogRepository, AuditPage, AuditQuery, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use review::{approve, apply as apply_review, reject, ReviewDecision};
pub use service::AuditService;
