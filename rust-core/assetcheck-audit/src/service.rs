// SPDX-License-Identifier: PMPL-1.0-or-later
//! Submission and review entry points.
//!
//! [`AuditService`] wires the proposal builder, the evidence store and the
//! repository together. It is what the HTTP layer talks to.

use std::sync::Arc;

use assetcheck_storage::StorageBackend;
use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::AuditError;
use crate::evidence::{BackendEvidenceStore, EvidenceStore};
use crate::model::{AuditLog, EvidenceRef, StatusCounts};
use crate::proposal::{
    build_proposal, AuditSubmissionPayload, ProposalDraft, ProposalLimits, SubmittedEvidence,
};
use crate::repository::{AuditLogRepository, AuditPage, AuditQuery};
use crate::review::ReviewDecision;

pub struct AuditService<B: StorageBackend> {
    repository: AuditLogRepository<B>,
    evidence: Arc<dyn EvidenceStore>,
    limits: ProposalLimits,
}

impl<B: StorageBackend + Clone + 'static> AuditService<B> {
    /// Logs and evidence on the same backend.
    pub fn new(backend: B, limits: ProposalLimits) -> Self {
        let evidence = Arc::new(BackendEvidenceStore::new(backend.clone()));
        Self::with_evidence_store(backend, evidence, limits)
    }
}

impl<B: StorageBackend> AuditService<B> {
    pub fn with_evidence_store(
        backend: B,
        evidence: Arc<dyn EvidenceStore>,
        limits: ProposalLimits,
    ) -> Self {
        Self {
            repository: AuditLogRepository::new(backend),
            evidence,
            limits,
        }
    }

    pub fn evidence_store(&self) -> &Arc<dyn EvidenceStore> {
        &self.evidence
    }

    /// Build, store evidence, and persist a new `pending` log.
    ///
    /// Evidence already written is removed again if a later step fails.
    #[instrument(skip(self, draft, evidence))]
    pub async fn submit(
        &self,
        draft: ProposalDraft,
        evidence: SubmittedEvidence,
        created_by: &str,
    ) -> Result<AuditLog, AuditError> {
        let payload = build_proposal(draft, evidence, &self.limits)?;

        let mut stored: Vec<EvidenceRef> = Vec::with_capacity(payload.evidence.count());
        let result = self.persist(&payload, created_by, &mut stored).await;
        if result.is_err() {
            self.discard(&stored).await;
        }
        result
    }

    async fn persist(
        &self,
        payload: &AuditSubmissionPayload,
        created_by: &str,
        stored: &mut Vec<EvidenceRef>,
    ) -> Result<AuditLog, AuditError> {
        let mut current = None;
        if let Some(image) = &payload.evidence.current_asset_image {
            let reference = self.evidence.store(image).await?;
            stored.push(reference.clone());
            current = Some(reference);
        }

        let mut audit = Vec::with_capacity(payload.evidence.audit_images.len());
        for image in &payload.evidence.audit_images {
            let reference = self.evidence.store(image).await?;
            stored.push(reference.clone());
            audit.push(reference);
        }

        let log = AuditLog::new(
            payload.asset_id.clone(),
            created_by,
            payload.proposed_changes.clone(),
            payload.auditor_remark.clone(),
        )
        .with_evidence(current, audit);

        self.repository.create(&log).await?;
        info!(
            id = %log.id,
            asset_id = %log.asset_id,
            created_by = %created_by,
            fields = log.proposed_changes.len(),
            "Audit log submitted"
        );
        Ok(log)
    }

    async fn discard(&self, stored: &[EvidenceRef]) {
        for reference in stored {
            if let Err(err) = self.evidence.remove(reference.id).await {
                warn!(evidence_id = %reference.id, error = %err, "Failed to remove orphaned evidence");
            }
        }
    }

    pub async fn review(
        &self,
        id: Uuid,
        decision: &ReviewDecision,
        reviewer: &str,
    ) -> Result<AuditLog, AuditError> {
        self.repository.review(id, decision, reviewer, Utc::now()).await
    }

    pub async fn get(&self, id: Uuid) -> Result<AuditLog, AuditError> {
        self.repository.get(id).await
    }

    pub async fn list(&self, query: &AuditQuery) -> Result<AuditPage, AuditError> {
        self.repository.list(query).await
    }

    pub async fn status_counts(&self) -> Result<StatusCounts, AuditError> {
        self.repository.status_counts().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReviewStatus;
    use crate::proposal::EvidenceImage;
    use assetcheck_storage::InMemoryBackend;
    use serde_json::json;

    fn service() -> AuditService<InMemoryBackend> {
        AuditService::new(InMemoryBackend::new(), ProposalLimits::default())
    }

    fn draft(value: serde_json::Value) -> ProposalDraft {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_submit_stores_log_and_evidence() {
        let service = service();
        let evidence = SubmittedEvidence {
            current_asset_image: Some(EvidenceImage::new("now.jpg", "image/jpeg", vec![1, 2, 3])),
            audit_images: vec![EvidenceImage::new("tag.png", "image/png", vec![4, 5])],
        };

        let log = service
            .submit(
                draft(json!({"assetId": "A-9", "auditorRemark": "label faded", "room": "B12", "make": ""})),
                evidence,
                "auditor-3",
            )
            .await
            .unwrap();

        assert_eq!(log.review_status, ReviewStatus::Pending);
        assert_eq!(log.created_by, "auditor-3");
        assert_eq!(log.auditor_remark, "label faded");
        assert_eq!(log.proposed_changes.to_json_string(), r#"{"room":"B12"}"#);
        assert_eq!(log.evidence().count(), 2);

        let current = log.current_asset_image.as_ref().unwrap();
        assert_eq!(
            service.evidence_store().load(current.id).await.unwrap(),
            Some(vec![1, 2, 3])
        );
        assert_eq!(service.get(log.id).await.unwrap(), log);
    }

    #[tokio::test]
    async fn test_invalid_draft_stores_nothing() {
        let service = service();
        let result = service
            .submit(draft(json!({"room": "B12"})), SubmittedEvidence::default(), "auditor")
            .await;
        assert!(matches!(result, Err(AuditError::Validation(_))));
        assert_eq!(service.status_counts().await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_review_through_service() {
        let service = service();
        let log = service
            .submit(draft(json!({"assetId": "A-1", "year": 2020})), SubmittedEvidence::default(), "auditor")
            .await
            .unwrap();

        let approved = service.review(log.id, &ReviewDecision::Approved, "admin").await.unwrap();
        assert_eq!(approved.approved_changes().unwrap().get("year"), Some(&json!(2020)));
        assert_eq!(approved.reviewed_by.as_deref(), Some("admin"));
    }
}
