// SPDX-License-Identifier: PMPL-1.0-or-later
//! Audit log endpoints.
//!
//! Submission is multipart: text fields `assetId`, `auditorRemark` and
//! `proposedChanges` (a JSON object), one optional `currentAssetImage` file
//! and up to three `auditImages` files.

use assetcheck_access::Action;
use assetcheck_audit::{
    AuditLog, AuditPage, AuditQuery, EvidenceImage, ProposalDraft, ReviewDecision, StatusCounts,
    SubmittedEvidence,
};
use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{Map, Value};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::auth::Actor;
use crate::{json_body, ApiError, AppState};

pub const ASSET_ID_FIELD: &str = "assetId";
pub const REMARK_FIELD: &str = "auditorRemark";
pub const CHANGES_FIELD: &str = "proposedChanges";
pub const CURRENT_IMAGE_FIELD: &str = "currentAssetImage";
pub const AUDIT_IMAGES_FIELD: &str = "auditImages";

fn bad_multipart(err: MultipartError) -> ApiError {
    ApiError::BadRequest(err.body_text())
}

fn parse_log_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("invalid audit log id: {}", raw)))
}

fn parse_changes(text: &str) -> Result<Map<String, Value>, ApiError> {
    if text.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::BadRequest(format!("{} must be a JSON object", CHANGES_FIELD))),
        Err(err) => Err(ApiError::BadRequest(format!("{} is not valid JSON: {}", CHANGES_FIELD, err))),
    }
}

/// Read a file part. A part with neither a file name nor content is a
/// form's empty file input and yields `None`.
async fn read_image(field: Field<'_>) -> Result<Option<EvidenceImage>, ApiError> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = field.bytes().await.map_err(bad_multipart)?;

    if file_name.is_empty() && bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(EvidenceImage::new(file_name, content_type, bytes.to_vec())))
}

async fn read_submission(
    mut multipart: Multipart,
) -> Result<(ProposalDraft, SubmittedEvidence), ApiError> {
    let mut draft = ProposalDraft::default();
    let mut evidence = SubmittedEvidence::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            ASSET_ID_FIELD => draft.asset_id = Some(field.text().await.map_err(bad_multipart)?),
            REMARK_FIELD => draft.auditor_remark = Some(field.text().await.map_err(bad_multipart)?),
            CHANGES_FIELD => {
                let text = field.text().await.map_err(bad_multipart)?;
                draft.edits = parse_changes(&text)?;
            }
            CURRENT_IMAGE_FIELD => {
                if let Some(image) = read_image(field).await? {
                    if evidence.current_asset_image.replace(image).is_some() {
                        return Err(ApiError::BadRequest(format!(
                            "only one {} may be attached",
                            CURRENT_IMAGE_FIELD
                        )));
                    }
                }
            }
            AUDIT_IMAGES_FIELD => {
                if let Some(image) = read_image(field).await? {
                    evidence.audit_images.push(image);
                }
            }
            other => debug!(field = %other, "Ignoring unknown multipart field"),
        }
    }

    Ok((draft, evidence))
}

/// Submit a proposal; the created log is `pending`.
#[instrument(skip(state, actor, multipart), fields(caller = %actor.id))]
pub async fn submit_handler(
    State(state): State<AppState>,
    actor: Actor,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<AuditLog>), ApiError> {
    actor.require(Action::AssetMasterView, "/audit-logs")?;
    let multipart = multipart.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let (draft, evidence) = read_submission(multipart).await?;
    let log = state.audit.submit(draft, evidence, &actor.id).await?;

    Ok((StatusCode::CREATED, Json(log)))
}

#[instrument(skip(state, actor, query), fields(caller = %actor.id))]
pub async fn list_handler(
    State(state): State<AppState>,
    actor: Actor,
    query: Result<Query<AuditQuery>, QueryRejection>,
) -> Result<Json<AuditPage>, ApiError> {
    actor.require(Action::AuditReportView, "/audit-logs")?;
    let Query(query) = query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    Ok(Json(state.audit.list(&query).await?))
}

#[instrument(skip(state, actor), fields(caller = %actor.id))]
pub async fn counts_handler(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<StatusCounts>, ApiError> {
    actor.require(Action::AuditReportView, "/audit-logs/counts")?;
    Ok(Json(state.audit.status_counts().await?))
}

#[instrument(skip(state, actor), fields(caller = %actor.id))]
pub async fn get_handler(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<Json<AuditLog>, ApiError> {
    actor.require(Action::AuditReportView, "/audit-logs/{id}")?;
    let id = parse_log_id(&id)?;
    Ok(Json(state.audit.get(id).await?))
}

/// Approve or reject a pending log.
#[instrument(skip(state, actor, body), fields(caller = %actor.id))]
pub async fn review_handler(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
    body: Result<Json<ReviewDecision>, JsonRejection>,
) -> Result<Json<AuditLog>, ApiError> {
    actor.require(Action::AuditReportEdit, "/audit-logs/{id}/review")?;
    let id = parse_log_id(&id)?;
    let decision = json_body(body)?;

    Ok(Json(state.audit.review(id, &decision, &actor.id).await?))
}
