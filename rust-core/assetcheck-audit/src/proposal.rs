// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Audit proposal builder.
//!
//! Turns the flat form an auditor edited into a submission payload:
//!
//! 1. `year`, if present, is reduced to a plain integer year.
//! 2. Keys holding an empty string or `null` are dropped, so only fields
//!    the auditor actually changed are proposed.
//! 3. `assetId`, `auditorRemark`, the cleaned changes and up to four
//!    evidence images are assembled into an [`AuditSubmissionPayload`].
//!
//! Nothing here touches storage.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::AuditError;

/// Audit images accepted per submission, not counting the current-asset image.
pub const MAX_AUDIT_IMAGES: usize = 3;

/// Default per-image size limit (5 MiB).
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const YEAR_FIELD: &str = "year";
const ASSET_ID_FIELD: &str = "assetId";
const REMARK_FIELD: &str = "auditorRemark";

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Sparse field-to-value map of changes an auditor proposes.
///
/// The only way to obtain one is through [`ProposedChanges::sanitize`]
/// (deserialization included), so no value of this type ever holds an
/// empty string or `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposedChanges(Map<String, Value>);

impl ProposedChanges {
    pub fn sanitize(raw: Map<String, Value>) -> Self {
        Self(raw.into_iter().filter(|(_, v)| !is_blank(v)).collect())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Compact JSON object text, the transport form of the changes.
    pub fn to_json_string(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }
}

impl Serialize for ProposedChanges {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ProposedChanges {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::deserialize(deserializer).map(ProposedChanges::sanitize)
    }
}

/// Reduce a `year` value to a plain integer year.
///
/// Accepts an integer, an integral float, a digit string, an RFC 3339
/// timestamp, `YYYY-MM-DD` and `YYYY-MM-DDTHH:MM:SS[.fff]`. Empty strings
/// and `null` come back unchanged so the blank filter can drop them.
pub fn normalize_year(value: Value) -> Result<Value, AuditError> {
    if is_blank(&value) {
        return Ok(value);
    }

    let year = match &value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => year_from_str(s.trim()),
        _ => None,
    };

    match year {
        Some(y) if (1..=9999).contains(&y) => Ok(Value::from(y)),
        _ => Err(AuditError::Validation(format!("unrecognised year: {}", value))),
    }
}

fn year_from_str(s: &str) -> Option<i64> {
    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse().ok();
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(i64::from(ts.year()));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(i64::from(date.year()));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|ts| i64::from(ts.year()))
}

/// The auditor's edited form: every asset field they touched plus the two
/// submission fields, all in one flat object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalDraft {
    #[serde(default)]
    pub asset_id: Option<String>,
    #[serde(default)]
    pub auditor_remark: Option<String>,
    #[serde(flatten)]
    pub edits: Map<String, Value>,
}

/// An uploaded evidence image, not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl EvidenceImage {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    fn validate(&self, limits: &ProposalLimits) -> Result<(), AuditError> {
        if !self.content_type.starts_with("image/") {
            return Err(AuditError::Validation(format!(
                "{}: expected an image, got {}",
                self.file_name, self.content_type
            )));
        }
        if self.bytes.is_empty() {
            return Err(AuditError::Validation(format!("{}: empty file", self.file_name)));
        }
        if self.bytes.len() > limits.max_image_bytes {
            return Err(AuditError::Validation(format!(
                "{}: {} bytes exceeds the {} byte limit",
                self.file_name,
                self.bytes.len(),
                limits.max_image_bytes
            )));
        }
        Ok(())
    }
}

/// Evidence attached to one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmittedEvidence {
    pub current_asset_image: Option<EvidenceImage>,
    pub audit_images: Vec<EvidenceImage>,
}

impl SubmittedEvidence {
    pub fn count(&self) -> usize {
        usize::from(self.current_asset_image.is_some()) + self.audit_images.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProposalLimits {
    pub max_audit_images: usize,
    pub max_image_bytes: usize,
}

impl Default for ProposalLimits {
    fn default() -> Self {
        Self {
            max_audit_images: MAX_AUDIT_IMAGES,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

/// A sanitized proposal ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditSubmissionPayload {
    pub asset_id: String,
    pub auditor_remark: String,
    pub proposed_changes: ProposedChanges,
    pub evidence: SubmittedEvidence,
}

/// Sanitize a draft and package its evidence.
pub fn build_proposal(
    draft: ProposalDraft,
    evidence: SubmittedEvidence,
    limits: &ProposalLimits,
) -> Result<AuditSubmissionPayload, AuditError> {
    let asset_id = draft
        .asset_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AuditError::validation("assetId is required"))?
        .to_string();

    let mut edits = draft.edits;
    edits.remove(ASSET_ID_FIELD);
    edits.remove(REMARK_FIELD);

    if let Some(year) = edits.get_mut(YEAR_FIELD) {
        *year = normalize_year(year.take())?;
    }

    if evidence.audit_images.len() > limits.max_audit_images {
        return Err(AuditError::Validation(format!(
            "at most {} audit images allowed, got {}",
            limits.max_audit_images,
            evidence.audit_images.len()
        )));
    }
    for image in evidence.current_asset_image.iter().chain(evidence.audit_images.iter()) {
        image.validate(limits)?;
    }

    let proposed_changes = ProposedChanges::sanitize(edits);
    debug!(
        asset_id = %asset_id,
        fields = proposed_changes.len(),
        images = evidence.count(),
        "Audit proposal built"
    );

    Ok(AuditSubmissionPayload {
        asset_id,
        auditor_remark: draft.auditor_remark.unwrap_or_default(),
        proposed_changes,
        evidence,
    })
}
