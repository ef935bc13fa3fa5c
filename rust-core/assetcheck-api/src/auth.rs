// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Caller identity and per-action gating.
//!
//! Authentication happens upstream: a gateway sets [`USER_ID_HEADER`] on
//! every request it lets through. The [`Actor`] extractor reads that header
//! and loads the caller's effective permission set; handlers then call
//! [`Actor::require`] with the action their route needs. Every decision is
//! logged as `ALLOWED` or `DENIED`.

use assetcheck_access::{require, Action, PermissionSet};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::{info, warn};

use crate::{ApiError, AppState};

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: String,
    pub permissions: PermissionSet,
}

impl Actor {
    /// Fail with `403` unless the caller may perform `action`.
    pub fn require(&self, action: Action, path: &str) -> Result<(), ApiError> {
        match require(&self.permissions, action) {
            Ok(()) => {
                info!(
                    client = %self.id,
                    action = %action,
                    path = %path,
                    "Access ALLOWED"
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    client = %self.id,
                    action = %action,
                    path = %path,
                    "Access DENIED"
                );
                Err(err.into())
            }
        }
    }
}

impl FromRequestParts<AppState> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                warn!(path = %parts.uri.path(), "Request without user identity");
                ApiError::Unauthorized(format!("missing {} header", USER_ID_HEADER))
            })?
            .to_string();

        let permissions = state.permissions.effective(&id).await?;
        Ok(Actor { id, permissions })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
