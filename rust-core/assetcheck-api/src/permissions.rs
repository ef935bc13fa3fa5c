// SPDX-License-Identifier: PMPL-1.0-or-later
//! Per-user permission storage and the permission endpoints.
//!
//! Writes are last-write-wins. A user with no stored set is denied
//! everything, unless listed as a bootstrap admin.

use std::collections::HashSet;

use assetcheck_access::{
    apply_edits, Action, Effect, Group, PermissionEdit, PermissionSet, RawPermission,
    CATALOG_VERSION, GROUPS,
};
use assetcheck_storage::{StorageBackend, StorageError, TypedStore};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::auth::Actor;
use crate::{json_body, ApiError, AppState};

const NAMESPACE: &str = "permissions";

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

pub struct PermissionStore<B: StorageBackend> {
    sets: TypedStore<B>,
    bootstrap_admins: HashSet<String>,
}

impl<B: StorageBackend> PermissionStore<B> {
    pub fn new(backend: B, bootstrap_admins: impl IntoIterator<Item = String>) -> Self {
        Self {
            sets: TypedStore::new(backend, NAMESPACE),
            bootstrap_admins: bootstrap_admins.into_iter().collect(),
        }
    }

    /// The stored set for `user_id`, if any.
    pub async fn get(&self, user_id: &str) -> Result<Option<PermissionSet>, StorageError> {
        self.sets.get(user_id).await
    }

    /// What `user_id` may do right now: the stored set, full access for a
    /// bootstrap admin without one, all-deny otherwise.
    pub async fn effective(&self, user_id: &str) -> Result<PermissionSet, StorageError> {
        if let Some(set) = self.get(user_id).await? {
            return Ok(set);
        }
        if self.bootstrap_admins.contains(user_id) {
            debug!(user = %user_id, "Using bootstrap admin permissions");
            return Ok(PermissionSet::uniform(Effect::Allow));
        }
        Ok(PermissionSet::deny_all())
    }

    #[instrument(skip(self, set))]
    pub async fn put(&self, user_id: &str, set: &PermissionSet) -> Result<(), StorageError> {
        self.sets.put(user_id, set).await?;
        info!(user = %user_id, allowed = set.allowed().len(), "Permissions saved");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResponse {
    pub version: u32,
    pub actions: Vec<Action>,
    pub groups: Vec<GroupResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GroupResponse {
    pub name: String,
    pub actions: Vec<Action>,
}

impl From<&Group> for GroupResponse {
    fn from(group: &Group) -> Self {
        Self {
            name: group.name.to_string(),
            actions: group.actions.to_vec(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPermissionsResponse {
    pub user_id: String,
    pub permissions: PermissionSet,
}

/// Full replacement. Unknown actions are rejected; missing ones are denied.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReplacePermissionsRequest {
    pub permissions: Vec<RawPermission>,
}

/// Editor operations applied in order to the stored set.
#[derive(Debug, Serialize, Deserialize)]
pub struct EditPermissionsRequest {
    pub edits: Vec<PermissionEdit>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Catalog version, actions and groups, in catalog order.
#[instrument]
pub async fn catalog_handler() -> Json<CatalogResponse> {
    Json(CatalogResponse {
        version: CATALOG_VERSION,
        actions: Action::ALL.to_vec(),
        groups: GROUPS.iter().map(GroupResponse::from).collect(),
    })
}

#[instrument(skip(state, actor), fields(caller = %actor.id))]
pub async fn get_permissions_handler(
    State(state): State<AppState>,
    actor: Actor,
    Path(user_id): Path<String>,
) -> Result<Json<UserPermissionsResponse>, ApiError> {
    actor.require(Action::UserMasterView, "/users/{id}/permissions")?;

    let permissions = state
        .permissions
        .get(&user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("permissions for user {} not found", user_id)))?;

    Ok(Json(UserPermissionsResponse { user_id, permissions }))
}

#[instrument(skip(state, actor, body), fields(caller = %actor.id))]
pub async fn replace_permissions_handler(
    State(state): State<AppState>,
    actor: Actor,
    Path(user_id): Path<String>,
    body: Result<Json<ReplacePermissionsRequest>, JsonRejection>,
) -> Result<Json<UserPermissionsResponse>, ApiError> {
    actor.require(Action::UserMasterEdit, "/users/{id}/permissions")?;
    let request = json_body(body)?;

    let permissions = PermissionSet::from_raw_strict(&request.permissions)?;
    state.permissions.put(&user_id, &permissions).await?;

    Ok(Json(UserPermissionsResponse { user_id, permissions }))
}

#[instrument(skip(state, actor, body), fields(caller = %actor.id))]
pub async fn edit_permissions_handler(
    State(state): State<AppState>,
    actor: Actor,
    Path(user_id): Path<String>,
    body: Result<Json<EditPermissionsRequest>, JsonRejection>,
) -> Result<Json<UserPermissionsResponse>, ApiError> {
    actor.require(Action::UserMasterEdit, "/users/{id}/permissions")?;
    let request = json_body(body)?;

    let current = state.permissions.get(&user_id).await?.unwrap_or_default();
    let permissions = apply_edits(&current, &request.edits)?;
    state.permissions.put(&user_id, &permissions).await?;

    Ok(Json(UserPermissionsResponse { user_id, permissions }))
}
