// SPDX-License-Identifier: PMPL-1.0-or-later
//! Permission evaluation.
//!
//! `allAccess` is not a wildcard here. The editor keeps it consistent with
//! the other actions; callers that want "full access" ask for it explicitly
//! via [`has_full_access`].

use crate::catalog::Action;
use crate::error::AccessError;
use crate::permission::{Effect, PermissionSet};

/// True iff `action` is allowed in `set`.
pub fn can_access(set: &PermissionSet, action: Action) -> bool {
    set.effect(action) == Effect::Allow
}

/// [`can_access`] for callers that propagate errors.
pub fn require(set: &PermissionSet, action: Action) -> Result<(), AccessError> {
    if can_access(set, action) {
        Ok(())
    } else {
        Err(AccessError::Denied(action))
    }
}

pub fn has_full_access(set: &PermissionSet) -> bool {
    can_access(set, Action::AllAccess)
}
