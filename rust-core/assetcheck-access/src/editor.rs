// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Permission editing.
//!
//! Every operation takes a set and returns the edited set; nothing is
//! mutated in place and nothing is persisted here.
//!
//! # The derived `allAccess` flag
//!
//! After each operation one pure pass re-derives `allAccess` from the other
//! actions: `Allow` if every other action is `Allow`, `Deny` otherwise. The
//! single exception is an explicit toggle of `allAccess` itself, whose
//! result is kept as is. That lets an administrator switch the summary flag
//! off after a full grant without revoking anything:
//!
//! ```text
//! all Deny --toggle(allAccess)--> all Allow --toggle(allAccess)--> allAccess Deny, rest Allow
//! ```
//!
//! Enabling `allAccess` cascades to every action; disabling it does not.
//! The derivation never cascades on its own.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Action, Group};
use crate::error::AccessError;
use crate::permission::{Effect, PermissionSet};

/// One user-driven edit, as sent by a permission editing screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum PermissionEdit {
    Toggle { action: Action },
    SetGroup { group: String, effect: Effect },
    SetAll { effect: Effect },
}

/// `allAccess` as implied by the other actions.
fn derive_all_access(mut set: PermissionSet) -> PermissionSet {
    let all_allowed = Action::grantable().all(|action| set.effect(action).is_allow());
    let derived = if all_allowed { Effect::Allow } else { Effect::Deny };
    set.set(Action::AllAccess, derived);
    set
}

/// Flip one action. Turning `allAccess` on grants every action.
pub fn toggle(set: &PermissionSet, action: Action) -> PermissionSet {
    let mut next = set.clone();
    let effect = set.effect(action).flipped();
    next.set(action, effect);

    debug!(action = %action, effect = %effect, "permission toggled");

    if action != Action::AllAccess {
        return derive_all_access(next);
    }
    if effect == Effect::Allow {
        for other in Action::grantable() {
            next.set(other, Effect::Allow);
        }
    }
    next
}

/// Set every action in `actions` to `effect`, leaving all others alone.
pub fn set_group(set: &PermissionSet, actions: &[Action], effect: Effect) -> PermissionSet {
    let mut next = set.clone();
    for action in actions {
        next.set(*action, effect);
    }
    derive_all_access(next)
}

/// [`set_group`] for a catalog group named `name`.
pub fn set_group_by_name(
    set: &PermissionSet,
    name: &str,
    effect: Effect,
) -> Result<PermissionSet, AccessError> {
    let group = Group::by_name(name)?;
    Ok(set_group(set, group.actions, effect))
}

/// Set every catalog action, `allAccess` included.
pub fn set_all(set: &PermissionSet, effect: Effect) -> PermissionSet {
    let mut next = set.clone();
    for action in Action::ALL {
        next.set(action, effect);
    }
    derive_all_access(next)
}

/// Apply `edits` in order. Stops at the first edit naming an unknown group.
pub fn apply_edits(
    set: &PermissionSet,
    edits: &[PermissionEdit],
) -> Result<PermissionSet, AccessError> {
    edits.iter().try_fold(set.clone(), |current, edit| match edit {
        PermissionEdit::Toggle { action } => Ok(toggle(&current, *action)),
        PermissionEdit::SetGroup { group, effect } => set_group_by_name(&current, group, *effect),
        PermissionEdit::SetAll { effect } => Ok(set_all(&current, *effect)),
    })
}
