// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Permission sets and the normalizer.
//!
//! A [`PermissionSet`] holds exactly one [`Effect`] per catalog action. The
//! storage is a fixed-size table indexed by [`Action::index`], so gaps and
//! duplicates cannot be represented at all; the normalizer is only needed
//! when a list arrives from outside (a client, an old stored record).

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::Action;
use crate::error::AccessError;

/// Grant state of one action for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    #[default]
    Deny,
}

impl Effect {
    pub fn flipped(self) -> Effect {
        match self {
            Effect::Allow => Effect::Deny,
            Effect::Deny => Effect::Allow,
        }
    }

    pub fn is_allow(self) -> bool {
        self == Effect::Allow
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Allow => write!(f, "Allow"),
            Effect::Deny => write!(f, "Deny"),
        }
    }
}

/// One `(action, effect)` entry of a normalized set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub action: Action,
    pub effect: Effect,
}

/// An `(action, effect)` entry as received from outside, before the action
/// identifier has been checked against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPermission {
    pub action: String,
    pub effect: Effect,
}

impl RawPermission {
    pub fn new(action: impl Into<String>, effect: Effect) -> Self {
        Self {
            action: action.into(),
            effect,
        }
    }
}

impl From<Permission> for RawPermission {
    fn from(p: Permission) -> Self {
        RawPermission::new(p.action.as_str(), p.effect)
    }
}

/// The complete permission state of one user.
///
/// Serializes as a list of [`Permission`] in catalog order. Deserialization
/// goes through [`normalize`], so a stored set written against an older
/// catalog still loads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<Permission>", from = "Vec<RawPermission>")]
pub struct PermissionSet {
    effects: [Effect; Action::COUNT],
}

impl PermissionSet {
    /// Every action at the same effect.
    pub fn uniform(effect: Effect) -> Self {
        Self {
            effects: [effect; Action::COUNT],
        }
    }

    /// Every action denied.
    pub fn deny_all() -> Self {
        Self::uniform(Effect::Deny)
    }

    pub fn effect(&self, action: Action) -> Effect {
        self.effects[action.index()]
    }

    pub(crate) fn set(&mut self, action: Action, effect: Effect) {
        self.effects[action.index()] = effect;
    }

    /// Entries in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        Action::ALL.into_iter().map(move |action| Permission {
            action,
            effect: self.effect(action),
        })
    }

    /// Actions currently allowed, in catalog order.
    pub fn allowed(&self) -> Vec<Action> {
        self.iter()
            .filter(|p| p.effect.is_allow())
            .map(|p| p.action)
            .collect()
    }

    pub fn to_vec(&self) -> Vec<Permission> {
        self.iter().collect()
    }

    /// Strict ingest: fail on any action the catalog does not know, then
    /// fill gaps with `Deny`.
    pub fn from_raw_strict(existing: &[RawPermission]) -> Result<Self, AccessError> {
        if let Some(unknown) = existing.iter().find(|p| p.action.parse::<Action>().is_err()) {
            return Err(AccessError::UnknownAction(unknown.action.clone()));
        }
        Ok(normalize(existing))
    }
}

impl Default for PermissionSet {
    fn default() -> Self {
        Self::deny_all()
    }
}

impl From<PermissionSet> for Vec<Permission> {
    fn from(set: PermissionSet) -> Self {
        set.to_vec()
    }
}

impl From<Vec<RawPermission>> for PermissionSet {
    fn from(raw: Vec<RawPermission>) -> Self {
        normalize(&raw)
    }
}

/// Build a complete set from a sparse list.
///
/// Each catalog action takes the effect of its first occurrence in
/// `existing`, or `Deny` if it does not occur. Unknown action identifiers
/// are dropped. Pure and idempotent.
pub fn normalize<'a, I>(existing: I) -> PermissionSet
where
    I: IntoIterator<Item = &'a RawPermission>,
{
    let mut seen = [false; Action::COUNT];
    let mut set = PermissionSet::deny_all();

    for raw in existing {
        match raw.action.parse::<Action>() {
            Ok(action) if !seen[action.index()] => {
                seen[action.index()] = true;
                set.set(action, raw.effect);
            }
            Ok(action) => {
                debug!(action = %action, "duplicate permission entry ignored");
            }
            Err(_) => {
                debug!(action = %raw.action, "unknown permission action dropped");
            }
        }
    }

    set
}
