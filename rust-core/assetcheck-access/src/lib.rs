// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! AssetCheck access control.
//!
//! Per-user, per-action permissions over a closed catalog:
//!
//! - [`catalog`]: the versioned list of [`Action`]s and their named [`Group`]s.
//! - [`permission`]: [`Effect`], [`PermissionSet`] and the normalizer that
//!   turns a sparse, possibly stale permission list into a complete set.
//! - [`evaluator`]: allow/deny answers for protected operations.
//! - [`editor`]: toggle / group / catalog-wide edits and the derived
//!   `allAccess` flag.
//!
//! Every function here is pure: sets are passed in and returned by value and
//! persistence belongs to the caller.

pub mod catalog;
pub mod editor;
pub mod error;
pub mod evaluator;
pub mod permission;

pub use catalog::{Action, Group, CATALOG_VERSION, GROUPS};
pub use editor::{apply_edits, set_all, set_group, set_group_by_name, toggle, PermissionEdit};
pub use error::AccessError;
pub use evaluator::{can_access, has_full_access, require};
pub use permission::{normalize, Effect, Permission, PermissionSet, RawPermission};
