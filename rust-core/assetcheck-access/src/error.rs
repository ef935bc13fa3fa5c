// SPDX-License-Identifier: PMPL-1.0-or-later
//! Access-control error types.

use thiserror::Error;

use crate::catalog::Action;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("unknown permission group: {0}")]
    UnknownGroup(String),

    #[error("permission denied: '{0}' is not allowed")]
    Denied(Action),
}
