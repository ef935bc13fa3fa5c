// SPDX-License-Identifier: PMPL-1.0-or-later
//! Server configuration.
//!
//! Defaults can be overridden from the environment:
//!
//! | Variable                      | Field              |
//! |-------------------------------|--------------------|
//! | `ASSETCHECK_HOST`             | `host`             |
//! | `ASSETCHECK_PORT`             | `port`             |
//! | `ASSETCHECK_DATA_DIR`         | `data_dir`         |
//! | `ASSETCHECK_MAX_IMAGE_BYTES`  | `max_image_bytes`  |
//! | `ASSETCHECK_BOOTSTRAP_ADMINS` | `bootstrap_admins` |
//! | `ASSETCHECK_LOG_FORMAT`       | `log_json`         |
//!
//! Unparseable values are logged and ignored.

use std::path::PathBuf;

use assetcheck_audit::{ProposalLimits, DEFAULT_MAX_IMAGE_BYTES, MAX_AUDIT_IMAGES};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const HOST_ENV: &str = "ASSETCHECK_HOST";
pub const PORT_ENV: &str = "ASSETCHECK_PORT";
pub const DATA_DIR_ENV: &str = "ASSETCHECK_DATA_DIR";
pub const MAX_IMAGE_BYTES_ENV: &str = "ASSETCHECK_MAX_IMAGE_BYTES";
pub const BOOTSTRAP_ADMINS_ENV: &str = "ASSETCHECK_BOOTSTRAP_ADMINS";
pub const LOG_FORMAT_ENV: &str = "ASSETCHECK_LOG_FORMAT";

/// Multipart framing and text fields on top of the images themselves.
const REQUEST_OVERHEAD_BYTES: usize = 1024 * 1024;

/// API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// API version prefix
    pub version_prefix: String,
    /// Directory for the persistent store; in-memory when `None`
    pub data_dir: Option<PathBuf>,
    /// Per-image upload limit
    pub max_image_bytes: usize,
    /// Users granted every action while they have no stored permission set
    pub bootstrap_admins: Vec<String>,
    /// Emit JSON log lines instead of the human-readable format
    pub log_json: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            version_prefix: "/api/v1".to_string(),
            data_dir: None,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            bootstrap_admins: Vec::new(),
            log_json: false,
        }
    }
}

impl ApiConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(host) = var(HOST_ENV) {
            config.host = host;
        }
        if let Some(port) = var(PORT_ENV) {
            match port.parse() {
                Ok(port) => config.port = port,
                Err(_) => warn!(value = %port, "Ignoring invalid {}", PORT_ENV),
            }
        }
        if let Some(dir) = var(DATA_DIR_ENV) {
            config.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(bytes) = var(MAX_IMAGE_BYTES_ENV) {
            match bytes.parse::<usize>() {
                Ok(n) if n > 0 => config.max_image_bytes = n,
                _ => warn!(value = %bytes, "Ignoring invalid {}", MAX_IMAGE_BYTES_ENV),
            }
        }
        if let Some(admins) = var(BOOTSTRAP_ADMINS_ENV) {
            config.bootstrap_admins = admins
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(format) = var(LOG_FORMAT_ENV) {
            match format.to_ascii_lowercase().as_str() {
                "json" => config.log_json = true,
                "text" | "pretty" => config.log_json = false,
                _ => warn!(value = %format, "Ignoring invalid {}", LOG_FORMAT_ENV),
            }
        }

        config
    }

    pub fn proposal_limits(&self) -> ProposalLimits {
        ProposalLimits {
            max_audit_images: MAX_AUDIT_IMAGES,
            max_image_bytes: self.max_image_bytes,
        }
    }

    /// Request body limit: every image slot at full size plus overhead.
    pub fn max_request_bytes(&self) -> usize {
        self.max_image_bytes
            .saturating_mul(MAX_AUDIT_IMAGES + 1)
            .saturating_add(REQUEST_OVERHEAD_BYTES)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
