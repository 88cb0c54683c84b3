//! CLI error types with miette diagnostics.
//!
//! Maps engine and configuration failures into user-facing errors with
//! help text and a stable exit code.

use std::net::SocketAddr;

use miette::Diagnostic;
use thiserror::Error;

use lorasync_config::ConfigError;
use lorasync_core::{CoreError, StoreError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(lorasync::config),
        help("Check the configuration file (see: lorasync config path) and LORASYNC_* variables.")
    )]
    Config(#[from] ConfigError),

    // ── Input ────────────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(lorasync::validation))]
    Validation { field: String, reason: String },

    #[error("No enabled configuration matches the request")]
    #[diagnostic(
        code(lorasync::no_configuration),
        help("Set `enable = true` on a [[tenants]] entry, or pass a --config-id that exists.")
    )]
    NoMatchingConfiguration,

    // ── Upstream ─────────────────────────────────────────────────────
    #[error("Request for configuration {tenant_id} failed")]
    #[diagnostic(code(lorasync::upstream), help("{message}"))]
    Upstream { tenant_id: i64, message: String },

    #[error("Platform API error: {0}")]
    #[diagnostic(
        code(lorasync::platform),
        help("Check [platform].api_endpoint and the platform API token.")
    )]
    Platform(#[from] lorasync_api::Error),

    // ── Local state ──────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(lorasync::store))]
    Store(#[from] StoreError),

    #[error("Cannot listen on {addr}")]
    #[diagnostic(code(lorasync::bind), help("Pick another port with --port or listen_port."))]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(lorasync::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => exit_code::CONFIG,
            Self::Validation { .. } => exit_code::USAGE,
            Self::NoMatchingConfiguration => exit_code::NOT_FOUND,
            Self::Upstream { .. } | Self::Platform(_) => exit_code::CONNECTION,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation { field, reason } => Self::Validation { field, reason },
            CoreError::NoMatchingConfiguration => Self::NoMatchingConfiguration,
            CoreError::Upstream {
                tenant_id, message, ..
            } => Self::Upstream { tenant_id, message },
            CoreError::Persistence(e) => Self::Store(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_kind() {
        assert_eq!(
            CliError::from(CoreError::validation("devEUI", "bad")).exit_code(),
            exit_code::USAGE
        );
        assert_eq!(
            CliError::from(CoreError::NoMatchingConfiguration).exit_code(),
            exit_code::NOT_FOUND
        );
        let upstream = CoreError::Upstream {
            tenant_id: 1,
            url: None,
            status: Some(502),
            message: "bad gateway".into(),
        };
        assert_eq!(CliError::from(upstream).exit_code(), exit_code::CONNECTION);
    }
}
