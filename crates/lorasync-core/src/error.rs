// ── Core error types ──
//
// Errors surfaced by the engine to its callers (HTTP front door, CLI).
// Network-server failures are wrapped with the tenant and URL they came
// from; callers never match on `lorasync_api::Error` directly.

use thiserror::Error;

use crate::store::StoreError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Input errors ─────────────────────────────────────────────────
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("No enabled configuration matches the request")]
    NoMatchingConfiguration,

    // ── Upstream errors ──────────────────────────────────────────────
    #[error("Upstream call for configuration {tenant_id} failed: {message}")]
    Upstream {
        tenant_id: i64,
        url: Option<String>,
        status: Option<u16>,
        message: String,
    },

    // ── Persistence errors ───────────────────────────────────────────
    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
}

impl CoreError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Attribute a network-server or platform failure to a tenant.
    pub fn upstream(tenant_id: i64, err: &lorasync_api::Error) -> Self {
        Self::Upstream {
            tenant_id,
            url: err.url(),
            status: err.status(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_carries_status_and_url() {
        let api = lorasync_api::Error::Status {
            status: 503,
            url: "https://nwk.example/1/nwk/apps".into(),
            message: "unavailable".into(),
        };
        let err = CoreError::upstream(7, &api);
        match &err {
            CoreError::Upstream {
                tenant_id, status, url, ..
            } => {
                assert_eq!(*tenant_id, 7);
                assert_eq!(*status, Some(503));
                assert_eq!(url.as_deref(), Some("https://nwk.example/1/nwk/apps"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(err.to_string().contains("configuration 7"));
    }

    #[test]
    fn validation_names_the_field() {
        let err = CoreError::validation("devEUI", "not hex");
        assert_eq!(err.to_string(), "Validation failed for devEUI: not hex");
    }
}
