// Shared transport configuration for building reqwest::Client instances.
//
// The Network and Platform clients share timeout and user-agent settings
// through this module, avoiding duplicated builder logic.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::Error;

const USER_AGENT: &str = concat!("lorasync/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request timeout. A hung call blocks its unit of work until this fires.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Build a `reqwest::Client` with additional default headers.
    ///
    /// Used to inject the bearer token (Network) or `X-API-Key` (Platform).
    pub fn build_client_with_headers(&self, headers: HeaderMap) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::ClientBuild(e.to_string()))
    }
}

// ── URL normalization ────────────────────────────────────────────────

/// Ensure the base path ends with `/` so relative joins append instead of replace.
pub(crate) fn normalize_base_url(raw: &str) -> Result<Url, Error> {
    let mut url = Url::parse(raw)?;
    let path = url.path().trim_end_matches('/').to_owned();
    url.set_path(&format!("{path}/"));
    Ok(url)
}

// ── Response handling ────────────────────────────────────────────────

pub(crate) async fn handle_response<T: DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, Error> {
    let status = resp.status();
    if status.is_success() {
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    } else {
        Err(status_error(status, resp).await)
    }
}

pub(crate) async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
    let status = resp.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(status_error(status, resp).await)
    }
}

async fn status_error(status: StatusCode, resp: reqwest::Response) -> Error {
    let url = resp.url().to_string();
    let raw = resp.text().await.unwrap_or_default();
    let message = if raw.is_empty() {
        status.to_string()
    } else {
        raw.chars().take(200).collect()
    };
    Error::Status {
        status: status.as_u16(),
        url,
        message,
    }
}
