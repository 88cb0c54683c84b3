use thiserror::Error;

/// Top-level error type for the `lorasync-api` crate.
///
/// Covers every failure mode across both external systems: transport,
/// non-success HTTP responses, payload decoding, and the asset-listener
/// WebSocket. `lorasync-core` wraps these with tenant context.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A credential could not be encoded as a header value.
    #[error("Invalid credential header: {0}")]
    InvalidCredential(String),

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── HTTP status ─────────────────────────────────────────────────
    /// The remote API answered with a non-success status.
    #[error("HTTP {status} from {url}: {message}")]
    Status {
        status: u16,
        url: String,
        message: String,
    },

    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket connection failed or broke mid-stream.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// HTTP status code carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// URL of the failed request, if known.
    pub fn url(&self) -> Option<String> {
        match self {
            Self::Transport(e) => e.url().map(ToString::to_string),
            Self::Status { url, .. } => Some(url.clone()),
            _ => None,
        }
    }
}
