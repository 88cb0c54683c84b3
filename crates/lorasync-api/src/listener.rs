//! Asset-listener WebSocket stream with unconditional reconnect.
//!
//! Connects to the platform's `asset-listener` endpoint and forwards every
//! decoded [`AssetListen`] frame through a bounded [`tokio::sync::mpsc`]
//! channel. The consumer reads frames one at a time, so a slow consumer
//! applies backpressure to the socket instead of losing events.
//!
//! Any connection loss, clean or not, waits a fixed delay and reconnects.
//! There is no retry cap: the listener runs for the life of the process
//! unless cancelled.
//!
//! # Example
//!
//! ```rust,ignore
//! let cancel = CancellationToken::new();
//! let (handle, mut rx) = AssetListenerHandle::spawn(
//!     platform.listener_url()?,
//!     platform.api_key().clone(),
//!     ReconnectPolicy::default(),
//!     cancel.clone(),
//! );
//! while let Some(frame) = rx.recv().await {
//!     println!("{:?} {:?}", frame.asset.id, frame.status_code);
//! }
//! handle.join().await;
//! ```

use std::time::Duration;

use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::platform::client::API_KEY_HEADER;
use crate::platform::types::AssetListen;

// ── Channel capacity ─────────────────────────────────────────────────

const FRAME_CHANNEL_CAPACITY: usize = 256;

// ── ReconnectPolicy ──────────────────────────────────────────────────

/// Constant-delay, unbounded reconnect policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Pause between a lost connection and the next attempt. Default: 5s.
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(5),
        }
    }
}

// ── AssetListenerHandle ──────────────────────────────────────────────

/// Handle to the background listener task.
pub struct AssetListenerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl AssetListenerHandle {
    /// Spawn the connect/read/reconnect loop and return the frame receiver.
    ///
    /// Returns immediately; the first connection attempt happens in the
    /// background task.
    pub fn spawn(
        ws_url: Url,
        api_key: SecretString,
        policy: ReconnectPolicy,
        cancel: CancellationToken,
    ) -> (Self, mpsc::Receiver<AssetListen>) {
        let (frame_tx, frame_rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            listen_loop(ws_url, api_key, frame_tx, policy, task_cancel).await;
        });

        (Self { cancel, task }, frame_rx)
    }

    /// Stop the task and wait for it to exit.
    pub async fn join(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "asset listener task ended abnormally");
        }
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read → on loss, wait → reconnect. Forever.
async fn listen_loop(
    ws_url: Url,
    api_key: SecretString,
    frame_tx: mpsc::Sender<AssetListen>,
    policy: ReconnectPolicy,
    cancel: CancellationToken,
) {
    loop {
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&ws_url, &api_key, &frame_tx, &cancel) => result,
        };

        match result {
            Ok(ReadEnd::ConsumerGone) => {
                tracing::debug!("asset frame consumer dropped, stopping listener");
                break;
            }
            Ok(ReadEnd::Closed) => tracing::warn!("asset listener connection closed"),
            Err(e) => tracing::error!(error = %e, "asset listener failed"),
        }

        tracing::warn!(
            delay = ?policy.delay,
            "asset listener connection broke, reconnecting"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(policy.delay) => {}
        }
    }

    tracing::debug!("asset listener loop exiting");
}

/// Why a single connection's read loop stopped without an error.
#[derive(Debug, PartialEq, Eq)]
enum ReadEnd {
    Closed,
    ConsumerGone,
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish one WebSocket connection and forward frames until it drops.
async fn connect_and_read(
    url: &Url,
    api_key: &SecretString,
    frame_tx: &mpsc::Sender<AssetListen>,
    cancel: &CancellationToken,
) -> Result<ReadEnd, Error> {
    tracing::info!(url = %url, "connecting to asset listener");

    let uri: tungstenite::http::Uri = url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()))?;

    let request = ClientRequestBuilder::new(uri)
        .with_header(API_KEY_HEADER, api_key.expose_secret().to_owned());

    let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    tracing::debug!("started asset listener");

    let (_write, mut read) = ws_stream.split();

    loop {
        let frame = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(ReadEnd::Closed),
            frame = read.next() => frame,
        };

        match frame {
            Some(Ok(tungstenite::Message::Text(text))) => {
                for listen in parse_frame(&text) {
                    if frame_tx.send(listen).await.is_err() {
                        return Ok(ReadEnd::ConsumerGone);
                    }
                }
            }
            Some(Ok(tungstenite::Message::Close(frame))) => {
                if let Some(ref cf) = frame {
                    tracing::info!(
                        code = %cf.code,
                        reason = %cf.reason,
                        "asset listener close frame"
                    );
                }
                return Ok(ReadEnd::Closed);
            }
            Some(Err(e)) => return Err(Error::WebSocketConnect(e.to_string())),
            None => return Ok(ReadEnd::Closed),
            // Ping is answered by tungstenite; binary/pong frames carry nothing for us.
            Some(Ok(_)) => {}
        }
    }
}

// ── Frame parsing ────────────────────────────────────────────────────

/// Decode a text frame holding one asset-listen object or an array of them.
///
/// Malformed frames are logged and yield nothing.
pub fn parse_frame(text: &str) -> Vec<AssetListen> {
    if let Ok(single) = serde_json::from_str::<AssetListen>(text) {
        return vec![single];
    }
    match serde_json::from_str::<Vec<AssetListen>>(text) {
        Ok(many) => many,
        Err(e) => {
            tracing::debug!(error = %e, "failed to parse asset listener frame");
            Vec::new()
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::SocketAddr;

    use futures_util::SinkExt;
    use tokio::net::TcpListener;

    use super::*;

    const RECV_TIMEOUT: Duration = Duration::from_secs(5);

    fn quick_policy() -> ReconnectPolicy {
        ReconnectPolicy {
            delay: Duration::from_millis(20),
        }
    }

    fn ws_url(addr: SocketAddr) -> Url {
        Url::parse(&format!("ws://{addr}/ws/asset-listener")).unwrap()
    }

    fn frame(id: i32) -> String {
        format!(r#"{{"id": {id}, "projectId": "P1", "deviceIds": null, "statusCode": 200}}"#)
    }

    /// Complete one WebSocket handshake, send `text`, then close.
    async fn serve_once(listener: &TcpListener, text: &str) {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        ws.send(tungstenite::Message::text(text)).await.unwrap();
        ws.close(None).await.unwrap();
    }

    async fn next_id(rx: &mut mpsc::Receiver<AssetListen>) -> Option<i32> {
        tokio::time::timeout(RECV_TIMEOUT, rx.recv())
            .await
            .unwrap()
            .unwrap()
            .asset
            .id
    }

    #[test]
    fn default_policy_is_five_seconds() {
        assert_eq!(ReconnectPolicy::default().delay, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn reconnects_after_lost_connection_and_failed_handshake() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let cancel = CancellationToken::new();
        let (handle, mut rx) = AssetListenerHandle::spawn(
            ws_url(addr),
            SecretString::from("platform-key".to_string()),
            quick_policy(),
            cancel.clone(),
        );

        serve_once(&listener, &frame(1)).await;
        assert_eq!(next_id(&mut rx).await, Some(1));

        // Plain TCP accept dropped before the upgrade: the subscription fails.
        let (tcp, _) = listener.accept().await.unwrap();
        drop(tcp);

        serve_once(&listener, &frame(2)).await;
        assert_eq!(next_id(&mut rx).await, Some(2));

        handle.join().await;
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn refused_connection_is_retried() {
        let reserved = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = reserved.local_addr().unwrap();
        drop(reserved);

        let (handle, mut rx) = AssetListenerHandle::spawn(
            ws_url(addr),
            SecretString::from("platform-key".to_string()),
            quick_policy(),
            CancellationToken::new(),
        );

        // Let several connects be refused before anything listens.
        tokio::time::sleep(Duration::from_millis(150)).await;
        let listener = TcpListener::bind(addr).await.unwrap();
        serve_once(&listener, &frame(7)).await;

        assert_eq!(next_id(&mut rx).await, Some(7));
        handle.join().await;
    }

    #[test]
    fn null_device_ids_keep_the_frame() {
        let frames = parse_frame(&frame(42));
        assert_eq!(frames.len(), 1);
        assert!(frames[0].asset.device_ids.is_empty());
    }

    #[test]
    fn parses_single_object_frame() {
        let frames = parse_frame(
            r#"{"id": 42, "projectId": "P1", "deviceIds": ["0123456789ABCDEF"], "statusCode": 200}"#,
        );
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].asset.id, Some(42));
        assert_eq!(frames[0].status_code, Some(200));
    }

    #[test]
    fn parses_array_frame() {
        let frames = parse_frame(
            r#"[{"id": 1, "projectId": "P1", "statusCode": 201},
                {"id": 2, "projectId": "P1", "statusCode": 204}]"#,
        );
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].status_code, Some(204));
    }

    #[test]
    fn malformed_frame_yields_nothing() {
        assert!(parse_frame("not json at all").is_empty());
    }
}
