// ── Asset event loop ──
//
// Drains the listener channel one frame at a time. Each event's full
// fan-out completes before the next frame is read, so two events for the
// same asset are never reconciled concurrently.

use std::sync::Arc;

use lorasync_api::platform::types::AssetListen;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::fanout::TenantFanout;
use crate::model::AssetEvent;

/// Run until `cancel` fires or the listener side of `frames` is dropped.
pub async fn run_event_loop(
    fanout: Arc<TenantFanout>,
    mut frames: mpsc::Receiver<AssetListen>,
    cancel: CancellationToken,
) {
    loop {
        let frame = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("event loop cancelled");
                break;
            }
            frame = frames.recv() => match frame {
                Some(frame) => frame,
                None => {
                    info!("asset listener closed, event loop exiting");
                    break;
                }
            },
        };

        let asset_id = frame.asset.id;
        let event = match AssetEvent::try_from(frame) {
            Ok(event) => event,
            Err(e) => {
                warn!(asset_id = ?asset_id, error = %e, "asset frame dropped");
                continue;
            }
        };

        let reports = fanout.handle_event(&event).await;
        let failed = reports.iter().filter(|r| r.outcome.is_failure()).count();
        debug!(
            asset_id = ?asset_id,
            tenants = reports.len(),
            failed,
            "asset event processed"
        );
    }
}
