//! Engine wiring and the long-running service supervisor.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use lorasync_api::{AssetListenerHandle, PlatformClient, TransportConfig};
use lorasync_config::Config;
use lorasync_core::{
    AssociationRecorder, AssociationStore, JsonFileAssociationStore, MemoryAssociationStore,
    MemoryConfigStore, Reconciler, TenantFanout, run_event_loop,
};

use crate::error::CliError;
use crate::http;

/// Everything both the service and one-shot commands need.
pub struct Engine {
    pub fanout: Arc<TenantFanout>,
    pub platform: Arc<PlatformClient>,
}

impl Engine {
    pub fn from_config(cfg: &Config) -> Result<Self, CliError> {
        let (endpoint, api_key) = cfg.platform_credentials()?;
        let platform = Arc::new(PlatformClient::new(
            &endpoint,
            &api_key,
            &TransportConfig::default(),
        )?);

        let associations: Arc<dyn AssociationStore> = match &cfg.association_file {
            Some(path) => Arc::new(JsonFileAssociationStore::open(path.clone())?),
            None => Arc::new(MemoryAssociationStore::new()),
        };
        let configs = Arc::new(MemoryConfigStore::new(cfg.tenant_configs()?));

        let reconciler = Reconciler::new(
            Arc::clone(&platform),
            AssociationRecorder::new(associations),
            cfg.asset_settings(),
        );
        let fanout = Arc::new(TenantFanout::new(configs, reconciler));

        Ok(Self { fanout, platform })
    }
}

/// Run listener, event loop, activation tick and HTTP server until
/// `cancel` fires. Any one of them ending cancels the rest; a dead
/// listener closes the frame channel, which ends the event loop.
pub async fn serve(cfg: &Config, port: u16, cancel: CancellationToken) -> Result<(), CliError> {
    let engine = Engine::from_config(cfg)?;

    // Unreadable configuration is the one fatal startup error.
    let configs = engine.fanout.sync_activation()?;
    info!(
        configurations = configs.len(),
        enabled = configs.iter().filter(|c| c.enabled).count(),
        "engine started"
    );

    let (listener, frames) = AssetListenerHandle::spawn(
        engine.platform.listener_url()?,
        engine.platform.api_key().clone(),
        cfg.reconnect_policy(),
        cancel.child_token(),
    );
    let events = spawn_guarded(
        &cancel,
        run_event_loop(Arc::clone(&engine.fanout), frames, cancel.child_token()),
    );
    let ticker = spawn_guarded(
        &cancel,
        activation_tick(Arc::clone(&engine.fanout), cancel.child_token()),
    );

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let tcp = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| CliError::Bind { addr, source })?;
    info!(%addr, "HTTP API listening");

    let shutdown = cancel.clone();
    let served = axum::serve(tcp, http::router(Arc::clone(&engine.fanout)))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await;

    cancel.cancel();
    listener.join().await;
    for task in [events, ticker] {
        if let Err(e) = task.await {
            error!(error = %e, "background task ended abnormally");
        }
    }
    info!("engine stopped");
    served.map_err(CliError::Io)
}

/// Spawn `task` so that its end, a panic included, cancels `cancel`.
fn spawn_guarded<F>(cancel: &CancellationToken, task: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let guard = cancel.clone().drop_guard();
    tokio::spawn(async move {
        let _guard = guard;
        task.await;
    })
}

/// Re-run activation on the shortest configured refresh interval.
async fn activation_tick(fanout: Arc<TenantFanout>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(fanout.refresh_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; startup already synced.
    interval.tick().await;

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = fanout.sync_activation() {
                    error!(error = %e, "activation sync failed");
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finished_task_cancels_the_rest() {
        let cancel = CancellationToken::new();
        let sibling = cancel.child_token();

        let handle = spawn_guarded(&cancel, async {});
        assert!(handle.await.is_ok());

        assert!(cancel.is_cancelled());
        assert!(sibling.is_cancelled());
    }

    #[tokio::test]
    async fn panicked_task_cancels_the_rest() {
        let cancel = CancellationToken::new();

        let handle = spawn_guarded(&cancel, async { panic!("event loop died") });
        assert!(handle.await.unwrap_err().is_panic());

        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn running_task_leaves_token_alone() {
        let cancel = CancellationToken::new();
        let inner = cancel.child_token();

        let handle = spawn_guarded(&cancel, async move { inner.cancelled().await });
        tokio::task::yield_now().await;
        assert!(!cancel.is_cancelled());

        cancel.cancel();
        assert!(handle.await.is_ok());
    }
}
