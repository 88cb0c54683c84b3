// ── Tenant fan-out ──
//
// Entry point for both paths. The event path visits every configuration
// and never fails as a whole; the manual path needs at least one enabled
// configuration and propagates the first error.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use lorasync_api::NetworkClient;
use tracing::{debug, error, info};

use crate::error::CoreError;
use crate::eui::is_valid_eui;
use crate::model::{AssetEvent, Association, PlatformAsset, TenantConfig, UpsertDeviceRequest};
use crate::reconcile::{Outcome, Reconciler, SkipReason, TenantReport};
use crate::store::{ConfigStore, StoreError};

const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

pub struct TenantFanout {
    configs: Arc<dyn ConfigStore>,
    reconciler: Reconciler,
    /// One network client per configuration id, built on first use.
    clients: DashMap<i64, NetworkClient>,
}

impl TenantFanout {
    pub fn new(configs: Arc<dyn ConfigStore>, reconciler: Reconciler) -> Self {
        Self {
            configs,
            reconciler,
            clients: DashMap::new(),
        }
    }

    // ── Activation ───────────────────────────────────────────────────

    /// Make each configuration's `active` flag follow `enabled`.
    ///
    /// Returns the configurations as they stand afterwards.
    pub fn sync_activation(&self) -> Result<Vec<TenantConfig>, StoreError> {
        let mut configs = self.configs.list()?;
        for config in &mut configs {
            if config.enabled && !config.active {
                self.configs.set_active(config.id, true)?;
                config.active = true;
                info!(
                    config_id = config.id,
                    refresh_interval_secs = config.refresh_interval.as_secs(),
                    request_timeout_secs = config.request_timeout.as_secs(),
                    project_ids = ?config.project_ids,
                    "configuration initialized"
                );
            } else if !config.enabled && config.active {
                self.configs.set_active(config.id, false)?;
                config.active = false;
                self.clients.remove(&config.id);
                info!(config_id = config.id, "configuration deactivated");
            }
        }
        Ok(configs)
    }

    /// How often activation should be re-checked: the shortest refresh
    /// interval among enabled configurations.
    pub fn refresh_interval(&self) -> Duration {
        self.configs
            .list()
            .ok()
            .and_then(|configs| {
                configs
                    .iter()
                    .filter(|c| c.enabled)
                    .map(|c| c.refresh_interval)
                    .filter(|d| !d.is_zero())
                    .min()
            })
            .unwrap_or(DEFAULT_REFRESH_INTERVAL)
    }

    fn client_for(&self, tenant: &TenantConfig) -> Result<NetworkClient, CoreError> {
        if let Some(client) = self.clients.get(&tenant.id) {
            return Ok(client.clone());
        }
        let client = tenant
            .network_client()
            .map_err(|e| CoreError::upstream(tenant.id, &e))?;
        self.clients.insert(tenant.id, client.clone());
        Ok(client)
    }

    // ── Event path ───────────────────────────────────────────────────

    /// The EUI an event refers to: one carried by the asset, else the
    /// one recorded for this asset id by an earlier operation.
    pub fn resolve_eui(&self, asset: &PlatformAsset, asset_id: i32) -> Option<String> {
        if let Some(eui) = asset.device_eui() {
            return Some(eui.to_owned());
        }
        match self.reconciler.recorder().lookup(asset_id) {
            Ok(Some(row)) if is_valid_eui(&row.dev_eui) => {
                debug!(asset_id, dev_eui = %row.dev_eui, "EUI recovered from association");
                Some(row.dev_eui)
            }
            Ok(_) => None,
            Err(e) => {
                error!(asset_id, error = %e, "association lookup failed");
                None
            }
        }
    }

    /// Apply one asset event to every configuration it concerns.
    pub async fn handle_event(&self, event: &AssetEvent) -> Vec<TenantReport> {
        let Some(asset_id) = event.asset.id else {
            debug!("asset event without id ignored");
            return Vec::new();
        };
        let Some(dev_eui) = self.resolve_eui(&event.asset, asset_id) else {
            debug!(asset_id, "asset carries no device EUI");
            return Vec::new();
        };
        info!(asset_id, dev_eui = %dev_eui, change = %event.change, "asset changed");

        let configs = match self.sync_activation() {
            Ok(configs) => configs,
            Err(e) => {
                error!(error = %e, "cannot read configurations");
                return Vec::new();
            }
        };

        let mut reports = Vec::with_capacity(configs.len());
        for tenant in &configs {
            let outcome = self.reconcile_one(tenant, event, asset_id, &dev_eui).await;
            reports.push(TenantReport {
                config_id: tenant.id,
                outcome,
            });
        }
        reports
    }

    async fn reconcile_one(
        &self,
        tenant: &TenantConfig,
        event: &AssetEvent,
        asset_id: i32,
        dev_eui: &str,
    ) -> Outcome {
        if !tenant.enabled {
            return Outcome::Skipped(SkipReason::Disabled);
        }
        if !tenant.applies_to(&event.asset.project_id) {
            info!(
                config_id = tenant.id,
                asset_id,
                project_id = %event.asset.project_id,
                "project not bound to configuration, skipped"
            );
            return Outcome::Skipped(SkipReason::ProjectNotBound);
        }
        match self.client_for(tenant) {
            Ok(client) => {
                self.reconciler
                    .reconcile(tenant, &client, event, asset_id, dev_eui)
                    .await
            }
            Err(e) => {
                error!(config_id = tenant.id, error = %e, "cannot build network client");
                Outcome::Failed(e)
            }
        }
    }

    // ── Manual path ──────────────────────────────────────────────────

    /// Create or update a device on every enabled configuration (or only
    /// `request.config_id`) and return the associations written.
    pub async fn upsert_device(
        &self,
        request: &UpsertDeviceRequest,
    ) -> Result<Vec<Association>, CoreError> {
        request.validate()?;

        let targets: Vec<TenantConfig> = self
            .sync_activation()?
            .into_iter()
            .filter(|c| c.enabled)
            .filter(|c| request.config_id.is_none_or(|id| id == c.id))
            .collect();
        if targets.is_empty() {
            return Err(CoreError::NoMatchingConfiguration);
        }

        let mut written = Vec::new();
        for tenant in &targets {
            let client = self.client_for(tenant)?;
            let rows = self
                .reconciler
                .upsert_for_tenant(tenant, &client, request)
                .await
                .inspect_err(|e| {
                    error!(
                        config_id = tenant.id,
                        dev_eui = %request.dev_eui,
                        error = %e,
                        "device upsert failed"
                    );
                })?;
            written.extend(rows);
        }
        Ok(written)
    }

    /// Associations whose last change was not a delete.
    pub fn list_associations(&self) -> Result<Vec<Association>, CoreError> {
        Ok(self.reconciler.recorder().list_active()?)
    }
}
