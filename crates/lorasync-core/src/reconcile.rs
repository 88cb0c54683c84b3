// ── Per-tenant reconciliation ──
//
// One (tenant, event) or (tenant, manual request) unit of work. Errors
// never escape `reconcile`: they end that unit and come back as an
// `Outcome` so the fan-out can carry on with the next tenant.

use std::sync::Arc;

use lorasync_api::network::types::Device;
use lorasync_api::platform::types::Asset;
use lorasync_api::{NetworkClient, PlatformClient};
use tracing::{error, info, warn};

use crate::error::CoreError;
use crate::locator::find_device;
use crate::model::{
    AssetChange, AssetEvent, Association, PlatformAsset, TenantConfig, UpsertDeviceRequest,
};
use crate::notify::change_notification;
use crate::recorder::AssociationRecorder;

/// Where device assets are hung in each project's asset tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSettings {
    pub root_asset_type: String,
    pub root_asset_name: String,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            root_asset_type: "lorasync_root".into(),
            root_asset_name: "LoRaWAN devices".into(),
        }
    }
}

/// Why a tenant did not act on an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    ProjectNotBound,
}

/// Result of one unit of work for one tenant.
#[derive(Debug)]
pub enum Outcome {
    Skipped(SkipReason),
    /// Created events only notify; the device is assumed to exist.
    Notified,
    /// The EUI resolved but no app of this tenant holds the device.
    DeviceNotFound,
    /// Device mutated and association written.
    Applied(Association),
    /// Device mutated but the association write failed.
    AppliedUnrecorded(CoreError),
    Failed(CoreError),
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::AppliedUnrecorded(_))
    }
}

#[derive(Debug)]
pub struct TenantReport {
    pub config_id: i64,
    pub outcome: Outcome,
}

/// Applies asset changes and manual requests to one tenant at a time.
pub struct Reconciler {
    platform: Arc<PlatformClient>,
    recorder: AssociationRecorder,
    assets: AssetSettings,
}

impl Reconciler {
    pub fn new(
        platform: Arc<PlatformClient>,
        recorder: AssociationRecorder,
        assets: AssetSettings,
    ) -> Self {
        Self {
            platform,
            recorder,
            assets,
        }
    }

    pub fn recorder(&self) -> &AssociationRecorder {
        &self.recorder
    }

    // ── Event path ───────────────────────────────────────────────────

    /// Bring `tenant`'s device for `dev_eui` in line with `event`.
    pub async fn reconcile(
        &self,
        tenant: &TenantConfig,
        client: &NetworkClient,
        event: &AssetEvent,
        asset_id: i32,
        dev_eui: &str,
    ) -> Outcome {
        let change = event.change;
        let result = match change {
            AssetChange::Created => {
                self.notify(tenant, &event.asset.project_id, change, dev_eui, asset_id)
                    .await;
                return Outcome::Notified;
            }
            AssetChange::Updated => self.update(client, &event.asset, dev_eui).await,
            AssetChange::Deleted => self.delete(client, dev_eui).await,
        };

        let device = match result {
            Ok(Some(device)) => device,
            Ok(None) => {
                warn!(
                    config_id = tenant.id,
                    dev_eui,
                    status_code = change.status_code(),
                    "device not found, platform change ignored for this configuration"
                );
                return Outcome::DeviceNotFound;
            }
            Err(e) => {
                error!(
                    config_id = tenant.id,
                    dev_eui,
                    status_code = change.status_code(),
                    error = %e,
                    "device operation failed"
                );
                return Outcome::Failed(CoreError::upstream(tenant.id, &e));
            }
        };

        info!(
            config_id = tenant.id,
            dev_eui,
            app_id = %device.app_id,
            status_code = change.status_code(),
            "device operation performed"
        );
        self.notify(tenant, &event.asset.project_id, change, dev_eui, asset_id)
            .await;

        match self
            .recorder
            .record(tenant.id, &device, asset_id, &event.asset, change)
        {
            Ok(row) => Outcome::Applied(row),
            Err(e) => {
                error!(
                    config_id = tenant.id,
                    asset_id,
                    dev_eui,
                    error = %e,
                    "failed to record association"
                );
                Outcome::AppliedUnrecorded(e.into())
            }
        }
    }

    async fn update(
        &self,
        client: &NetworkClient,
        asset: &PlatformAsset,
        dev_eui: &str,
    ) -> Result<Option<Device>, lorasync_api::Error> {
        let Some(mut device) = find_device(client, dev_eui).await? else {
            return Ok(None);
        };
        device.title = asset.title_or(dev_eui);
        device.description = asset.description.clone().unwrap_or_default();
        client.update_device(&device).await?;
        Ok(Some(device))
    }

    async fn delete(
        &self,
        client: &NetworkClient,
        dev_eui: &str,
    ) -> Result<Option<Device>, lorasync_api::Error> {
        let Some(device) = find_device(client, dev_eui).await? else {
            return Ok(None);
        };
        client.delete_device(&device).await?;
        Ok(Some(device))
    }

    async fn notify(
        &self,
        tenant: &TenantConfig,
        project_id: &str,
        change: AssetChange,
        dev_eui: &str,
        asset_id: i32,
    ) {
        let notification =
            change_notification(&tenant.user_id, project_id, change, dev_eui, asset_id);
        if let Err(e) = self.platform.notify(&notification).await {
            warn!(config_id = tenant.id, asset_id, error = %e, "user notification failed");
        }
    }

    // ── Manual path ──────────────────────────────────────────────────

    /// Create or update the requested device on `tenant`, then upsert a
    /// device asset and an association in each of the tenant's projects.
    pub async fn upsert_for_tenant(
        &self,
        tenant: &TenantConfig,
        client: &NetworkClient,
        request: &UpsertDeviceRequest,
    ) -> Result<Vec<Association>, CoreError> {
        let upstream = |e: lorasync_api::Error| CoreError::upstream(tenant.id, &e);

        let device = match client
            .get_device(&request.app_id, &request.dev_eui)
            .await
            .map_err(upstream)?
        {
            None => {
                let created = client
                    .create_device(&request.app_id, &request.create_request())
                    .await
                    .map_err(upstream)?;
                info!(
                    config_id = tenant.id,
                    dev_eui = %request.dev_eui,
                    app_id = %request.app_id,
                    "device created"
                );
                created
            }
            Some(mut existing) => {
                if let Some(title) = request.title.as_deref().filter(|t| !t.is_empty()) {
                    title.clone_into(&mut existing.title);
                }
                if let Some(desc) = request.description.as_deref().filter(|d| !d.is_empty()) {
                    desc.clone_into(&mut existing.description);
                }
                client.update_device(&existing).await.map_err(upstream)?;
                info!(
                    config_id = tenant.id,
                    dev_eui = %request.dev_eui,
                    app_id = %request.app_id,
                    "device updated"
                );
                existing
            }
        };

        let mut written = Vec::with_capacity(tenant.project_ids.len());
        for project_id in &tenant.project_ids {
            let stored = self
                .platform
                .upsert_device_asset(
                    Asset::from(request.asset_for_project(project_id)),
                    &self.assets.root_asset_type,
                    &self.assets.root_asset_name,
                )
                .await
                .map_err(upstream)?;
            let Some(asset_id) = stored.id else {
                return Err(CoreError::Upstream {
                    tenant_id: tenant.id,
                    url: None,
                    status: None,
                    message: format!("platform returned asset without id for project {project_id}"),
                });
            };
            let asset = PlatformAsset::from(stored);
            let row = self
                .recorder
                .record(tenant.id, &device, asset_id, &asset, AssetChange::Created)?;
            written.push(row);
        }
        Ok(written)
    }
}
