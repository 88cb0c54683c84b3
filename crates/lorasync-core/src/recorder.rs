// ── Association recorder ──

use std::sync::Arc;

use chrono::Utc;
use lorasync_api::network::types::Device;

use crate::model::{AssetChange, Association, PlatformAsset};
use crate::store::{AssociationStore, StoreError};

/// Writes the asset ↔ device link after every successful operation.
#[derive(Clone)]
pub struct AssociationRecorder {
    store: Arc<dyn AssociationStore>,
}

impl AssociationRecorder {
    pub fn new(store: Arc<dyn AssociationStore>) -> Self {
        Self { store }
    }

    /// Upsert the row for `asset`, stamped now with `change`.
    ///
    /// Deletes are recorded too; the row is what lets a later event
    /// without device ids find the EUI again.
    pub fn record(
        &self,
        config_id: i64,
        device: &Device,
        asset_id: i32,
        asset: &PlatformAsset,
        change: AssetChange,
    ) -> Result<Association, StoreError> {
        self.store.upsert(Association {
            config_id,
            project_id: asset.project_id.clone(),
            global_asset_identifier: asset.global_asset_identifier.clone(),
            app_id: device.app_id.clone(),
            dev_eui: device.dev_eui.clone(),
            asset_id,
            last_status: change,
            modified_at: Utc::now(),
        })
    }

    pub fn lookup(&self, asset_id: i32) -> Result<Option<Association>, StoreError> {
        self.store.lookup(asset_id)
    }

    pub fn list_active(&self) -> Result<Vec<Association>, StoreError> {
        self.store.list_active()
    }
}
