// ── Asset ↔ device association ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::asset::AssetChange;

/// Persisted link between a platform asset and a network device under
/// one tenant configuration. Unique by `asset_id`.
///
/// Rows are never removed by the engine: a delete still writes a row with
/// `last_status = Deleted`, so a later event without device ids can
/// recover the EUI the asset used to carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Association {
    #[serde(rename = "configID")]
    pub config_id: i64,
    pub project_id: String,
    pub global_asset_identifier: String,
    #[serde(rename = "appID")]
    pub app_id: String,
    #[serde(rename = "devEUI")]
    pub dev_eui: String,
    #[serde(rename = "assetID")]
    pub asset_id: i32,
    #[serde(rename = "latestStatusCode")]
    pub last_status: AssetChange,
    pub modified_at: DateTime<Utc>,
}

impl Association {
    pub fn is_deleted(&self) -> bool {
        self.last_status == AssetChange::Deleted
    }
}
