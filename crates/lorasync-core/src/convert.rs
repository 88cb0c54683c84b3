// ── API-to-domain type conversions ──
//
// Bridges wire types from `lorasync_api::platform` into the engine's
// model. Frames that cannot become an `AssetEvent` are rejected here so
// nothing downstream ever sees an unknown status code.

use lorasync_api::platform::types::{Asset, AssetListen};

use crate::model::asset::UnknownStatusCode;
use crate::model::{AssetChange, AssetEvent, PlatformAsset};

/// Why a listener frame was not turned into an event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameRejected {
    #[error("frame carries no status code")]
    MissingStatus,
    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatusCode),
}

// ── Asset ──────────────────────────────────────────────────────────

impl From<Asset> for PlatformAsset {
    fn from(a: Asset) -> Self {
        Self {
            id: a.id,
            project_id: a.project_id,
            global_asset_identifier: a.global_asset_identifier,
            name: a.name,
            description: a.description,
            asset_type: a.asset_type,
            device_ids: a.device_ids,
        }
    }
}

impl From<PlatformAsset> for Asset {
    fn from(a: PlatformAsset) -> Self {
        Self {
            id: a.id,
            project_id: a.project_id,
            global_asset_identifier: a.global_asset_identifier,
            name: a.name,
            description: a.description,
            asset_type: a.asset_type,
            device_ids: a.device_ids,
            parent_locational_asset_id: None,
        }
    }
}

// ── Listener frame ─────────────────────────────────────────────────

impl TryFrom<AssetListen> for AssetEvent {
    type Error = FrameRejected;

    fn try_from(frame: AssetListen) -> Result<Self, Self::Error> {
        let code = frame.status_code.ok_or(FrameRejected::MissingStatus)?;
        let change = AssetChange::try_from(code)?;
        Ok(Self {
            asset: frame.asset.into(),
            change,
        })
    }
}
