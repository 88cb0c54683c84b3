// ── Platform asset domain types ──

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::eui::first_valid_eui;

/// What happened to an asset on the platform.
///
/// The platform encodes this as an HTTP-style status code on each
/// listener frame; the conversion happens once, at the adapter boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum AssetChange {
    /// 201: the asset became visible (created or unarchived).
    Created,
    /// 200: asset fields changed.
    Updated,
    /// 204: the asset was archived.
    Deleted,
}

impl AssetChange {
    pub fn status_code(self) -> u16 {
        match self {
            Self::Created => 201,
            Self::Updated => 200,
            Self::Deleted => 204,
        }
    }
}

impl From<AssetChange> for u16 {
    fn from(change: AssetChange) -> Self {
        change.status_code()
    }
}

impl TryFrom<u16> for AssetChange {
    type Error = UnknownStatusCode;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            201 => Ok(Self::Created),
            200 => Ok(Self::Updated),
            204 => Ok(Self::Deleted),
            other => Err(UnknownStatusCode(other)),
        }
    }
}

impl fmt::Display for AssetChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        };
        write!(f, "{name} ({})", self.status_code())
    }
}

/// A status code outside {200, 201, 204}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown asset status code {0}")]
pub struct UnknownStatusCode(pub u16);

/// A platform asset as the engine sees it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformAsset {
    pub id: Option<i32>,
    pub project_id: String,
    pub global_asset_identifier: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub asset_type: String,
    pub device_ids: Vec<String>,
}

impl PlatformAsset {
    /// The first valid EUI among this asset's device ids.
    pub fn device_eui(&self) -> Option<&str> {
        first_valid_eui(&self.device_ids)
    }

    /// Device title to push: the asset name, or the EUI when unnamed.
    pub fn title_or(&self, dev_eui: &str) -> String {
        self.name.clone().unwrap_or_else(|| dev_eui.to_owned())
    }
}

/// One decoded change notification: asset snapshot plus what happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEvent {
    pub asset: PlatformAsset,
    pub change: AssetChange,
}
