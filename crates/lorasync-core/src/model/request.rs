// ── Manual device upsert request ──
//
// Body of the manual entry point (HTTP front door and CLI). Wire names
// follow the platform app's public API.

use serde::{Deserialize, Serialize};

use lorasync_api::network::types::CreateDeviceRequest;

use super::asset::PlatformAsset;
use crate::error::CoreError;
use crate::eui::is_valid_eui;

/// Create-or-update a device on every matching tenant and link it to a
/// platform asset in each of the tenant's projects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertDeviceRequest {
    #[serde(rename = "devEUI")]
    pub dev_eui: String,
    #[serde(rename = "appID")]
    pub app_id: String,
    #[serde(rename = "assetTypeName")]
    pub asset_type_name: String,
    /// Restrict to one tenant configuration. Absent means all enabled ones.
    #[serde(rename = "configID", default, skip_serializing_if = "Option::is_none")]
    pub config_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "joinEUI", default, skip_serializing_if = "Option::is_none")]
    pub join_eui: Option<String>,
    #[serde(rename = "appKey", default, skip_serializing_if = "Option::is_none")]
    pub app_key: Option<String>,
    #[serde(rename = "nwkKey", default, skip_serializing_if = "Option::is_none")]
    pub nwk_key: Option<String>,
    #[serde(rename = "devClass", default, skip_serializing_if = "Option::is_none")]
    pub dev_class: Option<String>,
}

impl UpsertDeviceRequest {
    /// Reject malformed input before any network call.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !is_valid_eui(&self.dev_eui) {
            return Err(CoreError::validation(
                "devEUI",
                format!("invalid device EUI: {}", self.dev_eui),
            ));
        }
        if self.app_id.trim().is_empty() {
            return Err(CoreError::validation("appID", "must not be empty"));
        }
        if self.asset_type_name.trim().is_empty() {
            return Err(CoreError::validation("assetTypeName", "must not be empty"));
        }
        Ok(())
    }

    /// Title for the device and its asset; the EUI when none was given.
    pub fn effective_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.dev_eui)
    }

    pub fn create_request(&self) -> CreateDeviceRequest {
        CreateDeviceRequest {
            dev_eui: self.dev_eui.clone(),
            join_eui: self.join_eui.clone(),
            app_key: self.app_key.clone(),
            nwk_key: self.nwk_key.clone(),
            dev_class: self.dev_class.clone(),
            title: Some(self.effective_title().to_owned()),
            description: self.description.clone().filter(|d| !d.is_empty()),
        }
    }

    /// The platform asset to upsert for this device in `project_id`.
    pub fn asset_for_project(&self, project_id: &str) -> PlatformAsset {
        let title = self.effective_title();
        let suffix_start = self.dev_eui.len().saturating_sub(4);
        let suffix = self.dev_eui.get(suffix_start..).unwrap_or(&self.dev_eui);
        PlatformAsset {
            id: None,
            project_id: project_id.to_owned(),
            global_asset_identifier: format!("{title} {suffix}"),
            name: Some(title.to_owned()),
            description: self.description.clone(),
            asset_type: self.asset_type_name.clone(),
            device_ids: vec![self.dev_eui.clone()],
        }
    }
}
