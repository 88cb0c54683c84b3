//! Network-server response and request types.
//!
//! Field names follow the server's JSON exactly, which mixes `camelCase`,
//! lowercase run-together names and a few upper-case counters, so most
//! fields carry an explicit `rename`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Pagination ───────────────────────────────────────────────────────

/// Pagination envelope returned by every list endpoint.
///
/// The item array is keyed by resource (`apps` or `devices`); whichever
/// one the endpoint does not return is simply empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(default)]
    pub apps: Vec<App>,
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u64,
    #[serde(default)]
    pub per_page: u64,
}

// ── Apps ─────────────────────────────────────────────────────────────

/// A tenant-scoped device grouping. Discovered by listing, never created here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct App {
    #[serde(rename = "_id", default)]
    pub id: i64,
    /// Hex identifier used in every app-scoped URL.
    #[serde(rename = "appHexId")]
    pub app_hex_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "ownerid", default)]
    pub owner_id: i64,
    #[serde(rename = "organizationId", default)]
    pub organization_id: i64,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    /// Number of devices currently registered in this app.
    #[serde(default)]
    pub devices: u32,
    #[serde(rename = "deviceLimit", default)]
    pub device_limit: u32,
    #[serde(rename = "cansend", default)]
    pub can_send: bool,
    #[serde(rename = "canotaa", default)]
    pub can_otaa: bool,
    #[serde(default)]
    pub suspended: bool,
}

// ── Devices ──────────────────────────────────────────────────────────

/// A radio device. `(app_id, dev_eui)` is its immutable identity.
///
/// Only `title` and `description` are mutable through the API; the rest
/// is radio telemetry reported by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Owning app. Not part of the server payload; stamped by the client.
    #[serde(rename = "appid", default)]
    pub app_id: String,
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "appeui", default)]
    pub app_eui: String,
    #[serde(rename = "deveui")]
    pub dev_eui: String,
    #[serde(rename = "devaddr", default)]
    pub dev_addr: Option<String>,
    #[serde(rename = "devclass", default)]
    pub dev_class: Option<String>,
    #[serde(rename = "seqno", default)]
    pub seq_no: i64,
    #[serde(rename = "seqdn", default)]
    pub seq_dn: i64,
    #[serde(rename = "adrCnt", default)]
    pub adr_cnt: i64,
    #[serde(rename = "NFCntDwn", default)]
    pub nf_cnt_dwn: i64,
    #[serde(rename = "AFCntDwn", default)]
    pub af_cnt_dwn: i64,
    #[serde(default)]
    pub adr: bool,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub bat: Option<i32>,
    #[serde(rename = "devSnr", default)]
    pub dev_snr: Option<i32>,
    #[serde(default)]
    pub freq: Option<i64>,
    #[serde(default)]
    pub gw: Option<String>,
    #[serde(rename = "lastJoin", default)]
    pub last_join: Option<DateTime<Utc>>,
    #[serde(rename = "lastSeen", default)]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sf: Option<i32>,
    #[serde(default)]
    pub rssi: Option<i32>,
    #[serde(default)]
    pub snr: Option<f64>,
}

/// Body for creating an OTAA device.
///
/// Join keys are only ever sent here; the server never returns them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateDeviceRequest {
    #[serde(rename = "deveui")]
    pub dev_eui: String,
    #[serde(rename = "appeui", skip_serializing_if = "Option::is_none")]
    pub join_eui: Option<String>,
    #[serde(rename = "appkey", skip_serializing_if = "Option::is_none")]
    pub app_key: Option<String>,
    #[serde(rename = "nwkkey", skip_serializing_if = "Option::is_none")]
    pub nwk_key: Option<String>,
    #[serde(rename = "devclass", skip_serializing_if = "Option::is_none")]
    pub dev_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The mutable subset of a device, posted on update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateDeviceRequest<'a> {
    pub title: &'a str,
    pub description: &'a str,
}

impl<'a> From<&'a Device> for UpdateDeviceRequest<'a> {
    fn from(device: &'a Device) -> Self {
        Self {
            title: &device.title,
            description: &device.description,
        }
    }
}
