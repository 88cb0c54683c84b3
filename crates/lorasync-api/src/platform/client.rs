// Async HTTP client for the building platform's REST API.
//
// Only the handful of endpoints the sync service needs: asset lookup by
// type, asset upsert by device id, user notifications, and the URL of
// the asset-listener WebSocket.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use super::types::{Asset, Notification};
use crate::Error;
use crate::transport::{TransportConfig, handle_empty, handle_response, normalize_base_url};

/// Header carrying the platform API key, on HTTP and WebSocket alike.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Async client for the platform asset and notification API.
pub struct PlatformClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
}

impl PlatformClient {
    /// Build from the API endpoint (e.g. `https://platform.example/v2`) and key.
    pub fn new(
        api_endpoint: &str,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut key_value = HeaderValue::from_str(api_key.expose_secret())
            .map_err(|e| Error::InvalidCredential(e.to_string()))?;
        key_value.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key_value);

        let http = transport.build_client_with_headers(headers)?;
        let base_url = normalize_base_url(api_endpoint)?;

        Ok(Self {
            http,
            base_url,
            api_key: api_key.clone(),
        })
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    /// WebSocket URL of the asset-listener stream, with device ids expanded.
    pub fn listener_url(&self) -> Result<Url, Error> {
        let mut url = self.url("asset-listener")?;
        url.query_pairs_mut()
            .append_pair("expansions", "Asset.deviceIds");
        let scheme = match url.scheme() {
            "https" => "wss",
            "http" => "ws",
            other => other,
        }
        .to_owned();
        url.set_scheme(&scheme)
            .map_err(|()| Error::WebSocketConnect(format!("cannot use scheme {scheme}")))?;
        Ok(url)
    }

    // ── Assets ───────────────────────────────────────────────────────

    pub async fn assets_by_type(&self, asset_type: &str) -> Result<Vec<Asset>, Error> {
        let url = self.url("assets")?;
        debug!("GET {url} assetTypeName={asset_type}");

        let resp = self
            .http
            .get(url)
            .query(&[("assetTypeName", asset_type)])
            .send()
            .await?;
        handle_response(resp).await
    }

    /// Create or replace an asset. With `identify_by`, the platform
    /// matches an existing asset on that attribute (e.g. `deviceId`).
    pub async fn put_asset(
        &self,
        asset: &Asset,
        identify_by: Option<&str>,
    ) -> Result<Asset, Error> {
        let url = self.url("assets")?;
        debug!("PUT {url} identifyBy={identify_by:?}");

        let mut request = self.http.put(url).json(asset);
        if let Some(attr) = identify_by {
            request = request.query(&[("identifyBy", attr)]);
        }
        let resp = request.send().await?;
        handle_response(resp).await
    }

    /// Fetch the project's root asset of `root_type`, creating it if absent.
    pub async fn ensure_root_asset(
        &self,
        project_id: &str,
        root_type: &str,
        root_name: &str,
    ) -> Result<Asset, Error> {
        let existing = self.assets_by_type(root_type).await?;
        if let Some(root) = existing.into_iter().find(|a| a.project_id == project_id) {
            return Ok(root);
        }

        let root = Asset {
            project_id: project_id.to_owned(),
            global_asset_identifier: format!("{root_type} {project_id}"),
            name: Some(root_name.to_owned()),
            asset_type: root_type.to_owned(),
            ..Asset::default()
        };
        self.put_asset(&root, None).await
    }

    /// Upsert a device asset below the project's root asset, matched by device id.
    pub async fn upsert_device_asset(
        &self,
        mut asset: Asset,
        root_type: &str,
        root_name: &str,
    ) -> Result<Asset, Error> {
        let root = self
            .ensure_root_asset(&asset.project_id, root_type, root_name)
            .await?;
        asset.parent_locational_asset_id = root.id;
        self.put_asset(&asset, Some("deviceId")).await
    }

    // ── Notifications ────────────────────────────────────────────────

    pub async fn notify(&self, notification: &Notification) -> Result<(), Error> {
        let url = self.url("notifications")?;
        debug!("POST {url} user={}", notification.user);

        let resp = self.http.post(url).json(notification).send().await?;
        handle_empty(resp).await
    }
}
