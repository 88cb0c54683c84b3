// Hand-crafted async HTTP client for the network server's `/1/nwk/` API.
//
// The server has no global device index: a device is addressed by
// `(appHexId, devEUI)`, so callers that only know the EUI must scan apps.

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::types::{App, CreateDeviceRequest, Device, Page, UpdateDeviceRequest};
use crate::Error;
use crate::transport::{TransportConfig, handle_empty, handle_response, normalize_base_url};

/// Page size requested from every list endpoint.
pub const PER_PAGE: u64 = 100;

// ── Client ───────────────────────────────────────────────────────────

/// Async client for one tenant's network-server account.
///
/// Bearer-token authenticated; every request honours the tenant's timeout.
#[derive(Clone)]
pub struct NetworkClient {
    http: reqwest::Client,
    base_url: Url,
}

impl NetworkClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL, bearer token and transport config.
    ///
    /// Injects `Authorization: Bearer <token>` as a default header.
    pub fn new(
        base_url: &str,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|e| Error::InvalidCredential(e.to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = transport.build_client_with_headers(headers)?;
        let base_url = normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        handle_response(resp).await
    }

    async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        handle_response(resp).await.map(Some)
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        handle_response(resp).await
    }

    async fn post_no_response<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        handle_empty(resp).await
    }

    async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        handle_empty(resp).await
    }

    // ── Pagination helper ────────────────────────────────────────────

    /// Walk `page=1..` until `page * perPage >= total` and collect every item.
    ///
    /// Any failing page aborts the whole listing; pages already fetched
    /// are dropped with it.
    async fn paginate_all<T, F>(&self, path: &str, pick: F) -> Result<Vec<T>, Error>
    where
        F: Fn(Page) -> Vec<T>,
    {
        let mut all = Vec::new();
        let mut page: u64 = 1;

        loop {
            let envelope: Page = self
                .get_with_params(
                    path,
                    &[("page", page.to_string()), ("perPage", PER_PAGE.to_string())],
                )
                .await?;
            let total = envelope.total;
            let items = pick(envelope);
            let received = items.len();
            all.extend(items);

            // An empty page past the reported total would otherwise spin forever.
            if page * PER_PAGE >= total || received == 0 {
                break;
            }
            page += 1;
        }

        Ok(all)
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Apps ─────────────────────────────────────────────────────────

    pub async fn list_apps(&self) -> Result<Vec<App>, Error> {
        self.paginate_all("1/nwk/apps", |page| page.apps).await
    }

    // ── Devices ──────────────────────────────────────────────────────

    /// List every device of one app, stamping `app_id` on each.
    pub async fn list_devices(&self, app_id: &str) -> Result<Vec<Device>, Error> {
        let mut devices = self
            .paginate_all(&format!("1/nwk/app/{app_id}/devices"), |page| page.devices)
            .await?;
        for device in &mut devices {
            device.app_id = app_id.to_owned();
        }
        Ok(devices)
    }

    /// Point lookup. A 404 is `Ok(None)`, not an error.
    pub async fn get_device(&self, app_id: &str, dev_eui: &str) -> Result<Option<Device>, Error> {
        let device: Option<Device> = self
            .get_optional(&format!("1/nwk/app/{app_id}/device/{dev_eui}"))
            .await?;
        Ok(device.map(|mut d| {
            d.app_id = app_id.to_owned();
            d
        }))
    }

    /// Register a new OTAA device. Never retried: a duplicate would clash
    /// with the device's identity.
    pub async fn create_device(
        &self,
        app_id: &str,
        request: &CreateDeviceRequest,
    ) -> Result<Device, Error> {
        let mut device: Device = self
            .post(&format!("1/nwk/app/{app_id}/devices/otaa"), request)
            .await?;
        device.app_id = app_id.to_owned();
        Ok(device)
    }

    /// Post the mutable fields (title, description) of `device`.
    pub async fn update_device(&self, device: &Device) -> Result<(), Error> {
        self.post_no_response(
            &format!("1/nwk/app/{}/device/{}", device.app_id, device.dev_eui),
            &UpdateDeviceRequest::from(device),
        )
        .await
    }

    pub async fn delete_device(&self, device: &Device) -> Result<(), Error> {
        self.delete(&format!(
            "1/nwk/app/{}/device/{}",
            device.app_id, device.dev_eui
        ))
        .await
    }
}
