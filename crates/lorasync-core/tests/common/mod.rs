// Shared fixtures for engine integration tests.
#![allow(dead_code, clippy::unwrap_used)]

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lorasync_api::{PlatformClient, TransportConfig};
use lorasync_core::{
    AssetSettings, AssociationRecorder, MemoryAssociationStore, MemoryConfigStore, Reconciler,
    TenantConfig, TenantFanout,
};

pub const EUI: &str = "0123456789ABCDEF";

pub struct Harness {
    pub server: MockServer,
    pub fanout: Arc<TenantFanout>,
    pub configs: Arc<MemoryConfigStore>,
    pub associations: Arc<MemoryAssociationStore>,
}

pub fn tenant(id: i64, base_url: &str, projects: &[&str]) -> TenantConfig {
    TenantConfig {
        id,
        enabled: true,
        active: false,
        api_base_url: base_url.to_owned(),
        api_token: SecretString::from(format!("token-{id}")),
        request_timeout: Duration::from_secs(5),
        refresh_interval: Duration::from_secs(60),
        user_id: "90".into(),
        project_ids: projects.iter().map(ToString::to_string).collect::<BTreeSet<_>>(),
    }
}

/// Network server and platform share one mock server: the network API
/// lives under `/1/nwk`, the platform under `/v2`.
pub async fn harness(tenants: impl FnOnce(&str) -> Vec<TenantConfig>) -> Harness {
    let server = MockServer::start().await;
    let configs = Arc::new(MemoryConfigStore::new(tenants(&server.uri())));
    let associations = Arc::new(MemoryAssociationStore::new());

    let platform = PlatformClient::new(
        &format!("{}/v2", server.uri()),
        &SecretString::from("platform-key".to_string()),
        &TransportConfig::default(),
    )
    .unwrap();
    let reconciler = Reconciler::new(
        Arc::new(platform),
        AssociationRecorder::new(associations.clone()),
        AssetSettings::default(),
    );
    let fanout = Arc::new(TenantFanout::new(configs.clone(), reconciler));

    Harness {
        server,
        fanout,
        configs,
        associations,
    }
}

pub async fn mount_apps(server: &MockServer, hex_ids: &[&str]) {
    let apps: Vec<_> = hex_ids
        .iter()
        .enumerate()
        .map(|(i, hex)| json!({ "_id": i, "appHexId": hex, "name": format!("app-{hex}") }))
        .collect();
    Mock::given(method("GET"))
        .and(path("/1/nwk/apps"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "apps": apps, "total": hex_ids.len(), "page": 1, "perPage": 100
        })))
        .mount(server)
        .await;
}

pub fn device_json(eui: &str, title: &str) -> serde_json::Value {
    json!({ "_id": eui.to_lowercase(), "deveui": eui, "title": title, "description": "" })
}

pub async fn mount_notifications(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v2/notifications"))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
}

/// Any other device lookup answers 404.
pub async fn mount_device_fallback_404(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/1/nwk/app/[^/]+/device/[^/]+$"))
        .respond_with(ResponseTemplate::new(404))
        .with_priority(10)
        .mount(server)
        .await;
}
