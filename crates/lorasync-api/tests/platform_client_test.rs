#![allow(clippy::unwrap_used)]
// Integration tests for `PlatformClient` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lorasync_api::platform::types::{Asset, Notification, Translation};
use lorasync_api::{PlatformClient, TransportConfig};

async fn setup() -> (MockServer, PlatformClient) {
    let server = MockServer::start().await;
    let client = PlatformClient::new(
        &format!("{}/v2", server.uri()),
        &SecretString::from("platform-key".to_string()),
        &TransportConfig::default(),
    )
    .unwrap();
    (server, client)
}

#[tokio::test]
async fn existing_root_asset_is_reused() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/assets"))
        .and(query_param("assetTypeName", "lorasync_root"))
        .and(header("X-API-Key", "platform-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 9, "projectId": "P2", "assetType": "lorasync_root" },
            { "id": 10, "projectId": "P1", "assetType": "lorasync_root" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v2/assets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let root = client
        .ensure_root_asset("P1", "lorasync_root", "LoRaWAN")
        .await
        .unwrap();
    assert_eq!(root.id, Some(10));
}

#[tokio::test]
async fn device_asset_is_put_below_new_root() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/assets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v2/assets"))
        .and(body_partial_json(json!({ "assetType": "lorasync_root", "projectId": "P1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 10, "projectId": "P1", "assetType": "lorasync_root"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v2/assets"))
        .and(query_param("identifyBy", "deviceId"))
        .and(body_partial_json(json!({
            "deviceIds": ["0123456789ABCDEF"],
            "parentLocationalAssetId": 10
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "projectId": "P1",
            "globalAssetIdentifier": "Sensor A CDEF",
            "assetType": "lorawan_device",
            "deviceIds": ["0123456789ABCDEF"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let asset = client
        .upsert_device_asset(
            Asset {
                project_id: "P1".into(),
                global_asset_identifier: "Sensor A CDEF".into(),
                name: Some("Sensor A".into()),
                asset_type: "lorawan_device".into(),
                device_ids: vec!["0123456789ABCDEF".into()],
                ..Asset::default()
            },
            "lorasync_root",
            "LoRaWAN",
        )
        .await
        .unwrap();

    assert_eq!(asset.id, Some(42));
}

#[tokio::test]
async fn notify_posts_translation() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v2/notifications"))
        .and(body_partial_json(json!({
            "user": "90",
            "projectId": "P1",
            "message": { "en": "hello" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    client
        .notify(&Notification {
            user: "90".into(),
            project_id: Some("P1".into()),
            message: Translation {
                de: Some("hallo".into()),
                en: Some("hello".into()),
            },
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn notify_failure_surfaces_status() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v2/notifications"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client
        .notify(&Notification {
            user: "90".into(),
            project_id: None,
            message: Translation::default(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));
}
