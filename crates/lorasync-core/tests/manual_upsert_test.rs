#![allow(clippy::unwrap_used)]
// Manual device upsert scenarios, against wiremock.

mod common;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{EUI, device_json, harness, tenant};
use lorasync_core::{AssetChange, CoreError, UpsertDeviceRequest};

fn request() -> UpsertDeviceRequest {
    UpsertDeviceRequest {
        dev_eui: EUI.into(),
        app_id: "A1".into(),
        asset_type_name: "lorawan_device".into(),
        title: Some("Sensor A".into()),
        app_key: Some("00112233445566778899AABBCCDDEEFF".into()),
        ..UpsertDeviceRequest::default()
    }
}

async fn mount_platform_assets(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v2/assets"))
        .and(query_param("assetTypeName", "lorasync_root"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "projectId": "P1", "assetType": "lorasync_root" }
        ])))
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v2/assets"))
        .and(query_param("identifyBy", "deviceId"))
        .and(body_partial_json(json!({
            "globalAssetIdentifier": "Sensor A CDEF",
            "parentLocationalAssetId": 1,
            "deviceIds": [EUI]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42, "projectId": "P1", "globalAssetIdentifier": "Sensor A CDEF",
            "assetType": "lorawan_device", "deviceIds": [EUI]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn absent_device_is_created_and_linked() {
    let h = harness(|uri| vec![tenant(1, uri, &["P1"])]).await;
    mount_platform_assets(&h.server).await;

    Mock::given(method("GET"))
        .and(path(format!("/1/nwk/app/A1/device/{EUI}")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/1/nwk/app/A1/devices/otaa"))
        .and(body_partial_json(json!({
            "deveui": EUI,
            "appkey": "00112233445566778899AABBCCDDEEFF",
            "title": "Sensor A"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_json(EUI, "Sensor A")))
        .expect(1)
        .mount(&h.server)
        .await;

    let rows = h.fanout.upsert_device(&request()).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].asset_id, 42);
    assert_eq!(rows[0].app_id, "A1");
    assert_eq!(rows[0].last_status, AssetChange::Created);
}

#[tokio::test]
async fn repeated_upsert_yields_the_same_row() {
    let h = harness(|uri| vec![tenant(1, uri, &["P1"])]).await;
    mount_platform_assets(&h.server).await;

    Mock::given(method("GET"))
        .and(path(format!("/1/nwk/app/A1/device/{EUI}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_json(EUI, "old")))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/1/nwk/app/A1/device/{EUI}")))
        .and(body_partial_json(json!({ "title": "Sensor A" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/1/nwk/app/A1/devices/otaa"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;

    let first = h.fanout.upsert_device(&request()).await.unwrap();
    let second = h.fanout.upsert_device(&request()).await.unwrap();

    assert_eq!(first.len(), 1);
    assert_eq!(
        (&first[0].app_id, &first[0].dev_eui, first[0].asset_id),
        (&second[0].app_id, &second[0].dev_eui, second[0].asset_id)
    );
    assert_eq!(h.associations.len(), 1);
}

#[tokio::test]
async fn invalid_eui_fails_before_any_call() {
    let h = harness(|uri| vec![tenant(1, uri, &["P1"])]).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;

    let mut req = request();
    req.dev_eui = "not-an-eui".into();
    let err = h.fanout.upsert_device(&req).await.unwrap_err();

    assert!(matches!(err, CoreError::Validation { .. }));
}

#[tokio::test]
async fn no_enabled_configuration_is_an_error() {
    let h = harness(|uri| {
        let mut t = tenant(1, uri, &["P1"]);
        t.enabled = false;
        vec![t]
    })
    .await;

    let err = h.fanout.upsert_device(&request()).await.unwrap_err();
    assert!(matches!(err, CoreError::NoMatchingConfiguration));
}

#[tokio::test]
async fn config_filter_selects_one_tenant() {
    let h = harness(|uri| vec![tenant(1, uri, &["P1"]), tenant(2, uri, &["P1"])]).await;

    let mut req = request();
    req.config_id = Some(9);
    let err = h.fanout.upsert_device(&req).await.unwrap_err();
    assert!(matches!(err, CoreError::NoMatchingConfiguration));
}

#[tokio::test]
async fn upstream_failure_propagates_with_tenant() {
    let h = harness(|uri| vec![tenant(3, uri, &["P1"])]).await;
    Mock::given(method("GET"))
        .and(path(format!("/1/nwk/app/A1/device/{EUI}")))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
        .mount(&h.server)
        .await;

    let err = h.fanout.upsert_device(&request()).await.unwrap_err();

    match err {
        CoreError::Upstream {
            tenant_id, status, url, ..
        } => {
            assert_eq!(tenant_id, 3);
            assert_eq!(status, Some(401));
            assert!(url.unwrap().ends_with(&format!("/1/nwk/app/A1/device/{EUI}")));
        }
        other => panic!("unexpected {other:?}"),
    }
}
