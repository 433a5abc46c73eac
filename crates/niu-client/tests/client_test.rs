//! Integration tests driving a real `NiuClient` against the mock vendor.

use std::time::Duration;

use niu_client::testing::{Behavior, Endpoint, MockVendor};
use niu_client::{password_digest, ClientError};
use serde_json::json;

#[tokio::test]
async fn login_returns_session_token() {
    let vendor = MockVendor::start().await.unwrap();
    let client = vendor.client().unwrap();

    let session = client.login("user@example.com", "hunter2").await.unwrap();
    assert_eq!(session.token(), "test-access-token");
}

#[tokio::test]
async fn login_sends_digested_password_and_fixed_grant() {
    let vendor = MockVendor::start().await.unwrap();
    let client = vendor.client().unwrap();

    client.login("user@example.com", "hunter2").await.unwrap();

    let form = vendor.last_login_form().expect("login request recorded");
    assert_eq!(form["account"], "user@example.com");
    // The plaintext never crosses the wire, only its legacy digest.
    assert_eq!(form["password"], password_digest("hunter2"));
    assert_eq!(form["grant_type"], "password");
    assert_eq!(form["scope"], "base");
    assert_eq!(form["app_id"], "niu_ktdrr960");
}

#[tokio::test]
async fn login_http_error_is_auth_failure() {
    let vendor = MockVendor::start().await.unwrap();
    vendor.set_behavior(Endpoint::Login, Behavior::HttpStatus(401));
    let client = vendor.client().unwrap();

    let err = client.login("user@example.com", "wrong").await.unwrap_err();
    assert!(matches!(err, ClientError::AuthFailed(_)), "{err}");
}

#[tokio::test]
async fn login_malformed_body_is_auth_failure() {
    let vendor = MockVendor::start().await.unwrap();
    vendor.set_behavior(Endpoint::Login, Behavior::MalformedBody);
    let client = vendor.client().unwrap();

    let err = client.login("user@example.com", "pw").await.unwrap_err();
    assert!(matches!(err, ClientError::AuthFailed(_)), "{err}");
}

#[tokio::test]
async fn login_missing_token_is_auth_failure() {
    let vendor = MockVendor::start().await.unwrap();
    vendor.set_payload(Endpoint::Login, json!({ "status": 0, "data": {} }));
    let client = vendor.client().unwrap();

    let err = client.login("user@example.com", "pw").await.unwrap_err();
    assert!(matches!(err, ClientError::AuthFailed(_)), "{err}");
}

#[tokio::test]
async fn vehicle_listing_resolves_by_index() {
    let vendor = MockVendor::start().await.unwrap();
    let client = vendor.client().unwrap();
    let session = client.login("user@example.com", "pw").await.unwrap();

    let list = client.list_vehicles(&session).await.unwrap();
    assert_eq!(list.vehicles().len(), 2);

    let vehicle = list.select(1).unwrap();
    assert_eq!(vehicle.serial_number, "SN0002");
    assert_eq!(vehicle.display_name, "Spare");
    assert_eq!(vehicle.sku_name.as_deref(), Some("NQi GT"));
}

#[tokio::test]
async fn vehicle_index_out_of_range_is_not_found() {
    let vendor = MockVendor::start().await.unwrap();
    let client = vendor.client().unwrap();
    let session = client.login("user@example.com", "pw").await.unwrap();

    let list = client.list_vehicles(&session).await.unwrap();
    let err = list.select(5).unwrap_err();
    assert!(
        matches!(err, ClientError::VehicleNotFound { index: 5, count: 2 }),
        "{err}"
    );
}

#[tokio::test]
async fn battery_info_returns_vendor_payload() {
    let vendor = MockVendor::start().await.unwrap();
    let client = vendor.client().unwrap();
    let session = client.login("user@example.com", "pw").await.unwrap();

    let body = client.battery_info(&session, "SN0001").await.unwrap();
    assert_eq!(body["status"], json!(0));
    assert_eq!(
        body["data"]["batteries"]["compartmentA"]["temperature"],
        json!(28)
    );
}

#[tokio::test]
async fn non_200_telemetry_response_is_server_error() {
    let vendor = MockVendor::start().await.unwrap();
    vendor.set_behavior(Endpoint::MotorIndex, Behavior::HttpStatus(503));
    let client = vendor.client().unwrap();
    let session = client.login("user@example.com", "pw").await.unwrap();

    let err = client.motor_index(&session, "SN0001").await.unwrap_err();
    assert!(matches!(err, ClientError::ServerError { status: 503 }), "{err}");
}

#[tokio::test]
async fn nonzero_vendor_status_is_rejected() {
    let vendor = MockVendor::start().await.unwrap();
    vendor.set_behavior(Endpoint::OverallTally, Behavior::VendorStatus(1131));
    let client = vendor.client().unwrap();
    let session = client.login("user@example.com", "pw").await.unwrap();

    let err = client.overall_tally(&session, "SN0001").await.unwrap_err();
    assert!(matches!(err, ClientError::VendorStatus(1131)), "{err}");
}

#[tokio::test]
async fn missing_vendor_status_is_a_parse_failure() {
    let vendor = MockVendor::start().await.unwrap();
    vendor.set_payload(Endpoint::Battery, json!({ "data": {} }));
    let client = vendor.client().unwrap();
    let session = client.login("user@example.com", "pw").await.unwrap();

    let err = client.battery_info(&session, "SN0001").await.unwrap_err();
    assert!(matches!(err, ClientError::Parse(_)), "{err}");
}

#[tokio::test]
async fn malformed_telemetry_body_is_a_parse_failure() {
    let vendor = MockVendor::start().await.unwrap();
    vendor.set_behavior(Endpoint::TrackList, Behavior::MalformedBody);
    let client = vendor.client().unwrap();
    let session = client.login("user@example.com", "pw").await.unwrap();

    let err = client.track_list(&session, "SN0001").await.unwrap_err();
    assert!(matches!(err, ClientError::Parse(_)), "{err}");
}

#[tokio::test]
async fn slow_vendor_times_out() {
    let vendor = MockVendor::start().await.unwrap();
    vendor.set_behavior(Endpoint::Battery, Behavior::Delay(Duration::from_millis(500)));
    let client = vendor
        .client_with_timeout(Duration::from_millis(50))
        .unwrap();
    let session = client.login("user@example.com", "pw").await.unwrap();

    let err = client.battery_info(&session, "SN0001").await.unwrap_err();
    match err {
        ClientError::Http(inner) => assert!(inner.is_timeout(), "{inner}"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn track_list_requests_first_page_of_ten() {
    let vendor = MockVendor::start().await.unwrap();
    let client = vendor.client().unwrap();
    let session = client.login("user@example.com", "pw").await.unwrap();

    client.track_list(&session, "SN0001").await.unwrap();

    let request = vendor.last_track_request().expect("track request recorded");
    assert_eq!(request["index"], json!("0"));
    assert_eq!(request["pagesize"], json!(10));
    assert_eq!(request["sn"], json!("SN0001"));
}
