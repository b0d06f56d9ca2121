//! Conformance tests for the schedule endpoint.

use chrono::{Duration, Utc};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fulfillment_adapter::checks;
use fulfillment_adapter::delivery::{AdapterConfig, DeliveryClient};

fn test_client(server: &MockServer) -> DeliveryClient {
    DeliveryClient::new_with_base_url(AdapterConfig::default(), &server.uri())
}

fn ts(minutes_from_now: i64) -> String {
    (Utc::now() + Duration::minutes(minutes_from_now)).to_rfc3339()
}

fn schedule_request() -> serde_json::Value {
    json!({
        "externalOrderId": "15aaedf-b9b3-416e-937e-43329ab221cb",
        "pickupDetails": {"locationId": "9972"},
        "requestedTime": "2031-05-04T18:30:00Z"
    })
}

/// A freshly scheduled delivery is "scheduled" with no dasher yet.
#[tokio::test]
async fn test_schedule_conformant_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/brand/SDI/location/123/delivery"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deliveryId": 42137,
            "status": "scheduled",
            "dasherStatus": "unassigned",
            "statusUrl": "https://track.example.com/d/42137",
            "estimatedPickupTime": ts(20),
            "estimatedDeliveryTime": ts(55)
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let resp = client
        .schedule("SDI", "123", &schedule_request())
        .await
        .unwrap();

    // Numeric deliveryId is normalized so it can be spliced into the cancel path
    assert_eq!(resp.delivery_id, "42137");
    assert!(resp.is_scheduled());
    assert!(resp.is_unassigned());
    assert!(checks::equals("status", &resp.status, "scheduled").passed);
    assert!(checks::equals("dasherStatus", &resp.dasher_status, "unassigned").passed);
    assert!(checks::present("statusUrl", &resp.status_url).passed);
    assert!(checks::time_in_future(
        "estimatedPickupTime",
        resp.estimated_pickup_time.as_deref().unwrap()
    )
    .passed);
}

/// Some adapter deployments answer 201 on create; any success status counts.
#[tokio::test]
async fn test_schedule_accepts_201() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/brand/SDI/location/123/delivery"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "deliveryId": "d-7781",
            "status": "scheduled",
            "dasherStatus": "unassigned"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let resp = client
        .schedule("SDI", "123", &schedule_request())
        .await
        .unwrap();
    assert_eq!(resp.delivery_id, "d-7781");
    assert!(resp.status_url.is_none());
}

/// A 500 from the adapter surfaces status and body.
#[tokio::test]
async fn test_schedule_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/brand/SDI/location/123/delivery"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "errorMessage": "no couriers available for location 123"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client
        .schedule("SDI", "123", &schedule_request())
        .await
        .unwrap_err()
        .to_string();
    assert!(err.contains("500"), "unexpected error: {}", err);
    assert!(err.contains("no couriers available"), "unexpected error: {}", err);
}
