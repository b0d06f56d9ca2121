//! Conformance tests for delivery status updates.

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fulfillment_adapter::delivery::{AdapterConfig, DeliveryClient, StatusUpdateRequest};
use fulfillment_adapter::fixtures::FixtureDir;

fn test_client(server: &MockServer) -> DeliveryClient {
    DeliveryClient::new_with_base_url(AdapterConfig::default(), &server.uri())
}

fn fixtures() -> FixtureDir {
    FixtureDir::new(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures"))
}

/// A dispatched update is ACKed; the wire body must match the recorded shape.
#[tokio::test]
async fn test_status_update_acked() {
    let server = MockServer::start().await;

    let expected_body = json!({
        "type": "update",
        "items": [
            {
                "id": "6059855129",
                "external": "15aaedf-b9b3-416e-937e-43329ab221cb",
                "status": "dispatched"
            }
        ]
    });

    Mock::given(method("POST"))
        .and(path("/brand/ARB/delivery"))
        .and(header("channel-id", "WEBOA"))
        .and(header("sub-channel-id", "WEB"))
        .and(body_json(&expected_body))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ACK"})))
        .expect(1)
        .mount(&server)
        .await;

    let update =
        StatusUpdateRequest::dispatched("6059855129", "15aaedf-b9b3-416e-937e-43329ab221cb");
    let client = test_client(&server);
    let resp = client.update_delivery_status("ARB", &update).await.unwrap();
    assert!(resp.is_ack());
}

/// The canned fixture body produces the same ACK.
#[tokio::test]
async fn test_status_update_from_fixture() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/brand/ARB/delivery"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ACK"})))
        .expect(1)
        .mount(&server)
        .await;

    let text = fixtures().load_request("UpdateDeliveryStatus.json").unwrap();
    let update: StatusUpdateRequest = serde_json::from_str(&text).unwrap();
    assert_eq!(update.update_type, "update");
    assert_eq!(update.items[0].status, "dispatched");

    let client = test_client(&server);
    let resp = client.update_delivery_status("ARB", &update).await.unwrap();
    assert!(resp.is_ack());
}

/// The known-bad fixture draws a 400 whose body carries the error fields.
#[tokio::test]
async fn test_status_update_invalid_fixture_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/brand/ARB/delivery"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errorMessage": "items[0] is missing required field 'external'",
            "errors": ["items[0].external is required", "items[0].status 'teleported' is not a known status"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let body = fixtures().load_request("InvalidStatusUpdate.json").unwrap();
    let client = test_client(&server);
    let (status, parsed) = client.post_raw("/brand/ARB/delivery", &body).await.unwrap();

    assert_eq!(status.as_u16(), 400);
    let parsed = parsed.expect("error body should be JSON");
    assert!(parsed["errorMessage"]
        .as_str()
        .unwrap()
        .contains("external"));
    assert_eq!(parsed["errors"].as_array().unwrap().len(), 2);
}
