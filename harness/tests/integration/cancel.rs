//! Conformance tests for the cancel endpoint.

use serde_json::json;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fulfillment_adapter::checks;
use fulfillment_adapter::delivery::{AdapterConfig, DeliveryClient};

fn test_client(server: &MockServer) -> DeliveryClient {
    DeliveryClient::new_with_base_url(AdapterConfig::default(), &server.uri())
}

fn cancel_request() -> serde_json::Value {
    json!({"reason": "CUSTOMER_REQUEST"})
}

/// Cancelling a scheduled delivery initiates a return and stamps the time.
#[tokio::test]
async fn test_cancel_conformant_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/brand/SDI/delivery/42137/cancel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "returnInitiated": true,
            "cancelledAt": "2026-02-11T16:44:09Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let resp = client
        .cancel("SDI", "42137", &cancel_request())
        .await
        .unwrap();

    assert!(resp.confirms_return());
    assert!(checks::holds("returnInitiated", resp.confirms_return()).passed);
    assert!(checks::holds("cancelledAt", !resp.cancelled_at.is_empty()).passed);
}

/// An empty delivery id is rejected before any request goes out.
#[tokio::test]
async fn test_cancel_empty_delivery_id_never_hits_the_wire() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(r"^/brand/SDI/delivery/.*/cancel$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client
        .cancel("SDI", "", &cancel_request())
        .await
        .unwrap_err()
        .to_string();
    assert!(err.contains("must not be empty"), "unexpected error: {}", err);
}

/// Return not initiated: the typed field comes through and the check fails.
#[tokio::test]
async fn test_cancel_without_return() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/brand/SDI/delivery/42138/cancel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "returnInitiated": false,
            "cancelledAt": "2026-02-11T16:44:09Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let resp = client
        .cancel("SDI", "42138", &cancel_request())
        .await
        .unwrap();
    assert!(!resp.confirms_return());
    assert!(!checks::holds("returnInitiated", resp.confirms_return()).passed);
}
