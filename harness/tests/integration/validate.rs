//! Conformance tests for the validate endpoint.

use chrono::{Duration, Utc};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fulfillment_adapter::checks;
use fulfillment_adapter::delivery::{AdapterConfig, DeliveryClient};

fn ts(minutes_from_now: i64) -> String {
    (Utc::now() + Duration::minutes(minutes_from_now)).to_rfc3339()
}

fn validate_request() -> serde_json::Value {
    json!({
        "dropoffDetails": {"address": {"cityName": "OKLAHOMA CITY", "zipCode": "73103"}},
        "requestedTime": "2031-05-04T19:00:00Z"
    })
}

/// Happy path: both pickup locations come back with their exact city
/// spellings, and the promised delivery time is after the first pickup.
#[tokio::test]
async fn test_validate_pickup_locations_and_ordering() {
    let server = MockServer::start().await;

    let first_pickup = ts(25);
    let delivery = ts(60);
    Mock::given(method("POST"))
        .and(path("/brand/SDI/delivery/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pickupLocations": [
                {
                    "id": "9972",
                    "time": first_pickup,
                    "contactDetails": {
                        "address": {"line1": "6801 N May Ave", "cityName": "OKLAHOMA CITY", "state": "OK"}
                    }
                },
                {
                    "id": "9974",
                    "time": ts(40),
                    "contactDetails": {
                        "address": {"line1": "1207 SW 59th St", "cityName": "Oklahoma City", "state": "OK"}
                    }
                }
            ],
            "deliveryDetails": {"time": delivery}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = DeliveryClient::new_with_base_url(AdapterConfig::default(), &server.uri());
    let resp = client.validate("SDI", &validate_request()).await.unwrap();

    assert!(checks::non_empty("pickupLocations", resp.pickup_locations.len()).passed);
    // The adapter reports the two stores with different city casing; the
    // contract check is exact equality on each
    assert!(checks::equals("pickupLocations[0].id", &resp.pickup_locations[0].id, "9972").passed);
    assert!(checks::equals("cityName[0]", resp.pickup_city(0).unwrap(), "OKLAHOMA CITY").passed);
    assert!(checks::equals("pickupLocations[1].id", &resp.pickup_locations[1].id, "9974").passed);
    assert!(checks::equals("cityName[1]", resp.pickup_city(1).unwrap(), "Oklahoma City").passed);
    assert!(!checks::equals("cityName[1]", resp.pickup_city(1).unwrap(), "OKLAHOMA CITY").passed);

    let delivery_time = resp.delivery_details.as_ref().unwrap().time.as_ref().unwrap();
    let pickup_time = resp.pickup_locations[0].time.as_ref().unwrap();
    assert!(checks::time_in_future("deliveryDetails.time", delivery_time).passed);
    assert!(checks::time_in_future("pickupLocations[0].time", pickup_time).passed);
    assert!(checks::time_after("delivery after pickup", delivery_time, pickup_time).passed);
}

/// The validate flow runs on the MOBILE sub-channel in one recorded
/// variant; the header must follow the configured identity.
#[tokio::test]
async fn test_validate_mobile_sub_channel_header() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/brand/SDI/delivery/validate"))
        .and(header("channel-id", "WEBOA"))
        .and(header("sub-channel-id", "MOBILE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pickupLocations": [{"id": "9972"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = AdapterConfig::default().with_sub_channel("MOBILE");
    let client = DeliveryClient::new_with_base_url(config, &server.uri());
    let resp = client.validate("SDI", &validate_request()).await.unwrap();
    assert_eq!(resp.pickup_locations.len(), 1);
}

/// No deliverable pickup locations: the non-empty check must fail.
#[tokio::test]
async fn test_validate_empty_locations_fail_check() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/brand/SDI/delivery/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pickupLocations": [],
            "deliveryDetails": {"time": ts(60)}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = DeliveryClient::new_with_base_url(AdapterConfig::default(), &server.uri());
    let resp = client.validate("SDI", &validate_request()).await.unwrap();

    let check = checks::non_empty("pickupLocations", resp.pickup_locations.len());
    assert!(!check.passed);
    assert!(resp.first_pickup().is_none());
}
