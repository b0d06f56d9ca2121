//! Wire types for the fulfillment adapter.
//!
//! Request bodies for the flow endpoints (estimate, validate, schedule,
//! cancel) are opaque canned payloads owned by the adapter, so they travel
//! as raw JSON. Responses are asserted on field-by-field and get full
//! types here. Unknown extra fields are tolerated everywhere.

use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Status Update
// ============================================================================

/// Body for `POST /brand/{brandId}/delivery`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    #[serde(rename = "type")]
    pub update_type: String,
    pub items: Vec<StatusUpdateItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateItem {
    pub id: String,
    pub external: String,
    pub status: String,
}

impl StatusUpdateRequest {
    /// Single-item "dispatched" update, the shape the adapter ACKs.
    pub fn dispatched(id: &str, external: &str) -> Self {
        Self {
            update_type: "update".to_string(),
            items: vec![StatusUpdateItem {
                id: id.to_string(),
                external: external.to_string(),
                status: "dispatched".to_string(),
            }],
        }
    }
}

/// Response to a status update.
#[derive(Debug, Clone, Deserialize)]
pub struct AckResponse {
    pub message: String,
}

impl AckResponse {
    pub fn is_ack(&self) -> bool {
        self.message == "ACK"
    }
}

// ============================================================================
// Estimate
// ============================================================================

/// Response from `POST /brand/{brandId}/delivery/estimate`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResponse {
    /// ISO 8601, expected to be in the future
    pub pickup_time: String,
    /// ISO 8601, expected after `pickup_time`
    pub delivery_time: String,
    pub fee: f64,
    pub currency: String,
    pub id: i64,
}

impl EstimateResponse {
    pub fn has_positive_fee(&self) -> bool {
        self.fee > 0.0
    }

    pub fn has_valid_id(&self) -> bool {
        self.id > 0
    }
}

// ============================================================================
// Validate
// ============================================================================

/// Response from `POST /brand/{brandId}/delivery/validate`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    #[serde(default)]
    pub pickup_locations: Vec<PickupLocation>,
    #[serde(default)]
    pub delivery_details: Option<DeliveryDetails>,
}

impl ValidateResponse {
    pub fn first_pickup(&self) -> Option<&PickupLocation> {
        self.pickup_locations.first()
    }

    /// City name of the n-th pickup location, if present.
    pub fn pickup_city(&self, n: usize) -> Option<&str> {
        self.pickup_locations
            .get(n)
            .and_then(|loc| loc.contact_details.as_ref())
            .and_then(|cd| cd.address.as_ref())
            .and_then(|addr| addr.city_name.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupLocation {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Earliest pickup time at this location, ISO 8601
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub contact_details: Option<ContactDetails>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetails {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub line1: Option<String>,
    #[serde(default)]
    pub city_name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDetails {
    /// Promised delivery time, ISO 8601
    #[serde(default)]
    pub time: Option<String>,
}

// ============================================================================
// Schedule
// ============================================================================

/// Response from `POST /brand/{brandId}/location/{locationId}/delivery`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    /// The adapter has returned this both as a number and as a string;
    /// normalized to `String` so it can be spliced into the cancel path.
    #[serde(deserialize_with = "string_or_number")]
    pub delivery_id: String,
    pub status: String,
    pub dasher_status: String,
    #[serde(default)]
    pub status_url: Option<String>,
    #[serde(default)]
    pub estimated_pickup_time: Option<String>,
    #[serde(default)]
    pub estimated_delivery_time: Option<String>,
}

impl ScheduleResponse {
    pub fn is_scheduled(&self) -> bool {
        self.status == "scheduled"
    }

    pub fn is_unassigned(&self) -> bool {
        self.dasher_status == "unassigned"
    }
}

// ============================================================================
// Cancel
// ============================================================================

/// Response from `POST /brand/{brandId}/delivery/{deliveryId}/cancel`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelResponse {
    pub return_initiated: bool,
    pub cancelled_at: String,
}

impl CancelResponse {
    pub fn confirms_return(&self) -> bool {
        self.return_initiated
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error body the adapter returns on 400/500.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterError {
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub errors: Option<serde_json::Value>,
}

// ============================================================================
// Helpers
// ============================================================================

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Str(String),
        Num(i64),
    }

    Ok(match Wire::deserialize(deserializer)? {
        Wire::Str(s) => s,
        Wire::Num(n) => n.to_string(),
    })
}
