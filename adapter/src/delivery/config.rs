//! Adapter endpoint constants and call identity.

// === API Constants ===

pub const ADAPTER_API_BASE: &str = "https://fulfillment-adapter-v1.snc-api.qa.irb.digital";

pub const DEFAULT_CHANNEL_ID: &str = "WEBOA";
pub const DEFAULT_SUB_CHANNEL_ID: &str = "WEB";

// === Call Identity ===

/// Channel identity the adapter expects on every request.
///
/// Sent as the `channel-id` / `sub-channel-id` headers. The adapter routes
/// and rate-limits by these, so they are part of the contract under test.
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    pub channel_id: String,
    pub sub_channel_id: String,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            channel_id: DEFAULT_CHANNEL_ID.to_string(),
            sub_channel_id: DEFAULT_SUB_CHANNEL_ID.to_string(),
        }
    }
}

impl AdapterConfig {
    /// Load the channel identity from environment variables.
    ///
    /// Expects env vars to already be loaded (e.g., via dotenv by the caller).
    /// Optional: `ADAPTER_CHANNEL_ID`, `ADAPTER_SUB_CHANNEL_ID`.
    pub fn from_env() -> Self {
        let channel_id = std::env::var("ADAPTER_CHANNEL_ID")
            .unwrap_or_else(|_| DEFAULT_CHANNEL_ID.to_string());
        let sub_channel_id = std::env::var("ADAPTER_SUB_CHANNEL_ID")
            .unwrap_or_else(|_| DEFAULT_SUB_CHANNEL_ID.to_string());
        Self {
            channel_id,
            sub_channel_id,
        }
    }

    /// Same identity on a different sub-channel (the validate flow runs as
    /// `MOBILE` in one of the recorded variants).
    pub fn with_sub_channel(mut self, sub_channel_id: &str) -> Self {
        self.sub_channel_id = sub_channel_id.to_string();
        self
    }
}
