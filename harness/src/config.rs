//! Harness configuration.

use anyhow::Result;
use std::env;

use fulfillment_adapter::delivery::{AdapterConfig, ADAPTER_API_BASE};

pub const DEFAULT_BRAND_ID: &str = "SDI";
pub const DEFAULT_STATUS_BRAND_ID: &str = "ARB";
pub const DEFAULT_LOCATION_ID: &str = "123";

/// Which adapter environment the harness talks to, and as whom.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub base_url: String,
    /// Brand for the estimate/validate/schedule/cancel flow
    pub brand_id: String,
    /// Brand for status updates (a different brand in the recorded traffic)
    pub status_brand_id: String,
    pub location_id: String,
    pub adapter: AdapterConfig,
}

impl HarnessConfig {
    /// Load configuration from environment variables.
    ///
    /// Expects env vars to already be loaded (e.g., via dotenv by the caller).
    /// Optional: `ADAPTER_BASE_URL`, `BRAND_ID`, `STATUS_BRAND_ID`,
    /// `LOCATION_ID`, plus the channel identity read by
    /// [`AdapterConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        let base_url = env::var("ADAPTER_BASE_URL")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| ADAPTER_API_BASE.to_string());
        let brand_id = env::var("BRAND_ID").unwrap_or_else(|_| DEFAULT_BRAND_ID.to_string());
        let status_brand_id =
            env::var("STATUS_BRAND_ID").unwrap_or_else(|_| DEFAULT_STATUS_BRAND_ID.to_string());
        let location_id =
            env::var("LOCATION_ID").unwrap_or_else(|_| DEFAULT_LOCATION_ID.to_string());

        let config = Self {
            base_url,
            brand_id,
            status_brand_id,
            location_id,
            adapter: AdapterConfig::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            anyhow::bail!("ADAPTER_BASE_URL must be an http(s) URL: {}", self.base_url);
        }
        for (name, value) in [
            ("BRAND_ID", &self.brand_id),
            ("STATUS_BRAND_ID", &self.status_brand_id),
            ("LOCATION_ID", &self.location_id),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("{} must not be empty", name);
            }
        }
        Ok(())
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: ADAPTER_API_BASE.to_string(),
            brand_id: DEFAULT_BRAND_ID.to_string(),
            status_brand_id: DEFAULT_STATUS_BRAND_ID.to_string(),
            location_id: DEFAULT_LOCATION_ID.to_string(),
            adapter: AdapterConfig::default(),
        }
    }
}
