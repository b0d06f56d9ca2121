//! Conformance scenarios against a live (or mocked) adapter.
//!
//! Each scenario loads its canned request body, issues the call, and
//! evaluates the contract checks. HTTP failures abort a scenario; failed
//! checks do not — the run records them all and the report decides the
//! exit status.

use anyhow::{Context, Result};
use tracing::{info, warn};

use fulfillment_adapter::checks::{self, CheckSet};
use fulfillment_adapter::delivery::{DeliveryClient, EstimateResponse, StatusUpdateRequest};
use fulfillment_adapter::fixtures::FixtureDir;

use crate::config::HarnessConfig;

// Canned request bodies, named after the recorded resources
const ESTIMATE_FIXTURE: &str = "PostEstimateRequest.json";
const VALIDATE_FIXTURE: &str = "PostValidateRequest.json";
const SCHEDULE_FIXTURE: &str = "PostScheduleRequest.json";
const CANCEL_FIXTURE: &str = "PostCancelRequest.json";
const STATUS_UPDATE_FIXTURE: &str = "UpdateDeliveryStatus.json";

// ============================================================================
// SCENARIOS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Estimate,
    Validate,
    Schedule,
    Cancel,
    StatusUpdate,
    EndToEnd,
}

impl Scenario {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "estimate" => Some(Self::Estimate),
            "validate" => Some(Self::Validate),
            "schedule" => Some(Self::Schedule),
            "cancel" => Some(Self::Cancel),
            "status-update" => Some(Self::StatusUpdate),
            "e2e" => Some(Self::EndToEnd),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Estimate => "estimate",
            Self::Validate => "validate",
            Self::Schedule => "schedule",
            Self::Cancel => "cancel",
            Self::StatusUpdate => "status-update",
            Self::EndToEnd => "e2e",
        }
    }
}

// ============================================================================
// REPORTS
// ============================================================================

/// One adapter call and its evaluated checks.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub name: &'static str,
    pub checks: CheckSet,
}

/// Everything a scenario run observed.
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub scenario: &'static str,
    pub steps: Vec<StepReport>,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.steps.iter().all(|s| s.checks.passed())
    }

    pub fn failure_count(&self) -> usize {
        self.steps.iter().map(|s| s.checks.failures().len()).sum()
    }

    /// Log one line per check and a summary line.
    pub fn log(&self) {
        for step in &self.steps {
            for check in step.checks.iter() {
                if check.passed {
                    info!("[RUNNER] {} / {}: ok", step.name, check.label);
                } else {
                    warn!(
                        "[RUNNER] {} / {}: FAILED ({})",
                        step.name,
                        check.label,
                        check.detail.as_deref().unwrap_or("no detail")
                    );
                }
            }
        }
        let total: usize = self.steps.iter().map(|s| s.checks.len()).sum();
        info!(
            "[RUNNER] scenario {} finished: {}/{} checks passed",
            self.scenario,
            total - self.failure_count(),
            total
        );
    }
}

// ============================================================================
// RUNNER
// ============================================================================

pub struct Runner {
    client: DeliveryClient,
    config: HarnessConfig,
    fixtures: FixtureDir,
}

impl Runner {
    pub fn new(config: HarnessConfig, fixtures: FixtureDir) -> Self {
        let client = DeliveryClient::new_with_base_url(config.adapter.clone(), &config.base_url);
        Self {
            client,
            config,
            fixtures,
        }
    }

    /// Run a scenario. `delivery_id` is required for standalone `cancel`
    /// and ignored everywhere else (end-to-end extracts its own).
    pub async fn run(&self, scenario: Scenario, delivery_id: Option<&str>) -> Result<ScenarioReport> {
        info!("[RUNNER] scenario {} against {}", scenario.name(), self.client.base_url());

        let steps = match scenario {
            Scenario::Estimate => vec![self.estimate_step().await?.0],
            Scenario::Validate => vec![self.validate_step().await?],
            Scenario::Schedule => vec![self.schedule_step().await?.0],
            Scenario::Cancel => {
                let id = delivery_id
                    .context("cancel requires --delivery-id (or run the e2e scenario)")?;
                vec![self.cancel_step(id).await?]
            }
            Scenario::StatusUpdate => vec![self.status_update_step().await?],
            Scenario::EndToEnd => {
                // estimate -> validate -> schedule -> cancel, threading the
                // deliveryId the adapter assigned at schedule time
                let (estimate, _) = self.estimate_step().await?;
                let validate = self.validate_step().await?;
                let (schedule, scheduled_id) = self.schedule_step().await?;
                let cancel = self.cancel_step(&scheduled_id).await?;
                vec![estimate, validate, schedule, cancel]
            }
        };

        Ok(ScenarioReport {
            scenario: scenario.name(),
            steps,
        })
    }

    // ========================================================================
    // STEPS
    // ========================================================================

    async fn estimate_step(&self) -> Result<(StepReport, EstimateResponse)> {
        let body = self.fixtures.load_request_json(ESTIMATE_FIXTURE)?;
        let resp = self.client.estimate(&self.config.brand_id, &body).await?;

        let mut set = CheckSet::new();
        set.push(checks::time_in_future("pickupTime", &resp.pickup_time));
        set.push(checks::time_in_future("deliveryTime", &resp.delivery_time));
        set.push(checks::time_after(
            "deliveryTime after pickupTime",
            &resp.delivery_time,
            &resp.pickup_time,
        ));
        set.push(checks::positive("fee", resp.fee));
        set.push(checks::equals("currency", &resp.currency, "USD"));
        set.push(checks::positive_int("id", resp.id));

        Ok((
            StepReport {
                name: "estimate",
                checks: set,
            },
            resp,
        ))
    }

    async fn validate_step(&self) -> Result<StepReport> {
        let body = self.fixtures.load_request_json(VALIDATE_FIXTURE)?;
        let resp = self.client.validate(&self.config.brand_id, &body).await?;

        let mut set = CheckSet::new();
        set.push(checks::non_empty(
            "pickupLocations",
            resp.pickup_locations.len(),
        ));

        let first_time = resp.first_pickup().and_then(|loc| loc.time.clone());
        if let Some(first) = resp.first_pickup() {
            set.push(checks::holds(
                "pickupLocations[0].contactDetails.address.cityName",
                resp.pickup_city(0).is_some(),
            ));
            set.push(checks::present("pickupLocations[0].time", &first.time));
            if let Some(time) = &first.time {
                set.push(checks::time_in_future("pickupLocations[0].time in future", time));
            }
        }

        let delivery_time = resp
            .delivery_details
            .as_ref()
            .and_then(|details| details.time.clone());
        set.push(checks::present("deliveryDetails.time", &delivery_time));
        if let Some(time) = &delivery_time {
            set.push(checks::time_in_future("deliveryDetails.time in future", time));
            if let Some(pickup) = &first_time {
                set.push(checks::time_after(
                    "deliveryDetails.time after pickupLocations[0].time",
                    time,
                    pickup,
                ));
            }
        }

        Ok(StepReport {
            name: "validate",
            checks: set,
        })
    }

    async fn schedule_step(&self) -> Result<(StepReport, String)> {
        let body = self.fixtures.load_request_json(SCHEDULE_FIXTURE)?;
        let resp = self
            .client
            .schedule(&self.config.brand_id, &self.config.location_id, &body)
            .await?;

        let mut set = CheckSet::new();
        set.push(checks::holds("deliveryId", !resp.delivery_id.is_empty()));
        set.push(checks::equals("status", &resp.status, "scheduled"));
        set.push(checks::equals("dasherStatus", &resp.dasher_status, "unassigned"));
        set.push(checks::present("statusUrl", &resp.status_url));

        let delivery_id = resp.delivery_id.clone();
        Ok((
            StepReport {
                name: "schedule",
                checks: set,
            },
            delivery_id,
        ))
    }

    async fn cancel_step(&self, delivery_id: &str) -> Result<StepReport> {
        let body = self.fixtures.load_request_json(CANCEL_FIXTURE)?;
        let resp = self
            .client
            .cancel(&self.config.brand_id, delivery_id, &body)
            .await?;

        let mut set = CheckSet::new();
        set.push(checks::holds("returnInitiated", resp.confirms_return()));
        set.push(checks::holds("cancelledAt", !resp.cancelled_at.is_empty()));

        Ok(StepReport {
            name: "cancel",
            checks: set,
        })
    }

    async fn status_update_step(&self) -> Result<StepReport> {
        let text = self.fixtures.load_request(STATUS_UPDATE_FIXTURE)?;
        let update: StatusUpdateRequest = serde_json::from_str(&text)
            .context("status update fixture does not match the update shape")?;
        let resp = self
            .client
            .update_delivery_status(&self.config.status_brand_id, &update)
            .await?;

        let mut set = CheckSet::new();
        set.push(checks::equals("message", &resp.message, "ACK"));

        Ok(StepReport {
            name: "status-update",
            checks: set,
        })
    }
}
