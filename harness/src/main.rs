//! Conformance harness CLI - runs contract scenarios against the adapter.

use anyhow::{Context, Result};
use tracing::{error, info};

use conformance_harness::config::HarnessConfig;
use conformance_harness::paths;
use conformance_harness::runner::{Runner, Scenario};
use fulfillment_adapter::fixtures::FixtureDir;

/// Minimal CLI parser: expects `--key value` pairs after the scenario.
fn arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn usage() -> String {
    [
        "Usage: conformance-harness <scenario> [options]",
        "",
        "Scenarios:",
        "  estimate        POST /brand/{brandId}/delivery/estimate",
        "  validate        POST /brand/{brandId}/delivery/validate",
        "  schedule        POST /brand/{brandId}/location/{locationId}/delivery",
        "  cancel          POST /brand/{brandId}/delivery/{deliveryId}/cancel (needs --delivery-id)",
        "  status-update   POST /brand/{brandId}/delivery",
        "  e2e             estimate -> validate -> schedule -> cancel",
        "",
        "Options:",
        "  --base-url URL       Adapter base URL (default: env ADAPTER_BASE_URL or the QA adapter)",
        "  --brand ID           Brand for the flow endpoints (default: env BRAND_ID or SDI)",
        "  --location ID        Location for scheduling (default: env LOCATION_ID or 123)",
        "  --delivery-id ID     Delivery to cancel (standalone cancel only)",
        "  --fixture-dir PATH   Fixture corpus root (default: harness/fixtures)",
        "",
        "Set CAPTURE_DIR to record every adapter exchange for replay.",
    ]
    .join("\n")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load environment variables from `.env` (supports workspace-root `.env`)
    paths::load_dotenv();

    // Initialize HTTP capture session if CAPTURE_DIR is set.
    // Must be done early, before any HTTP clients are created.
    match fulfillment_adapter::capture::init_capture_session() {
        Ok(Some(session)) => {
            info!(
                "[MAIN] Capture mode active: {} (filter: {})",
                session.session_dir.display(),
                session.filter
            );
        }
        Ok(None) => {
            // Capture disabled - nothing to log
        }
        Err(e) => {
            error!("[MAIN] Failed to initialize capture session: {}", e);
            error!("[MAIN] Check that CAPTURE_DIR points to a writable directory");
            return Err(e.into());
        }
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let scenario = match args.first().map(String::as_str) {
        Some(name) => match Scenario::parse(name) {
            Some(scenario) => scenario,
            None => {
                eprintln!("Unknown scenario: {}\n\n{}", name, usage());
                anyhow::bail!("unknown scenario: {}", name);
            }
        },
        None => {
            eprintln!("{}", usage());
            anyhow::bail!("no scenario given");
        }
    };

    let mut config = HarnessConfig::from_env().context("Failed to load configuration")?;
    if let Some(base_url) = arg_value(&args, "--base-url") {
        config.base_url = base_url;
    }
    if let Some(brand) = arg_value(&args, "--brand") {
        config.brand_id = brand;
    }
    if let Some(location) = arg_value(&args, "--location") {
        config.location_id = location;
    }

    let fixtures = match arg_value(&args, "--fixture-dir") {
        Some(dir) => FixtureDir::new(dir),
        None => paths::fixture_dir().context("Failed to locate fixture corpus")?,
    };

    info!(
        "[MAIN] brand={} location={} fixtures={}",
        config.brand_id,
        config.location_id,
        fixtures.root().display()
    );

    let delivery_id = arg_value(&args, "--delivery-id");
    let runner = Runner::new(config, fixtures);
    let report = runner.run(scenario, delivery_id.as_deref()).await?;
    report.log();

    if !report.passed() {
        error!(
            "[MAIN] {} conformance check(s) failed",
            report.failure_count()
        );
        std::process::exit(1);
    }
    Ok(())
}
