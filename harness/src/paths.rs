//! Runtime path helpers for the harness.
//!
//! Configuration (`.env`) and the fixture corpus usually live relative to
//! the workspace root, even when the crate is executed from within
//! `harness/`.

use std::path::{Path, PathBuf};

use fulfillment_adapter::fixtures::FixtureDir;

pub fn harness_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn workspace_root() -> PathBuf {
    harness_dir()
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(harness_dir)
}

/// Load `.env` once, searching common locations:
/// - current working directory (and its parent)
/// - workspace root (one folder up from `harness/`)
/// - harness crate dir
pub fn load_dotenv() {
    static ONCE: std::sync::OnceLock<()> = std::sync::OnceLock::new();
    ONCE.get_or_init(|| {
        let mut candidates: Vec<PathBuf> = Vec::new();

        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd.join(".env"));
            if let Some(parent) = cwd.parent() {
                candidates.push(parent.join(".env"));
            }
        }

        candidates.push(workspace_root().join(".env"));
        candidates.push(harness_dir().join(".env"));

        for p in candidates {
            if p.exists() && dotenvy::from_path(&p).is_ok() {
                tracing::debug!("Loaded .env from {}", p.display());
                return;
            }
        }

        let _ = dotenvy::dotenv();
    });
}

/// Locate the fixture corpus: the crate's own `fixtures/` dir when present,
/// otherwise the generic search (`FIXTURE_DIR`, then walking up from cwd).
pub fn fixture_dir() -> anyhow::Result<FixtureDir> {
    if std::env::var("FIXTURE_DIR").map(|v| !v.is_empty()).unwrap_or(false) {
        return FixtureDir::resolve();
    }
    let local = harness_dir().join("fixtures");
    if local.is_dir() {
        return Ok(FixtureDir::new(local));
    }
    FixtureDir::resolve()
}
