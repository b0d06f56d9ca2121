//! Canned request bodies and captured exchanges on disk.
//!
//! Layout:
//!
//! ```text
//! fixtures/
//!   request/    canned JSON request bodies, sent byte-for-byte
//!   captured/   recorded exchanges in the capture format, for replay
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Root of a fixture corpus.
#[derive(Debug, Clone)]
pub struct FixtureDir {
    root: PathBuf,
}

impl FixtureDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Locate the fixture corpus.
    ///
    /// `FIXTURE_DIR` wins when set. Otherwise walk up from the working
    /// directory looking for `harness/fixtures` or `fixtures`, so the
    /// harness finds its corpus whether invoked from the workspace root or
    /// from within a member crate.
    pub fn resolve() -> Result<Self> {
        if let Ok(dir) = std::env::var("FIXTURE_DIR") {
            if !dir.is_empty() {
                let root = PathBuf::from(dir);
                anyhow::ensure!(root.is_dir(), "FIXTURE_DIR {} is not a directory", root.display());
                return Ok(Self::new(root));
            }
        }

        let cwd = std::env::current_dir().context("cannot determine working directory")?;
        for base in cwd.ancestors() {
            for candidate in [base.join("harness/fixtures"), base.join("fixtures")] {
                if candidate.is_dir() {
                    return Ok(Self::new(candidate));
                }
            }
        }

        anyhow::bail!(
            "no fixture directory found above {} (set FIXTURE_DIR to override)",
            cwd.display()
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a canned request body.
    pub fn request_path(&self, name: &str) -> PathBuf {
        self.root.join("request").join(name)
    }

    /// Path of a captured exchange.
    pub fn captured_path(&self, name: &str) -> PathBuf {
        self.root.join("captured").join(name)
    }

    /// Read a canned request body as text, exactly as it will be sent.
    pub fn load_request(&self, name: &str) -> Result<String> {
        let path = self.request_path(name);
        std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read fixture {}", path.display()))
    }

    /// Read and parse a canned request body.
    pub fn load_request_json(&self, name: &str) -> Result<serde_json::Value> {
        let path = self.request_path(name);
        let text = self.load_request(name)?;
        serde_json::from_str(&text)
            .with_context(|| format!("fixture {} is not valid JSON", path.display()))
    }
}
