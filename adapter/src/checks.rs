//! Contract checks evaluated against adapter responses.
//!
//! Checks record pass/fail instead of panicking, so a live conformance run
//! can report every violated expectation in one pass. The test suite
//! asserts on the same records.

use chrono::{DateTime, Utc};

/// Outcome of a single contract expectation.
#[derive(Debug, Clone)]
pub struct Check {
    pub label: String,
    pub passed: bool,
    /// What went wrong, for failed checks
    pub detail: Option<String>,
}

impl Check {
    fn pass(label: &str) -> Self {
        Self {
            label: label.to_string(),
            passed: true,
            detail: None,
        }
    }

    fn fail(label: &str, detail: String) -> Self {
        Self {
            label: label.to_string(),
            passed: false,
            detail: Some(detail),
        }
    }
}

/// The timestamp parses as RFC 3339 and lies in the future.
pub fn time_in_future(label: &str, value: &str) -> Check {
    match parse_rfc3339(value) {
        Ok(ts) if ts > Utc::now() => Check::pass(label),
        Ok(ts) => Check::fail(label, format!("{} is not in the future", ts.to_rfc3339())),
        Err(e) => Check::fail(label, format!("unparseable timestamp {:?}: {}", value, e)),
    }
}

/// Both timestamps parse and `later` is strictly after `earlier`.
pub fn time_after(label: &str, later: &str, earlier: &str) -> Check {
    match (parse_rfc3339(later), parse_rfc3339(earlier)) {
        (Ok(l), Ok(e)) if l > e => Check::pass(label),
        (Ok(l), Ok(e)) => Check::fail(
            label,
            format!("{} is not after {}", l.to_rfc3339(), e.to_rfc3339()),
        ),
        (Err(e), _) => Check::fail(label, format!("unparseable timestamp {:?}: {}", later, e)),
        (_, Err(e)) => Check::fail(label, format!("unparseable timestamp {:?}: {}", earlier, e)),
    }
}

/// The value is strictly greater than zero.
pub fn positive(label: &str, value: f64) -> Check {
    if value > 0.0 {
        Check::pass(label)
    } else {
        Check::fail(label, format!("{} is not > 0", value))
    }
}

/// The integer value is strictly greater than zero.
pub fn positive_int(label: &str, value: i64) -> Check {
    if value > 0 {
        Check::pass(label)
    } else {
        Check::fail(label, format!("{} is not > 0", value))
    }
}

/// Exact, case-sensitive string equality.
pub fn equals(label: &str, actual: &str, expected: &str) -> Check {
    if actual == expected {
        Check::pass(label)
    } else {
        Check::fail(label, format!("expected {:?}, got {:?}", expected, actual))
    }
}

/// The collection has at least one element.
pub fn non_empty(label: &str, len: usize) -> Check {
    if len > 0 {
        Check::pass(label)
    } else {
        Check::fail(label, "empty".to_string())
    }
}

/// An optional field is present.
pub fn present<T>(label: &str, value: &Option<T>) -> Check {
    if value.is_some() {
        Check::pass(label)
    } else {
        Check::fail(label, "missing".to_string())
    }
}

/// The boolean expectation holds.
pub fn holds(label: &str, condition: bool) -> Check {
    if condition {
        Check::pass(label)
    } else {
        Check::fail(label, "condition is false".to_string())
    }
}

fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|ts| ts.with_timezone(&Utc))
}

// ============================================================================
// Check sets
// ============================================================================

/// Ordered collection of checks for one response.
#[derive(Debug, Clone, Default)]
pub struct CheckSet {
    checks: Vec<Check>,
}

impl CheckSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, check: Check) {
        self.checks.push(check);
    }

    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failures(&self) -> Vec<&Check> {
        self.checks.iter().filter(|c| !c.passed).collect()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter()
    }
}

impl Extend<Check> for CheckSet {
    fn extend<I: IntoIterator<Item = Check>>(&mut self, iter: I) {
        self.checks.extend(iter);
    }
}
