//! Conformance tests against mock adapter servers.

pub mod cancel;
pub mod schedule;
pub mod status_update;
pub mod validate;
