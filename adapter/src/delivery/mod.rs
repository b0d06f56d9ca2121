//! Fulfillment adapter client and payload types.

pub mod client;
pub mod config;
pub mod types;

pub use client::DeliveryClient;
pub use config::*;
pub use types::*;
