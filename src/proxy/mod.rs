//! Outbound proxy handling
//!
//! This module provides:
//! - Validation of proxy candidates against an IP echo endpoint
//! - The working pool and per-proxy failure counters
//! - Round-robin assignment of pool entries to accounts
//! - HTTP clients for direct and proxied routes

pub mod health;
pub mod rotation;
pub mod transport;

pub use health::{HealthCheckerConfig, ProbeResult, ProxyHealthManager};
pub use rotation::RoundRobinSelector;
pub use transport::ProxyTransport;
