//! Fardog - daily task automation for the Fardog API
//!
//! Runs a set of accounts through their daily and main task lists once per
//! day, routing each account through its own validated proxy.
//!
//! ## Features
//!
//! - Proxy validation against an IP-echo probe, round-robin assignment
//! - Retrying request dispatch with per-account direct fallback
//! - Idempotent click/claim task lifecycle with point accounting
//! - Strictly sequential account processing, repeated at local midnight

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod proxy;
pub mod services;
pub mod sources;

pub use config::Config;
pub use error::{BotError, Result};
