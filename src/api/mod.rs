//! Remote API client
//!
//! Endpoint catalogue, the browser header set, the resilient dispatcher and
//! the typed per-account session built on top of it.

pub mod dispatcher;
pub mod endpoints;
pub mod headers;
pub mod session;

pub use dispatcher::{ApiResponse, DispatchConfig, RequestDispatcher};
pub use endpoints::Endpoint;
pub use session::ApiSession;
