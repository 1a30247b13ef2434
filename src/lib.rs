//! # Resource Provider Client Library
//!
//! Issues control-plane operations against a REST management API and sees
//! them through to the end: throttled requests are resubmitted after the
//! server's `Retry-After` hint, and asynchronous operations announced with
//! an `Azure-AsyncOperation` header are polled until they reach a terminal
//! status.
//!
//! Modules:
//! - `client`: the `ResourceProviderClient` façade (GET/POST/PUT/PATCH/DELETE)
//! - `cache`: registry memoizing one client per target key
//! - `resilience`: throttle retrier and operation poller
//! - `transport`: HTTP seam and the `reqwest` implementation
//! - `auth`: credential headers and token providers
//! - `config`: YAML settings, loading and validation

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod helpers;
pub mod observability;
pub mod request;
pub mod resilience;
pub mod transport;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::cache::ClientRegistry;
pub use crate::client::ResourceProviderClient;
pub use crate::error::{Phase, RpError};
pub use crate::request::RequestOptions;
