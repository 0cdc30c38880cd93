//! Shared library surface for the SafeRoute server and its tests.

pub mod api;
pub mod backoff;
pub mod cache;
pub mod config;
pub mod loops;
pub mod notify;
pub mod provider;
pub mod service;
pub mod state;
pub mod telemetry;

pub use service::{RouteRequest, RouteSynthesisService};
