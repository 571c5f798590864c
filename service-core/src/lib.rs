//! Infrastructure shared by the service binaries: the HTTP error type, base
//! listener config, tracing setup and the common axum middleware.

pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
