//! HTTP surface for Stratus
//!
//! Config loading, route wiring and the service-error → status mapping.
//! All domain behavior lives in the service crates below.

pub mod config;
pub mod error;
pub mod routes;

pub use config::Config;
pub use error::ApiError;
pub use routes::{router, AppState};
