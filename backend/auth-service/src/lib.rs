//! Authentication core for the Redline document-review platform.
//!
//! Provides the token lifecycle and access-control state management consumed
//! by the HTTP layer:
//!
//! - `config`: service configuration
//! - `db`: persistence operations (revocation tombstones, reset-token ledger)
//! - `error`: error taxonomy
//! - `models`: roles and persistence row types
//! - `security`: signed token issuance and verification
//! - `services`: the access-control gate
//!
//! Rate limiting and TTL caching live in the `ephemeral-store` crate. That
//! state is in-memory and single-process; multi-instance deployments need to
//! externalize it, which this crate deliberately does not provide.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod security;
pub mod services;

// Re-export commonly used types
pub use error::{AuthError, Result};
pub use security::jwt::{Claims, TokenService};
pub use services::access_gate::{AccessGate, RateLimitRule};
