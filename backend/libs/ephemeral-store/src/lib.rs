//! Ephemeral keyed state for the Redline backend
//!
//! Two policies over lock-protected, time-bounded in-memory maps:
//! - Sliding-window rate limiting (`RateLimiter`)
//! - TTL caching with lazy eviction (`TtlCache`)
//!
//! Each store instance owns its map behind a single `tokio::sync::Mutex`;
//! all operations on an instance serialize through that one critical
//! section, regardless of key. Operations perform no I/O while holding the
//! lock, so the critical section stays short.
//!
//! State is per-process. Multi-instance deployments need an external store;
//! this crate deliberately does not provide one.

mod cache;
mod rate_limit;

pub use cache::TtlCache;
pub use rate_limit::RateLimiter;
