//! Persistence operations over the shared connection pool.
//!
//! The pool and its schema are owned by the wider application; this core
//! issues individual statements and opens no transactions of its own.

pub mod password_reset;
pub mod token_revocation;
