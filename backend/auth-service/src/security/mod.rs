//! Security primitives for the auth core.
//!
//! - `jwt`: signed bearer-token issuance and verification
//!
//! Revocation is deliberately not a token concern: tombstone persistence
//! lives in `db::token_revocation` and is sequenced by the access gate.

pub mod jwt;

pub use jwt::{Claims, TokenService};
