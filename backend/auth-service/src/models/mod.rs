use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Reviewer role carried in token claims.
///
/// Stored and serialized directly; there is no boolean `is_admin`
/// indirection behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tombstone row in `blacklisted_tokens`.
///
/// A tombstone marks a `jti` invalid until the token's own expiry, after
/// which it is inert: verification already rejects the token on expiry
/// grounds, so the table stays bounded without a purge job.
#[derive(Debug, Clone, FromRow)]
pub struct RevocationEntry {
    pub jti: String,
    /// Stored without a timezone (`TIMESTAMP`); preserved as written.
    pub expires_at: NaiveDateTime,
}

impl RevocationEntry {
    /// Whether this tombstone still gates its `jti`. The naive storage
    /// timestamp is normalized to UTC here, at comparison time only.
    pub fn is_active(&self) -> bool {
        self.expires_at.and_utc() > Utc::now()
    }
}

/// Parameters for recording a password-reset redemption.
///
/// Validated before any persistence attempt; an empty email or nonce never
/// reaches the database.
#[derive(Debug, Validate)]
pub struct ResetTokenUse<'a> {
    #[validate(length(min = 1, message = "email must not be empty"))]
    pub email: &'a str,
    #[validate(length(min = 1, message = "nonce must not be empty"))]
    pub nonce: &'a str,
}
