//! One-time-use ledger over the `used_password_reset_tokens` table.
//!
//! Callers check [`consumed`] before performing a password reset and call
//! [`record_use`] only after the reset succeeds. The check and the record
//! are not atomic with each other and the schema carries no uniqueness
//! constraint over `(email, nonce)`, so two concurrent redemptions of the
//! same pair can both be recorded. That race is inherited from the schema
//! and flagged here rather than papered over.

use crate::error::Result;
use crate::models::ResetTokenUse;
use chrono::NaiveDateTime;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

/// Durably record that the reset credential `(email, nonce)` was redeemed.
///
/// Both fields are validated non-empty before any statement is issued; a
/// validation failure performs no I/O.
pub async fn record_use(
    pool: &PgPool,
    email: &str,
    nonce: &str,
    used_at: NaiveDateTime,
) -> Result<()> {
    ResetTokenUse { email, nonce }.validate()?;

    sqlx::query(
        "INSERT INTO used_password_reset_tokens (id, email, nonce, used_at) VALUES ($1, $2, $3, $4)",
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(nonce)
    .bind(used_at)
    .execute(pool)
    .await?;

    debug!("password reset credential recorded as used");
    Ok(())
}

/// Whether `(email, nonce)` has ever been redeemed.
pub async fn consumed(pool: &PgPool, email: &str, nonce: &str) -> Result<bool> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM used_password_reset_tokens WHERE email = $1 AND nonce = $2",
    )
    .bind(email)
    .bind(nonce)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}
