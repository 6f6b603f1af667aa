//! Revocation tombstones over the `blacklisted_tokens` table.

use crate::error::{AuthError, Result};
use crate::models::RevocationEntry;
use chrono::{NaiveDateTime, Utc};
use sqlx::PgPool;
use tracing::info;

/// Record that `jti` must be treated as invalid until `expires_at`.
///
/// The tombstone inherits the token's own expiry: once the token would have
/// expired anyway the tombstone is inert, so the table stays bounded without
/// a purge job. Re-blacklisting an already-revoked `jti` is a conflict, not
/// an overwrite.
pub async fn blacklist(pool: &PgPool, jti: &str, expires_at: NaiveDateTime) -> Result<()> {
    sqlx::query("INSERT INTO blacklisted_tokens (jti, expires_at) VALUES ($1, $2)")
        .bind(jti)
        .bind(expires_at)
        .execute(pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AuthError::DuplicateRevocation
            }
            _ => AuthError::Database(e.to_string()),
        })?;

    info!(jti = %jti, "token blacklisted");
    Ok(())
}

/// Whether `jti` is currently revoked.
///
/// An expired tombstone answers `false`: past that point verification
/// already rejects the token on expiry grounds, so the question is moot.
pub async fn is_revoked(pool: &PgPool, jti: &str) -> Result<bool> {
    let entry = find(pool, jti).await?;
    Ok(entry.map(|e| e.is_active()).unwrap_or(false))
}

/// Fetch the tombstone for `jti`, if any.
pub async fn find(pool: &PgPool, jti: &str) -> Result<Option<RevocationEntry>> {
    let entry = sqlx::query_as::<_, RevocationEntry>(
        "SELECT jti, expires_at FROM blacklisted_tokens WHERE jti = $1",
    )
    .bind(jti)
    .fetch_optional(pool)
    .await?;

    Ok(entry)
}

/// Delete tombstones whose tokens have expired (maintenance operation).
pub async fn cleanup_expired(pool: &PgPool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM blacklisted_tokens WHERE expires_at < $1")
        .bind(Utc::now().naive_utc())
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Count tombstones still gating a live token.
pub async fn count_active(pool: &PgPool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM blacklisted_tokens WHERE expires_at > $1",
    )
    .bind(Utc::now().naive_utc())
    .fetch_one(pool)
    .await?;

    Ok(count)
}
