//! Authorization sequencing for sensitive actions.
//!
//! One decision per request, in a fixed order: sliding-window rate limit
//! first (cheap, blunts abuse before any cryptography runs), then token
//! verification, then the revocation tombstone, and for password-reset
//! actions the one-time-use ledger. A rate-limit slot consumed by a caller
//! that is cancelled before the later steps run is not refunded.

use crate::config::Settings;
use crate::db;
use crate::error::{AuthError, Result};
use crate::security::jwt::{Claims, TokenService};
use chrono::{DateTime, Utc};
use ephemeral_store::RateLimiter;
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Per-invocation rate-limit parameters. Supplied by the caller for each
/// action key rather than fixed globally.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitRule {
    pub max_calls: usize,
    pub period: Duration,
}

/// Sequences rate limiting, verification, revocation and the reset ledger
/// into one authorization decision.
#[derive(Clone)]
pub struct AccessGate {
    tokens: TokenService,
    limiter: Arc<RateLimiter>,
    pool: PgPool,
}

impl AccessGate {
    pub fn new(settings: &Settings, pool: PgPool) -> anyhow::Result<Self> {
        Ok(Self {
            tokens: TokenService::from_settings(&settings.jwt)?,
            limiter: Arc::new(RateLimiter::new(settings.rate_limit.disabled)),
            pool,
        })
    }

    /// The token service this gate verifies with; issuance flows use it
    /// directly.
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Authorize `token` for one invocation of `action_key`.
    pub async fn authorize(
        &self,
        token: &str,
        action_key: &str,
        rule: RateLimitRule,
    ) -> Result<Claims> {
        if !self
            .limiter
            .allow(action_key, rule.max_calls, rule.period)
            .await
        {
            warn!(action = %action_key, "rate limit exceeded");
            return Err(AuthError::RateLimitExceeded(action_key.to_string()));
        }

        let claims = self.tokens.verify(token)?;

        // The synthetic bypass identity carries no `jti`; there is nothing
        // to look up for it.
        if let Some(jti) = claims.get("jti").and_then(Value::as_str) {
            if db::token_revocation::is_revoked(&self.pool, jti).await? {
                warn!(jti = %jti, action = %action_key, "revoked token presented");
                return Err(AuthError::RevokedToken);
            }
        }

        Ok(claims)
    }

    /// Authorize a password-reset action: everything [`authorize`] does plus
    /// a one-time-use check on `(email, nonce)`.
    ///
    /// Call [`finish_password_reset`] only after the password mutation
    /// succeeds. The check here and the record there are not atomic with
    /// each other (see `db::password_reset`).
    ///
    /// [`authorize`]: AccessGate::authorize
    /// [`finish_password_reset`]: AccessGate::finish_password_reset
    pub async fn authorize_password_reset(
        &self,
        token: &str,
        action_key: &str,
        rule: RateLimitRule,
        email: &str,
        nonce: &str,
    ) -> Result<Claims> {
        let claims = self.authorize(token, action_key, rule).await?;

        if db::password_reset::consumed(&self.pool, email, nonce).await? {
            warn!("reused password reset credential rejected");
            return Err(AuthError::ResetTokenAlreadyUsed);
        }

        Ok(claims)
    }

    /// Record redemption of the reset credential after a successful reset.
    pub async fn finish_password_reset(&self, email: &str, nonce: &str) -> Result<()> {
        db::password_reset::record_use(&self.pool, email, nonce, Utc::now().naive_utc()).await
    }

    /// Blacklist the verified claims' token until its own expiry (logout or
    /// compromise). The claims must come out of `verify`; synthetic bypass
    /// claims have no `jti` to revoke.
    pub async fn revoke(&self, claims: &Claims) -> Result<()> {
        let jti = claims
            .get("jti")
            .and_then(Value::as_str)
            .ok_or(AuthError::MalformedPayload)?;
        let exp = claims
            .get("exp")
            .and_then(Value::as_i64)
            .ok_or(AuthError::MalformedPayload)?;
        let expires_at = DateTime::from_timestamp(exp, 0)
            .ok_or(AuthError::MalformedPayload)?
            .naive_utc();

        db::token_revocation::blacklist(&self.pool, jti, expires_at).await
    }
}
