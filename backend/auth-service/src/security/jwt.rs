//! Signed bearer-token issuance and verification.
//!
//! Tokens are compact JWTs (three dot-separated base64url segments) signed
//! with an HMAC-class algorithm. Every issued token carries a fresh `jti`
//! (UUID v4), `iat` and `exp` alongside the caller's claims.
//!
//! The token lifecycle here is Issued -> Active -> Expired; revocation is a
//! separate step owned by `db::token_revocation` and sequenced by the
//! access gate.

use crate::config::JwtSettings;
use crate::error::{AuthError, Result};
use crate::models::Role;
use anyhow::bail;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{json, Map, Value};
use uuid::Uuid;

/// Claim names injected at issuance. Caller-supplied values for these names
/// are overwritten; the service is authoritative for them.
const CLAIM_JTI: &str = "jti";
const CLAIM_IAT: &str = "iat";
const CLAIM_EXP: &str = "exp";

/// Subject of the synthetic identity returned while authentication is
/// administratively disabled.
const BYPASS_SUBJECT: &str = "dev-user";

/// Lifetime of the synthetic identity's `exp` claim.
const BYPASS_EXP_DAYS: i64 = 3650;

/// Decoded token claims.
pub type Claims = Map<String, Value>;

/// Issues and verifies signed bearer tokens.
///
/// Owns no mutable state beyond the signing configuration copied out of the
/// settings at construction.
#[derive(Clone)]
pub struct TokenService {
    secret: Option<String>,
    algorithm: Algorithm,
    token_ttl: Duration,
    auth_enabled: bool,
}

impl TokenService {
    /// Build a token service from loaded settings.
    ///
    /// Only HMAC-class algorithms are accepted; anything else is a
    /// configuration mistake and aborts startup.
    pub fn from_settings(settings: &JwtSettings) -> anyhow::Result<Self> {
        let algorithm: Algorithm = settings
            .algorithm
            .parse()
            .map_err(|_| anyhow::anyhow!("Unknown JWT algorithm: {}", settings.algorithm))?;
        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            bail!("JWT algorithm must be HMAC-class, got {}", settings.algorithm);
        }

        Ok(Self {
            secret: settings.secret.clone(),
            algorithm,
            token_ttl: settings.token_ttl(),
            auth_enabled: settings.auth_enabled,
        })
    }

    fn secret(&self) -> Result<&[u8]> {
        match self.secret.as_deref() {
            Some(secret) if !secret.is_empty() => Ok(secret.as_bytes()),
            _ => Err(AuthError::MissingSecretConfig),
        }
    }

    /// Issue a token with the configured default lifetime.
    pub fn create(&self, claims: &Claims) -> Result<String> {
        self.create_with_ttl(claims, self.token_ttl)
    }

    /// Issue a token carrying `claims` plus injected `jti`, `iat` and `exp`.
    ///
    /// Issuance ignores the auth-enabled flag: a token minted while
    /// verification is bypassed is a real signed token and stays valid once
    /// the bypass is turned off. Fails with `MissingSecretConfig` when no
    /// signing secret is configured.
    pub fn create_with_ttl(&self, claims: &Claims, ttl: Duration) -> Result<String> {
        let secret = self.secret()?;
        let now = Utc::now();

        let mut payload = claims.clone();
        payload.insert(CLAIM_JTI.to_string(), json!(Uuid::new_v4().to_string()));
        payload.insert(CLAIM_IAT.to_string(), json!(now.timestamp()));
        payload.insert(CLAIM_EXP.to_string(), json!((now + ttl).timestamp()));

        encode(
            &Header::new(self.algorithm),
            &payload,
            &EncodingKey::from_secret(secret),
        )
        .map_err(|e| {
            tracing::error!(error = %e, "token signing failed");
            AuthError::Internal(format!("Failed to sign token: {e}"))
        })
    }

    /// Issue a token for a known subject and role.
    pub fn create_for_subject(&self, sub: &str, role: Role) -> Result<String> {
        let mut claims = Claims::new();
        claims.insert("sub".to_string(), json!(sub));
        claims.insert("role".to_string(), json!(role));
        self.create(&claims)
    }

    /// Verify a token and return its claims.
    ///
    /// The structural shape is checked before any cryptographic work: a
    /// string that is not three dot-separated segments fails fast with
    /// `MalformedToken`, keeping garbage input cheap and its error kind
    /// stable. Signature and expiry are then validated with zero leeway.
    ///
    /// While authentication is administratively disabled this returns the
    /// fixed development identity for any input, malformed or not, and
    /// never fails. Callers must not assume bypass output came from
    /// cryptographic validation.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        if !self.auth_enabled {
            return Ok(Self::bypass_claims());
        }

        if token.split('.').count() != 3 {
            return Err(AuthError::MalformedToken);
        }

        let secret = self.secret()?;
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        // A token past `exp` is expired, full stop.
        validation.leeway = 0;

        let data = decode::<Value>(token, &DecodingKey::from_secret(secret), &validation)
            .map_err(map_jwt_error)?;

        match data.claims {
            Value::Object(claims) => Ok(claims),
            _ => {
                tracing::error!("decoded token payload is not an object");
                Err(AuthError::MalformedPayload)
            }
        }
    }

    /// The fixed identity handed out while authentication is disabled.
    fn bypass_claims() -> Claims {
        let mut claims = Claims::new();
        claims.insert("sub".to_string(), json!(BYPASS_SUBJECT));
        claims.insert("role".to_string(), json!(Role::Admin));
        claims.insert("is_authenticated".to_string(), json!(true));
        claims.insert(
            CLAIM_EXP.to_string(),
            json!((Utc::now() + Duration::days(BYPASS_EXP_DAYS)).timestamp()),
        );
        claims
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::InvalidSignature,
        _ => AuthError::MalformedToken,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;

    fn settings(secret: Option<&str>, auth_enabled: bool) -> JwtSettings {
        JwtSettings {
            secret: secret.map(String::from),
            algorithm: "HS256".to_string(),
            token_ttl_minutes: 30,
            auth_enabled,
        }
    }

    fn service() -> TokenService {
        TokenService::from_settings(&settings(Some("unit-test-secret"), true)).unwrap()
    }

    fn sample_claims() -> Claims {
        let mut claims = Claims::new();
        claims.insert("sub".to_string(), json!("reviewer-42"));
        claims.insert("role".to_string(), json!(Role::User));
        claims
    }

    #[test]
    fn round_trip_preserves_claims() {
        let svc = service();
        let token = svc.create(&sample_claims()).unwrap();
        let claims = svc.verify(&token).unwrap();

        assert_eq!(claims["sub"], json!("reviewer-42"));
        assert_eq!(claims["role"], json!("user"));
    }

    #[test]
    fn issuance_injects_jti_iat_exp() {
        let svc = service();
        let token = svc.create(&sample_claims()).unwrap();
        let claims = svc.verify(&token).unwrap();

        let jti = claims["jti"].as_str().unwrap();
        assert!(Uuid::parse_str(jti).is_ok());
        let iat = claims["iat"].as_i64().unwrap();
        let exp = claims["exp"].as_i64().unwrap();
        assert_eq!(exp - iat, 30 * 60);
    }

    #[test]
    fn fresh_jti_per_token() {
        let svc = service();
        let a = svc.create(&sample_claims()).unwrap();
        let b = svc.create(&sample_claims()).unwrap();

        let jti_a = svc.verify(&a).unwrap()["jti"].clone();
        let jti_b = svc.verify(&b).unwrap()["jti"].clone();
        assert_ne!(jti_a, jti_b);
    }

    #[test]
    fn reserved_claims_are_overwritten() {
        let svc = service();
        let mut claims = sample_claims();
        claims.insert("exp".to_string(), json!(1));
        claims.insert("jti".to_string(), json!("attacker-chosen"));

        let token = svc.create(&claims).unwrap();
        let decoded = svc.verify(&token).unwrap();
        assert_ne!(decoded["jti"], json!("attacker-chosen"));
        assert!(decoded["exp"].as_i64().unwrap() > Utc::now().timestamp());
    }

    #[test]
    fn structurally_invalid_tokens_fail_fast() {
        let svc = service();
        for garbage in ["", "garbage", "a.b", "a.b.c.d"] {
            assert!(
                matches!(svc.verify(garbage), Err(AuthError::MalformedToken)),
                "expected MalformedToken for {garbage:?}"
            );
        }
    }

    #[test]
    fn tampering_is_detected() {
        let svc = service();
        let token = svc.create(&sample_claims()).unwrap();

        // Flip the final signature character to another base64url character.
        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        match svc.verify(&tampered) {
            Err(AuthError::InvalidSignature) | Err(AuthError::MalformedToken) => {}
            other => panic!("expected tamper detection, got {other:?}"),
        }

        // Appending a character must also fail.
        let extended = format!("{token}x");
        match svc.verify(&extended) {
            Err(AuthError::InvalidSignature) | Err(AuthError::MalformedToken) => {}
            other => panic!("expected tamper detection, got {other:?}"),
        }
    }

    #[test]
    fn wrong_secret_fails_signature_check() {
        let svc = service();
        let other = TokenService::from_settings(&settings(Some("other-secret"), true)).unwrap();

        let token = svc.create(&sample_claims()).unwrap();
        assert!(matches!(
            other.verify(&token),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn negative_ttl_is_expired_immediately() {
        let svc = service();
        let token = svc
            .create_with_ttl(&sample_claims(), Duration::minutes(-1))
            .unwrap();
        assert!(matches!(svc.verify(&token), Err(AuthError::ExpiredToken)));
    }

    #[test]
    fn missing_secret_is_fatal_for_both_operations() {
        let svc = TokenService::from_settings(&settings(None, true)).unwrap();
        assert!(matches!(
            svc.create(&sample_claims()),
            Err(AuthError::MissingSecretConfig)
        ));

        let token = service().create(&sample_claims()).unwrap();
        assert!(matches!(
            svc.verify(&token),
            Err(AuthError::MissingSecretConfig)
        ));
    }

    #[test]
    fn bypass_returns_synthetic_identity_for_any_input() {
        let svc = TokenService::from_settings(&settings(None, false)).unwrap();

        let claims = svc.verify("not.a.valid.token").unwrap();
        assert_eq!(claims["sub"], json!("dev-user"));
        assert_eq!(claims["role"], json!("admin"));
        assert_eq!(claims["is_authenticated"], json!(true));
        assert!(claims["exp"].as_i64().unwrap() > Utc::now().timestamp());

        // Garbage and empty strings never raise in bypass mode.
        assert!(svc.verify("").is_ok());
    }

    #[test]
    fn issuance_is_not_bypassed() {
        let bypassed = TokenService::from_settings(&settings(Some("unit-test-secret"), false)).unwrap();
        let token = bypassed.create(&sample_claims()).unwrap();
        assert_eq!(token.split('.').count(), 3);

        // The same token verifies cryptographically once bypass is off.
        let enforcing = service();
        let claims = enforcing.verify(&token).unwrap();
        assert_eq!(claims["sub"], json!("reviewer-42"));
    }

    #[test]
    fn create_for_subject_carries_role() {
        let svc = service();
        let token = svc.create_for_subject("reviewer-7", Role::Admin).unwrap();
        let claims = svc.verify(&token).unwrap();
        assert_eq!(claims["sub"], json!("reviewer-7"));
        assert_eq!(claims["role"], json!("admin"));
    }

    #[test]
    fn non_hmac_algorithm_is_rejected_at_startup() {
        let mut cfg = settings(Some("s"), true);
        cfg.algorithm = "RS256".to_string();
        assert!(TokenService::from_settings(&cfg).is_err());

        cfg.algorithm = "not-an-algorithm".to_string();
        assert!(TokenService::from_settings(&cfg).is_err());
    }
}
