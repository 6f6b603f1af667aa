use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

/// Error taxonomy for the auth core.
///
/// Every kind stays distinguishable so the HTTP layer can map them to
/// distinct status codes; none are collapsed into a generic failure.
/// `MissingSecretConfig` is the one kind that should abort startup rather
/// than be handled per-request.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Malformed token")]
    MalformedToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    ExpiredToken,

    #[error("Malformed token payload")]
    MalformedPayload,

    #[error("No token signing secret configured")]
    MissingSecretConfig,

    #[error("Token revoked")]
    RevokedToken,

    #[error("Token already blacklisted")]
    DuplicateRevocation,

    #[error("Password reset token already used")]
    ResetTokenAlreadyUsed,

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Conversions from external error types
impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {}", err);
        AuthError::Database(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(err: validator::ValidationErrors) -> Self {
        AuthError::Validation(err.to_string())
    }
}
