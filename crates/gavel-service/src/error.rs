use thiserror::Error;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    DatabaseError(#[from] gavel_db::error::DbError),

    #[error(transparent)]
    CoreError(#[from] gavel_core::error::CoreError),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Authorization error: {0}")]
    AuthorizationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Verification code is invalid")]
    OtpInvalid,

    #[error("Verification code has expired")]
    OtpExpired,

    #[error("Point conversion rate is not configured")]
    NotConfigured,

    #[error("Upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Upstream service returned {status}: {body}")]
    ExternalService { status: u16, body: String },

    #[error("Unexpected upstream payload: {0}")]
    ExternalFormat(String),

    #[error("Diesel error: {0}")]
    DieselError(#[from] diesel::result::Error),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Maps a unique-constraint violation onto a domain `Conflict` with the given
/// message; every other database error passes through unchanged.
pub(crate) fn unique_violation_to_conflict(
    error: diesel::result::Error,
    message: &str,
) -> ServiceError {
    match error {
        diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        ) => ServiceError::Conflict(message.to_string()),
        other => ServiceError::DieselError(other),
    }
}
