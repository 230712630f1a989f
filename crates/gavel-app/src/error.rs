use salvo::http::StatusCode;
use salvo::writing::Writer;
use salvo::{Depot, Request, Response, async_trait};
use thiserror::Error;

use gavel_service::error::ServiceError;

use crate::response::Envelope;

/// Application-level errors (HTTP layer)
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    ServiceError(#[from] ServiceError),

    #[error(transparent)]
    DatabaseError(#[from] gavel_db::error::DbError),

    #[error(transparent)]
    CoreError(#[from] gavel_core::error::CoreError),

    #[error("Invalid request body: {0}")]
    ParseError(#[from] salvo::http::ParseError),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

impl AppError {
    /// HTTP status that pairs with this error in the response envelope.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ServiceError(error) => service_status(error),
            AppError::ParseError(_) => StatusCode::BAD_REQUEST,
            AppError::DatabaseError(_) | AppError::CoreError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

fn service_status(error: &ServiceError) -> StatusCode {
    match error {
        ServiceError::ValidationError(_)
        | ServiceError::NotConfigured
        | ServiceError::OtpInvalid
        | ServiceError::OtpExpired => StatusCode::BAD_REQUEST,
        ServiceError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        ServiceError::AuthorizationError(_) => StatusCode::FORBIDDEN,
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Conflict(_) => StatusCode::CONFLICT,
        ServiceError::Transport(_)
        | ServiceError::ExternalService { .. }
        | ServiceError::ExternalFormat(_) => StatusCode::BAD_GATEWAY,
        ServiceError::DatabaseError(_)
        | ServiceError::CoreError(_)
        | ServiceError::InvalidConfiguration(_)
        | ServiceError::InvariantViolation(_)
        | ServiceError::DieselError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Builds the 400 error used when a path or query parameter is malformed.
pub(crate) fn bad_request(message: impl Into<String>) -> AppError {
    AppError::ServiceError(ServiceError::ValidationError(message.into()))
}

/// ## Summary
/// Writes the error as a failure envelope with the mapped status code.
///
/// Internal errors are logged in full but reach the client as a generic
/// message; everything else keeps its own wording.
#[async_trait]
impl Writer for AppError {
    async fn write(mut self, _req: &mut Request, _depot: &mut Depot, res: &mut Response) {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = ?self, status = %status, "Request failed");
        } else {
            tracing::debug!(error = ?self, status = %status, "Request rejected");
        }

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        res.status_code(status);
        res.render(Envelope::failure(message));
    }
}
