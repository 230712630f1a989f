//! The uniform response body every route answers with.

use salvo::http::StatusCode;
use salvo::writing::{Json, Scribe};
use salvo::{FlowCtrl, Response, handler};
use serde::Serialize;

/// Body shape shared by every route: a success flag, a human-readable
/// message, and an optional payload under `data`.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    /// Successful response carrying a payload.
    #[must_use]
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl Envelope<()> {
    /// Successful response with no payload; `data` is omitted entirely.
    #[must_use]
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    /// Failed response; the message explains the rejection.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize + Send> Scribe for Envelope<T> {
    fn render(self, res: &mut Response) {
        res.render(Json(self));
    }
}

/// ## Summary
/// Catcher hoop that replaces salvo's default 404 page with the JSON
/// envelope, so unmatched routes answer in the same shape as everything else.
#[handler]
pub async fn not_found_handler(res: &mut Response, ctrl: &mut FlowCtrl) {
    if let Some(StatusCode::NOT_FOUND) = res.status_code {
        res.render(Envelope::failure("Route not found"));
        ctrl.skip_rest();
    }
}
