use salvo::async_trait;
use std::sync::Arc;

use crate::error::AppResult;
use gavel_core::error::CoreError;
use gavel_service::mail::Mailer;

/// Hoop that shares the transactional mailer with handlers.
///
/// The field is already a trait object so tests can swap in a recording
/// implementation.
pub struct MailerHandler {
    pub mailer: Arc<dyn Mailer>,
}

#[async_trait]
impl salvo::Handler for MailerHandler {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(self.mailer.clone());
    }
}

/// ## Summary
/// Retrieves the transactional mailer from the depot.
///
/// ## Errors
/// Returns an error if the mailer is not found in the depot.
pub fn get_mailer_from_depot(depot: &salvo::Depot) -> AppResult<Arc<dyn Mailer>> {
    depot.obtain::<Arc<dyn Mailer>>().cloned().map_err(|_err| {
        CoreError::InvariantViolation("Mailer not found in depot").into()
    })
}
