use salvo::async_trait;
use std::sync::Arc;

use crate::error::AppResult;
use gavel_core::error::CoreError;
use gavel_service::clio::client::ClioClient;

/// Hoop that shares the practice-management API client with handlers.
pub struct ClioHandler {
    pub client: Arc<ClioClient>,
}

#[async_trait]
impl salvo::Handler for ClioHandler {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(self.client.clone());
    }
}

/// ## Summary
/// Retrieves the practice-management client from the depot.
///
/// ## Errors
/// Returns an error if the client is not found in the depot.
pub fn get_clio_from_depot(depot: &salvo::Depot) -> AppResult<Arc<ClioClient>> {
    depot.obtain::<Arc<ClioClient>>().cloned().map_err(|_err| {
        CoreError::InvariantViolation("Practice-management client not found in depot").into()
    })
}
