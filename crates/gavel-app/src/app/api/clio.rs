use salvo::{Depot, Request, Router, handler};
use serde::Deserialize;
use serde_json::json;

use gavel_core::constants::CLIO_ROUTE_COMPONENT;
use gavel_service::auth::depot::{get_account_from_depot, get_admin_from_depot};
use gavel_service::billing;
use gavel_service::clio::activities::{
    self, DescriptionRequest, PostActivityRequest, PostedActivity, PricedDescription,
};
use gavel_service::clio::linkage::{
    self, AssignContactRequest, ContactListQuery, CreateContactRequest, Linkage,
};

use crate::app::api::path_i64;
use crate::clio_handler::get_clio_from_depot;
use crate::db_handler::get_db_from_depot;
use crate::error::AppResult;
use crate::middleware::auth::{AdminGate, SessionAuth};
use crate::response::Envelope;

#[derive(Debug, Deserialize)]
struct PointValueBody {
    point_value: f64,
}

/// ## Summary
/// POST /clio/activities - Book a billable time entry on the caller's
/// matter, priced from points at the configured rate.
///
/// ## Errors
/// Returns HTTP 400 for non-positive points, an unlinked account, or a
/// missing conversion rate
/// Returns HTTP 502 if the remote booking fails
#[handler]
async fn post_activity_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Envelope<PostedActivity>> {
    let body: PostActivityRequest = req.parse_json().await?;
    let clio = get_clio_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let account = get_account_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let posted = activities::post_activity(&mut conn, &clio, account, &body).await?;

    Ok(Envelope::ok("Activity posted", posted))
}

/// ## Summary
/// GET /clio/contacts - List external person contacts.
///
/// Forwards `query`, `limit`, and `page_token` untouched and answers with
/// the raw page, records and paging metadata together.
///
/// ## Errors
/// Returns HTTP 502 if the remote listing fails
#[handler]
async fn list_contacts_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Envelope<serde_json::Value>> {
    let query: ContactListQuery = req.parse_queries()?;
    let clio = get_clio_from_depot(depot)?;

    let page = linkage::list_contacts(&clio, &query).await?;

    Ok(Envelope::ok("Contacts fetched", page))
}

/// ## Summary
/// POST /clio/contacts - Create an external contact for an account and open
/// its matter.
///
/// A contact-linked but matter-less account resumes at the matter step.
///
/// ## Errors
/// Returns HTTP 404 if the account does not exist
/// Returns HTTP 409 if the account is already linked
/// Returns HTTP 502 if a remote call fails
#[handler]
async fn create_contact_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Envelope<Linkage>> {
    let body: CreateContactRequest = req.parse_json().await?;
    let clio = get_clio_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let linkage = linkage::create_contact(&mut conn, &clio, body.account_id).await?;

    Ok(Envelope::ok("Contact created", linkage))
}

/// ## Summary
/// PUT /clio/contacts/assign - Tie an existing external contact to an
/// account and open its matter.
///
/// ## Errors
/// Returns HTTP 404 if the account or the remote contact does not exist
/// Returns HTTP 409 if either side of the linkage is already taken
/// Returns HTTP 502 if a remote call fails
#[handler]
async fn assign_contact_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Envelope<Linkage>> {
    let body: AssignContactRequest = req.parse_json().await?;
    let clio = get_clio_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let linkage = linkage::assign_contact(&mut conn, &clio, &body).await?;

    Ok(Envelope::ok("Contact assigned", linkage))
}

/// ## Summary
/// GET /clio/activity-descriptions - List the remote catalog with the point
/// cost of each entry at the configured rate.
///
/// ## Errors
/// Returns HTTP 502 if the remote listing fails or its payload is unreadable
#[handler]
async fn list_descriptions_handler(
    depot: &mut Depot,
) -> AppResult<Envelope<Vec<PricedDescription>>> {
    let clio = get_clio_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let catalog = activities::list_descriptions(&mut conn, &clio).await?;

    Ok(Envelope::ok("Activity descriptions fetched", catalog))
}

/// ## Summary
/// POST /clio/activity-descriptions - Create a remote activity description.
///
/// ## Errors
/// Returns HTTP 400 without a name
/// Returns HTTP 502 if the remote call fails
#[handler]
async fn create_description_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Envelope<serde_json::Value>> {
    let body: DescriptionRequest = req.parse_json().await?;
    let clio = get_clio_from_depot(depot)?;

    let created = activities::create_description(&clio, &body).await?;

    Ok(Envelope::ok("Activity description created", created))
}

/// ## Summary
/// PUT /clio/activity-descriptions/{description_id} - Merge-patch a remote
/// activity description.
///
/// ## Errors
/// Returns HTTP 400 for a malformed id or an empty patch
/// Returns HTTP 502 if the remote call fails
#[handler]
async fn update_description_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Envelope<serde_json::Value>> {
    let description_id = path_i64(req, "description_id")?;
    let body: DescriptionRequest = req.parse_json().await?;
    let clio = get_clio_from_depot(depot)?;

    let updated = activities::update_description(&clio, description_id, &body).await?;

    Ok(Envelope::ok("Activity description updated", updated))
}

/// ## Summary
/// DELETE /clio/activity-descriptions/{description_id} - Delete a remote
/// activity description.
///
/// ## Errors
/// Returns HTTP 400 for a malformed id
/// Returns HTTP 502 if the remote call fails
#[handler]
async fn delete_description_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Envelope<()>> {
    let description_id = path_i64(req, "description_id")?;
    let clio = get_clio_from_depot(depot)?;

    activities::delete_description(&clio, description_id).await?;

    Ok(Envelope::message_only("Activity description deleted"))
}

/// ## Summary
/// GET /clio/point-value - Return the stored conversion rate, `null` when
/// none is set.
///
/// ## Errors
/// Returns HTTP 401 without a session, HTTP 403 without the admin role
#[handler]
async fn get_point_value_handler(depot: &mut Depot) -> AppResult<Envelope<serde_json::Value>> {
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let value = billing::stored_rate(&mut conn).await?;

    Ok(Envelope::ok(
        "Point value fetched",
        json!({ "point_value": value }),
    ))
}

/// ## Summary
/// PUT /clio/point-value - Store a new conversion rate, recording which
/// admin set it.
///
/// ## Errors
/// Returns HTTP 400 for a non-positive value
#[handler]
async fn update_point_value_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Envelope<serde_json::Value>> {
    let body: PointValueBody = req.parse_json().await?;
    let provider = get_db_from_depot(depot)?;
    let admin_id = get_admin_from_depot(depot)?.id;
    let mut conn = provider.get_connection().await?;

    let stored = billing::update_rate(&mut conn, admin_id, body.point_value).await?;

    Ok(Envelope::ok(
        "Point value updated",
        json!({ "point_value": stored }),
    ))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(CLIO_ROUTE_COMPONENT)
        .hoop(SessionAuth)
        .push(Router::with_path("activities").post(post_activity_handler))
        .push(
            Router::new()
                .hoop(AdminGate)
                .push(
                    Router::with_path("contacts")
                        .get(list_contacts_handler)
                        .post(create_contact_handler)
                        .push(Router::with_path("assign").put(assign_contact_handler)),
                )
                .push(
                    Router::with_path("activity-descriptions")
                        .get(list_descriptions_handler)
                        .post(create_description_handler)
                        .push(
                            Router::with_path("{description_id}")
                                .put(update_description_handler)
                                .delete(delete_description_handler),
                        ),
                )
                .push(
                    Router::with_path("point-value")
                        .get(get_point_value_handler)
                        .put(update_point_value_handler),
                ),
        )
}
