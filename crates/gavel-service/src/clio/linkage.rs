//! Account to external contact and matter linkage.
//!
//! Linking is a two-step saga: create (or adopt) the contact, then open the
//! matter under it. Each step claims its local id column with a
//! compare-and-set, so of two racing requests exactly one links. A failure
//! between the steps leaves a contact-linked, matter-less account that a
//! later call resumes at the matter step.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use gavel_db::db::connection::DbConnection;
use gavel_db::db::query::account;
use gavel_db::model::account::Account;

use crate::clio::client::{self, ClioClient};
use crate::error::{ServiceError, ServiceResult, unique_violation_to_conflict};

#[derive(Debug, Deserialize)]
pub struct CreateContactRequest {
    pub account_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct AssignContactRequest {
    pub account_id: Uuid,
    pub contact_id: i64,
}

/// The external identifiers tied to an account.
#[derive(Debug, Serialize)]
pub struct Linkage {
    pub contact_id: i64,
    pub matter_id: i64,
}

/// ## Summary
/// Creates an external person contact for the account and opens its matter.
///
/// A fully linked account is a conflict. A contact-linked, matter-less
/// account skips straight to the matter step. The contact id is claimed
/// with a compare-and-set; the loser of a race reports `Conflict` and logs
/// the remote contact it orphaned.
///
/// ## Errors
/// Returns `NotFound` for a missing account, `Conflict` when the linkage is
/// already taken, and external errors from the remote calls.
pub async fn create_contact(
    conn: &mut DbConnection<'_>,
    clio: &ClioClient,
    account_id: Uuid,
) -> ServiceResult<Linkage> {
    let Some(account) = account::find_live_by_id(conn, account_id).await? else {
        return Err(ServiceError::NotFound("Account not found".to_string()));
    };
    if account.clio_contact_id.is_some() && account.clio_matter_id.is_some() {
        return Err(ServiceError::Conflict(
            "Account is already linked to a contact".to_string(),
        ));
    }

    let contact_id = match account.clio_contact_id {
        Some(existing) => {
            tracing::debug!(
                account_id = %account.id,
                contact_id = existing,
                "Resuming linkage at the matter step"
            );
            existing
        }
        None => {
            let payload = person_payload(&account, clio.custom_field());
            let created = client::data(clio.post("/contacts.json", &payload).await?)?;
            let contact_id = client::record_id(&created)?;

            let claimed = account::claim_clio_contact(conn, account.id, contact_id)
                .await
                .map_err(|e| {
                    unique_violation_to_conflict(e, "Contact is already assigned to an account")
                })?;
            if claimed == 0 {
                tracing::warn!(
                    account_id = %account.id,
                    contact_id,
                    "Linkage race lost; the remote contact is orphaned"
                );
                return Err(ServiceError::Conflict(
                    "Account is already linked to a contact".to_string(),
                ));
            }
            contact_id
        }
    };

    let matter_id = open_matter(conn, clio, account.id, contact_id).await?;
    Ok(Linkage {
        contact_id,
        matter_id,
    })
}

/// ## Summary
/// Points an account at an existing external contact, then opens its matter.
///
/// The remote contact is probed first so a typo cannot claim a dangling id.
/// Re-assigning the contact the account already holds resumes the matter
/// step instead of failing.
///
/// ## Errors
/// Returns `NotFound` when the account or the remote contact is missing and
/// `Conflict` when either side of the linkage is already taken.
pub async fn assign_contact(
    conn: &mut DbConnection<'_>,
    clio: &ClioClient,
    request: &AssignContactRequest,
) -> ServiceResult<Linkage> {
    let Some(account) = account::find_live_by_id(conn, request.account_id).await? else {
        return Err(ServiceError::NotFound("Account not found".to_string()));
    };
    if account.clio_contact_id.is_some() && account.clio_matter_id.is_some() {
        return Err(ServiceError::Conflict(
            "Account is already linked to a contact".to_string(),
        ));
    }

    let contact_id = match account.clio_contact_id {
        Some(existing) if existing == request.contact_id => existing,
        Some(_) => {
            return Err(ServiceError::Conflict(
                "Account is already linked to a different contact".to_string(),
            ));
        }
        None => {
            match clio
                .get(&format!("/contacts/{}.json", request.contact_id), &[])
                .await
            {
                Ok(_) => {}
                Err(ServiceError::ExternalService { status: 404, .. }) => {
                    return Err(ServiceError::NotFound("Contact not found".to_string()));
                }
                Err(error) => return Err(error),
            }

            let claimed = account::claim_clio_contact(conn, account.id, request.contact_id)
                .await
                .map_err(|e| {
                    unique_violation_to_conflict(
                        e,
                        "Contact is already assigned to another account",
                    )
                })?;
            if claimed == 0 {
                return Err(ServiceError::Conflict(
                    "Account is already linked to a contact".to_string(),
                ));
            }
            request.contact_id
        }
    };

    let matter_id = open_matter(conn, clio, account.id, contact_id).await?;
    Ok(Linkage {
        contact_id,
        matter_id,
    })
}

async fn open_matter(
    conn: &mut DbConnection<'_>,
    clio: &ClioClient,
    account_id: Uuid,
    contact_id: i64,
) -> ServiceResult<i64> {
    let payload = serde_json::json!({
        "data": {
            "client": { "id": contact_id },
            "description": clio.matter_description(),
            "status": "open",
            "billable": true,
        }
    });
    let created = client::data(clio.post("/matters.json", &payload).await?)?;
    let matter_id = client::record_id(&created)?;

    let claimed = account::set_clio_matter(conn, account_id, matter_id).await?;
    if claimed == 0 {
        tracing::warn!(
            %account_id,
            matter_id,
            "Matter race lost; the remote matter is orphaned"
        );
        return Err(ServiceError::Conflict(
            "Account already has a matter".to_string(),
        ));
    }

    tracing::info!(%account_id, contact_id, matter_id, "Account linked");
    Ok(matter_id)
}

/// Paging controls forwarded to the external contact listing.
#[derive(Debug, Default, Deserialize)]
pub struct ContactListQuery {
    pub query: Option<String>,
    pub limit: Option<i64>,
    pub page_token: Option<String>,
}

/// ## Summary
/// Lists external person contacts, forwarding paging and search untouched.
/// The raw page comes back as-is so the caller keeps the records and the
/// paging metadata together.
///
/// ## Errors
/// Returns `Transport` or `ExternalService` from the remote call.
pub async fn list_contacts(clio: &ClioClient, query: &ContactListQuery) -> ServiceResult<Value> {
    let mut params: Vec<(&str, String)> = vec![("type", "Person".to_string())];
    if let Some(search) = query.query.as_deref() {
        params.push(("query", search.to_string()));
    }
    if let Some(limit) = query.limit {
        params.push(("limit", limit.to_string()));
    }
    if let Some(token) = query.page_token.as_deref() {
        params.push(("page_token", token.to_string()));
    }
    clio.get("/contacts.json", &params).await
}

/// Profile fields mirrored onto the linked external contact.
#[derive(Debug, Default)]
pub struct ContactPatchFields<'a> {
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub physical_address: Option<&'a str>,
    pub mailing_address: Option<&'a str>,
}

impl ContactPatchFields<'_> {
    /// True when no field is set and the remote call can be skipped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.physical_address.is_none()
            && self.mailing_address.is_none()
    }
}

/// ## Summary
/// Merge-patches profile fields onto the linked contact.
///
/// Sub-resources (phone numbers, addresses) update in place only when the
/// patch carries the existing entry's id; the current contact is fetched
/// first so the patch can reuse those ids instead of appending duplicates.
///
/// ## Errors
/// Returns `Transport` or `ExternalService` from the remote calls and
/// `ExternalFormat` when the contact payload is unreadable.
pub async fn update_contact_profile(
    clio: &ClioClient,
    contact_id: i64,
    fields: &ContactPatchFields<'_>,
) -> ServiceResult<()> {
    let current = client::data(
        clio.get(
            &format!("/contacts/{contact_id}.json"),
            &[(
                "fields",
                "id,phone_numbers{id,name},addresses{id,name}".to_string(),
            )],
        )
        .await?,
    )?;

    let patch = contact_merge_patch(&current, fields);
    if patch.as_object().is_some_and(serde_json::Map::is_empty) {
        return Ok(());
    }

    clio.patch(
        &format!("/contacts/{contact_id}.json"),
        &serde_json::json!({ "data": patch }),
    )
    .await?;
    Ok(())
}

fn person_payload(account: &Account, custom_field: Option<i64>) -> Value {
    let mut person = serde_json::Map::new();
    person.insert("type".to_string(), Value::from("Person"));
    if let Some(first_name) = account.first_name.as_deref() {
        person.insert("first_name".to_string(), Value::from(first_name));
    }
    if let Some(last_name) = account.last_name.as_deref() {
        person.insert("last_name".to_string(), Value::from(last_name));
    }
    person.insert(
        "email_addresses".to_string(),
        serde_json::json!([{
            "name": "Other",
            "address": account.email,
            "default_email": true,
        }]),
    );
    if let Some(phone) = account.phone.as_deref() {
        person.insert(
            "phone_numbers".to_string(),
            serde_json::json!([{
                "name": "Mobile",
                "number": phone,
                "default_number": true,
            }]),
        );
    }
    if let Some(field_id) = custom_field {
        person.insert(
            "custom_field_values".to_string(),
            serde_json::json!([{
                "value": account.id.to_string(),
                "custom_field": { "id": field_id },
            }]),
        );
    }
    serde_json::json!({ "data": person })
}

fn contact_merge_patch(current: &Value, fields: &ContactPatchFields<'_>) -> Value {
    let mut data = serde_json::Map::new();
    if let Some(first_name) = fields.first_name {
        data.insert("first_name".to_string(), Value::from(first_name));
    }
    if let Some(last_name) = fields.last_name {
        data.insert("last_name".to_string(), Value::from(last_name));
    }
    if let Some(phone) = fields.phone {
        data.insert(
            "phone_numbers".to_string(),
            Value::Array(vec![slot_patch(
                current,
                "phone_numbers",
                "Mobile",
                "number",
                phone,
            )]),
        );
    }

    let mut addresses = Vec::new();
    if let Some(physical) = fields.physical_address {
        addresses.push(slot_patch(current, "addresses", "Home", "street", physical));
    }
    if let Some(mailing) = fields.mailing_address {
        addresses.push(slot_patch(current, "addresses", "Other", "street", mailing));
    }
    if !addresses.is_empty() {
        data.insert("addresses".to_string(), Value::Array(addresses));
    }

    Value::Object(data)
}

/// Builds one sub-resource entry, reusing the existing record id when the
/// named slot is already present so the remote side updates in place
/// instead of appending a duplicate.
fn slot_patch(current: &Value, collection: &str, slot: &str, value_key: &str, value: &str) -> Value {
    let existing_id = current
        .get(collection)
        .and_then(Value::as_array)
        .and_then(|entries| {
            entries
                .iter()
                .find(|entry| entry.get("name").and_then(Value::as_str) == Some(slot))
        })
        .and_then(|entry| entry.get("id"))
        .and_then(Value::as_i64);

    let mut entry = serde_json::Map::new();
    entry.insert("name".to_string(), Value::from(slot));
    entry.insert(value_key.to_string(), Value::from(value));
    if let Some(id) = existing_id {
        entry.insert("id".to_string(), Value::from(id));
    }
    Value::Object(entry)
}
