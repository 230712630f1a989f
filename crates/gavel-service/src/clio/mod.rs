//! Integration with the external practice-management system.
//!
//! ## Module Organization
//!
//! - [`client`]: authenticated JSON transport and envelope helpers
//! - [`linkage`]: account to contact/matter linking saga
//! - [`activities`]: billable activities and the description catalog
//! - [`documents`]: two-phase document upload plumbing

pub mod activities;
pub mod client;
pub mod documents;
pub mod linkage;
