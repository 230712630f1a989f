//! HTTP surface of the Gavel backend: the route tree, request middleware,
//! and the hoops that share configuration, database, mail, and
//! practice-management clients with handlers through the depot.

pub mod app;
pub mod clio_handler;
pub mod config;
pub mod db_handler;
pub mod error;
pub mod mail_handler;
pub mod middleware;
pub mod response;
