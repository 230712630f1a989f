//! Request middleware: session authentication and the admin gate.

pub mod auth;
