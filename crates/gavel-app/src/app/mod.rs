//! Application surface: the HTTP API.

pub mod api;
