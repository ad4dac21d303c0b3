//! # Recurbot Gateway
//! HTTP surface: the management page plus JSON endpoints for creating,
//! listing, deleting and manually sending templates.

pub mod dashboard;
pub mod routes;
pub mod server;

pub use server::{AppState, build_router, start};
