//! Service layer for business logic
//!
//! HTTP handlers and the CLI share these services.

mod link_service;

pub use link_service::*;
