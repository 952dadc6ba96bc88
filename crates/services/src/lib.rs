//! school-desk/crates/services/src/lib.rs
//!
//! Use-cases of the school desk core. Each service is handed its ports at
//! construction time, including the identity provider for the current
//! request, and keeps no state of its own.

pub mod content_service;
pub mod roster_service;

pub use content_service::ContentService;
pub use roster_service::RosterService;
