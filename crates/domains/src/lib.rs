//! school-desk/crates/domains/src/lib.rs
//!
//! Entities, pure workflow and roster rules, and the port traits the
//! services are written against. Nothing in this crate performs I/O.

pub mod errors;
pub mod models;
pub mod ports;
pub mod roster;
pub mod validation;
pub mod workflow;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use models::*;
pub use ports::*;
