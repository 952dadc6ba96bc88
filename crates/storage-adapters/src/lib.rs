//! school-desk/crates/storage-adapters/src/lib.rs
//!
//! In-memory implementations of the repository ports. Every write is a
//! compare-and-swap on the entity's `version`; the store bumps it.

pub mod content;
pub mod roster;

pub use content::InMemoryContentRepository;
pub use roster::InMemoryRosterStore;

use domains::{ConflictKind, DomainError};

pub(crate) fn stale(entity: &'static str, id: impl ToString) -> DomainError {
    DomainError::Conflict(ConflictKind::StaleWrite {
        entity,
        id: id.to_string(),
    })
}
