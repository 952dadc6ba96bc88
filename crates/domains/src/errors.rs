//! # DomainError
//!
//! Centralized error handling for the school-desk core.
//! Every variant is terminal for the current call; nothing here is retried.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// The primary error type for all domain and service operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The acting principal's role or identity does not permit the operation.
    #[error("not authorized: {0}")]
    Unauthorized(String),

    /// The entity's current state has no edge for the requested action.
    #[error("cannot {action} {entity} in status {from}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        action: String,
    },

    /// Field-level contract violations, keyed by field path.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// Capacity, assignment or concurrent-write conflicts.
    #[error("conflict: {0}")]
    Conflict(ConflictKind),

    /// Referenced entity id/slug does not resolve.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Adapter failure (storage unreachable, token backend down, ...).
    #[error("internal service error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, key: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn invalid_transition(
        entity: &'static str,
        from: impl fmt::Display,
        action: impl fmt::Display,
    ) -> Self {
        Self::InvalidTransition {
            entity,
            from: from.to_string(),
            action: action.to_string(),
        }
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized(reason.into())
    }

    /// Single-field validation failure.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::default();
        errors.add(field, message);
        Self::Validation(errors)
    }
}

/// The specific reason behind a [`DomainError::Conflict`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    /// `enrolled >= capacity` at the moment a student was assigned.
    CapacityExceeded { class_id: String, capacity: u32 },
    /// Enrollment into a deactivated class.
    ClassInactive { class_id: String },
    /// The teacher already holds a role in this class.
    DuplicateTeacher { teacher_id: String },
    /// Another teacher already holds the primary role.
    PrimaryAlreadyAssigned { existing_teacher_id: String },
    /// Another content item already owns the slug.
    SlugTaken { slug: String },
    /// The stored entity changed since it was read.
    StaleWrite { entity: &'static str, id: String },
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded { class_id, capacity } => {
                write!(f, "class {class_id} is at full capacity ({capacity})")
            }
            Self::ClassInactive { class_id } => {
                write!(f, "class {class_id} is inactive")
            }
            Self::DuplicateTeacher { teacher_id } => {
                write!(f, "teacher {teacher_id} is already assigned to this class")
            }
            Self::PrimaryAlreadyAssigned { existing_teacher_id } => write!(
                f,
                "teacher {existing_teacher_id} is already the primary teacher; change or remove that assignment first"
            ),
            Self::SlugTaken { slug } => write!(f, "slug {slug} is already in use"),
            Self::StaleWrite { entity, id } => {
                write!(f, "{entity} {id} was modified concurrently, reload and retry")
            }
        }
    }
}

/// Field path → human-readable message. Ordered so messages render stably.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    /// Records the first message for a field; later messages for the same
    /// field are dropped so each input shows one error.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// A specialized Result type for school-desk logic.
pub type Result<T> = std::result::Result<T, DomainError>;
