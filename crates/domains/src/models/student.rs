use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentStatus {
    Pending,
    Admitted,
    Active,
    Inactive,
    Withdrawn,
}

impl StudentStatus {
    /// A class may only be assigned to admitted or active students.
    pub fn can_take_class(self) -> bool {
        matches!(self, StudentStatus::Admitted | StudentStatus::Active)
    }
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StudentStatus::Pending => "pending",
            StudentStatus::Admitted => "admitted",
            StudentStatus::Active => "active",
            StudentStatus::Inactive => "inactive",
            StudentStatus::Withdrawn => "withdrawn",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub status: StudentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admitted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admitted_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
}

impl Student {
    /// A freshly registered student awaiting admission.
    pub fn pending(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            status: StudentStatus::Pending,
            class_id: None,
            class_name: None,
            admitted_at: None,
            admitted_by: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Seat movements committed atomically with the student record.
///
/// `joined` gains one seat, `left` releases one. Every entity carries the
/// already-mutated state together with the version observed before the
/// change; the store rejects the whole change if any version moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentChange {
    pub student: Student,
    pub joined: Option<super::class::ClassSection>,
    pub left: Option<super::class::ClassSection>,
}
