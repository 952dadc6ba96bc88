//! # Class Models
//!
//! Class sections, their teacher roster, and the read-side projections built
//! from them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeacherRole {
    Primary,
    Assistant,
}

impl fmt::Display for TeacherRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TeacherRole::Primary => "primary",
            TeacherRole::Assistant => "assistant",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClassStatus {
    #[default]
    Active,
    Inactive,
}

impl fmt::Display for ClassStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ClassStatus::Active => "active",
            ClassStatus::Inactive => "inactive",
        })
    }
}

/// One teacher's role in one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassTeacherAssignment {
    pub teacher_id: String,
    pub teacher_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_email: Option<String>,
    pub role: TeacherRole,
    pub assigned_at: DateTime<Utc>,
    /// Principal id of the administrator who made the assignment.
    pub assigned_by: String,
}

/// Who is being assigned; the service stamps time and assigner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherRef {
    pub teacher_id: String,
    pub teacher_name: String,
    #[serde(default)]
    pub teacher_email: Option<String>,
}

impl TeacherRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            teacher_id: id.into(),
            teacher_name: name.into(),
            teacher_email: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSection {
    pub id: Uuid,
    pub name: String,
    pub grade_id: String,
    #[serde(default)]
    pub grade_name: String,
    /// Day of week, free text ("Saturday").
    pub day: String,
    /// Time window, free text ("10:00-12:00").
    pub time: String,
    pub capacity: u32,
    pub enrolled: u32,
    pub status: ClassStatus,
    pub academic_year: String,
    #[serde(default)]
    pub teachers: Vec<ClassTeacherAssignment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
}

impl ClassSection {
    pub fn primary_teacher(&self) -> Option<&ClassTeacherAssignment> {
        self.teachers.iter().find(|t| t.role == TeacherRole::Primary)
    }

    pub fn assistant_teachers(&self) -> impl Iterator<Item = &ClassTeacherAssignment> {
        self.teachers.iter().filter(|t| t.role == TeacherRole::Assistant)
    }

    pub fn assignment(&self, teacher_id: &str) -> Option<&ClassTeacherAssignment> {
        self.teachers.iter().find(|t| t.teacher_id == teacher_id)
    }

    /// No primary teacher, regardless of assistants.
    pub fn is_unassigned(&self) -> bool {
        self.primary_teacher().is_none()
    }

    pub fn is_active(&self) -> bool {
        self.status == ClassStatus::Active
    }

    pub fn available_seats(&self) -> u32 {
        self.capacity.saturating_sub(self.enrolled)
    }

    /// Capacity was lowered below current enrollment after the fact.
    pub fn is_over_capacity(&self) -> bool {
        self.enrolled > self.capacity
    }

    /// "Primary (+N assistants)" style label for roster screens.
    pub fn teachers_display(&self) -> String {
        let assistants = self.assistant_teachers().count();
        match (self.primary_teacher(), assistants) {
            (None, 0) => "Unassigned".to_string(),
            (None, n) => format!("No primary (+{n} assistant{})", plural(n)),
            (Some(p), 0) => p.teacher_name.clone(),
            (Some(p), n) => format!("{} (+{n} assistant{})", p.teacher_name, plural(n)),
        }
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Input for creating a class section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClass {
    pub name: String,
    pub grade_id: String,
    #[serde(default)]
    pub grade_name: String,
    pub day: String,
    pub time: String,
    pub capacity: u32,
    pub academic_year: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassPatch {
    pub name: Option<String>,
    pub grade_id: Option<String>,
    pub grade_name: Option<String>,
    pub day: Option<String>,
    pub time: Option<String>,
    pub capacity: Option<u32>,
    pub academic_year: Option<String>,
}

impl ClassPatch {
    /// Capacity and schedule edits are only accepted while the class is active.
    pub fn touches_schedule_or_capacity(&self) -> bool {
        self.day.is_some() || self.time.is_some() || self.capacity.is_some()
    }

    pub fn apply_to(self, class: &mut ClassSection) {
        if let Some(v) = self.name {
            class.name = v;
        }
        if let Some(v) = self.grade_id {
            class.grade_id = v;
        }
        if let Some(v) = self.grade_name {
            class.grade_name = v;
        }
        if let Some(v) = self.day {
            class.day = v;
        }
        if let Some(v) = self.time {
            class.time = v;
        }
        if let Some(v) = self.capacity {
            class.capacity = v;
        }
        if let Some(v) = self.academic_year {
            class.academic_year = v;
        }
    }
}

/// Non-blocking notices returned alongside a successful class update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ClassWarning {
    CapacityBelowEnrollment { capacity: u32, enrolled: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassUpdate {
    pub class: ClassSection,
    pub warnings: Vec<ClassWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassFilter {
    pub status: Option<ClassStatus>,
    pub grade_id: Option<String>,
    pub teacher_id: Option<String>,
    /// Only classes without a primary teacher.
    #[serde(default)]
    pub unassigned: bool,
    /// `None` returns every match.
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

impl ClassFilter {
    pub fn matches(&self, class: &ClassSection) -> bool {
        self.status.is_none_or(|s| class.status == s)
            && self
                .grade_id
                .as_deref()
                .is_none_or(|g| class.grade_id == g)
            && self
                .teacher_id
                .as_deref()
                .is_none_or(|t| class.assignment(t).is_some())
            && (!self.unassigned || class.is_unassigned())
    }
}

/// Dropdown entry for enrollment flows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassOption {
    pub id: Uuid,
    pub name: String,
    pub grade_id: String,
    pub grade_name: String,
    pub day: String,
    pub time: String,
    pub capacity: u32,
    pub enrolled: u32,
    pub available: u32,
    pub teachers: Vec<ClassTeacherAssignment>,
}

impl From<ClassSection> for ClassOption {
    fn from(class: ClassSection) -> Self {
        Self {
            available: class.available_seats(),
            id: class.id,
            name: class.name,
            grade_id: class.grade_id,
            grade_name: class.grade_name,
            day: class.day,
            time: class.time,
            capacity: class.capacity,
            enrolled: class.enrolled,
            teachers: class.teachers,
        }
    }
}

/// Per-teacher assignment counts across a set of classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherWorkload {
    pub teacher_id: String,
    pub teacher_name: String,
    pub primary_count: usize,
    pub assistant_count: usize,
}

impl TeacherWorkload {
    pub fn total(&self) -> usize {
        self.primary_count + self.assistant_count
    }
}
