//! # Roster Rules
//!
//! Pure checks over a class's current assignment set and enrollment. The
//! service runs these against a fresh snapshot before every write.

use std::collections::HashMap;

use crate::errors::{ConflictKind, DomainError, Result, ValidationErrors};
use crate::models::{
    ClassSection, ClassTeacherAssignment, Student, TeacherRole, TeacherWorkload,
};

/// Field rules shared by class creation and class edits.
pub fn validate_class(class: &ClassSection) -> Result<()> {
    let mut errors = ValidationErrors::default();
    if class.name.trim().is_empty() {
        errors.add("name", "Class name is required");
    }
    if class.grade_id.trim().is_empty() {
        errors.add("gradeId", "Grade is required");
    }
    if class.capacity == 0 {
        errors.add("capacity", "Capacity must be a positive number");
    }
    if class.day.trim().is_empty() {
        errors.add("day", "Day is required");
    }
    errors.into_result()
}

/// Adding `teacher_id` with `role` must not duplicate the teacher or create a
/// second primary.
pub fn check_assign(
    assignments: &[ClassTeacherAssignment],
    teacher_id: &str,
    role: TeacherRole,
) -> Result<()> {
    if assignments.iter().any(|a| a.teacher_id == teacher_id) {
        return Err(DomainError::Conflict(ConflictKind::DuplicateTeacher {
            teacher_id: teacher_id.to_string(),
        }));
    }
    if role == TeacherRole::Primary {
        check_primary_free(assignments, teacher_id)?;
    }
    Ok(())
}

/// `teacher_id` must be assigned; promoting to primary must not displace an
/// existing primary held by someone else.
pub fn check_role_change(
    assignments: &[ClassTeacherAssignment],
    teacher_id: &str,
    new_role: TeacherRole,
) -> Result<()> {
    if !assignments.iter().any(|a| a.teacher_id == teacher_id) {
        return Err(DomainError::not_found("class teacher", teacher_id));
    }
    if new_role == TeacherRole::Primary {
        check_primary_free(assignments, teacher_id)?;
    }
    Ok(())
}

fn check_primary_free(assignments: &[ClassTeacherAssignment], teacher_id: &str) -> Result<()> {
    match assignments
        .iter()
        .find(|a| a.role == TeacherRole::Primary && a.teacher_id != teacher_id)
    {
        Some(existing) => Err(DomainError::Conflict(ConflictKind::PrimaryAlreadyAssigned {
            existing_teacher_id: existing.teacher_id.clone(),
        })),
        None => Ok(()),
    }
}

/// Both roster invariants hold: at most one primary, no repeated teacher.
pub fn roster_is_consistent(assignments: &[ClassTeacherAssignment]) -> bool {
    let primaries = assignments
        .iter()
        .filter(|a| a.role == TeacherRole::Primary)
        .count();
    let mut seen = std::collections::HashSet::new();
    primaries <= 1 && assignments.iter().all(|a| seen.insert(a.teacher_id.as_str()))
}

/// The class can take one more student right now.
pub fn check_enrollment(class: &ClassSection) -> Result<()> {
    if !class.is_active() {
        return Err(DomainError::Conflict(ConflictKind::ClassInactive {
            class_id: class.id.to_string(),
        }));
    }
    if class.enrolled >= class.capacity {
        return Err(DomainError::Conflict(ConflictKind::CapacityExceeded {
            class_id: class.id.to_string(),
            capacity: class.capacity,
        }));
    }
    Ok(())
}

/// The student's status allows a class assignment.
pub fn check_student_can_take_class(student: &Student) -> Result<()> {
    if student.status.can_take_class() {
        Ok(())
    } else {
        Err(DomainError::invalid_transition(
            "student",
            student.status,
            "assign class",
        ))
    }
}

/// Primary vs assistant counts per teacher, busiest first.
pub fn teacher_workload(classes: &[ClassSection]) -> Vec<TeacherWorkload> {
    let mut by_teacher: HashMap<&str, TeacherWorkload> = HashMap::new();
    for assignment in classes.iter().flat_map(|c| c.teachers.iter()) {
        let entry = by_teacher
            .entry(assignment.teacher_id.as_str())
            .or_insert_with(|| TeacherWorkload {
                teacher_id: assignment.teacher_id.clone(),
                teacher_name: assignment.teacher_name.clone(),
                primary_count: 0,
                assistant_count: 0,
            });
        match assignment.role {
            TeacherRole::Primary => entry.primary_count += 1,
            TeacherRole::Assistant => entry.assistant_count += 1,
        }
    }

    let mut workload: Vec<_> = by_teacher.into_values().collect();
    workload.sort_by(|a, b| {
        b.total()
            .cmp(&a.total())
            .then_with(|| a.teacher_name.cmp(&b.teacher_name))
            .then_with(|| a.teacher_id.cmp(&b.teacher_id))
    });
    workload
}
