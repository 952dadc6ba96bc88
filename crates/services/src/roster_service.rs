//! # Roster Service
//!
//! Class sections, their teaching assignments and student enrollment.
//! All mutations are moderator-only.

use std::sync::Arc;

use chrono::Utc;
use domains::roster::{self, teacher_workload};
use domains::{
    ClassFilter, ClassOption, ClassPatch, ClassRepository, ClassSection, ClassStatus,
    ClassTeacherAssignment, ClassUpdate, ClassWarning, DomainError, EnrollmentChange,
    IdentityProvider, NewClass, Page, Principal, Result, Role, Student, StudentRepository,
    StudentStatus, TeacherRef, TeacherRole, TeacherWorkload,
};
use uuid::Uuid;

pub struct RosterService {
    classes: Arc<dyn ClassRepository>,
    students: Arc<dyn StudentRepository>,
    identity: Arc<dyn IdentityProvider>,
}

impl RosterService {
    pub fn new(
        classes: Arc<dyn ClassRepository>,
        students: Arc<dyn StudentRepository>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            classes,
            students,
            identity,
        }
    }

    async fn moderator(&self) -> Result<Principal> {
        let principal = self.identity.resolve_acting_principal().await?;
        if !principal.is_moderator() {
            return Err(DomainError::unauthorized(format!(
                "roster changes require an administrator (caller role: {})",
                principal.role
            )));
        }
        Ok(principal)
    }

    async fn load_class(&self, id: Uuid) -> Result<ClassSection> {
        self.classes
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("class", id))
    }

    async fn load_student(&self, id: Uuid) -> Result<Student> {
        self.students
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("student", id))
    }

    // ---------------------------------------------------------------------
    // Classes
    // ---------------------------------------------------------------------

    pub async fn create_class(&self, new: NewClass) -> Result<ClassSection> {
        let admin = self.moderator().await?;
        let now = Utc::now();
        let class = ClassSection {
            id: Uuid::new_v4(),
            name: new.name.trim().to_string(),
            grade_id: new.grade_id,
            grade_name: new.grade_name,
            day: new.day,
            time: new.time,
            capacity: new.capacity,
            enrolled: 0,
            status: ClassStatus::Active,
            academic_year: new.academic_year,
            teachers: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 0,
        };
        roster::validate_class(&class)?;
        let stored = self.classes.insert(&class).await?;

        tracing::info!(class_id = %stored.id, name = %stored.name, admin_id = %admin.id, "class created");
        Ok(stored)
    }

    /// Moderators see any class; teachers only classes they are assigned to.
    pub async fn get_class(&self, id: Uuid) -> Result<ClassSection> {
        let principal = self.identity.resolve_acting_principal().await?;
        let class = self.load_class(id).await?;
        match principal.role {
            _ if principal.is_moderator() => Ok(class),
            Role::Teacher if class.assignment(&principal.id).is_some() => Ok(class),
            _ => Err(DomainError::unauthorized("not assigned to this class")),
        }
    }

    /// Teachers are always scoped to their own classes; parents are refused.
    pub async fn list_classes(&self, filter: &ClassFilter) -> Result<Page<ClassSection>> {
        let principal = self.identity.resolve_acting_principal().await?;
        let classes = if principal.is_moderator() {
            self.classes.list(filter).await?
        } else if principal.role == Role::Teacher {
            let scoped = ClassFilter {
                teacher_id: Some(principal.id),
                ..filter.clone()
            };
            self.classes.list(&scoped).await?
        } else {
            return Err(DomainError::unauthorized("class listings are staff-only"));
        };
        Ok(Page::paginate(classes, filter.limit, filter.offset))
    }

    /// Active classes for enrollment pickers, with their remaining seats.
    pub async fn class_options(&self) -> Result<Vec<ClassOption>> {
        self.moderator().await?;
        let filter = ClassFilter {
            status: Some(ClassStatus::Active),
            ..Default::default()
        };
        let classes = self.classes.list(&filter).await?;
        Ok(classes.into_iter().map(ClassOption::from).collect())
    }

    /// Applies a patch. Lowering capacity below current enrollment is
    /// accepted and reported as a warning.
    pub async fn update_class(&self, id: Uuid, patch: ClassPatch) -> Result<ClassUpdate> {
        let admin = self.moderator().await?;
        let mut class = self.load_class(id).await?;

        if patch.touches_schedule_or_capacity() && !class.is_active() {
            return Err(DomainError::invalid_transition(
                "class",
                class.status,
                "edit schedule",
            ));
        }
        patch.apply_to(&mut class);
        class.name = class.name.trim().to_string();
        roster::validate_class(&class)?;
        class.updated_at = Utc::now();

        let stored = self.classes.update(&class).await?;
        let mut warnings = Vec::new();
        if stored.is_over_capacity() {
            tracing::warn!(
                class_id = %id,
                capacity = stored.capacity,
                enrolled = stored.enrolled,
                "class capacity set below enrollment"
            );
            warnings.push(ClassWarning::CapacityBelowEnrollment {
                capacity: stored.capacity,
                enrolled: stored.enrolled,
            });
        }

        tracing::info!(class_id = %id, admin_id = %admin.id, "class updated");
        Ok(ClassUpdate {
            class: stored,
            warnings,
        })
    }

    pub async fn deactivate_class(&self, id: Uuid) -> Result<ClassSection> {
        self.set_class_status(id, ClassStatus::Inactive, "deactivate")
            .await
    }

    pub async fn reactivate_class(&self, id: Uuid) -> Result<ClassSection> {
        self.set_class_status(id, ClassStatus::Active, "reactivate")
            .await
    }

    async fn set_class_status(
        &self,
        id: Uuid,
        to: ClassStatus,
        action: &'static str,
    ) -> Result<ClassSection> {
        let admin = self.moderator().await?;
        let mut class = self.load_class(id).await?;
        if class.status == to {
            return Err(DomainError::invalid_transition("class", class.status, action));
        }
        class.status = to;
        class.updated_at = Utc::now();
        let stored = self.classes.update(&class).await?;

        tracing::info!(class_id = %id, status = %to, admin_id = %admin.id, "class status changed");
        Ok(stored)
    }

    // ---------------------------------------------------------------------
    // Teaching assignments
    // ---------------------------------------------------------------------

    /// Adds a teacher. A second primary is refused, never demoted.
    pub async fn assign_teacher(
        &self,
        class_id: Uuid,
        teacher: TeacherRef,
        role: TeacherRole,
    ) -> Result<ClassSection> {
        let admin = self.moderator().await?;
        let mut class = self.load_class(class_id).await?;
        roster::check_assign(&class.teachers, &teacher.teacher_id, role)?;

        let now = Utc::now();
        class.teachers.push(ClassTeacherAssignment {
            teacher_id: teacher.teacher_id,
            teacher_name: teacher.teacher_name,
            teacher_email: teacher.teacher_email,
            role,
            assigned_at: now,
            assigned_by: admin.id.clone(),
        });
        class.updated_at = now;
        let stored = self.classes.update(&class).await?;

        tracing::info!(
            class_id = %class_id,
            teacher_count = stored.teachers.len(),
            %role,
            admin_id = %admin.id,
            "teacher assigned"
        );
        Ok(stored)
    }

    pub async fn update_teacher_role(
        &self,
        class_id: Uuid,
        teacher_id: &str,
        role: TeacherRole,
    ) -> Result<ClassSection> {
        let admin = self.moderator().await?;
        let mut class = self.load_class(class_id).await?;
        roster::check_role_change(&class.teachers, teacher_id, role)?;

        let unchanged = class
            .assignment(teacher_id)
            .is_some_and(|a| a.role == role);
        if unchanged {
            return Ok(class);
        }
        for assignment in class.teachers.iter_mut().filter(|a| a.teacher_id == teacher_id) {
            assignment.role = role;
        }
        class.updated_at = Utc::now();
        let stored = self.classes.update(&class).await?;

        tracing::info!(class_id = %class_id, teacher_id, %role, admin_id = %admin.id, "teacher role changed");
        Ok(stored)
    }

    /// Removing a teacher who is not assigned succeeds without a write.
    pub async fn remove_teacher(&self, class_id: Uuid, teacher_id: &str) -> Result<ClassSection> {
        let admin = self.moderator().await?;
        let mut class = self.load_class(class_id).await?;

        let before = class.teachers.len();
        class.teachers.retain(|a| a.teacher_id != teacher_id);
        if class.teachers.len() == before {
            tracing::debug!(class_id = %class_id, teacher_id, "teacher not assigned; nothing to remove");
            return Ok(class);
        }
        class.updated_at = Utc::now();
        let stored = self.classes.update(&class).await?;

        tracing::info!(class_id = %class_id, teacher_id, admin_id = %admin.id, "teacher removed");
        Ok(stored)
    }

    /// Primary vs assistant counts across active classes.
    pub async fn teacher_workload(&self) -> Result<Vec<TeacherWorkload>> {
        self.moderator().await?;
        let filter = ClassFilter {
            status: Some(ClassStatus::Active),
            ..Default::default()
        };
        let classes = self.classes.list(&filter).await?;
        Ok(teacher_workload(&classes))
    }

    // ---------------------------------------------------------------------
    // Students
    // ---------------------------------------------------------------------

    pub async fn get_student(&self, id: Uuid) -> Result<Student> {
        self.moderator().await?;
        self.load_student(id).await
    }

    /// `pending -> admitted`.
    pub async fn admit_student(&self, id: Uuid) -> Result<Student> {
        let admin = self.moderator().await?;
        let mut student = self.load_student(id).await?;
        if student.status != StudentStatus::Pending {
            return Err(DomainError::invalid_transition("student", student.status, "admit"));
        }

        let now = Utc::now();
        student.status = StudentStatus::Admitted;
        student.admitted_at = Some(now);
        student.admitted_by = Some(admin.id.clone());
        student.updated_at = now;
        let stored = self.students.update(&student).await?;

        tracing::info!(student_id = %id, admin_id = %admin.id, "student admitted");
        Ok(stored)
    }

    /// Takes a seat in `class_id`, releasing the seat in any previous class.
    /// The student record and every touched class are written together.
    pub async fn assign_student_to_class(&self, student_id: Uuid, class_id: Uuid) -> Result<Student> {
        let admin = self.moderator().await?;
        let mut student = self.load_student(student_id).await?;
        let mut class = self.load_class(class_id).await?;
        roster::check_student_can_take_class(&student)?;

        if student.class_id == Some(class_id) {
            return Ok(student);
        }
        roster::check_enrollment(&class)?;

        let left = self.release_seat(&student).await?;
        let now = Utc::now();
        class.enrolled += 1;
        class.updated_at = now;

        let previous = student.class_id;
        student.class_id = Some(class.id);
        student.class_name = Some(class.name.clone());
        if student.status == StudentStatus::Admitted {
            student.status = StudentStatus::Active;
        }
        student.updated_at = now;

        let stored = self
            .students
            .commit_enrollment(&EnrollmentChange {
                student,
                joined: Some(class),
                left,
            })
            .await?;

        tracing::info!(
            student_id = %student_id,
            class_id = %class_id,
            previous_class_id = ?previous,
            admin_id = %admin.id,
            "student assigned to class"
        );
        Ok(stored)
    }

    /// Clears the student's class and frees the seat. Status is left as is.
    pub async fn unassign_student(&self, student_id: Uuid) -> Result<Student> {
        let admin = self.moderator().await?;
        let mut student = self.load_student(student_id).await?;
        let Some(previous) = student.class_id else {
            return Ok(student);
        };

        let left = self.release_seat(&student).await?;
        student.class_id = None;
        student.class_name = None;
        student.updated_at = Utc::now();

        let stored = self
            .students
            .commit_enrollment(&EnrollmentChange {
                student,
                joined: None,
                left,
            })
            .await?;

        tracing::info!(student_id = %student_id, class_id = %previous, admin_id = %admin.id, "student unassigned");
        Ok(stored)
    }

    /// The student's current class with one seat released, if it still exists.
    async fn release_seat(&self, student: &Student) -> Result<Option<ClassSection>> {
        let Some(previous) = student.class_id else {
            return Ok(None);
        };
        let Some(mut class) = self.classes.get(previous).await? else {
            tracing::warn!(student_id = %student.id, class_id = %previous, "previous class no longer exists");
            return Ok(None);
        };
        class.enrolled = class.enrolled.saturating_sub(1);
        class.updated_at = Utc::now();
        Ok(Some(class))
    }
}
