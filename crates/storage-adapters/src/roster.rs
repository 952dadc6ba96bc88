//! # In-memory Roster Store
//!
//! Classes and students share one write lock so that an enrollment change
//! touching a student and up to two classes is checked and applied as a unit.
//! Reads go straight to the maps.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use dashmap::DashMap;
use domains::{
    ClassFilter, ClassRepository, ClassSection, DomainError, EnrollmentChange, Result, Student,
    StudentRepository,
};
use uuid::Uuid;

use crate::stale;

#[derive(Default)]
pub struct InMemoryRosterStore {
    classes: DashMap<Uuid, ClassSection>,
    students: DashMap<Uuid, Student>,
    writes: Mutex<()>,
}

impl InMemoryRosterStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn write_lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.writes
            .lock()
            .map_err(|_| DomainError::Internal("roster write lock poisoned".into()))
    }

    fn check_class_version(&self, class: &ClassSection) -> Result<()> {
        match self.classes.get(&class.id) {
            Some(current) if current.version == class.version => Ok(()),
            Some(_) => Err(stale("class", class.id)),
            None => Err(DomainError::not_found("class", class.id)),
        }
    }

    fn check_student_version(&self, student: &Student) -> Result<()> {
        match self.students.get(&student.id) {
            Some(current) if current.version == student.version => Ok(()),
            Some(_) => Err(stale("student", student.id)),
            None => Err(DomainError::not_found("student", student.id)),
        }
    }

    fn write_class(&self, class: &ClassSection) -> ClassSection {
        let mut stored = class.clone();
        stored.version += 1;
        self.classes.insert(stored.id, stored.clone());
        stored
    }

    fn write_student(&self, student: &Student) -> Student {
        let mut stored = student.clone();
        stored.version += 1;
        self.students.insert(stored.id, stored.clone());
        stored
    }
}

#[async_trait]
impl ClassRepository for InMemoryRosterStore {
    async fn insert(&self, class: &ClassSection) -> Result<ClassSection> {
        let _guard = self.write_lock()?;
        if self.classes.contains_key(&class.id) {
            return Err(DomainError::Internal(format!("class id {} already exists", class.id)));
        }
        let mut stored = class.clone();
        stored.version = 1;
        self.classes.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ClassSection>> {
        Ok(self.classes.get(&id).map(|class| class.clone()))
    }

    async fn update(&self, class: &ClassSection) -> Result<ClassSection> {
        let _guard = self.write_lock()?;
        self.check_class_version(class)?;
        Ok(self.write_class(class))
    }

    async fn list(&self, filter: &ClassFilter) -> Result<Vec<ClassSection>> {
        let mut matching: Vec<ClassSection> = self
            .classes
            .iter()
            .filter(|class| filter.matches(class))
            .map(|class| class.clone())
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(matching)
    }
}

#[async_trait]
impl StudentRepository for InMemoryRosterStore {
    async fn insert(&self, student: &Student) -> Result<Student> {
        let _guard = self.write_lock()?;
        if self.students.contains_key(&student.id) {
            return Err(DomainError::Internal(format!(
                "student id {} already exists",
                student.id
            )));
        }
        let mut stored = student.clone();
        stored.version = 1;
        self.students.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Student>> {
        Ok(self.students.get(&id).map(|student| student.clone()))
    }

    async fn update(&self, student: &Student) -> Result<Student> {
        let _guard = self.write_lock()?;
        self.check_student_version(student)?;
        Ok(self.write_student(student))
    }

    async fn commit_enrollment(&self, change: &EnrollmentChange) -> Result<Student> {
        let _guard = self.write_lock()?;

        self.check_student_version(&change.student)?;
        for class in change.joined.iter().chain(change.left.iter()) {
            self.check_class_version(class)?;
        }

        for class in change.joined.iter().chain(change.left.iter()) {
            self.write_class(class);
        }
        let stored = self.write_student(&change.student);
        tracing::debug!(
            student_id = %stored.id,
            joined = ?change.joined.as_ref().map(|c| c.id),
            left = ?change.left.as_ref().map(|c| c.id),
            "enrollment committed"
        );
        Ok(stored)
    }
}
