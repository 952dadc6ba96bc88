//! Shared fixtures for the scenario tests: one set of in-memory stores and
//! services built per acting principal on top of it.

use std::sync::Arc;

use auth_adapters::StaticIdentity;
use domains::{
    Bilingual, ClassSection, ContentFields, NewClass, Principal, Role, Student, StudentRepository,
    StudentStatus,
};
use services::{ContentService, RosterService};
use storage_adapters::{InMemoryContentRepository, InMemoryRosterStore};

pub fn admin() -> Principal {
    Principal::new("admin-1", "Lakshmi", Role::Admin)
}

pub fn super_admin() -> Principal {
    Principal::new("root-1", "Priya", Role::SuperAdmin)
}

pub fn teacher() -> Principal {
    Principal::new("teacher-1", "Meena", Role::Teacher)
}

pub fn other_teacher() -> Principal {
    Principal::new("teacher-2", "Arun", Role::Teacher)
}

pub fn parent() -> Principal {
    Principal::new("parent-1", "Kavitha", Role::Parent)
}

pub fn fields(title: &str) -> ContentFields {
    ContentFields {
        title: Bilingual::en(title),
        summary: Bilingual::en(format!("{title} summary")),
        body: Bilingual::en(format!("<p>{title} body</p>")),
        ..Default::default()
    }
}

pub fn new_class(name: &str, capacity: u32) -> NewClass {
    NewClass {
        name: name.into(),
        grade_id: "g1".into(),
        grade_name: "Grade 1".into(),
        day: "Saturday".into(),
        time: "10:00".into(),
        capacity,
        academic_year: "2026-27".into(),
    }
}

#[derive(Clone, Default)]
pub struct Harness {
    pub content: Arc<InMemoryContentRepository>,
    pub roster: Arc<InMemoryRosterStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content_as(&self, principal: &Principal) -> ContentService {
        ContentService::new(
            self.content.clone(),
            Arc::new(StaticIdentity::new(principal.clone())),
        )
    }

    pub fn roster_as(&self, principal: &Principal) -> RosterService {
        RosterService::new(
            self.roster.clone(),
            self.roster.clone(),
            Arc::new(StaticIdentity::new(principal.clone())),
        )
    }

    pub async fn class(&self, name: &str, capacity: u32) -> ClassSection {
        self.roster_as(&admin())
            .create_class(new_class(name, capacity))
            .await
            .expect("class fixture")
    }

    /// Inserts a student directly in the given status.
    pub async fn student(&self, first_name: &str, status: StudentStatus) -> Student {
        let mut student = Student::pending(first_name, "Test");
        student.status = status;
        StudentRepository::insert(self.roster.as_ref(), &student)
            .await
            .expect("student fixture")
    }
}
