//! # Seed
//!
//! Fills the in-memory stores with a demo term: classes with teachers, a
//! few students, and news posts walked through the publication workflow.
//! Prints the public news feed as JSON when done.

use std::sync::Arc;

use anyhow::Context;
use auth_adapters::StaticIdentity;
use configs::{AppConfig, LogFormat};
use domains::{
    Bilingual, Category, ContentFields, NewClass, Principal, Role, Student, StudentRepository,
    TeacherRef, TeacherRole,
};
use services::{ContentService, RosterService};
use storage_adapters::{InMemoryContentRepository, InMemoryRosterStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    init_tracing(&config);

    let content_repo = Arc::new(InMemoryContentRepository::new());
    let roster_store = Arc::new(InMemoryRosterStore::new());

    let admin = Principal::new("admin-1", "Lakshmi Raman", Role::Admin);
    let teacher = Principal::new("teacher-1", "Meena Kumar", Role::Teacher);

    let identity_for = |who: &Principal| Arc::new(StaticIdentity::new(who.clone()));
    let roster = RosterService::new(roster_store.clone(), roster_store.clone(), identity_for(&admin));
    let admin_content =
        ContentService::new(content_repo.clone(), identity_for(&admin)).with_limits(config.content);
    let teacher_content =
        ContentService::new(content_repo.clone(), identity_for(&teacher)).with_limits(config.content);

    seed_roster(&roster, roster_store.as_ref(), &teacher).await?;
    seed_news(&admin_content, &teacher_content).await?;

    let feed = admin_content.list_published(None, Some(10), 0).await?;
    println!("{}", serde_json::to_string_pretty(&feed)?);
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn seed_roster(
    roster: &RosterService,
    students: &dyn StudentRepository,
    teacher: &Principal,
) -> anyhow::Result<()> {
    let mut class_ids = Vec::new();
    for (name, grade, day, capacity) in [
        ("Grade 1 - A", "g1", "Saturday", 20),
        ("Grade 1 - B", "g1", "Sunday", 20),
        ("Grade 2 - A", "g2", "Saturday", 18),
    ] {
        let class = roster
            .create_class(NewClass {
                name: name.into(),
                grade_id: grade.into(),
                grade_name: format!("Grade {}", &grade[1..]),
                day: day.into(),
                time: "10:00".into(),
                capacity,
                academic_year: "2026-27".into(),
            })
            .await?;
        class_ids.push(class.id);
    }

    let lead = TeacherRef::new(&teacher.id, &teacher.name);
    roster
        .assign_teacher(class_ids[0], lead.clone(), TeacherRole::Primary)
        .await?;
    roster
        .assign_teacher(class_ids[1], lead, TeacherRole::Assistant)
        .await?;
    roster
        .assign_teacher(
            class_ids[1],
            TeacherRef::new("teacher-2", "Arun Selvam"),
            TeacherRole::Primary,
        )
        .await?;

    for (i, (first, last)) in [("Anu", "Krishnan"), ("Bala", "Murugan"), ("Devi", "Raj")]
        .into_iter()
        .enumerate()
    {
        let student = students.insert(&Student::pending(first, last)).await?;
        roster.admit_student(student.id).await?;
        roster
            .assign_student_to_class(student.id, class_ids[i % class_ids.len()])
            .await?;
    }

    for load in roster.teacher_workload().await? {
        tracing::info!(
            teacher = %load.teacher_name,
            primary = load.primary_count,
            assistant = load.assistant_count,
            "workload"
        );
    }
    Ok(())
}

async fn seed_news(admin: &ContentService, teacher: &ContentService) -> anyhow::Result<()> {
    let welcome = admin
        .create_content(ContentFields {
            title: Bilingual::new("Welcome to the new term", "புதிய பருவத்திற்கு வரவேற்கிறோம்"),
            summary: Bilingual::en("Classes resume this Saturday."),
            body: Bilingual::en("<p>We look forward to seeing every family back.</p>"),
            category: Category::Announcements,
            is_pinned: true,
            priority: 90,
            ..Default::default()
        })
        .await?;
    admin.publish(welcome.id).await?;

    let fair = teacher
        .create_content(ContentFields {
            title: Bilingual::en("Grade 1 art fair"),
            summary: Bilingual::en("Student drawings on display."),
            body: Bilingual::en("<p>Drop by the hall after class.</p>"),
            category: Category::Events,
            tags: vec!["art".into(), "grade-1".into()],
            ..Default::default()
        })
        .await?;
    teacher.submit(fair.id).await?;
    admin.approve(fair.id).await?;
    admin.publish(fair.id).await?;

    let draft = teacher
        .create_content(ContentFields {
            title: Bilingual::en("Library hours"),
            summary: Bilingual::en("Draft pending review."),
            body: Bilingual::en("<p>Open before class.</p>"),
            ..Default::default()
        })
        .await?;
    teacher.submit(draft.id).await?;
    admin
        .reject(draft.id, "Please add the new opening times.")
        .await?;

    tracing::info!(pending = admin.pending_review_count().await?, "news seeded");
    Ok(())
}
