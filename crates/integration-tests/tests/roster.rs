use domains::roster::roster_is_consistent;
use domains::{
    ClassFilter, ClassPatch, ClassStatus, ClassWarning, ConflictKind, DomainError, StudentStatus,
    TeacherRef, TeacherRole,
};
use integration_tests::{admin, other_teacher, parent, teacher, Harness};
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

fn t(id: &str) -> TeacherRef {
    TeacherRef::new(id, format!("Teacher {id}"))
}

#[tokio::test]
async fn single_seat_class_takes_one_student() {
    let h = Harness::new();
    let roster = h.roster_as(&admin());
    let class = h.class("1-A", 1).await;
    let first = h.student("Anu", StudentStatus::Admitted).await;
    let second = h.student("Bala", StudentStatus::Active).await;

    let placed = assert_ok!(roster.assign_student_to_class(first.id, class.id).await);
    assert_eq!(placed.class_id, Some(class.id));
    assert_eq!(placed.class_name.as_deref(), Some("1-A"));
    assert_eq!(placed.status, StudentStatus::Active);
    assert_eq!(assert_ok!(roster.get_class(class.id).await).enrolled, 1);

    let err = assert_err!(roster.assign_student_to_class(second.id, class.id).await);
    assert!(matches!(
        err,
        DomainError::Conflict(ConflictKind::CapacityExceeded { capacity: 1, .. })
    ));

    let class = assert_ok!(roster.get_class(class.id).await);
    assert_eq!(class.enrolled, 1);
    assert!(class.enrolled <= class.capacity);
    assert_eq!(assert_ok!(roster.get_student(second.id).await).class_id, None);
}

#[tokio::test]
async fn one_primary_per_class() {
    let h = Harness::new();
    let roster = h.roster_as(&admin());
    let class = h.class("2-A", 10).await;

    assert_ok!(roster.assign_teacher(class.id, t("t1"), TeacherRole::Primary).await);
    let err = assert_err!(roster.assign_teacher(class.id, t("t2"), TeacherRole::Primary).await);
    assert!(matches!(
        err,
        DomainError::Conflict(ConflictKind::PrimaryAlreadyAssigned { .. })
    ));

    assert_ok!(roster.update_teacher_role(class.id, "t1", TeacherRole::Assistant).await);
    let class = assert_ok!(roster.assign_teacher(class.id, t("t2"), TeacherRole::Primary).await);

    assert_eq!(class.primary_teacher().map(|a| a.teacher_id.as_str()), Some("t2"));
    assert_eq!(class.assistant_teachers().count(), 1);
    assert!(roster_is_consistent(&class.teachers));
}

#[tokio::test]
async fn a_teacher_is_assigned_at_most_once() {
    let h = Harness::new();
    let roster = h.roster_as(&admin());
    let class = h.class("2-B", 10).await;

    assert_ok!(roster.assign_teacher(class.id, t("t1"), TeacherRole::Assistant).await);
    for role in [TeacherRole::Assistant, TeacherRole::Primary] {
        let err = assert_err!(roster.assign_teacher(class.id, t("t1"), role).await);
        assert!(matches!(err, DomainError::Conflict(ConflictKind::DuplicateTeacher { .. })));
    }
    assert_eq!(assert_ok!(roster.get_class(class.id).await).teachers.len(), 1);
}

#[tokio::test]
async fn role_changes_and_removal() {
    let h = Harness::new();
    let roster = h.roster_as(&admin());
    let class = h.class("3-A", 10).await;
    assert_ok!(roster.assign_teacher(class.id, t("t1"), TeacherRole::Primary).await);
    assert_ok!(roster.assign_teacher(class.id, t("t2"), TeacherRole::Assistant).await);

    let err = assert_err!(roster.update_teacher_role(class.id, "t2", TeacherRole::Primary).await);
    assert!(matches!(err, DomainError::Conflict(_)));
    let err = assert_err!(roster.update_teacher_role(class.id, "ghost", TeacherRole::Assistant).await);
    assert!(matches!(err, DomainError::NotFound { .. }));

    let before = assert_ok!(roster.get_class(class.id).await);
    let after = assert_ok!(roster.remove_teacher(class.id, "ghost").await);
    assert_eq!(after.version, before.version);

    let after = assert_ok!(roster.remove_teacher(class.id, "t1").await);
    assert!(after.is_unassigned());
    assert_eq!(after.teachers_display(), "No primary (+1 assistant)");
}

#[tokio::test]
async fn roster_changes_are_admin_only() {
    let h = Harness::new();
    let class = h.class("4-A", 10).await;

    for who in [teacher(), parent()] {
        let roster = h.roster_as(&who);
        let err = assert_err!(roster.assign_teacher(class.id, t("t9"), TeacherRole::Primary).await);
        assert!(matches!(err, DomainError::Unauthorized(_)));
        let err = assert_err!(roster.deactivate_class(class.id).await);
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }
}

#[tokio::test]
async fn capacity_below_enrollment_is_allowed_with_warning() {
    let h = Harness::new();
    let roster = h.roster_as(&admin());
    let class = h.class("5-A", 3).await;
    for name in ["A", "B"] {
        let s = h.student(name, StudentStatus::Admitted).await;
        assert_ok!(roster.assign_student_to_class(s.id, class.id).await);
    }

    let update = assert_ok!(
        roster
            .update_class(
                class.id,
                ClassPatch {
                    capacity: Some(1),
                    ..Default::default()
                }
            )
            .await
    );
    assert_eq!(update.class.capacity, 1);
    assert_eq!(
        update.warnings,
        vec![ClassWarning::CapacityBelowEnrollment {
            capacity: 1,
            enrolled: 2
        }]
    );

    let late = h.student("C", StudentStatus::Admitted).await;
    let err = assert_err!(roster.assign_student_to_class(late.id, class.id).await);
    assert!(matches!(err, DomainError::Conflict(ConflictKind::CapacityExceeded { .. })));
}

#[tokio::test]
async fn inactive_classes_refuse_students_and_schedule_edits() {
    let h = Harness::new();
    let roster = h.roster_as(&admin());
    let class = h.class("6-A", 10).await;
    assert_ok!(roster.deactivate_class(class.id).await);

    let student = h.student("Devi", StudentStatus::Admitted).await;
    let err = assert_err!(roster.assign_student_to_class(student.id, class.id).await);
    assert!(matches!(err, DomainError::Conflict(ConflictKind::ClassInactive { .. })));

    let err = assert_err!(
        roster
            .update_class(
                class.id,
                ClassPatch {
                    day: Some("Sunday".into()),
                    ..Default::default()
                }
            )
            .await
    );
    assert!(matches!(err, DomainError::InvalidTransition { .. }));

    let renamed = assert_ok!(
        roster
            .update_class(
                class.id,
                ClassPatch {
                    name: Some("6-A (archived)".into()),
                    ..Default::default()
                }
            )
            .await
    );
    assert!(renamed.warnings.is_empty());

    let err = assert_err!(roster.deactivate_class(class.id).await);
    assert!(matches!(err, DomainError::InvalidTransition { .. }));
    let active = assert_ok!(roster.reactivate_class(class.id).await);
    assert_eq!(active.status, ClassStatus::Active);
}

#[tokio::test]
async fn moving_and_unassigning_students_keeps_counts() {
    let h = Harness::new();
    let roster = h.roster_as(&admin());
    let a = h.class("7-A", 5).await;
    let b = h.class("7-B", 5).await;
    let student = h.student("Esha", StudentStatus::Admitted).await;

    assert_ok!(roster.assign_student_to_class(student.id, a.id).await);
    let same = assert_ok!(roster.assign_student_to_class(student.id, a.id).await);
    assert_eq!(same.class_id, Some(a.id));
    assert_eq!(assert_ok!(roster.get_class(a.id).await).enrolled, 1);

    let moved = assert_ok!(roster.assign_student_to_class(student.id, b.id).await);
    assert_eq!(moved.class_id, Some(b.id));
    assert_eq!(assert_ok!(roster.get_class(a.id).await).enrolled, 0);
    assert_eq!(assert_ok!(roster.get_class(b.id).await).enrolled, 1);

    let cleared = assert_ok!(roster.unassign_student(student.id).await);
    assert_eq!(cleared.class_id, None);
    assert_eq!(cleared.class_name, None);
    assert_eq!(cleared.status, StudentStatus::Active);
    assert_eq!(assert_ok!(roster.get_class(b.id).await).enrolled, 0);

    let again = assert_ok!(roster.unassign_student(student.id).await);
    assert_eq!(again.version, cleared.version);
}

#[tokio::test]
async fn student_status_gates() {
    let h = Harness::new();
    let roster = h.roster_as(&admin());
    let class = h.class("8-A", 5).await;
    let pending = h.student("Fathima", StudentStatus::Pending).await;

    let err = assert_err!(roster.assign_student_to_class(pending.id, class.id).await);
    assert!(matches!(err, DomainError::InvalidTransition { .. }));

    let admitted = assert_ok!(roster.admit_student(pending.id).await);
    assert_eq!(admitted.status, StudentStatus::Admitted);
    assert_eq!(admitted.admitted_by.as_deref(), Some("admin-1"));
    assert!(admitted.admitted_at.is_some());

    let err = assert_err!(roster.admit_student(pending.id).await);
    assert!(matches!(err, DomainError::InvalidTransition { .. }));

    let withdrawn = h.student("Gopi", StudentStatus::Withdrawn).await;
    let err = assert_err!(roster.assign_student_to_class(withdrawn.id, class.id).await);
    assert!(matches!(err, DomainError::InvalidTransition { .. }));
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let h = Harness::new();
    let roster = h.roster_as(&admin());
    let class = h.class("9-A", 5).await;
    let student = h.student("Hari", StudentStatus::Admitted).await;

    let err = assert_err!(roster.assign_student_to_class(Uuid::new_v4(), class.id).await);
    assert!(matches!(err, DomainError::NotFound { entity: "student", .. }));
    let err = assert_err!(roster.assign_student_to_class(student.id, Uuid::new_v4()).await);
    assert!(matches!(err, DomainError::NotFound { entity: "class", .. }));
    let err = assert_err!(roster.get_class(Uuid::new_v4()).await);
    assert!(matches!(err, DomainError::NotFound { .. }));
}

#[tokio::test]
async fn listings_filters_and_workload() {
    let h = Harness::new();
    let roster = h.roster_as(&admin());
    let a = h.class("1-A", 5).await;
    let b = h.class("1-B", 5).await;
    let c = h.class("1-C", 5).await;

    let me = teacher();
    let lead = TeacherRef::new(&me.id, &me.name);
    assert_ok!(roster.assign_teacher(a.id, lead.clone(), TeacherRole::Primary).await);
    assert_ok!(roster.assign_teacher(b.id, lead, TeacherRole::Assistant).await);
    assert_ok!(roster.assign_teacher(b.id, t("t2"), TeacherRole::Primary).await);
    assert_ok!(roster.deactivate_class(c.id).await);

    let unassigned = ClassFilter {
        unassigned: true,
        ..Default::default()
    };
    let listed = assert_ok!(roster.list_classes(&unassigned).await);
    assert_eq!(listed.items.iter().map(|c| c.id).collect::<Vec<_>>(), vec![c.id]);

    let active = ClassFilter {
        status: Some(ClassStatus::Active),
        grade_id: Some("g1".into()),
        ..Default::default()
    };
    assert_eq!(assert_ok!(roster.list_classes(&active).await).total, 2);

    let mine = assert_ok!(h.roster_as(&me).list_classes(&ClassFilter::default()).await);
    assert_eq!(mine.total, 2);

    let first = ClassFilter {
        limit: Some(1),
        ..Default::default()
    };
    let page = assert_ok!(roster.list_classes(&first).await);
    assert_eq!(page.items.iter().map(|c| c.id).collect::<Vec<_>>(), vec![a.id]);
    assert_eq!(page.total, 3);
    assert!(page.has_more());
    assert_ok!(h.roster_as(&me).get_class(a.id).await);
    let err = assert_err!(h.roster_as(&other_teacher()).get_class(a.id).await);
    assert!(matches!(err, DomainError::Unauthorized(_)));

    let options = assert_ok!(roster.class_options().await);
    assert_eq!(options.len(), 2);
    assert!(options.iter().all(|o| o.available == 5));

    let workload = assert_ok!(roster.teacher_workload().await);
    assert_eq!(workload[0].teacher_id, "teacher-1");
    assert_eq!((workload[0].primary_count, workload[0].assistant_count), (1, 1));
    assert_eq!(workload[1].teacher_id, "t2");
}
