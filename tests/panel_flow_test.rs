use std::sync::Arc;

use registrar::{
    error::{PanelError, ValidationError},
    models::{
        Course, CourseType, NameDraft, Offering, OfferingDraft, OfferingRecord, Registration,
        RegistrationDraft,
    },
    panel::Panel,
    store::{EntityStore, MemoryStore, SqliteStore, Table},
};
use serde_json::json;

async fn seed(store: &dyn EntityStore) {
    store
        .insert(Table::CourseTypes, json!({ "name": "Lecture" }))
        .await
        .expect("Failed to seed course type");
    store
        .insert(Table::Courses, json!({ "name": "Algebra" }))
        .await
        .expect("Failed to seed course");
}

#[tokio::test]
async fn test_offering_then_registration_then_dangling_offering() {
    let store = Arc::new(MemoryStore::new());
    seed(store.as_ref()).await;

    let mut offerings = Panel::<Offering>::mount(store.clone()).await;
    offerings.set_form(OfferingDraft {
        course_id: Some(1),
        course_type_id: Some(1),
    });
    let offering = offerings.add().await.expect("Failed to add offering");
    assert_eq!(store.select(Table::Offerings).await.unwrap().len(), 1);

    let mut registrations = Panel::<Registration>::mount(store.clone()).await;
    let view = registrations.view();
    assert!(view.can_submit);
    assert_eq!(view.options.offerings[0].label, "Lecture - Algebra");

    registrations.set_form(RegistrationDraft {
        student: "Ana".to_string(),
        offering_id: Some(offering.id),
    });
    registrations.add().await.expect("Failed to register Ana");

    let view = registrations.view();
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].label, "Lecture - Algebra");
    assert_eq!(view.rows[0].display, "Ana — Lecture - Algebra");

    // Deleting the offering does not cascade to its registrations.
    offerings.delete(offering.id).await.expect("Failed to delete offering");
    assert!(offerings.rows().is_empty());

    registrations.reload().await;
    let view = registrations.view();
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].offering_id, offering.id);
    assert_eq!(view.rows[0].label, "Unknown Offering");
    assert!(view.options.no_offerings_available);
}

#[tokio::test]
async fn test_offering_label_degrades_when_course_type_removed() {
    let store = Arc::new(MemoryStore::new());
    seed(store.as_ref()).await;

    let mut offerings = Panel::<Offering>::mount(store.clone()).await;
    offerings.set_form(OfferingDraft {
        course_id: Some(1),
        course_type_id: Some(1),
    });
    offerings.add().await.expect("Failed to add offering");

    let mut course_types = Panel::<CourseType>::mount(store.clone()).await;
    course_types.delete(1).await.expect("Failed to delete course type");

    offerings.reload().await;
    assert_eq!(offerings.view().rows[0].label, "N/A - Algebra");
}

#[tokio::test]
async fn test_add_without_selection_leaves_rows_unchanged() {
    let store = Arc::new(MemoryStore::new());
    seed(store.as_ref()).await;

    let mut offerings = Panel::<Offering>::mount(store.clone()).await;
    offerings.set_form(OfferingDraft {
        course_id: None,
        course_type_id: Some(1),
    });

    let err = offerings.add().await.expect_err("course not selected");
    assert!(matches!(err, PanelError::Validation(ValidationError::MissingSelection)));
    assert_eq!(
        offerings.notice().map(|n| n.message.as_str()),
        Some("Please select both course and type")
    );
    assert!(offerings.rows().is_empty());
    assert!(store.select(Table::Offerings).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_offerings_are_accepted() {
    let store = Arc::new(MemoryStore::new());
    seed(store.as_ref()).await;

    let mut offerings = Panel::<Offering>::mount(store.clone()).await;
    for _ in 0..2 {
        offerings.set_form(OfferingDraft {
            course_id: Some(1),
            course_type_id: Some(1),
        });
        offerings.add().await.expect("duplicates are not prevented");
    }

    let labels: Vec<String> = offerings.view().rows.into_iter().map(|r| r.label).collect();
    assert_eq!(labels, vec!["Lecture - Algebra", "Lecture - Algebra"]);
}

async fn crud_properties(store: Arc<dyn EntityStore>) {
    // Names.
    let mut courses = Panel::<Course>::mount(store.clone()).await;
    courses.set_form(NameDraft {
        name: "Algebra".to_string(),
    });
    let course = courses.add().await.expect("Failed to add course");
    let listed: Vec<Course> = registrar::store::list(store.as_ref(), Table::Courses)
        .await
        .unwrap();
    assert_eq!(listed, vec![course.clone()]);

    courses.edit(course.id).unwrap();
    courses
        .set_draft(NameDraft {
            name: "Geometry".to_string(),
        })
        .unwrap();
    courses.save().await.expect("Failed to save course");
    let listed: Vec<Course> = registrar::store::list(store.as_ref(), Table::Courses)
        .await
        .unwrap();
    assert_eq!(listed[0].id, course.id);
    assert_eq!(listed[0].name, "Geometry");

    let mut course_types = Panel::<CourseType>::mount(store.clone()).await;
    course_types.set_form(NameDraft {
        name: "Lab".to_string(),
    });
    let course_type = course_types.add().await.expect("Failed to add course type");
    let listed: Vec<CourseType> = registrar::store::list(store.as_ref(), Table::CourseTypes)
        .await
        .unwrap();
    assert_eq!(listed, vec![course_type.clone()]);

    course_types.edit(course_type.id).unwrap();
    course_types
        .set_draft(NameDraft {
            name: "Practical".to_string(),
        })
        .unwrap();
    let course_type = course_types.save().await.expect("Failed to save course type");
    let listed: Vec<CourseType> = registrar::store::list(store.as_ref(), Table::CourseTypes)
        .await
        .unwrap();
    assert_eq!(
        listed,
        vec![CourseType {
            id: course_type.id,
            name: "Practical".to_string(),
        }]
    );

    // Offerings: only the edited key changes.
    let mut offerings = Panel::<Offering>::mount(store.clone()).await;
    offerings.set_form(OfferingDraft {
        course_id: Some(course.id),
        course_type_id: Some(course_type.id),
    });
    let offering = offerings.add().await.expect("Failed to add offering");

    course_types.set_form(NameDraft {
        name: "Seminar".to_string(),
    });
    let seminar = course_types.add().await.unwrap();
    offerings.reload().await;

    offerings.edit(offering.id).unwrap();
    offerings
        .set_draft(OfferingDraft {
            course_id: Some(course.id),
            course_type_id: Some(seminar.id),
        })
        .unwrap();
    let updated = offerings.save().await.expect("Failed to save offering");
    assert_eq!(updated.course_id, course.id);
    assert_eq!(updated.course_type_id, seminar.id);
    assert_eq!(offerings.view().rows[0].label, "Seminar - Geometry");
    let records: Vec<OfferingRecord> = registrar::store::list(store.as_ref(), Table::Offerings)
        .await
        .unwrap();
    let listed: Vec<Offering> = records
        .into_iter()
        .map(Offering::from)
        .collect();
    assert_eq!(listed, vec![updated.clone()]);

    offerings.set_form(OfferingDraft {
        course_id: Some(course.id),
        course_type_id: Some(course_type.id),
    });
    let second = offerings.add().await.expect("Failed to add second offering");

    // Registrations.
    let mut registrations = Panel::<Registration>::mount(store.clone()).await;
    registrations.set_form(RegistrationDraft {
        student: "Ana".to_string(),
        offering_id: Some(offering.id),
    });
    let registration = registrations.add().await.expect("Failed to register");
    assert_eq!(registration.student, "Ana");
    assert_eq!(registration.offering_id, offering.id);
    let listed: Vec<Registration> = registrar::store::list(store.as_ref(), Table::Registrations)
        .await
        .unwrap();
    assert_eq!(listed, vec![registration.clone()]);

    registrations.edit(registration.id).unwrap();
    registrations
        .set_draft(RegistrationDraft {
            student: "Ana".to_string(),
            offering_id: Some(second.id),
        })
        .unwrap();
    registrations.save().await.expect("Failed to move registration");
    let listed: Vec<Registration> = registrar::store::list(store.as_ref(), Table::Registrations)
        .await
        .unwrap();
    assert_eq!(
        listed,
        vec![Registration {
            id: registration.id,
            student: "Ana".to_string(),
            offering_id: second.id,
        }]
    );
    assert_eq!(registrations.view().rows[0].label, "Practical - Geometry");

    registrations.delete(registration.id).await.expect("Failed to delete");
    let listed: Vec<Registration> = registrar::store::list(store.as_ref(), Table::Registrations)
        .await
        .unwrap();
    assert!(listed.iter().all(|r| r.id != registration.id));
}

#[tokio::test]
async fn test_crud_properties_memory_store() {
    crud_properties(Arc::new(MemoryStore::new())).await;
}

#[tokio::test]
async fn test_crud_properties_sqlite_store() {
    let store = SqliteStore::in_memory()
        .await
        .expect("Failed to create test db");
    crud_properties(Arc::new(store)).await;
}
