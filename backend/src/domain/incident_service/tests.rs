//! Ingestion ordering, cleanup and announcement coverage.

use super::*;
use crate::domain::ports::{
    MockImageStore, MockIncidentNotifier, MockIncidentRepository, MockUserRepository,
    UserPersistenceError,
};
use crate::domain::{
    Email, ErrorCode, ImageUpload, IncidentDraft, IncidentFields, IncidentType, User, UserId,
};
use chrono::{DateTime, TimeZone, Utc};
use mockable::MockClock;
use rstest::{fixture, rstest};

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

#[fixture]
fn clock() -> MockClock {
    let mut clock = MockClock::new();
    clock.expect_utc().return_const(at(9));
    clock
}

fn upload(name: &str) -> ImageUpload {
    ImageUpload::try_new(Some(name.to_owned()), Some("image/png"), vec![1, 2, 3])
        .expect("valid upload")
}

fn submission(images: Vec<ImageUpload>, creator: Option<UserId>) -> IncidentSubmission {
    let draft = IncidentDraft::try_from_fields(IncidentFields {
        incident_type: Some("Fire".to_owned()),
        title: Some("Warehouse blaze".to_owned()),
        ..IncidentFields::default()
    })
    .expect("valid draft");
    IncidentSubmission::new(draft, images, creator).expect("valid submission")
}

fn storing_images() -> MockImageStore {
    let mut images = MockImageStore::new();
    images.expect_store().returning(|upload| {
        Ok(ImageRef::for_file(
            upload.original_name().unwrap_or("unnamed"),
        ))
    });
    images
}

/// Every looked-up creator exists.
fn known_users() -> MockUserRepository {
    let mut users = MockUserRepository::new();
    users.expect_find_by_id().returning(|id| {
        Ok(Some(User::new(
            *id,
            Email::new("reporter@example.com").expect("valid email"),
        )))
    });
    users
}

fn service(
    incidents: MockIncidentRepository,
    images: MockImageStore,
    notifier: MockIncidentNotifier,
    clock: MockClock,
) -> IncidentService {
    service_with_users(incidents, known_users(), images, notifier, clock)
}

fn service_with_users(
    incidents: MockIncidentRepository,
    users: MockUserRepository,
    images: MockImageStore,
    notifier: MockIncidentNotifier,
    clock: MockClock,
) -> IncidentService {
    IncidentService::new(
        Arc::new(incidents),
        Arc::new(users),
        Arc::new(images),
        Arc::new(notifier),
        Arc::new(clock),
    )
}

#[rstest]
#[tokio::test]
async fn announces_the_persisted_record(clock: MockClock) {
    let creator = UserId::random();
    let mut incidents = MockIncidentRepository::new();
    incidents
        .expect_insert()
        .withf(move |incident| {
            incident.created_at == at(9)
                && incident.user_id == Some(creator)
                && incident.incident_type == IncidentType::Fire
        })
        .times(1)
        .returning(|incident| {
            let mut stored = incident.clone();
            stored.created_at = at(10);
            Ok(stored)
        });
    let mut notifier = MockIncidentNotifier::new();
    notifier
        .expect_incident_created()
        .withf(|incident| incident.created_at == at(10))
        .times(1)
        .return_const(());

    let created = service(incidents, storing_images(), notifier, clock)
        .create(submission(Vec::new(), Some(creator)))
        .await
        .expect("creation succeeds");
    assert_eq!(created.created_at, at(10));
}

#[rstest]
#[tokio::test]
async fn stores_images_in_submission_order(clock: MockClock) {
    let mut incidents = MockIncidentRepository::new();
    incidents
        .expect_insert()
        .returning(|incident| Ok(incident.clone()));
    let mut notifier = MockIncidentNotifier::new();
    notifier.expect_incident_created().times(1).return_const(());

    let created = service(incidents, storing_images(), notifier, clock)
        .create(submission(vec![upload("a.png"), upload("b.png")], None))
        .await
        .expect("creation succeeds");
    let paths: Vec<_> = created.images.iter().map(ImageRef::as_str).collect();
    assert_eq!(paths, ["/uploads/a.png", "/uploads/b.png"]);
}

#[rstest]
#[case(IncidentPersistenceError::connection("refused"), ErrorCode::ServiceUnavailable)]
#[case(IncidentPersistenceError::query("constraint"), ErrorCode::InternalError)]
#[tokio::test]
async fn persistence_failure_discards_images_and_stays_silent(
    clock: MockClock,
    #[case] failure: IncidentPersistenceError,
    #[case] expected: ErrorCode,
) {
    let mut incidents = MockIncidentRepository::new();
    incidents
        .expect_insert()
        .returning(move |_| Err(failure.clone()));
    let mut images = storing_images();
    images.expect_remove().times(2).returning(|_| Ok(()));
    let mut notifier = MockIncidentNotifier::new();
    notifier.expect_incident_created().never();

    let err = service(incidents, images, notifier, clock)
        .create(submission(vec![upload("a.png"), upload("b.png")], None))
        .await
        .expect_err("insert fails");
    assert_eq!(err.code(), expected);
}

#[rstest]
#[tokio::test]
async fn image_failure_rolls_back_earlier_images(clock: MockClock) {
    let mut images = MockImageStore::new();
    let mut seq = mockall::Sequence::new();
    images
        .expect_store()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(ImageRef::for_file("first.png")));
    images
        .expect_store()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Err(ImageStoreError::io("disk full")));
    images
        .expect_remove()
        .withf(|image| image.file_name() == "first.png")
        .times(1)
        .returning(|_| Ok(()));
    let mut incidents = MockIncidentRepository::new();
    incidents.expect_insert().never();
    let mut notifier = MockIncidentNotifier::new();
    notifier.expect_incident_created().never();

    let err = service(incidents, images, notifier, clock)
        .create(submission(vec![upload("a.png"), upload("b.png")], None))
        .await
        .expect_err("second image fails");
    assert_eq!(err.code(), ErrorCode::InternalError);
}

#[rstest]
#[tokio::test]
async fn list_maps_connection_failures(clock: MockClock) {
    let mut incidents = MockIncidentRepository::new();
    incidents
        .expect_list_newest_first()
        .returning(|| Err(IncidentPersistenceError::connection("refused")));

    let err = service(
        incidents,
        MockImageStore::new(),
        MockIncidentNotifier::new(),
        clock,
    )
    .list()
    .await
    .expect_err("list fails");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn unknown_creator_is_rejected_before_anything_is_stored(clock: MockClock) {
    let creator = UserId::random();
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .withf(move |id| *id == creator)
        .times(1)
        .returning(|_| Ok(None));
    let mut images = MockImageStore::new();
    images.expect_store().never();
    let mut incidents = MockIncidentRepository::new();
    incidents.expect_insert().never();
    let mut notifier = MockIncidentNotifier::new();
    notifier.expect_incident_created().never();

    let err = service_with_users(incidents, users, images, notifier, clock)
        .create(submission(vec![upload("a.png")], Some(creator)))
        .await
        .expect_err("creator is gone");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
}

#[rstest]
#[tokio::test]
async fn anonymous_reports_skip_the_creator_lookup(clock: MockClock) {
    let mut users = MockUserRepository::new();
    users.expect_find_by_id().never();
    let mut incidents = MockIncidentRepository::new();
    incidents
        .expect_insert()
        .returning(|incident| Ok(incident.clone()));
    let mut notifier = MockIncidentNotifier::new();
    notifier.expect_incident_created().times(1).return_const(());

    let created = service_with_users(incidents, users, storing_images(), notifier, clock)
        .create(submission(Vec::new(), None))
        .await
        .expect("creation succeeds");
    assert_eq!(created.user_id, None);
}

#[rstest]
#[tokio::test]
async fn creator_lookup_outage_is_service_unavailable(clock: MockClock) {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .returning(|_| Err(UserPersistenceError::connection("refused")));
    let mut notifier = MockIncidentNotifier::new();
    notifier.expect_incident_created().never();

    let err = service_with_users(
        MockIncidentRepository::new(),
        users,
        MockImageStore::new(),
        notifier,
        clock,
    )
    .create(submission(Vec::new(), Some(UserId::random())))
    .await
    .expect_err("lookup fails");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn creator_removed_during_insert_is_unauthorised(clock: MockClock) {
    let mut incidents = MockIncidentRepository::new();
    incidents
        .expect_insert()
        .returning(|_| Err(IncidentPersistenceError::unknown_creator()));
    let mut images = storing_images();
    images.expect_remove().times(1).returning(|_| Ok(()));
    let mut notifier = MockIncidentNotifier::new();
    notifier.expect_incident_created().never();

    let err = service(incidents, images, notifier, clock)
        .create(submission(vec![upload("a.png")], Some(UserId::random())))
        .await
        .expect_err("foreign key rejects the row");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
}
