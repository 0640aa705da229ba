use residentsync_core::db::open_db_in_memory;
use residentsync_core::{
    ModelValidationError, Property, PropertyRepository, RepoError, Resident, ResidentRepository,
    SqlitePropertyRepository, SqliteResidentRepository,
};

fn seed_property(conn: &rusqlite::Connection, external_id: &str) -> Property {
    let property = Property::new(external_id);
    SqlitePropertyRepository::try_new(conn)
        .unwrap()
        .create_property(&property)
        .unwrap();
    property
}

#[test]
fn property_external_id_is_unique() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePropertyRepository::try_new(&conn).unwrap();

    repo.create_property(&Property::new("test")).unwrap();
    let err = repo.create_property(&Property::new("test")).unwrap_err();
    assert!(matches!(err, RepoError::DuplicateProperty(ref id) if id == "test"));
}

#[test]
fn padded_property_id_is_rejected_instead_of_stored_trimmed() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePropertyRepository::try_new(&conn).unwrap();

    let err = repo.create_property(&Property::new(" p1 ")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ModelValidationError::PaddedExternalId(_))
    ));
    assert!(repo.list_properties().unwrap().is_empty());

    let stored = Property::new("p1");
    repo.create_property(&stored).unwrap();
    assert_eq!(repo.list_properties().unwrap(), vec![stored]);
}

#[test]
fn properties_list_in_external_id_order_and_resolve_by_id() {
    let conn = open_db_in_memory().unwrap();
    let b = seed_property(&conn, "b-site");
    let a = seed_property(&conn, "a-site");
    let repo = SqlitePropertyRepository::try_new(&conn).unwrap();

    let listed = repo.list_properties().unwrap();
    assert_eq!(listed, vec![a.clone(), b.clone()]);
    assert_eq!(repo.get_property(b.uuid).unwrap(), Some(b));
    assert_eq!(repo.get_property_by_external_id(" a-site ").unwrap(), Some(a));
    assert_eq!(repo.get_property_by_external_id("missing").unwrap(), None);
}

#[test]
fn resident_pair_is_unique_within_property_only() {
    let conn = open_db_in_memory().unwrap();
    let p1 = seed_property(&conn, "p1");
    let p2 = seed_property(&conn, "p2");
    let repo = SqliteResidentRepository::try_new(&conn).unwrap();

    repo.create_resident(&Resident::new(p1.uuid, "r1", "r1@example.com"))
        .unwrap();
    repo.create_resident(&Resident::new(p2.uuid, "r1", "r1@example.com"))
        .unwrap();

    let err = repo
        .create_resident(&Resident::new(p1.uuid, "r1", "other@example.com"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::DuplicateResident { ref external_id, .. } if external_id == "r1"
    ));
}

#[test]
fn create_rejects_invalid_email_before_writing() {
    let conn = open_db_in_memory().unwrap();
    let p1 = seed_property(&conn, "p1");
    let repo = SqliteResidentRepository::try_new(&conn).unwrap();

    let err = repo
        .create_resident(&Resident::new(p1.uuid, "r1", "nope"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ModelValidationError::InvalidEmail(_))
    ));
    assert!(repo.all_residents(p1.uuid).unwrap().is_empty());
}

#[test]
fn deactivated_residents_leave_active_view_but_stay_in_full_view() {
    let conn = open_db_in_memory().unwrap();
    let p1 = seed_property(&conn, "p1");
    let repo = SqliteResidentRepository::try_new(&conn).unwrap();
    repo.create_residents(&[
        Resident::new(p1.uuid, "r1", "r1@example.com"),
        Resident::new(p1.uuid, "r2", "r2@example.com"),
    ])
    .unwrap();

    let changed = repo
        .deactivate_residents(p1.uuid, &["r1".to_string()])
        .unwrap();
    assert_eq!(changed, 1);

    let active: Vec<String> = repo
        .active_residents(p1.uuid)
        .unwrap()
        .into_iter()
        .map(|resident| resident.external_id)
        .collect();
    assert_eq!(active, vec!["r2".to_string()]);
    assert_eq!(repo.all_residents(p1.uuid).unwrap().len(), 2);

    let r1 = repo.get_resident(p1.uuid, "r1").unwrap().unwrap();
    assert!(!r1.is_active);
}

#[test]
fn deactivate_is_idempotent_and_scoped_to_property() {
    let conn = open_db_in_memory().unwrap();
    let p1 = seed_property(&conn, "p1");
    let p2 = seed_property(&conn, "p2");
    let repo = SqliteResidentRepository::try_new(&conn).unwrap();
    repo.create_residents(&[
        Resident::new(p1.uuid, "r1", "r1@example.com"),
        Resident::new(p2.uuid, "r1", "r1@example.com"),
    ])
    .unwrap();

    let ids = vec!["r1".to_string()];
    assert_eq!(repo.deactivate_residents(p1.uuid, &ids).unwrap(), 1);
    assert_eq!(repo.deactivate_residents(p1.uuid, &ids).unwrap(), 0);
    assert!(repo.get_resident(p2.uuid, "r1").unwrap().unwrap().is_active);
}

#[test]
fn deactivate_handles_id_sets_larger_than_one_statement() {
    let conn = open_db_in_memory().unwrap();
    let p1 = seed_property(&conn, "p1");
    let repo = SqliteResidentRepository::try_new(&conn).unwrap();

    let residents: Vec<Resident> = (0..1200)
        .map(|index| Resident::new(p1.uuid, format!("r{index}"), "bulk@example.com"))
        .collect();
    repo.create_residents(&residents).unwrap();

    let ids: Vec<String> = residents
        .iter()
        .map(|resident| resident.external_id.clone())
        .collect();
    assert_eq!(repo.deactivate_residents(p1.uuid, &ids).unwrap(), 1200);
    assert!(repo.active_residents(p1.uuid).unwrap().is_empty());
}

#[test]
fn update_email_reports_only_real_changes() {
    let conn = open_db_in_memory().unwrap();
    let p1 = seed_property(&conn, "p1");
    let repo = SqliteResidentRepository::try_new(&conn).unwrap();
    repo.create_resident(&Resident::new(p1.uuid, "r1", "old@example.com"))
        .unwrap();

    assert!(repo.update_email(p1.uuid, "r1", "new@example.com").unwrap());
    assert!(!repo.update_email(p1.uuid, "r1", "new@example.com").unwrap());
    assert_eq!(
        repo.get_resident(p1.uuid, "r1").unwrap().unwrap().email,
        "new@example.com"
    );
}

#[test]
fn reactivate_restores_departed_resident_with_new_email() {
    let conn = open_db_in_memory().unwrap();
    let p1 = seed_property(&conn, "p1");
    let repo = SqliteResidentRepository::try_new(&conn).unwrap();
    let original = Resident::new(p1.uuid, "r1", "old@example.com");
    repo.create_resident(&original).unwrap();
    repo.deactivate_residents(p1.uuid, &["r1".to_string()])
        .unwrap();

    repo.reactivate_resident(p1.uuid, "r1", "back@example.com")
        .unwrap();
    let restored = repo.get_resident(p1.uuid, "r1").unwrap().unwrap();
    assert!(restored.is_active);
    assert_eq!(restored.uuid, original.uuid);
    assert_eq!(restored.email, "back@example.com");

    let err = repo
        .reactivate_resident(p1.uuid, "r1", "again@example.com")
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn unnotified_listing_spans_properties_and_skips_inactive() {
    let conn = open_db_in_memory().unwrap();
    let p1 = seed_property(&conn, "p1");
    let p2 = seed_property(&conn, "p2");
    let repo = SqliteResidentRepository::try_new(&conn).unwrap();

    let mut already = Resident::new(p1.uuid, "r0", "r0@example.com");
    already.is_notified = true;
    repo.create_residents(&[
        already,
        Resident::new(p1.uuid, "r1", "r1@example.com"),
        Resident::new(p2.uuid, "r2", "r2@example.com"),
        Resident::new(p2.uuid, "gone", "gone@example.com"),
    ])
    .unwrap();
    repo.deactivate_residents(p2.uuid, &["gone".to_string()])
        .unwrap();

    let mut pending: Vec<String> = repo
        .list_unnotified()
        .unwrap()
        .into_iter()
        .map(|resident| resident.external_id)
        .collect();
    pending.sort();
    assert_eq!(pending, vec!["r1".to_string(), "r2".to_string()]);

    let r1 = repo.get_resident(p1.uuid, "r1").unwrap().unwrap();
    repo.mark_notified(r1.uuid).unwrap();
    assert_eq!(repo.list_unnotified().unwrap().len(), 1);
}

#[test]
fn mark_notified_unknown_resident_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteResidentRepository::try_new(&conn).unwrap();
    let id = uuid::Uuid::new_v4();

    let err = repo.mark_notified(id).unwrap_err();
    assert!(matches!(err, RepoError::ResidentNotFound(missing) if missing == id));
}
