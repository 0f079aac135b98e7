use agenda_core::db::open_db_in_memory;
use agenda_core::{
    Contact, ContactPatch, ContactRepository, ContactService, ContactServiceError, FixedClock,
    Listing, NewContact, SqliteContactRepository,
};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 10)
        .unwrap()
        .and_hms_opt(14, 0, 0)
        .unwrap()
}

fn service(conn: &Connection) -> ContactService<SqliteContactRepository<'_>, FixedClock> {
    let repo = SqliteContactRepository::try_new(conn).unwrap();
    ContactService::with_clock(repo, FixedClock::new(now()))
}

fn new_contact(name: &str, phone: &str) -> NewContact {
    NewContact {
        name: name.to_string(),
        phone: phone.to_string(),
        ..NewContact::default()
    }
}

#[test]
fn add_assigns_sequential_ids_and_clock_timestamp() {
    let conn = open_db_in_memory().unwrap();
    let contacts = service(&conn);

    let first = contacts.add(&new_contact("Ana", "1111")).unwrap();
    let second = contacts
        .add(&NewContact {
            email: Some("bruno@example.com".to_string()),
            address: Some("   ".to_string()),
            ..new_contact("Bruno", "2222")
        })
        .unwrap();

    assert_eq!(first.id, 1);
    assert_eq!(second.id, 2);
    assert_eq!(first.created_at, now());
    assert_eq!(second.email.as_deref(), Some("bruno@example.com"));
    assert_eq!(second.address, None);

    let stored = contacts.get(2).unwrap();
    assert_eq!(stored, second);
}

#[test]
fn list_distinguishes_empty_store() {
    let conn = open_db_in_memory().unwrap();
    let contacts = service(&conn);
    assert_eq!(contacts.list().unwrap(), Listing::NoRecords);

    contacts.add(&new_contact("Ana", "1111")).unwrap();
    contacts.add(&new_contact("Bruno", "2222")).unwrap();
    let names = contacts
        .list()
        .unwrap()
        .into_items()
        .into_iter()
        .map(|contact| contact.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Ana", "Bruno"]);
}

#[test]
fn search_matches_name_case_insensitively_or_phone_literally() {
    let conn = open_db_in_memory().unwrap();
    let contacts = service(&conn);
    contacts.add(&new_contact("Ana Souza", "(11) 9999-0000")).unwrap();
    contacts.add(&new_contact("Bruno Lima", "(21) 8888-1234")).unwrap();

    let by_name = contacts.search("souza").unwrap();
    assert_eq!(ids(&by_name), vec![1]);

    let by_phone = contacts.search("8888").unwrap();
    assert_eq!(ids(&by_phone), vec![2]);

    assert_eq!(contacts.search("Carla").unwrap(), Listing::NoMatches);
}

#[test]
fn empty_search_term_returns_every_contact() {
    let conn = open_db_in_memory().unwrap();
    let contacts = service(&conn);
    assert_eq!(contacts.search("").unwrap(), Listing::NoMatches);

    contacts.add(&new_contact("Ana", "1111")).unwrap();
    contacts.add(&new_contact("Bruno", "2222")).unwrap();
    assert_eq!(ids(&contacts.search("").unwrap()), vec![1, 2]);
}

#[test]
fn edit_overwrites_only_supplied_fields() {
    let conn = open_db_in_memory().unwrap();
    let contacts = service(&conn);
    contacts
        .add(&NewContact {
            email: Some("ana@example.com".to_string()),
            address: Some("Rua A, 1".to_string()),
            ..new_contact("Ana", "1111")
        })
        .unwrap();

    let edited = contacts
        .edit(
            1,
            &ContactPatch {
                phone: Some("9999".to_string()),
                address: Some(None),
                ..ContactPatch::default()
            },
        )
        .unwrap();

    assert_eq!(edited.name, "Ana");
    assert_eq!(edited.phone, "9999");
    assert_eq!(edited.email.as_deref(), Some("ana@example.com"));
    assert_eq!(edited.address, None);
    assert_eq!(contacts.get(1).unwrap(), edited);
}

#[test]
fn edit_skips_blank_required_fields_and_trims_values() {
    let conn = open_db_in_memory().unwrap();
    let contacts = service(&conn);
    let ana = contacts.add(&new_contact("Ana", "555")).unwrap();

    let edited = contacts
        .edit(
            ana.id,
            &ContactPatch {
                name: Some("   ".to_string()),
                phone: Some("  777  ".to_string()),
                ..ContactPatch::default()
            },
        )
        .unwrap();

    assert_eq!(edited.name, "Ana");
    assert_eq!(edited.phone, "777");
    assert_eq!(contacts.get(ana.id).unwrap(), edited);
}

#[test]
fn edit_and_delete_report_missing_ids() {
    let conn = open_db_in_memory().unwrap();
    let contacts = service(&conn);

    let edit = contacts.edit(7, &ContactPatch::default()).unwrap_err();
    assert!(matches!(edit, ContactServiceError::NotFound(7)));

    let delete = contacts.delete(7).unwrap_err();
    assert!(matches!(delete, ContactServiceError::NotFound(7)));
}

#[test]
fn delete_removes_record_and_next_id_follows_max() {
    let conn = open_db_in_memory().unwrap();
    let contacts = service(&conn);
    for name in ["Ana", "Bruno", "Carla"] {
        contacts.add(&new_contact(name, "0000")).unwrap();
    }

    let removed = contacts.delete(2).unwrap();
    assert_eq!(removed.name, "Bruno");
    assert_eq!(ids(&contacts.list().unwrap()), vec![1, 3]);

    let repo = SqliteContactRepository::try_new(&conn).unwrap();
    assert_eq!(repo.next_contact_id().unwrap(), 4);
}

#[test]
fn repository_update_of_missing_row_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContactRepository::try_new(&conn).unwrap();
    let ghost = Contact {
        id: 42,
        name: "Ghost".to_string(),
        phone: "0".to_string(),
        email: None,
        address: None,
        created_at: now(),
    };
    assert!(repo.update_contact(&ghost).is_err());
    assert_eq!(repo.get_contact(42).unwrap(), None);
}

fn ids(listing: &Listing<Contact>) -> Vec<i64> {
    listing.items().iter().map(|contact| contact.id).collect()
}
