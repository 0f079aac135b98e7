//! Contact repository contract and SQLite implementation.
//!
//! # Invariants
//! - List order is `id ASC`.
//! - Ids are assigned as `max(id) + 1`; a deleted top id can be reused.

use crate::model::contact::{Contact, ContactId};
use crate::repo::{ensure_table_exists, next_id, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const CONTACT_SELECT_SQL: &str = "SELECT
    id,
    name,
    phone,
    email,
    address,
    created_at
FROM contacts";

/// Repository interface for contact CRUD operations.
pub trait ContactRepository {
    fn next_contact_id(&self) -> RepoResult<ContactId>;
    fn insert_contact(&self, contact: &Contact) -> RepoResult<ContactId>;
    fn update_contact(&self, contact: &Contact) -> RepoResult<()>;
    fn get_contact(&self, id: ContactId) -> RepoResult<Option<Contact>>;
    fn list_contacts(&self) -> RepoResult<Vec<Contact>>;
    fn delete_contact(&self, id: ContactId) -> RepoResult<()>;
}

/// SQLite-backed contact repository.
pub struct SqliteContactRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContactRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_exists(conn, "contacts")?;
        Ok(Self { conn })
    }
}

impl ContactRepository for SqliteContactRepository<'_> {
    fn next_contact_id(&self) -> RepoResult<ContactId> {
        next_id(self.conn, "contacts")
    }

    fn insert_contact(&self, contact: &Contact) -> RepoResult<ContactId> {
        self.conn.execute(
            "INSERT INTO contacts (id, name, phone, email, address, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                contact.id,
                contact.name.as_str(),
                contact.phone.as_str(),
                contact.email.as_deref(),
                contact.address.as_deref(),
                contact.created_at,
            ],
        )?;
        Ok(contact.id)
    }

    fn update_contact(&self, contact: &Contact) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE contacts
             SET
                name = ?2,
                phone = ?3,
                email = ?4,
                address = ?5
             WHERE id = ?1;",
            params![
                contact.id,
                contact.name.as_str(),
                contact.phone.as_str(),
                contact.email.as_deref(),
                contact.address.as_deref(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                table: "contacts",
                id: contact.id,
            });
        }
        Ok(())
    }

    fn get_contact(&self, id: ContactId) -> RepoResult<Option<Contact>> {
        let contact = self
            .conn
            .query_row(
                &format!("{CONTACT_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_contact_row,
            )
            .optional()?;
        Ok(contact)
    }

    fn list_contacts(&self) -> RepoResult<Vec<Contact>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONTACT_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut contacts = Vec::new();
        while let Some(row) = rows.next()? {
            contacts.push(parse_contact_row(row)?);
        }
        Ok(contacts)
    }

    fn delete_contact(&self, id: ContactId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM contacts WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                table: "contacts",
                id,
            });
        }
        Ok(())
    }
}

fn parse_contact_row(row: &Row<'_>) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: row.get("id")?,
        name: row.get("name")?,
        phone: row.get("phone")?,
        email: row.get("email")?,
        address: row.get("address")?,
        created_at: row.get("created_at")?,
    })
}
