//! Contact use-case service.
//!
//! # Invariants
//! - `edit` only overwrites fields present in the patch.
//! - Blank optional fields (email, address) are stored as `None`.

use crate::model::contact::{Contact, ContactId};
use crate::model::listing::Listing;
use crate::repo::contact_repo::ContactRepository;
use crate::repo::RepoError;
use crate::schedule::clock::{Clock, SystemClock};
use crate::service::non_blank;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for contact use-cases.
#[derive(Debug)]
pub enum ContactServiceError {
    /// No contact has this id.
    NotFound(ContactId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ContactServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "contact not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ContactServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<RepoError> for ContactServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { id, .. } => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Input for [`ContactService::add`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewContact {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Field-level contact update.
///
/// `None` or a blank value keeps the stored name and phone. For optional
/// fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<Option<String>>,
    pub address: Option<Option<String>>,
}

impl ContactPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none() && self.email.is_none() && self.address.is_none()
    }

    fn apply(&self, contact: &mut Contact) {
        if let Some(name) = non_blank(self.name.as_deref()) {
            contact.name = name;
        }
        if let Some(phone) = non_blank(self.phone.as_deref()) {
            contact.phone = phone;
        }
        if let Some(email) = &self.email {
            contact.email = non_blank(email.as_deref());
        }
        if let Some(address) = &self.address {
            contact.address = non_blank(address.as_deref());
        }
    }
}

/// Contact facade over repository implementations.
pub struct ContactService<R: ContactRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
}

impl<R: ContactRepository> ContactService<R> {
    /// Creates a service stamping records with the system clock.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: ContactRepository, C: Clock> ContactService<R, C> {
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    /// Adds a contact with the next sequential id.
    pub fn add(&self, input: &NewContact) -> Result<Contact, ContactServiceError> {
        let contact = Contact {
            id: self.repo.next_contact_id()?,
            name: input.name.trim().to_string(),
            phone: input.phone.trim().to_string(),
            email: non_blank(input.email.as_deref()),
            address: non_blank(input.address.as_deref()),
            created_at: self.clock.now(),
        };
        self.repo.insert_contact(&contact)?;
        info!(
            "event=contact_add module=service status=ok contact_id={}",
            contact.id
        );
        Ok(contact)
    }

    /// Lists all contacts in id order.
    pub fn list(&self) -> Result<Listing<Contact>, ContactServiceError> {
        let contacts = self.repo.list_contacts()?;
        Ok(Listing::from_filtered(contacts.len(), contacts))
    }

    /// Finds contacts by name (case-insensitive) or phone (literal).
    ///
    /// An empty term matches every contact.
    pub fn search(&self, term: &str) -> Result<Listing<Contact>, ContactServiceError> {
        let contacts = self.repo.list_contacts()?;
        let matches = contacts
            .into_iter()
            .filter(|contact| contact.matches(term))
            .collect::<Vec<_>>();
        // Search reports "no matches" even when nothing is stored.
        if matches.is_empty() {
            return Ok(Listing::NoMatches);
        }
        Ok(Listing::Found(matches))
    }

    pub fn get(&self, id: ContactId) -> Result<Contact, ContactServiceError> {
        self.repo
            .get_contact(id)?
            .ok_or(ContactServiceError::NotFound(id))
    }

    /// Applies a patch to one contact and returns the stored result.
    pub fn edit(&self, id: ContactId, patch: &ContactPatch) -> Result<Contact, ContactServiceError> {
        let mut contact = self.get(id)?;
        patch.apply(&mut contact);
        self.repo.update_contact(&contact)?;
        info!(
            "event=contact_edit module=service status=ok contact_id={}",
            contact.id
        );
        Ok(contact)
    }

    /// Deletes one contact and returns the removed record.
    pub fn delete(&self, id: ContactId) -> Result<Contact, ContactServiceError> {
        let contact = self.get(id)?;
        self.repo.delete_contact(id)?;
        info!("event=contact_delete module=service status=ok contact_id={id}");
        Ok(contact)
    }
}
