//! Contact domain model.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Integer identity of a stored contact.
pub type ContactId = i64;

/// One address-book entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Local time at which the contact was added.
    pub created_at: NaiveDateTime,
}

impl Contact {
    /// Returns whether this contact matches a free-text search term.
    ///
    /// Name matching ignores case; phone matching is a literal substring
    /// check. An empty term matches every contact.
    pub fn matches(&self, term: &str) -> bool {
        self.name.to_lowercase().contains(&term.to_lowercase()) || self.phone.contains(term)
    }
}
