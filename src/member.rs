use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::RecordError,
    persistence::{format_timestamp, parse_timestamp},
    registry::Keyed,
};

/// A registered borrower
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Display name
    name: String,
    /// Unique member key
    member_id: String,
    /// Fixed at creation
    registration_date: DateTime<Utc>,
    /// ISBNs currently held, in borrow order, no repeats
    borrowed_books: Vec<String>,
}

impl Member {
    /// Create a member registered now
    #[must_use]
    pub fn new(name: impl Into<String>, member_id: impl Into<String>) -> Self {
        Self::registered_at(name, member_id, Utc::now())
    }

    /// Create a member with an explicit registration date
    #[must_use]
    pub fn registered_at(
        name: impl Into<String>,
        member_id: impl Into<String>,
        registration_date: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            member_id: member_id.into(),
            registration_date,
            borrowed_books: Vec::new(),
        }
    }

    /// Display name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member ID
    #[must_use]
    pub fn member_id(&self) -> &str {
        &self.member_id
    }

    /// When the member was registered
    #[must_use]
    pub fn registration_date(&self) -> DateTime<Utc> {
        self.registration_date
    }

    /// Copy of the held ISBNs; changing it does not affect the member
    #[must_use]
    pub fn borrowed_books(&self) -> Vec<String> {
        self.borrowed_books.clone()
    }

    /// Number of books currently held
    #[must_use]
    pub fn borrowed_count(&self) -> usize {
        self.borrowed_books.len()
    }

    /// Whether the member currently holds `isbn`
    #[must_use]
    pub fn has_borrowed(&self, isbn: &str) -> bool {
        self.borrowed_books.iter().any(|held| held == isbn)
    }

    /// Record that the member now holds `isbn`.
    ///
    /// Returns `false` if the member already holds it.
    pub fn borrow_book(&mut self, isbn: &str) -> bool {
        if self.has_borrowed(isbn) {
            return false;
        }
        self.borrowed_books.push(isbn.to_string());
        true
    }

    /// Drop `isbn` from the held list.
    ///
    /// Returns `false` if the member does not hold it.
    pub fn return_book(&mut self, isbn: &str) -> bool {
        let before = self.borrowed_books.len();
        self.borrowed_books.retain(|held| held != isbn);
        self.borrowed_books.len() != before
    }

    /// Multi-line summary for display
    #[must_use]
    pub fn info(&self) -> String {
        format!(
            "Name: {}\nMember ID: {}\nRegistered: {}\nBooks Borrowed: {}",
            self.name,
            self.member_id,
            self.registration_date.format("%Y-%m-%d"),
            self.borrowed_books.len()
        )
    }

    /// Convert to a plain record
    #[must_use]
    pub fn to_record(&self) -> MemberRecord {
        MemberRecord {
            name: self.name.clone(),
            member_id: self.member_id.clone(),
            borrowed_books: self.borrowed_books.clone(),
            registration_date: format_timestamp(&self.registration_date),
        }
    }

    /// Rebuild a member from a plain record
    ///
    /// # Errors
    ///
    /// Returns a [`RecordError`] if the registration date does not parse or
    /// an ISBN appears more than once in `borrowed_books`.
    pub fn from_record(record: MemberRecord) -> Result<Self, RecordError> {
        let MemberRecord { name, member_id, borrowed_books, registration_date } = record;
        let registration_date = parse_timestamp("registration_date", &registration_date)?;

        let mut member = Self::registered_at(name, member_id, registration_date);
        for isbn in borrowed_books {
            if !member.borrow_book(&isbn) {
                return Err(RecordError::DuplicateHold { member_id: member.member_id, isbn });
            }
        }
        Ok(member)
    }
}

impl Keyed for Member {
    fn key(&self) -> &str {
        &self.member_id
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (ID: {})", self.name, self.member_id)
    }
}

/// Plain key-value form of a [`Member`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MemberRecord {
    /// Display name
    pub name: String,
    /// Unique member key
    pub member_id: String,
    /// Held ISBNs in borrow order
    pub borrowed_books: Vec<String>,
    /// ISO-8601 registration date
    pub registration_date: String,
}
