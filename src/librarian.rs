use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    book::Book,
    error::RecordError,
    member::Member,
    persistence::{format_timestamp, parse_timestamp},
    registry::Keyed,
};

/// Password used when a librarian is created without one
pub const DEFAULT_PASSWORD: &str = "admin123";

/// The catalog operations a librarian is allowed to perform
pub trait EntityStore {
    /// Add a book; `false` if its ISBN is already catalogued
    fn add_book(&mut self, book: Book) -> bool;

    /// Remove a book; `false` if unknown or currently borrowed
    fn remove_book(&mut self, isbn: &str) -> bool;

    /// Register a member; `false` if the ID is taken
    fn register_member(&mut self, member: Member) -> bool;

    /// Remove a member; `false` if unknown or still holding books
    fn remove_member(&mut self, member_id: &str) -> bool;
}

/// Stored secret that can check a login attempt
pub trait Credential {
    /// Whether `attempt` matches the stored secret
    fn verify(&self, attempt: &str) -> bool;

    /// Replace the stored secret
    fn replace(&mut self, secret: &str);

    /// Form written to records
    fn stored_form(&self) -> String;
}

/// Secret kept and compared in clear text
#[derive(Clone)]
pub struct PlaintextCredential(String);

impl PlaintextCredential {
    /// Wrap a clear-text secret
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }
}

impl Credential for PlaintextCredential {
    fn verify(&self, attempt: &str) -> bool {
        self.0 == attempt
    }

    fn replace(&mut self, secret: &str) {
        secret.clone_into(&mut self.0);
    }

    fn stored_form(&self) -> String {
        self.0.clone()
    }
}

impl fmt::Debug for PlaintextCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlaintextCredential(<redacted>)")
    }
}

/// Staff member with administrative access.
///
/// The administrative methods ([`Librarian::add_book`] and friends) only
/// delegate to an [`EntityStore`]; they do not check that [`Librarian::authenticate`]
/// has succeeded first. Callers that need that guarantee must enforce it.
pub struct Librarian {
    /// Display name
    name: String,
    /// Unique librarian key
    librarian_id: String,
    /// Login secret
    credential: Box<dyn Credential>,
    /// Successful logins so far
    login_count: u64,
    /// Time of the last successful login
    last_login: Option<DateTime<Utc>>,
}

// Manual implementation so the credential never reaches logs
impl fmt::Debug for Librarian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Librarian")
            .field("name", &self.name)
            .field("librarian_id", &self.librarian_id)
            .field("credential", &"<redacted>")
            .field("login_count", &self.login_count)
            .field("last_login", &self.last_login)
            .finish()
    }
}

impl Librarian {
    /// Create a librarian with the default password
    #[must_use]
    pub fn new(name: impl Into<String>, librarian_id: impl Into<String>) -> Self {
        Self::with_password(name, librarian_id, DEFAULT_PASSWORD)
    }

    /// Create a librarian with a clear-text password
    #[must_use]
    pub fn with_password(
        name: impl Into<String>,
        librarian_id: impl Into<String>,
        password: &str,
    ) -> Self {
        Self::with_credential(name, librarian_id, Box::new(PlaintextCredential::new(password)))
    }

    /// Create a librarian with any credential implementation
    #[must_use]
    pub fn with_credential(
        name: impl Into<String>,
        librarian_id: impl Into<String>,
        credential: Box<dyn Credential>,
    ) -> Self {
        Self {
            name: name.into(),
            librarian_id: librarian_id.into(),
            credential,
            login_count: 0,
            last_login: None,
        }
    }

    /// Display name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Librarian ID
    #[must_use]
    pub fn librarian_id(&self) -> &str {
        &self.librarian_id
    }

    /// Number of successful logins
    #[must_use]
    pub fn login_count(&self) -> u64 {
        self.login_count
    }

    /// Time of the last successful login
    #[must_use]
    pub fn last_login(&self) -> Option<DateTime<Utc>> {
        self.last_login
    }

    /// Check `password`; on success bump the login count and stamp the login time
    pub fn authenticate(&mut self, password: &str) -> bool {
        if !self.credential.verify(password) {
            info!(librarian_id = %self.librarian_id, "authentication failed");
            return false;
        }
        self.login_count = self.login_count.saturating_add(1);
        self.last_login = Some(Utc::now());
        info!(librarian_id = %self.librarian_id, logins = self.login_count, "librarian logged in");
        true
    }

    /// Replace the password if `old_password` matches the current one
    pub fn change_password(&mut self, old_password: &str, new_password: &str) -> bool {
        if !self.credential.verify(old_password) {
            return false;
        }
        self.credential.replace(new_password);
        true
    }

    /// Catalog a book through `store`
    pub fn add_book(&self, store: &mut dyn EntityStore, book: Book) -> bool {
        debug!(librarian_id = %self.librarian_id, isbn = book.isbn(), "add book");
        store.add_book(book)
    }

    /// Withdraw a book through `store`
    pub fn remove_book(&self, store: &mut dyn EntityStore, isbn: &str) -> bool {
        debug!(librarian_id = %self.librarian_id, isbn, "remove book");
        store.remove_book(isbn)
    }

    /// Register a member through `store`
    pub fn register_member(&self, store: &mut dyn EntityStore, member: Member) -> bool {
        debug!(librarian_id = %self.librarian_id, member_id = member.member_id(), "register member");
        store.register_member(member)
    }

    /// Remove a member through `store`
    pub fn remove_member(&self, store: &mut dyn EntityStore, member_id: &str) -> bool {
        debug!(librarian_id = %self.librarian_id, member_id, "remove member");
        store.remove_member(member_id)
    }

    /// Multi-line summary for display
    #[must_use]
    pub fn info(&self) -> String {
        let last_login = self
            .last_login
            .map_or_else(|| "Never".to_string(), |at| at.format("%Y-%m-%d %H:%M").to_string());
        format!(
            "Name: {}\nLibrarian ID: {}\nLogin Count: {}\nLast Login: {last_login}",
            self.name, self.librarian_id, self.login_count
        )
    }

    /// Convert to a plain record, including the stored credential
    #[must_use]
    pub fn to_record(&self) -> LibrarianRecord {
        LibrarianRecord {
            name: self.name.clone(),
            librarian_id: self.librarian_id.clone(),
            password: self.credential.stored_form(),
            login_count: self.login_count,
            last_login: self.last_login.as_ref().map(format_timestamp),
        }
    }

    /// Rebuild a librarian from a plain record with a clear-text credential
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Timestamp`] if `last_login` does not parse.
    pub fn from_record(record: LibrarianRecord) -> Result<Self, RecordError> {
        let LibrarianRecord { name, librarian_id, password, login_count, last_login } = record;
        let last_login =
            last_login.as_deref().map(|at| parse_timestamp("last_login", at)).transpose()?;

        let mut librarian = Self::with_password(name, librarian_id, &password);
        librarian.login_count = login_count;
        librarian.last_login = last_login;
        Ok(librarian)
    }
}

impl Keyed for Librarian {
    fn key(&self) -> &str {
        &self.librarian_id
    }
}

impl fmt::Display for Librarian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Librarian {} (ID: {})", self.name, self.librarian_id)
    }
}

/// Plain key-value form of a [`Librarian`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LibrarianRecord {
    /// Display name
    pub name: String,
    /// Unique librarian key
    pub librarian_id: String,
    /// Stored credential form
    pub password: String,
    /// Successful logins so far
    pub login_count: u64,
    /// ISO-8601 time of the last login, `null` if never
    pub last_login: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;

    /// Store that only remembers which operations it saw
    #[derive(Debug, Default)]
    struct RecordingStore {
        /// Operation name and key, in call order
        calls: Vec<(&'static str, String)>,
    }

    impl EntityStore for RecordingStore {
        fn add_book(&mut self, book: Book) -> bool {
            self.calls.push(("add_book", book.isbn().to_string()));
            true
        }

        fn remove_book(&mut self, isbn: &str) -> bool {
            self.calls.push(("remove_book", isbn.to_string()));
            false
        }

        fn register_member(&mut self, member: Member) -> bool {
            self.calls.push(("register_member", member.member_id().to_string()));
            true
        }

        fn remove_member(&mut self, member_id: &str) -> bool {
            self.calls.push(("remove_member", member_id.to_string()));
            false
        }
    }

    /// Credential that counts how often it was consulted
    struct CountingCredential {
        /// Accepted secret
        secret: String,
        /// Number of `verify` calls
        checks: Rc<Cell<u32>>,
    }

    impl Credential for CountingCredential {
        fn verify(&self, attempt: &str) -> bool {
            self.checks.set(self.checks.get().saturating_add(1));
            self.secret == attempt
        }

        fn replace(&mut self, secret: &str) {
            secret.clone_into(&mut self.secret);
        }

        fn stored_form(&self) -> String {
            format!("counted:{}", self.secret)
        }
    }

    #[test]
    fn test_default_password() {
        let mut librarian = Librarian::new("Ada", "L1");
        assert!(librarian.authenticate(DEFAULT_PASSWORD));
    }

    #[test]
    fn test_authenticate_counts_only_successes() {
        let mut librarian = Librarian::with_password("Ada", "L1", "s3cret");
        assert_eq!(librarian.last_login(), None);

        assert!(!librarian.authenticate("wrong"));
        assert_eq!(librarian.login_count(), 0);
        assert_eq!(librarian.last_login(), None);

        assert!(librarian.authenticate("s3cret"));
        assert!(librarian.authenticate("s3cret"));
        assert_eq!(librarian.login_count(), 2);
        assert!(librarian.last_login().is_some());
    }

    #[test]
    fn test_change_password_requires_old_password() {
        let mut librarian = Librarian::with_password("Ada", "L1", "old");
        assert!(!librarian.change_password("nope", "new"));
        assert!(librarian.authenticate("old"));

        assert!(librarian.change_password("old", "new"));
        assert!(!librarian.authenticate("old"));
        assert!(librarian.authenticate("new"));
    }

    #[test]
    fn test_admin_methods_delegate_to_store() {
        let librarian = Librarian::new("Ada", "L1");
        let mut store = RecordingStore::default();

        assert!(librarian.add_book(&mut store, Book::new("Dune", "Herbert", "111")));
        assert!(!librarian.remove_book(&mut store, "111"));
        assert!(librarian.register_member(&mut store, Member::new("Alice", "M1")));
        assert!(!librarian.remove_member(&mut store, "M1"));

        assert_eq!(
            store.calls,
            vec![
                ("add_book", "111".to_string()),
                ("remove_book", "111".to_string()),
                ("register_member", "M1".to_string()),
                ("remove_member", "M1".to_string()),
            ]
        );
    }

    #[test]
    fn test_custom_credential_is_used() {
        let checks = Rc::new(Cell::new(0));
        let credential =
            CountingCredential { secret: "pw".to_string(), checks: Rc::clone(&checks) };
        let mut librarian = Librarian::with_credential("Ada", "L1", Box::new(credential));

        assert!(librarian.authenticate("pw"));
        assert!(!librarian.change_password("bad", "pw2"));
        assert_eq!(checks.get(), 2);
        assert_eq!(librarian.to_record().password, "counted:pw");
    }

    #[test]
    fn test_debug_hides_credential() {
        let librarian = Librarian::with_password("Ada", "L1", "hunter2");
        let rendered = format!("{librarian:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("L1"));
    }

    #[test]
    fn test_info_and_display() {
        let librarian = Librarian::new("Ada", "L1");
        assert_eq!(librarian.to_string(), "Librarian Ada (ID: L1)");
        assert_eq!(librarian.info(), "Name: Ada\nLibrarian ID: L1\nLogin Count: 0\nLast Login: Never");
    }

    #[test]
    fn test_record_round_trip() {
        let mut librarian = Librarian::with_password("Ada", "L1", "pw");
        assert!(librarian.authenticate("pw"));

        let record = librarian.to_record();
        assert_eq!(record.password, "pw");
        assert_eq!(record.login_count, 1);

        let mut restored = Librarian::from_record(record.clone()).unwrap();
        assert_eq!(restored.to_record(), record);
        assert_eq!(restored.last_login(), librarian.last_login());
        assert!(restored.authenticate("pw"));
    }
}
