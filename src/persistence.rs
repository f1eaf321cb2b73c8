use std::{collections::HashSet, fs, path::Path};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    book::{Book, BookRecord},
    error::{RecordError, StoreError},
    librarian::{Librarian, LibrarianRecord},
    library::Library,
    member::{Member, MemberRecord},
};

/// Render a timestamp as RFC 3339 in UTC, keeping every sub-second digit
pub(crate) fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse an RFC 3339 timestamp from record field `field`
pub(crate) fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, RecordError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc)).map_err(|source| {
        RecordError::Timestamp { field, value: value.to_string(), source }
    })
}

/// A whole library as plain records, ready for JSON
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LibrarySnapshot {
    /// Library display name
    pub name: String,
    /// Catalog in insertion order
    pub books: Vec<BookRecord>,
    /// Members in registration order
    pub members: Vec<MemberRecord>,
    /// Librarians in insertion order
    pub librarians: Vec<LibrarianRecord>,
}

impl LibrarySnapshot {
    /// Capture the current state of `library`
    #[must_use]
    pub fn capture(library: &Library) -> Self {
        Self {
            name: library.name().to_string(),
            books: library.all_books().into_iter().map(Book::to_record).collect(),
            members: library.all_members().into_iter().map(Member::to_record).collect(),
            librarians: library.all_librarians().into_iter().map(Librarian::to_record).collect(),
        }
    }

    /// Rebuild a library from this snapshot.
    ///
    /// Books and members are inserted with their loans intact, then the loans
    /// are checked against each other before the library is handed back.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if:
    /// - any record is malformed
    /// - two books, members or librarians share a key
    /// - a lent-out book and its borrower's held list disagree
    pub fn restore(self) -> Result<Library, StoreError> {
        let mut library = Library::new(self.name);

        for record in self.books {
            let book = Book::from_record(record)?;
            let isbn = book.isbn().to_string();
            if !library.insert_book(book) {
                return Err(StoreError::integrity(format!("duplicate ISBN {isbn}")));
            }
        }

        for record in self.members {
            let member = Member::from_record(record)?;
            let member_id = member.member_id().to_string();
            if !library.insert_member(member) {
                return Err(StoreError::integrity(format!("duplicate member ID {member_id}")));
            }
        }

        for record in self.librarians {
            let librarian = Librarian::from_record(record)?;
            let librarian_id = librarian.librarian_id().to_string();
            if !library.add_librarian(librarian) {
                return Err(StoreError::integrity(format!("duplicate librarian ID {librarian_id}")));
            }
        }

        check_loans(&library)?;
        Ok(library)
    }

    /// Save the snapshot as pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if serialization fails or the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let serialized = serde_json::to_string_pretty(self)?;
        debug!(path = %path.display(), books = self.books.len(), "saving library snapshot");
        fs::write(path, serialized).map_err(|e| StoreError::io(path, e))
    }

    /// Load a snapshot from a JSON file
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the file cannot be read or is not a valid snapshot.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        debug!(path = %path.display(), "loading library snapshot");
        let contents = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Every lent-out book must appear in exactly its borrower's held list, and
/// every held ISBN must be a book lent to that member.
fn check_loans(library: &Library) -> Result<(), StoreError> {
    let mut held = HashSet::new();

    for member in library.all_members() {
        for isbn in member.borrowed_books() {
            let lent_to_member = library
                .find_book_by_isbn(&isbn)
                .and_then(Book::borrowed_by)
                .is_some_and(|by| by == member.member_id());
            if !lent_to_member {
                return Err(StoreError::integrity(format!(
                    "member {} holds {isbn}, which is not lent to them",
                    member.member_id()
                )));
            }
            held.insert(isbn);
        }
    }

    match library.borrowed_books().into_iter().find(|book| !held.contains(book.isbn())) {
        Some(book) => Err(StoreError::integrity(format!(
            "book {} is lent out but no member holds it",
            book.isbn()
        ))),
        None => Ok(()),
    }
}
