use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::RecordError,
    loan_state::LoanState,
    persistence::{format_timestamp, parse_timestamp},
    registry::Keyed,
};

/// A catalogued book, keyed by ISBN
///
/// The borrower and borrow date only exist inside [`LoanState::Borrowed`],
/// so a book can never be "available" while still naming a borrower.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    /// Book title
    title: String,
    /// Book author
    author: String,
    /// Unique catalog key
    isbn: String,
    /// Current loan state
    state: LoanState,
}

impl Book {
    /// Create an available book
    #[must_use]
    pub fn new(title: impl Into<String>, author: impl Into<String>, isbn: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
            state: LoanState::Available,
        }
    }

    /// Book title
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Book author
    #[must_use]
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Book ISBN
    #[must_use]
    pub fn isbn(&self) -> &str {
        &self.isbn
    }

    /// Current loan state
    #[must_use]
    pub fn state(&self) -> &LoanState {
        &self.state
    }

    /// Whether the book can be borrowed right now
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.state.is_available()
    }

    /// Member ID of the current borrower, if lent out
    #[must_use]
    pub fn borrowed_by(&self) -> Option<&str> {
        match &self.state {
            LoanState::Available => None,
            LoanState::Borrowed { by, .. } => Some(by),
        }
    }

    /// Start of the current loan, if lent out
    #[must_use]
    pub fn borrow_date(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            LoanState::Available => None,
            LoanState::Borrowed { since, .. } => Some(*since),
        }
    }

    /// Lend the book to `member_id`, stamped with the current time.
    ///
    /// Returns `false` and leaves the book untouched if it is already lent out.
    pub fn borrow(&mut self, member_id: &str) -> bool {
        self.borrow_at(member_id, Utc::now())
    }

    /// Lend the book to `member_id` starting at `since`
    pub fn borrow_at(&mut self, member_id: &str, since: DateTime<Utc>) -> bool {
        if !self.is_available() {
            return false;
        }
        self.state = LoanState::Borrowed { by: member_id.to_string(), since };
        true
    }

    /// Put the book back on the shelf.
    ///
    /// Returns `false` if the book was not lent out.
    pub fn return_book(&mut self) -> bool {
        if self.is_available() {
            return false;
        }
        self.state = LoanState::Available;
        true
    }

    /// Overwrite the loan state, used to undo a half-applied transaction
    pub(crate) fn restore_state(&mut self, state: LoanState) {
        self.state = state;
    }

    /// Multi-line summary for display
    #[must_use]
    pub fn info(&self) -> String {
        format!(
            "Title: {}\nAuthor: {}\nISBN: {}\nStatus: {}",
            self.title,
            self.author,
            self.isbn,
            self.state.get_description()
        )
    }

    /// Convert to a plain record
    #[must_use]
    pub fn to_record(&self) -> BookRecord {
        BookRecord {
            title: self.title.clone(),
            author: self.author.clone(),
            isbn: self.isbn.clone(),
            available: self.is_available(),
            borrowed_by: self.borrowed_by().map(str::to_string),
            borrow_date: self.borrow_date().as_ref().map(format_timestamp),
        }
    }

    /// Rebuild a book from a plain record
    ///
    /// # Errors
    ///
    /// Returns a [`RecordError`] if the borrow date does not parse, or if the
    /// `available` flag disagrees with the presence of the borrower and
    /// borrow date.
    pub fn from_record(record: BookRecord) -> Result<Self, RecordError> {
        let BookRecord { title, author, isbn, available, borrowed_by, borrow_date } = record;

        let since = borrow_date.as_deref().map(|d| parse_timestamp("borrow_date", d)).transpose()?;

        let state = match (available, borrowed_by, since) {
            (true, None, None) => LoanState::Available,
            (false, Some(by), Some(since)) => LoanState::Borrowed { by, since },
            (true, _, _) => return Err(RecordError::StrayLoan { isbn }),
            (false, _, _) => return Err(RecordError::MissingLoan { isbn }),
        };

        Ok(Self { title, author, isbn, state })
    }
}

impl Keyed for Book {
    fn key(&self) -> &str {
        &self.isbn
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {} (ISBN: {})", self.title, self.author, self.isbn)
    }
}

/// Plain key-value form of a [`Book`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BookRecord {
    /// Book title
    pub title: String,
    /// Book author
    pub author: String,
    /// Unique catalog key
    pub isbn: String,
    /// `true` when on the shelf
    pub available: bool,
    /// Borrower's member ID, `null` when available
    pub borrowed_by: Option<String>,
    /// ISO-8601 loan start, `null` when available
    pub borrow_date: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    /// Available copy of Dune
    fn dune() -> Book {
        Book::new("Dune", "Frank Herbert", "111")
    }

    #[test]
    fn test_new_book_is_available() {
        let book = dune();
        assert!(book.is_available());
        assert_eq!(book.borrowed_by(), None);
        assert_eq!(book.borrow_date(), None);
    }

    #[test]
    fn test_borrow_records_borrower_and_date() {
        let mut book = dune();
        let since = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();

        assert!(book.borrow_at("M1", since));
        assert!(!book.is_available());
        assert_eq!(book.borrowed_by(), Some("M1"));
        assert_eq!(book.borrow_date(), Some(since));
    }

    #[test]
    fn test_borrow_twice_fails_and_keeps_first_loan() {
        let mut book = dune();
        assert!(book.borrow("M1"));
        assert!(!book.borrow("M2"));
        assert_eq!(book.borrowed_by(), Some("M1"));
    }

    #[test]
    fn test_return_clears_loan() {
        let mut book = dune();
        assert!(!book.return_book());

        assert!(book.borrow("M1"));
        assert!(book.return_book());
        assert!(book.is_available());
        assert_eq!(book.borrowed_by(), None);
        assert_eq!(book.borrow_date(), None);
    }

    #[test]
    fn test_info_and_display() {
        let mut book = dune();
        assert_eq!(book.to_string(), "Dune by Frank Herbert (ISBN: 111)");
        assert_eq!(book.info(), "Title: Dune\nAuthor: Frank Herbert\nISBN: 111\nStatus: Available");

        assert!(book.borrow("M1"));
        assert!(book.info().ends_with("Status: Borrowed by M1"));
    }

    #[test]
    fn test_record_round_trip_keeps_subsecond_precision() {
        let mut book = dune();
        let since = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        assert!(book.borrow_at("M1", since));

        let record = book.to_record();
        assert!(!record.available);
        assert_eq!(record.borrowed_by.as_deref(), Some("M1"));

        let restored = Book::from_record(record).unwrap();
        assert_eq!(restored, book);
        assert_eq!(restored.borrow_date(), Some(since));
    }

    #[test]
    fn test_record_json_uses_null_for_absent_loan() {
        let json = serde_json::to_value(dune().to_record()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "title": "Dune",
                "author": "Frank Herbert",
                "isbn": "111",
                "available": true,
                "borrowed_by": null,
                "borrow_date": null,
            })
        );
    }

    #[test]
    fn test_from_record_rejects_inconsistent_loan() {
        let mut record = dune().to_record();
        record.available = false;
        assert!(matches!(Book::from_record(record.clone()), Err(RecordError::MissingLoan { .. })));

        record.available = true;
        record.borrowed_by = Some("M1".to_string());
        assert!(matches!(Book::from_record(record), Err(RecordError::StrayLoan { .. })));
    }

    #[test]
    fn test_from_record_rejects_bad_timestamp() {
        let record = BookRecord {
            available: false,
            borrowed_by: Some("M1".to_string()),
            borrow_date: Some("yesterday".to_string()),
            ..dune().to_record()
        };
        let err = Book::from_record(record).unwrap_err();
        assert!(matches!(err, RecordError::Timestamp { field: "borrow_date", .. }));
    }
}
