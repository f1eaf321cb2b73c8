//! Error types for loans, entity records and the snapshot store.
//!
//! Catalog inserts and removals report plain `bool` outcomes, the same way
//! `HashMap`-style collections do. Only the two-sided borrow/return operations
//! and the record/snapshot boundary carry typed errors.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Broad category of a failed loan operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown member or ISBN
    NotFound,
    /// The book is already lent out
    Conflict,
    /// The request contradicts current state (e.g. returning a book never borrowed)
    PreconditionViolation,
    /// A sub-step of the transaction failed after validation passed
    Internal,
}

/// Reason a borrow or return was refused.
///
/// The `Display` text of each variant is the message shown to the user.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoanError {
    /// No member is registered under the given ID
    #[error("Member not found")]
    MemberNotFound,

    /// No book is catalogued under the given ISBN
    #[error("Book not found")]
    BookNotFound,

    /// The book is already lent out
    #[error("Book is not available")]
    BookUnavailable,

    /// The member does not hold the book being returned
    #[error("Member has not borrowed this book")]
    NotBorrowedByMember,

    /// One side of the borrow refused the change and was rolled back
    #[error("Failed to borrow book")]
    BorrowFailed,

    /// One side of the return refused the change and was rolled back
    #[error("Failed to return book")]
    ReturnFailed,
}

impl LoanError {
    /// Category of this failure
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MemberNotFound | Self::BookNotFound => ErrorKind::NotFound,
            Self::BookUnavailable => ErrorKind::Conflict,
            Self::NotBorrowedByMember => ErrorKind::PreconditionViolation,
            Self::BorrowFailed | Self::ReturnFailed => ErrorKind::Internal,
        }
    }
}

/// A plain entity record could not be turned back into an entity
#[derive(Debug, Error)]
pub enum RecordError {
    /// A timestamp field is not valid ISO-8601 / RFC 3339
    #[error("invalid timestamp in `{field}`: {value:?}")]
    Timestamp {
        /// Record field holding the bad value
        field: &'static str,
        /// The offending text
        value: String,
        /// Parser failure
        #[source]
        source: chrono::ParseError,
    },

    /// `available` is false but the borrower or borrow date is missing
    #[error("book {isbn} is unavailable but has no borrower or borrow date")]
    MissingLoan {
        /// ISBN of the book
        isbn: String,
    },

    /// `available` is true but a borrower or borrow date is present
    #[error("book {isbn} is available but still carries loan details")]
    StrayLoan {
        /// ISBN of the book
        isbn: String,
    },

    /// A member record lists the same ISBN twice
    #[error("member {member_id} holds ISBN {isbn} more than once")]
    DuplicateHold {
        /// ID of the member
        member_id: String,
        /// Repeated ISBN
        isbn: String,
    },
}

/// Saving or loading a library snapshot failed
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the snapshot file failed
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        /// Snapshot file path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },

    /// The snapshot is not valid JSON for the expected shape
    #[error("invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// An entity record inside the snapshot is malformed
    #[error(transparent)]
    Record(#[from] RecordError),

    /// The records are individually valid but contradict each other
    #[error("snapshot integrity violation: {0}")]
    Integrity(String),
}

impl StoreError {
    /// Create an I/O error for `path`
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Create an integrity error
    pub(crate) fn integrity(msg: impl Into<String>) -> Self {
        Self::Integrity(msg.into())
    }
}
