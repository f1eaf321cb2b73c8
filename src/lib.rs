//! Catalog and membership bookkeeping for a small library.
//!
//! This crate tracks books, members and librarians, and coordinates
//! borrow/return as a two-sided change so that a book's loan state and the
//! borrowing member's held list never disagree.

pub mod book;
pub mod error;
pub mod events;
pub mod librarian;
pub mod library;
pub mod loan_state;
pub mod member;
pub mod observers;
pub mod persistence;
mod registry;

pub use book::{Book, BookRecord};
pub use error::{ErrorKind, LoanError, RecordError, StoreError};
pub use events::LibraryEvent;
pub use librarian::{Credential, EntityStore, Librarian, LibrarianRecord, PlaintextCredential};
pub use library::{Library, LibraryStatistics};
pub use loan_state::LoanState;
pub use member::{Member, MemberRecord};
pub use observers::{LibraryObserver, TransactionLogger};
pub use persistence::LibrarySnapshot;
