use tracing::info;

use crate::events::LibraryEvent;

/// Trait for library change observation
pub trait LibraryObserver {
    /// Called after a change has been applied
    fn on_event(&self, event: &LibraryEvent);
}

/// Logs every library change through `tracing`
#[derive(Debug)]
pub struct TransactionLogger;

impl LibraryObserver for TransactionLogger {
    fn on_event(&self, event: &LibraryEvent) {
        match event {
            LibraryEvent::BookAdded { isbn } => info!(%isbn, "book added"),
            LibraryEvent::BookRemoved { isbn } => info!(%isbn, "book removed"),
            LibraryEvent::MemberRegistered { member_id } => info!(%member_id, "member registered"),
            LibraryEvent::MemberRemoved { member_id } => info!(%member_id, "member removed"),
            LibraryEvent::LibrarianAdded { librarian_id } => {
                info!(%librarian_id, "librarian added");
            }
            LibraryEvent::BookBorrowed { member_id, isbn, title } => {
                info!(%member_id, %isbn, %title, "book borrowed");
            }
            LibraryEvent::BookReturned { member_id, isbn, title } => {
                info!(%member_id, %isbn, %title, "book returned");
            }
        }
    }
}
