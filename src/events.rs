/// Changes announced by a [`Library`](crate::Library) to its observers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LibraryEvent {
    /// A book entered the catalog
    BookAdded {
        /// ISBN of the book
        isbn: String,
    },
    /// A book left the catalog
    BookRemoved {
        /// ISBN of the book
        isbn: String,
    },
    /// A member was registered
    MemberRegistered {
        /// ID of the member
        member_id: String,
    },
    /// A member was removed
    MemberRemoved {
        /// ID of the member
        member_id: String,
    },
    /// A librarian was added
    LibrarianAdded {
        /// ID of the librarian
        librarian_id: String,
    },
    /// A member borrowed a book
    BookBorrowed {
        /// Borrowing member
        member_id: String,
        /// Borrowed book
        isbn: String,
        /// Title of the borrowed book
        title: String,
    },
    /// A member returned a book
    BookReturned {
        /// Returning member
        member_id: String,
        /// Returned book
        isbn: String,
        /// Title of the returned book
        title: String,
    },
}
