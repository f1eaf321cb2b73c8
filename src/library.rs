use std::fmt;

use tracing::warn;

use crate::{
    book::Book,
    error::LoanError,
    events::LibraryEvent,
    librarian::{EntityStore, Librarian},
    member::Member,
    observers::LibraryObserver,
    registry::Registry,
};

/// Name given to a library created through [`Library::default`]
pub const DEFAULT_LIBRARY_NAME: &str = "City Library";

/// Counts derived from the live collections
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LibraryStatistics {
    /// Books in the catalog
    pub total_books: usize,
    /// Books on the shelf
    pub available_books: usize,
    /// Books lent out
    pub borrowed_books: usize,
    /// Registered members
    pub total_members: usize,
    /// Registered librarians
    pub total_librarians: usize,
}

/// The catalog, membership and staff of one library.
///
/// Borrow and return change a [`Book`] and a [`Member`] together; if the
/// second half of either operation is refused, the first half is undone so
/// the two never disagree. Loans only start inside the library: a book that
/// is already lent out, or a member who already holds books, is refused at
/// the door.
pub struct Library {
    /// Display name
    name: String,
    /// Catalog by ISBN
    books: Registry<Book>,
    /// Members by ID
    members: Registry<Member>,
    /// Librarians by ID
    librarians: Registry<Librarian>,
    /// Registered change observers
    observers: Vec<Box<dyn LibraryObserver>>,
}

// Manual implementation of Debug for Library
impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("name", &self.name)
            .field("books", &self.books)
            .field("members", &self.members)
            .field("librarians", &self.librarians)
            .field("observers_count", &self.observers.len())
            .finish()
    }
}

impl Default for Library {
    fn default() -> Self {
        Self::new(DEFAULT_LIBRARY_NAME)
    }
}

impl Library {
    /// Create an empty library
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            books: Registry::new(),
            members: Registry::new(),
            librarians: Registry::new(),
            observers: Vec::new(),
        }
    }

    /// Display name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register an observer to be notified of changes
    pub fn register_observer(&mut self, observer: Box<dyn LibraryObserver>) {
        self.observers.push(observer);
    }

    /// Tell every observer about `event`
    fn notify(&self, event: &LibraryEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }

    /// Add a book to the catalog; `false` if the ISBN is already taken or
    /// the book is lent out
    pub fn add_book(&mut self, book: Book) -> bool {
        if !book.is_available() {
            return false;
        }
        self.insert_book(book)
    }

    /// Catalog a book as-is, loan state included
    pub(crate) fn insert_book(&mut self, book: Book) -> bool {
        let isbn = book.isbn().to_string();
        if !self.books.insert(book) {
            return false;
        }
        self.notify(&LibraryEvent::BookAdded { isbn });
        true
    }

    /// Remove a book; `false` if the ISBN is unknown or the book is lent out
    pub fn remove_book(&mut self, isbn: &str) -> bool {
        if !self.books.remove_if(isbn, Book::is_available) {
            return false;
        }
        self.notify(&LibraryEvent::BookRemoved { isbn: isbn.to_string() });
        true
    }

    /// Look up a book by exact ISBN
    #[must_use]
    pub fn find_book_by_isbn(&self, isbn: &str) -> Option<&Book> {
        self.books.get(isbn)
    }

    /// Books whose title contains `query`, ignoring case
    #[must_use]
    pub fn find_books_by_title(&self, query: &str) -> Vec<&Book> {
        let query = query.to_lowercase();
        self.books.iter().filter(|book| book.title().to_lowercase().contains(&query)).collect()
    }

    /// Books whose author contains `query`, ignoring case
    #[must_use]
    pub fn find_books_by_author(&self, query: &str) -> Vec<&Book> {
        let query = query.to_lowercase();
        self.books.iter().filter(|book| book.author().to_lowercase().contains(&query)).collect()
    }

    /// Every catalogued book, in the order it was added
    #[must_use]
    pub fn all_books(&self) -> Vec<&Book> {
        self.books.iter().collect()
    }

    /// Books currently on the shelf
    #[must_use]
    pub fn available_books(&self) -> Vec<&Book> {
        self.books.iter().filter(|book| book.is_available()).collect()
    }

    /// Books currently lent out
    #[must_use]
    pub fn borrowed_books(&self) -> Vec<&Book> {
        self.books.iter().filter(|book| !book.is_available()).collect()
    }

    /// Register a member; `false` if the ID is already taken or the member
    /// already holds books
    pub fn register_member(&mut self, member: Member) -> bool {
        if member.borrowed_count() > 0 {
            return false;
        }
        self.insert_member(member)
    }

    /// Register a member as-is, held books included
    pub(crate) fn insert_member(&mut self, member: Member) -> bool {
        let member_id = member.member_id().to_string();
        if !self.members.insert(member) {
            return false;
        }
        self.notify(&LibraryEvent::MemberRegistered { member_id });
        true
    }

    /// Remove a member; `false` if the ID is unknown or the member still holds books
    pub fn remove_member(&mut self, member_id: &str) -> bool {
        if !self.members.remove_if(member_id, |member| member.borrowed_count() == 0) {
            return false;
        }
        self.notify(&LibraryEvent::MemberRemoved { member_id: member_id.to_string() });
        true
    }

    /// Look up a member by exact ID
    #[must_use]
    pub fn find_member(&self, member_id: &str) -> Option<&Member> {
        self.members.get(member_id)
    }

    /// Every member, in registration order
    #[must_use]
    pub fn all_members(&self) -> Vec<&Member> {
        self.members.iter().collect()
    }

    /// Add a librarian; `false` if the ID is already taken
    pub fn add_librarian(&mut self, librarian: Librarian) -> bool {
        let librarian_id = librarian.librarian_id().to_string();
        if !self.librarians.insert(librarian) {
            return false;
        }
        self.notify(&LibraryEvent::LibrarianAdded { librarian_id });
        true
    }

    /// Look up a librarian by exact ID
    #[must_use]
    pub fn find_librarian(&self, librarian_id: &str) -> Option<&Librarian> {
        self.librarians.get(librarian_id)
    }

    /// Look up a librarian for login or password changes
    pub fn find_librarian_mut(&mut self, librarian_id: &str) -> Option<&mut Librarian> {
        self.librarians.get_mut(librarian_id)
    }

    /// Every librarian, in the order they were added
    #[must_use]
    pub fn all_librarians(&self) -> Vec<&Librarian> {
        self.librarians.iter().collect()
    }

    /// Lend `isbn` to `member_id`.
    ///
    /// On success returns a confirmation naming the book.
    ///
    /// # Errors
    ///
    /// - [`LoanError::MemberNotFound`] / [`LoanError::BookNotFound`] for unknown keys
    /// - [`LoanError::BookUnavailable`] if the book is already lent out
    /// - [`LoanError::BorrowFailed`] if the member refuses the hold; the book
    ///   is put back in its previous state
    ///
    /// No state changes on any error.
    pub fn borrow_book(&mut self, member_id: &str, isbn: &str) -> Result<String, LoanError> {
        let member = self.members.get_mut(member_id).ok_or(LoanError::MemberNotFound)?;
        let book = self.books.get_mut(isbn).ok_or(LoanError::BookNotFound)?;

        if !book.is_available() {
            return Err(LoanError::BookUnavailable);
        }

        let prior = book.state().clone();
        if !book.borrow(member_id) {
            return Err(LoanError::BorrowFailed);
        }
        if !member.borrow_book(isbn) {
            warn!(member_id, isbn, "member already held the book; rolling back borrow");
            book.restore_state(prior);
            return Err(LoanError::BorrowFailed);
        }

        let title = book.title().to_string();
        let message = format!("Book '{title}' borrowed successfully");
        self.notify(&LibraryEvent::BookBorrowed {
            member_id: member_id.to_string(),
            isbn: isbn.to_string(),
            title,
        });
        Ok(message)
    }

    /// Take `isbn` back from `member_id`.
    ///
    /// On success returns a confirmation naming the book.
    ///
    /// # Errors
    ///
    /// - [`LoanError::MemberNotFound`] / [`LoanError::BookNotFound`] for unknown keys
    /// - [`LoanError::NotBorrowedByMember`] if the member does not hold the book
    /// - [`LoanError::ReturnFailed`] if either side refuses; the book is put
    ///   back in its previous state
    pub fn return_book(&mut self, member_id: &str, isbn: &str) -> Result<String, LoanError> {
        let member = self.members.get_mut(member_id).ok_or(LoanError::MemberNotFound)?;
        let book = self.books.get_mut(isbn).ok_or(LoanError::BookNotFound)?;

        if !member.has_borrowed(isbn) {
            return Err(LoanError::NotBorrowedByMember);
        }

        let prior = book.state().clone();
        if !book.return_book() {
            warn!(member_id, isbn, "member holds a book that is on the shelf");
            return Err(LoanError::ReturnFailed);
        }
        if !member.return_book(isbn) {
            warn!(member_id, isbn, "member refused the return; rolling back");
            book.restore_state(prior);
            return Err(LoanError::ReturnFailed);
        }

        let title = book.title().to_string();
        let message = format!("Book '{title}' returned successfully");
        self.notify(&LibraryEvent::BookReturned {
            member_id: member_id.to_string(),
            isbn: isbn.to_string(),
            title,
        });
        Ok(message)
    }

    /// Counts computed from the current collections
    #[must_use]
    pub fn statistics(&self) -> LibraryStatistics {
        let available_books = self.books.iter().filter(|book| book.is_available()).count();
        let total_books = self.books.len();
        LibraryStatistics {
            total_books,
            available_books,
            borrowed_books: total_books.saturating_sub(available_books),
            total_members: self.members.len(),
            total_librarians: self.librarians.len(),
        }
    }
}

impl EntityStore for Library {
    fn add_book(&mut self, book: Book) -> bool {
        Self::add_book(self, book)
    }

    fn remove_book(&mut self, isbn: &str) -> bool {
        Self::remove_book(self, isbn)
    }

    fn register_member(&mut self, member: Member) -> bool {
        Self::register_member(self, member)
    }

    fn remove_member(&mut self, member_id: &str) -> bool {
        Self::remove_member(self, member_id)
    }
}

impl fmt::Display for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.statistics();
        write!(
            f,
            "{}\nBooks: {} (Available: {}, Borrowed: {})\nMembers: {}",
            self.name,
            stats.total_books,
            stats.available_books,
            stats.borrowed_books,
            stats.total_members
        )
    }
}
