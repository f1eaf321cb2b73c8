//! Command-line front end for the library catalog.
//!
//! Every command loads the JSON snapshot (or starts empty when it does not
//! exist), applies one change, and writes the snapshot back if anything changed.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use library_catalog::{
    Book, Librarian, Library, LibrarySnapshot, Member, TransactionLogger,
    librarian::DEFAULT_PASSWORD, library::DEFAULT_LIBRARY_NAME,
};

/// Manage a small library's catalog, members and loans
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Snapshot file holding the library
    #[arg(long, env = "LIBRARY_DATA_FILE", default_value = "library.json")]
    data_file: PathBuf,

    /// Library name used when the snapshot does not exist yet
    #[arg(long, env = "LIBRARY_NAME", default_value = DEFAULT_LIBRARY_NAME)]
    name: String,

    /// Command to run
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a book to the catalog
    AddBook {
        /// Book title
        #[arg(long)]
        title: String,
        /// Book author
        #[arg(long)]
        author: String,
        /// Unique ISBN
        #[arg(long)]
        isbn: String,
    },

    /// Withdraw a book that is on the shelf
    RemoveBook {
        /// ISBN of the book
        isbn: String,
    },

    /// Register a new member
    RegisterMember {
        /// Member name
        #[arg(long)]
        name: String,
        /// Unique member ID
        #[arg(long)]
        id: String,
    },

    /// Remove a member who holds no books
    RemoveMember {
        /// Member ID
        id: String,
    },

    /// Add a librarian
    AddLibrarian {
        /// Librarian name
        #[arg(long)]
        name: String,
        /// Unique librarian ID
        #[arg(long)]
        id: String,
        /// Login password (defaults to the built-in password)
        #[arg(long)]
        password: Option<String>,
    },

    /// Log a librarian in
    Login {
        /// Librarian ID
        #[arg(long)]
        id: String,
        /// Password
        #[arg(long)]
        password: String,
    },

    /// Change a librarian's password
    ChangePassword {
        /// Librarian ID
        #[arg(long)]
        id: String,
        /// Current password
        #[arg(long)]
        old: String,
        /// New password
        #[arg(long)]
        new: String,
    },

    /// Lend a book to a member
    Borrow {
        /// Member ID
        #[arg(long)]
        member: String,
        /// ISBN of the book
        #[arg(long)]
        isbn: String,
    },

    /// Take a book back from a member
    Return {
        /// Member ID
        #[arg(long)]
        member: String,
        /// ISBN of the book
        #[arg(long)]
        isbn: String,
    },

    /// Search the catalog by title and/or author
    Search {
        /// Case-insensitive title fragment
        #[arg(long)]
        title: Option<String>,
        /// Case-insensitive author fragment
        #[arg(long)]
        author: Option<String>,
    },

    /// List books
    Books {
        /// Only books on the shelf
        #[arg(long, conflicts_with = "borrowed")]
        available: bool,
        /// Only books lent out
        #[arg(long)]
        borrowed: bool,
    },

    /// List members
    Members,

    /// List librarians
    Librarians,

    /// Show catalog statistics
    Stats,

    /// Run a short in-memory walkthrough without touching the snapshot
    Demo,
}

/// Entry point
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "library_catalog=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if matches!(cli.command, Commands::Demo) {
        run_demo();
        return Ok(());
    }

    let mut library = open_library(&cli.data_file, &cli.name)?;
    library.register_observer(Box::new(TransactionLogger));

    if run_command(&mut library, cli.command)? {
        LibrarySnapshot::capture(&library)
            .save(&cli.data_file)
            .with_context(|| format!("saving {}", cli.data_file.display()))?;
    }

    Ok(())
}

/// Load the snapshot at `path`, or start an empty library named `name`
fn open_library(path: &Path, name: &str) -> Result<Library> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "no snapshot found, starting an empty library");
        return Ok(Library::new(name));
    }
    let snapshot =
        LibrarySnapshot::load(path).with_context(|| format!("loading {}", path.display()))?;
    Ok(snapshot.restore()?)
}

/// Apply one command; returns whether the library changed
fn run_command(library: &mut Library, command: Commands) -> Result<bool> {
    match command {
        Commands::AddBook { title, author, isbn } => {
            if !library.add_book(Book::new(title, author, isbn.as_str())) {
                bail!("a book with ISBN {isbn} is already catalogued");
            }
            success(&format!("Added book {isbn}"));
        }

        Commands::RemoveBook { isbn } => {
            if !library.remove_book(&isbn) {
                bail!("book {isbn} is unknown or currently borrowed");
            }
            success(&format!("Removed book {isbn}"));
        }

        Commands::RegisterMember { name, id } => {
            if !library.register_member(Member::new(name, id.as_str())) {
                bail!("member ID {id} is already registered");
            }
            success(&format!("Registered member {id}"));
        }

        Commands::RemoveMember { id } => {
            if !library.remove_member(&id) {
                bail!("member {id} is unknown or still holds books");
            }
            success(&format!("Removed member {id}"));
        }

        Commands::AddLibrarian { name, id, password } => {
            let librarian = match password {
                Some(password) => Librarian::with_password(name, id.as_str(), &password),
                None => Librarian::new(name, id.as_str()),
            };
            if !library.add_librarian(librarian) {
                bail!("librarian ID {id} is already taken");
            }
            success(&format!("Added librarian {id}"));
        }

        Commands::Login { id, password } => {
            let Some(librarian) = library.find_librarian_mut(&id) else {
                bail!("librarian {id} not found");
            };
            if !librarian.authenticate(&password) {
                bail!("authentication failed for {id}");
            }
            success(&format!("Welcome, {}", librarian.name()));
            println!("{}", librarian.info());
        }

        Commands::ChangePassword { id, old, new } => {
            let Some(librarian) = library.find_librarian_mut(&id) else {
                bail!("librarian {id} not found");
            };
            if !librarian.change_password(&old, &new) {
                bail!("current password for {id} does not match");
            }
            success("Password changed");
        }

        Commands::Borrow { member, isbn } => {
            let message = library.borrow_book(&member, &isbn)?;
            success(&message);
        }

        Commands::Return { member, isbn } => {
            let message = library.return_book(&member, &isbn)?;
            success(&message);
        }

        Commands::Search { title, author } => {
            print_books(&search_books(library, title.as_deref(), author.as_deref()));
            return Ok(false);
        }

        Commands::Books { available, borrowed } => {
            let books = if available {
                library.available_books()
            } else if borrowed {
                library.borrowed_books()
            } else {
                library.all_books()
            };
            print_books(&books);
            return Ok(false);
        }

        Commands::Members => {
            let members = library.all_members();
            if members.is_empty() {
                println!("{}", "No members registered.".dimmed());
            }
            for member in members {
                println!("{member}  {}", format!("[{} borrowed]", member.borrowed_count()).dimmed());
            }
            return Ok(false);
        }

        Commands::Librarians => {
            for librarian in library.all_librarians() {
                println!("{}\n", librarian.info());
            }
            return Ok(false);
        }

        Commands::Stats => {
            println!("{library}");
            return Ok(false);
        }

        Commands::Demo => {
            run_demo();
            return Ok(false);
        }
    }

    Ok(true)
}

/// Books matching every given query, in catalog order
fn search_books<'a>(library: &'a Library, title: Option<&str>, author: Option<&str>) -> Vec<&'a Book> {
    let mut books = title.map_or_else(|| library.all_books(), |query| library.find_books_by_title(query));
    if let Some(query) = author {
        let by_author = library.find_books_by_author(query);
        books.retain(|book| by_author.iter().any(|b| b.isbn() == book.isbn()));
    }
    books
}

/// Print a confirmation line
fn success(message: &str) {
    println!("{}", message.green());
}

/// Print one line per book with its loan status
fn print_books(books: &[&Book]) {
    if books.is_empty() {
        println!("{}", "No books found.".dimmed());
        return;
    }
    for book in books {
        let status = match book.borrowed_by() {
            None => "available".green(),
            Some(member_id) => format!("borrowed by {member_id}").yellow(),
        };
        println!("{book}  [{status}]");
    }
}

/// Walk through a borrow/return cycle on a throwaway library
fn run_demo() {
    println!("{}", "Library catalog walkthrough".green().bold());
    println!("=====================================\n");

    let mut library = Library::default();
    library.register_observer(Box::new(TransactionLogger));

    let mut librarian = Librarian::new("Ada", "L1");
    println!("Librarian login: {}", librarian.authenticate(DEFAULT_PASSWORD));

    librarian.add_book(&mut library, Book::new("Dune", "Frank Herbert", "111"));
    librarian.add_book(&mut library, Book::new("Emma", "Jane Austen", "222"));
    librarian.register_member(&mut library, Member::new("Alice", "M1"));

    for (member, isbn) in [("M1", "111"), ("Mx", "111"), ("M1", "111")] {
        match library.borrow_book(member, isbn) {
            Ok(message) => println!("borrow {member}/{isbn}: {}", message.green()),
            Err(err) => println!("borrow {member}/{isbn}: {}", err.to_string().red()),
        }
    }

    println!("\nSearch \"dun\":");
    print_books(&library.find_books_by_title("dun"));
    println!("\nAvailable:");
    print_books(&library.available_books());

    match library.return_book("M1", "111") {
        Ok(message) => println!("\n{}", message.green()),
        Err(err) => println!("\n{}", err.to_string().red()),
    }

    println!("\n{library}");
    println!("\n{}", "Walkthrough complete!".green().bold());
}
