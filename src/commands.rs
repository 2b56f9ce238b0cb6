// ⌨️ Commands - the interactive catalog shell
//
// A typed command set instead of a name → callback table: `Command::parse`
// turns a line into a variant, `CommandHandler::execute` matches on it.

use chrono::NaiveDate;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

use crate::credentials::Credentials;
use crate::db::Database;
use crate::entities::{Book, User};
use crate::error::CatalogResult;
use crate::parser;

const IMPORT_USAGE: &str = "importBooks <FILE_PATH>";
const CREATE_USER_USAGE: &str =
    "createUser <firstname> <lastname> <dateOfBirth> <email> <password>";

// ============================================================================
// COMMAND SET
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    /// Titles only; the raw limit is validated when the command runs
    ListBooks { limit: Option<String> },
    /// Full rows
    List,
    ListUsers,
    ImportBooks { path: PathBuf },
    CreateUser(NewUser),
    SeedBooks,
    Quit,
}

/// Arguments of `createUser`, already validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub firstname: String,
    pub lastname: String,
    pub date_of_birth: NaiveDate,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid date '{0}', use YYYY-MM-DD (e.g. 1990-05-21)")]
    InvalidDate(String),
}

impl Command {
    /// Parse one input line. Command names are case-insensitive.
    /// Returns `Ok(None)` for an empty line.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        let command = match name.to_lowercase().as_str() {
            "help" => Command::Help,
            "listbooks" => Command::ListBooks {
                limit: (!rest.is_empty()).then(|| rest.to_string()),
            },
            "list" => Command::List,
            "listusers" => Command::ListUsers,
            "importbooks" => {
                if rest.is_empty() {
                    return Err(CommandError::Usage(IMPORT_USAGE));
                }
                Command::ImportBooks {
                    path: PathBuf::from(rest),
                }
            }
            "createuser" => Command::CreateUser(NewUser::parse(rest)?),
            "seedbooks" => Command::SeedBooks,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };

        Ok(Some(command))
    }
}

impl NewUser {
    /// Exactly five whitespace-separated tokens
    fn parse(args: &str) -> Result<Self, CommandError> {
        let parts: Vec<&str> = args.split_whitespace().collect();
        let &[firstname, lastname, date_of_birth, email, password] = parts.as_slice() else {
            return Err(CommandError::Usage(CREATE_USER_USAGE));
        };

        let date_of_birth = NaiveDate::parse_from_str(date_of_birth, "%Y-%m-%d")
            .map_err(|_| CommandError::InvalidDate(date_of_birth.to_string()))?;

        Ok(NewUser {
            firstname: firstname.to_string(),
            lastname: lastname.to_string(),
            date_of_birth,
            email: email.to_string(),
            password: password.to_string(),
        })
    }
}

/// What the shell should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

// ============================================================================
// EXECUTION
// ============================================================================

pub struct CommandHandler<'a> {
    db: &'a Database,
}

impl<'a> CommandHandler<'a> {
    pub fn new(db: &'a Database) -> Self {
        CommandHandler { db }
    }

    /// Run a command, writing user-facing output to `out`.
    ///
    /// Only output I/O errors are returned; catalog failures are reported
    /// to `out` and logged, and the shell keeps going.
    pub fn execute<W: Write>(&self, command: Command, out: &mut W) -> CatalogResult<Flow> {
        match command {
            Command::Help => self.help(out)?,
            Command::ListBooks { limit } => self.list_titles(limit.as_deref(), out)?,
            Command::List => self.list_detailed(out)?,
            Command::ListUsers => self.list_users(out)?,
            Command::ImportBooks { path } => self.import_books(&path, out)?,
            Command::CreateUser(new_user) => self.create_user(new_user, out)?,
            Command::SeedBooks => self.seed_books(out)?,
            Command::Quit => {
                writeln!(out, "Goodbye.")?;
                return Ok(Flow::Quit);
            }
        }

        Ok(Flow::Continue)
    }

    fn help<W: Write>(&self, out: &mut W) -> CatalogResult<()> {
        writeln!(out, "Available commands:")?;
        writeln!(out, "  help                 - show this help")?;
        writeln!(out, "  listBooks [limit]    - list book titles (optionally limited)")?;
        writeln!(out, "  list                 - list all books with details")?;
        writeln!(out, "  listUsers            - list all users")?;
        writeln!(out, "  {:<20} - import books from a TSV file", IMPORT_USAGE)?;
        writeln!(out, "  {}", CREATE_USER_USAGE)?;
        writeln!(out, "                       - create a new user")?;
        writeln!(out, "  seedBooks            - add the sample books")?;
        writeln!(out, "  quit                 - exit")?;
        Ok(())
    }

    fn list_titles<W: Write>(&self, limit: Option<&str>, out: &mut W) -> CatalogResult<()> {
        let books = self.db.list_books(resolve_limit(limit));
        if books.is_empty() {
            writeln!(out, "No books found in the database.")?;
            return Ok(());
        }

        for book in books {
            writeln!(out, "{}", book.title)?;
        }
        Ok(())
    }

    fn list_detailed<W: Write>(&self, out: &mut W) -> CatalogResult<()> {
        let books = self.db.list_books(None);
        if books.is_empty() {
            writeln!(out, "No books found in the database.")?;
            return Ok(());
        }

        for book in books {
            writeln!(out, "{}", book)?;
        }
        Ok(())
    }

    fn list_users<W: Write>(&self, out: &mut W) -> CatalogResult<()> {
        let users = self.db.list_users();
        if users.is_empty() {
            writeln!(out, "No users found in the database.")?;
            return Ok(());
        }

        for user in users {
            writeln!(out, "{}", user)?;
        }
        Ok(())
    }

    fn import_books<W: Write>(&self, path: &std::path::Path, out: &mut W) -> CatalogResult<()> {
        let books = parser::read_books_from_tsv(path);
        if books.is_empty() {
            tracing::warn!("No books read from {}", path.display());
            writeln!(
                out,
                "No books read from the file. Check the file path and format."
            )?;
            return Ok(());
        }

        match self.db.upsert_books(&books) {
            Ok(count) => {
                writeln!(out, "✓ {} books imported/updated", count)?;
                self.report_total(out)?;
            }
            Err(e) => {
                tracing::error!("Error saving books to database: {}", e);
                writeln!(out, "❌ Import failed, nothing was saved: {}", e)?;
            }
        }
        Ok(())
    }

    fn create_user<W: Write>(&self, new_user: NewUser, out: &mut W) -> CatalogResult<()> {
        let credentials = match Credentials::provision(&new_user.password) {
            Ok(credentials) => credentials,
            Err(e) => {
                tracing::error!("Error hashing password: {}", e);
                writeln!(out, "❌ Could not hash the password, user not created")?;
                return Ok(());
            }
        };

        let user = User::new(
            new_user.firstname,
            new_user.lastname,
            new_user.date_of_birth,
            new_user.email,
            credentials,
        );

        match self.db.upsert_user(&user) {
            Ok(id) => writeln!(
                out,
                "✓ User created: {} {} ({}) with id {}",
                user.firstname, user.lastname, user.email, id
            )?,
            Err(e) if e.is_constraint_violation() => {
                tracing::warn!("{}", e);
                writeln!(out, "❌ A user with email {} already exists", user.email)?;
            }
            Err(e) => {
                tracing::error!("Error creating user: {}", e);
                writeln!(out, "❌ Could not create user: {}", e)?;
            }
        }
        Ok(())
    }

    fn seed_books<W: Write>(&self, out: &mut W) -> CatalogResult<()> {
        match self.db.upsert_books(&Book::seed_catalog()) {
            Ok(count) => {
                writeln!(out, "✓ {} sample books added", count)?;
                self.report_total(out)?;
            }
            Err(e) => {
                tracing::error!("Error seeding books: {}", e);
                writeln!(out, "❌ Could not add sample books: {}", e)?;
            }
        }
        Ok(())
    }

    fn report_total<W: Write>(&self, out: &mut W) -> CatalogResult<()> {
        match self.db.count_books() {
            Ok(total) => writeln!(out, "  Catalog now holds {} books", total)?,
            Err(e) => tracing::warn!("Could not count books: {}", e),
        }
        Ok(())
    }
}

/// `listBooks` limit: absent, unparseable or non-positive means "all"
fn resolve_limit(raw: Option<&str>) -> Option<i64> {
    let raw = raw?.trim();
    match raw.parse::<i64>() {
        Ok(n) if n > 0 => Some(n),
        Ok(_) => {
            tracing::warn!("Limit must be a positive number, showing all books");
            None
        }
        Err(_) => {
            tracing::warn!("Invalid limit '{}', showing all books", raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(handler: &CommandHandler<'_>, line: &str) -> (Flow, String) {
        let command = Command::parse(line).unwrap().unwrap();
        let mut out = Vec::new();
        let flow = handler.execute(command, &mut out).unwrap();
        (flow, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Command::parse("HELP").unwrap(), Some(Command::Help));
        assert_eq!(
            Command::parse("listBooks 3").unwrap(),
            Some(Command::ListBooks {
                limit: Some("3".to_string())
            })
        );
        assert_eq!(
            Command::parse("listbooks").unwrap(),
            Some(Command::ListBooks { limit: None })
        );
        assert_eq!(Command::parse("Quit").unwrap(), Some(Command::Quit));
        assert_eq!(Command::parse("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            Command::parse("frobnicate now"),
            Err(CommandError::Unknown("frobnicate".to_string()))
        );
        assert_eq!(
            Command::parse("importBooks"),
            Err(CommandError::Usage(IMPORT_USAGE))
        );
        assert_eq!(
            Command::parse("createUser John Doe"),
            Err(CommandError::Usage(CREATE_USER_USAGE))
        );
        assert_eq!(
            Command::parse("createUser John Doe invalid-date john@example.com password"),
            Err(CommandError::InvalidDate("invalid-date".to_string()))
        );
    }

    #[test]
    fn test_parse_create_user() {
        let command =
            Command::parse("createUser Max Mustermann 1990-05-21 max@example.com geheim123")
                .unwrap()
                .unwrap();

        let Command::CreateUser(user) = command else {
            panic!("expected createUser");
        };
        assert_eq!(user.firstname, "Max");
        assert_eq!(user.date_of_birth, NaiveDate::from_ymd_opt(1990, 5, 21).unwrap());
        assert_eq!(user.password, "geheim123");
    }

    #[test]
    fn test_import_then_list() {
        let db = Database::open_in_memory().unwrap();
        let handler = CommandHandler::new(&db);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id\tisbn\ttitle\tauthor\tyear").unwrap();
        writeln!(file, "1\t978-1\tFirst\tA\t2001").unwrap();
        writeln!(file, "2\t978-2\tSecond\tB\t2002").unwrap();
        writeln!(file, "broken line").unwrap();

        let (_, output) = run(&handler, &format!("importBooks {}", file.path().display()));
        assert!(output.contains("2 books imported"), "got: {}", output);
        assert!(output.contains("Catalog now holds 2 books"), "got: {}", output);

        let (_, output) = run(&handler, "listBooks 1");
        assert_eq!(output, "First\n");

        let (_, output) = run(&handler, "listBooks abc");
        assert_eq!(output, "First\nSecond\n", "Invalid limit shows everything");

        let (_, output) = run(&handler, "list");
        assert_eq!(output, "1 | 978-1 | First | A | 2001\n2 | 978-2 | Second | B | 2002\n");
    }

    #[test]
    fn test_import_missing_file_saves_nothing() {
        let db = Database::open_in_memory().unwrap();
        let handler = CommandHandler::new(&db);

        let (flow, output) = run(&handler, "importBooks /no/such/file.tsv");
        assert_eq!(flow, Flow::Continue);
        assert!(output.contains("No books read"));
        assert_eq!(db.count_books().unwrap(), 0);
    }

    #[test]
    fn test_create_user_command() {
        let db = Database::open_in_memory().unwrap();
        let handler = CommandHandler::new(&db);

        let (_, output) = run(&handler, "createUser John Doe 1985-12-10 john@example.com secret456");
        assert!(output.contains("User created"), "got: {}", output);

        let users = db.list_users();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].firstname, "John");
        assert_eq!(users[0].date_of_birth, NaiveDate::from_ymd_opt(1985, 12, 10).unwrap());
        assert!(!users[0].password_hash.is_empty());
        assert!(!users[0].password_salt.is_empty());

        let (flow, output) =
            run(&handler, "createUser Jane Doe 1986-01-01 john@example.com other");
        assert_eq!(flow, Flow::Continue);
        assert!(output.contains("already exists"), "got: {}", output);
        assert_eq!(db.list_users().len(), 1);
    }

    #[test]
    fn test_seed_list_and_quit() {
        let db = Database::open_in_memory().unwrap();
        let handler = CommandHandler::new(&db);

        let (_, output) = run(&handler, "list");
        assert!(output.contains("No books found"));

        run(&handler, "seedBooks");
        let (_, output) = run(&handler, "seedBooks");
        assert!(output.contains("Catalog now holds 2 books"), "Reseeding overwrites: {}", output);

        let (_, output) = run(&handler, "listBooks");
        assert_eq!(output, "Java ist auch eine Insel\nGrundkurs Java\n");

        let (flow, _) = run(&handler, "quit");
        assert_eq!(flow, Flow::Quit);
    }

    #[test]
    fn test_resolve_limit() {
        assert_eq!(resolve_limit(None), None);
        assert_eq!(resolve_limit(Some("5")), Some(5));
        assert_eq!(resolve_limit(Some("0")), None);
        assert_eq!(resolve_limit(Some("-2")), None);
        assert_eq!(resolve_limit(Some("many")), None);
    }
}
