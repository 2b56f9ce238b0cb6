// 🗄️ Persistence Store - books + users in SQLite
//
// One process-wide connection, opened once and shut down once. Every
// operation borrows it through a lock guard scoped to that call, and every
// write runs inside a rusqlite `Transaction`, which rolls back on drop
// unless committed.

use rusqlite::{params, Connection, Transaction};
use std::path::Path;
use std::sync::Mutex;

use crate::config::DatabaseConfig;
use crate::entities::{Book, User};
use crate::error::{CatalogError, CatalogResult};

/// Sentinel for "no limit" in SQLite's `LIMIT` clause
const NO_LIMIT: i64 = -1;

pub struct Database {
    conn: Mutex<Option<Connection>>,
}

// ============================================================================
// LIFECYCLE
// ============================================================================

impl Database {
    /// Open (or create) a database file and make sure the schema exists
    pub fn open<P: AsRef<Path>>(path: P) -> CatalogResult<Self> {
        let conn = Connection::open(path.as_ref())?;

        // WAL for crash recovery; in-memory databases report "memory"
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;

        Self::from_connection(conn)
    }

    /// Private in-memory database (tests, throwaway sessions)
    pub fn open_in_memory() -> CatalogResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_config(config: &DatabaseConfig) -> CatalogResult<Self> {
        if config.path == ":memory:" {
            Self::open_in_memory()
        } else {
            Self::open(&config.path)
        }
    }

    fn from_connection(conn: Connection) -> CatalogResult<Self> {
        setup_database(&conn)?;
        Ok(Database {
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Close the connection. Safe to call more than once.
    pub fn shutdown(&self) {
        let mut guard = match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(conn) = guard.take() {
            if let Err((_, e)) = conn.close() {
                tracing::error!("Error closing database: {}", e);
            } else {
                tracing::info!("Database connection closed");
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.conn.lock().map(|guard| guard.is_some()).unwrap_or(false)
    }

    /// Run `f` with exclusive access to the connection. The lock is released
    /// when this returns, whatever `f` did.
    fn with_session<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> CatalogResult<T>,
    ) -> CatalogResult<T> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| CatalogError::SessionUnavailable)?;
        let conn = guard.as_mut().ok_or(CatalogError::Closed)?;
        f(conn)
    }
}

pub fn setup_database(conn: &Connection) -> CatalogResult<()> {
    // AUTOINCREMENT keeps ids from ever being reused
    conn.execute(
        "CREATE TABLE IF NOT EXISTS books (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            isbn TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            author TEXT NOT NULL,
            publication_year INTEGER
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            firstname TEXT NOT NULL,
            lastname TEXT NOT NULL,
            date_of_birth TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            password_salt TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

// ============================================================================
// BOOKS
// ============================================================================

impl Database {
    /// Books by ascending id. Failures are logged and read as "no books";
    /// use [`Database::try_list_books`] to tell the two apart.
    pub fn list_books(&self, limit: Option<i64>) -> Vec<Book> {
        self.try_list_books(limit).unwrap_or_else(|e| {
            tracing::error!("Error fetching books from database: {}", e);
            Vec::new()
        })
    }

    /// Books by ascending id, at most `limit` of them when `limit > 0`
    pub fn try_list_books(&self, limit: Option<i64>) -> CatalogResult<Vec<Book>> {
        let limit = limit.filter(|n| *n > 0).unwrap_or(NO_LIMIT);

        self.with_session(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, isbn, title, author, publication_year
                 FROM books
                 ORDER BY id
                 LIMIT ?1",
            )?;

            let books = stmt
                .query_map([limit], |row| {
                    Ok(Book {
                        id: row.get(0)?,
                        isbn: row.get(1)?,
                        title: row.get(2)?,
                        author: row.get(3)?,
                        publication_year: row.get(4)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(books)
        })
    }

    pub fn count_books(&self) -> CatalogResult<i64> {
        self.with_session(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
            Ok(count)
        })
    }

    /// Insert or overwrite every book in one transaction.
    ///
    /// A book whose id already exists has all other columns replaced; any
    /// other book is inserted (keeping its id if it has one). If any row
    /// fails, nothing from the batch is kept.
    pub fn upsert_books(&self, books: &[Book]) -> CatalogResult<usize> {
        let processed = self
            .with_session(|conn| {
                let tx = conn.transaction()?;
                for book in books {
                    upsert_book(&tx, book)?;
                }
                tx.commit()?;
                Ok(books.len())
            })
            .map_err(|e| match e {
                CatalogError::Database(source) => CatalogError::BatchImport(source),
                other => other,
            })?;

        let assigned = books.iter().filter(|book| book.is_new()).count();
        tracing::info!(
            "{} books imported/updated ({} with store-assigned ids)",
            processed,
            assigned
        );
        Ok(processed)
    }
}

fn upsert_book(tx: &Transaction<'_>, book: &Book) -> rusqlite::Result<i64> {
    tx.query_row(
        "INSERT INTO books (id, isbn, title, author, publication_year)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
            isbn = excluded.isbn,
            title = excluded.title,
            author = excluded.author,
            publication_year = excluded.publication_year
         RETURNING id",
        params![
            book.id,
            book.isbn,
            book.title,
            book.author,
            book.publication_year,
        ],
        |row| row.get(0),
    )
}

// ============================================================================
// USERS
// ============================================================================

impl Database {
    /// Users by ascending id; failures are logged and read as "no users"
    pub fn list_users(&self) -> Vec<User> {
        self.try_list_users().unwrap_or_else(|e| {
            tracing::error!("Error fetching users from database: {}", e);
            Vec::new()
        })
    }

    pub fn try_list_users(&self) -> CatalogResult<Vec<User>> {
        self.with_session(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, firstname, lastname, date_of_birth, email,
                        password_hash, password_salt
                 FROM users
                 ORDER BY id",
            )?;

            let users = stmt
                .query_map([], |row| {
                    Ok(User {
                        id: row.get(0)?,
                        firstname: row.get(1)?,
                        lastname: row.get(2)?,
                        date_of_birth: row.get(3)?,
                        email: row.get(4)?,
                        password_hash: row.get(5)?,
                        password_salt: row.get(6)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(users)
        })
    }

    /// Insert or overwrite one user in its own transaction; returns its id
    pub fn upsert_user(&self, user: &User) -> CatalogResult<i64> {
        let id = self
            .with_session(|conn| {
                let tx = conn.transaction()?;
                let id: i64 = tx.query_row(
                    "INSERT INTO users (
                        id, firstname, lastname, date_of_birth, email,
                        password_hash, password_salt
                     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(id) DO UPDATE SET
                        firstname = excluded.firstname,
                        lastname = excluded.lastname,
                        date_of_birth = excluded.date_of_birth,
                        email = excluded.email,
                        password_hash = excluded.password_hash,
                        password_salt = excluded.password_salt
                     RETURNING id",
                    params![
                        user.id,
                        user.firstname,
                        user.lastname,
                        user.date_of_birth,
                        user.email,
                        user.password_hash,
                        user.password_salt,
                    ],
                    |row| row.get(0),
                )?;
                tx.commit()?;
                Ok(id)
            })
            .map_err(|e| match e {
                CatalogError::Database(source) => CatalogError::UserWrite {
                    email: user.email.clone(),
                    source,
                },
                other => other,
            })?;

        if user.is_new() {
            tracing::info!("User created: {} (id {})", user.email, id);
        } else {
            tracing::info!("User updated: {} (id {})", user.email, id);
        }
        Ok(id)
    }
}
