// Error types for the library catalog
//
// One error type for the whole library. Reads absorb these into empty
// results; writes and credential provisioning hand them to the caller.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    /// The ingestion source could not be opened at all
    #[error("cannot open source {}: {source}", .path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A book batch failed and was rolled back as a whole
    #[error("batch import failed: {0}")]
    BatchImport(#[source] rusqlite::Error),

    /// A single user write failed and was rolled back
    #[error("failed to save user {email}: {source}")]
    UserWrite {
        email: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The connection lock was poisoned by a panicking holder
    #[error("database session unavailable")]
    SessionUnavailable,

    /// `Database::shutdown` has already run
    #[error("database has been shut down")]
    Closed,

    /// Salt or digest could not be produced; never persist the password
    #[error("credential provisioning failed: {0}")]
    Credential(String),

    #[error("invalid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    /// True when the underlying SQLite failure is a UNIQUE/NOT NULL violation
    pub fn is_constraint_violation(&self) -> bool {
        let source = match self {
            CatalogError::BatchImport(e) => e,
            CatalogError::UserWrite { source, .. } => source,
            CatalogError::Database(e) => e,
            _ => return false,
        };

        matches!(
            source,
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}

/// Result type alias for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
