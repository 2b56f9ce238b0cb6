// Library Catalog - Core Library
// Exposes all modules for use in the CLI, the API server, and tests

pub mod commands;
pub mod config;
pub mod credentials;
pub mod db;
pub mod entities;
pub mod error;
pub mod parser;
pub mod telemetry;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use commands::{Command, CommandError, CommandHandler, Flow, NewUser};
pub use config::{AppConfig, DatabaseConfig, LoggingConfig, ServerConfig};
pub use credentials::{generate_salt, hash_password, Credentials};
pub use db::{setup_database, Database};
pub use entities::{Book, User};
pub use error::{CatalogError, CatalogResult};
pub use parser::{
    parse_books, parse_books_file, read_books_from_tsv, ParseReport, SkipReason, SkippedLine,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
