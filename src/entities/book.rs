// 📚 Book Entity - Catalog record with store-assigned identity
//
// "The id is IDENTITY (never changes), everything else is a VALUE"
//
// Two books with the same id are the same entity, even when their
// title or isbn differ. Upsert relies on exactly this rule.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// BOOK ENTITY
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Row identity. `None` until the store assigns one.
    pub id: Option<i64>,

    /// Unique across the catalog
    pub isbn: String,

    pub title: String,

    pub author: String,

    pub publication_year: Option<i32>,
}

impl Book {
    /// Book with an explicit identity (import rows, seed data)
    pub fn new(
        id: i64,
        isbn: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        publication_year: i32,
    ) -> Self {
        Book {
            id: Some(id),
            isbn: isbn.into(),
            title: title.into(),
            author: author.into(),
            publication_year: Some(publication_year),
        }
    }

    /// Book without identity; the store assigns one on first upsert
    pub fn unsaved(
        isbn: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        publication_year: Option<i32>,
    ) -> Self {
        Book {
            id: None,
            isbn: isbn.into(),
            title: title.into(),
            author: author.into(),
            publication_year,
        }
    }

    /// The two constant books every fresh catalog can be seeded with
    pub fn seed_catalog() -> Vec<Book> {
        vec![
            Book::new(
                1,
                "978-3-8362-9544-4",
                "Java ist auch eine Insel",
                "Christian Ullenboom",
                2023,
            ),
            Book::new(2, "978-3-658-43573-8", "Grundkurs Java", "Dietmar Abts", 2024),
        ]
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }
}

// Identity-based equality: only `id` takes part, and an unsaved book
// equals nothing, not even itself
impl PartialEq for Book {
    fn eq(&self, other: &Self) -> bool {
        self.id.is_some() && self.id == other.id
    }
}

/// `id | isbn | title | author | publicationYear`
impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
        let year = self
            .publication_year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "-".to_string());

        write!(
            f,
            "{} | {} | {} | {} | {}",
            id, self.isbn, self.title, self.author, year
        )
    }
}
