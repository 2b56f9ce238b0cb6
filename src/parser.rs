// 📥 Catalog Ingestion - tab-separated book records
//
// Format: id \t isbn \t title \t author \t publicationYear [\t ignored...]
// Optional header line. Bad lines are skipped and reported, never fatal.

use csv::{ReaderBuilder, StringRecord, Trim};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::Path;

use crate::entities::Book;
use crate::error::{CatalogError, CatalogResult};

/// Columns every data row must provide
pub const REQUIRED_FIELDS: usize = 5;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Why a line did not become a book
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    TooFewFields { found: usize },
    InvalidId(String),
    InvalidYear(String),
    /// Not valid UTF-8 or otherwise unreadable as a record
    Unreadable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TooFewFields { found } => write!(
                f,
                "expected {} columns, found {}",
                REQUIRED_FIELDS, found
            ),
            SkipReason::InvalidId(value) => write!(f, "id '{}' is not an integer", value),
            SkipReason::InvalidYear(value) => {
                write!(f, "publication year '{}' is not an integer", value)
            }
            SkipReason::Unreadable(msg) => write!(f, "unreadable line: {}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number in the source
    pub line: u64,
    pub content: String,
    pub reason: SkipReason,
}

/// Output of a parse: books in file order plus every line that was dropped
#[derive(Debug, Default)]
pub struct ParseReport {
    pub books: Vec<Book>,
    pub skipped: Vec<SkippedLine>,
}

// ============================================================================
// PARSING
// ============================================================================

/// Header heuristic: the line mentions both "id" and "isbn", any case.
///
/// Known to be fragile: a data row whose text contains both tokens is taken
/// for a header, and a header with other column names is parsed as data.
pub fn is_header(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("id") && lower.contains("isbn")
}

/// Turn one record into a book. Extra trailing fields are ignored.
pub fn parse_record(record: &StringRecord) -> Result<Book, SkipReason> {
    if record.len() < REQUIRED_FIELDS {
        return Err(SkipReason::TooFewFields {
            found: record.len(),
        });
    }

    let field = move |i: usize| record.get(i).unwrap_or("");

    let id = field(0)
        .parse::<i64>()
        .map_err(|_| SkipReason::InvalidId(field(0).to_string()))?;
    let year = field(4)
        .parse::<i32>()
        .map_err(|_| SkipReason::InvalidYear(field(4).to_string()))?;

    Ok(Book::new(id, field(1), field(2), field(3), year))
}

/// Parse books from any reader.
///
/// Only the physical first line is a header candidate, even when it is blank.
pub fn parse_books<R: Read>(source: R) -> ParseReport {
    let mut report = ParseReport::default();
    let mut source = BufReader::new(source);

    let mut first_line = Vec::new();
    if let Err(e) = source.read_until(b'\n', &mut first_line) {
        tracing::error!("Error reading source at line 1: {}", e);
        return report;
    }

    // A dropped header shifts every csv line number by one
    let (first_line, offset) = if is_header(&String::from_utf8_lossy(&first_line)) {
        (Vec::new(), 1)
    } else {
        (first_line, 0)
    };

    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(Cursor::new(first_line).chain(source));

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map(|p| p.line() + offset).unwrap_or(0);
                if matches!(e.kind(), csv::ErrorKind::Io(_)) {
                    tracing::error!("Error reading source at line {}: {}", line, e);
                    break;
                }
                skip(&mut report, line, String::new(), SkipReason::Unreadable(e.to_string()));
                continue;
            }
        };

        // Blank (or whitespace-only) lines
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }

        let line = record.position().map(|p| p.line() + offset).unwrap_or(0);
        match parse_record(&record) {
            Ok(book) => report.books.push(book),
            Err(reason) => {
                let content = record.iter().collect::<Vec<_>>().join("\t");
                skip(&mut report, line, content, reason)
            }
        }
    }

    report
}

fn skip(report: &mut ParseReport, line: u64, content: String, reason: SkipReason) {
    tracing::warn!("Skipping line {} ({}): {}", line, reason, content);
    report.skipped.push(SkippedLine {
        line,
        content,
        reason,
    });
}

/// Parse a TSV file; fails only when the file cannot be opened
pub fn parse_books_file(path: &Path) -> CatalogResult<ParseReport> {
    let file = File::open(path).map_err(|source| CatalogError::SourceUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(parse_books(file))
}

/// Books from a TSV file. An unreadable file is logged and yields no books.
pub fn read_books_from_tsv(path: &Path) -> Vec<Book> {
    match parse_books_file(path) {
        Ok(report) => report.books,
        Err(e) => {
            tracing::error!("{}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(text: &str) -> ParseReport {
        parse_books(text.as_bytes())
    }

    #[test]
    fn test_example_row() {
        let report = parse("7\t978-0-1\tFoo\tBar\t1999\n");

        assert_eq!(report.books.len(), 1);
        let book = &report.books[0];
        assert_eq!(book.id, Some(7));
        assert_eq!(book.isbn, "978-0-1");
        assert_eq!(book.title, "Foo");
        assert_eq!(book.author, "Bar");
        assert_eq!(book.publication_year, Some(1999));
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_three_fields_skipped() {
        let report = parse("1\t978-1\tOne\t A\t2001\n2\t978-2\tTwo\n");

        assert_eq!(report.books.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].line, 2);
        assert_eq!(report.skipped[0].reason, SkipReason::TooFewFields { found: 3 });
    }

    #[test]
    fn test_header_is_discarded() {
        let text = "ID\tISBN\tTitle\tAuthor\tYear\n\
                    1\t978-1\tOne\tA\t2001\n\
                    2\t978-2\tTwo\tB\t2002\n";
        let report = parse(text);

        assert_eq!(report.books.len(), 2);
        assert!(report.skipped.is_empty(), "Header must not count as a bad line");
    }

    #[test]
    fn test_first_line_without_header_is_data() {
        let report = parse("1\t978-1\tOne\tA\t2001\n2\t978-2\tTwo\tB\t2002\n");
        let ids: Vec<i64> = report.books.iter().filter_map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_header_heuristic_misreads_data_row() {
        // A real data row whose title mentions both tokens
        let report = parse("1\tisbn-978\tValid Ideas\tA\t2001\n2\t978-2\tTwo\tB\t2002\n");
        assert_eq!(report.books.len(), 1);
        assert_eq!(report.books[0].id, Some(2));

        assert!(is_header("Id\tIsbn"));
        assert!(!is_header("number\tisbn\ttitle"));
    }

    #[test]
    fn test_leading_blank_line_is_the_header_candidate() {
        // The blank first line is the one inspected, so this row is data
        let report = parse("\n1\tisbn-978\tValid Ideas\tA\t2001\n");
        assert_eq!(report.books.len(), 1);
        assert_eq!(report.books[0].isbn, "isbn-978");

        // A header below a blank first line is just a bad row
        let report = parse("\nid\tisbn\ttitle\tauthor\tyear\n2\t978-2\tTwo\tB\t2002\n");
        assert_eq!(report.books.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::InvalidId("id".to_string()));
    }

    #[test]
    fn test_malformed_lines_tolerated() {
        let text = "id\tisbn\ttitle\tauthor\tyear\n\
                    1\t978-1\tOne\tA\t2001\n\
                    x\t978-x\tBad id\tA\t2001\n\
                    2\t978-2\tTwo\tB\t2002\n\
                    3\t978-3\tBad year\tC\tsoon\n\
                    4\t978-4\tShort\n\
                    5\t978-5\tFive\tE\t2005\n";
        let report = parse(text);

        let ids: Vec<i64> = report.books.iter().filter_map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2, 5], "Exactly the valid rows, in file order");
        assert_eq!(report.skipped.len(), 3);
        assert_eq!(report.skipped[0].reason, SkipReason::InvalidId("x".to_string()));
        assert_eq!(report.skipped[1].reason, SkipReason::InvalidYear("soon".to_string()));
        assert_eq!(report.skipped[2].line, 6);
    }

    #[test]
    fn test_blank_lines_and_extra_fields() {
        let text = "\n1\t978-1\tOne\tA\t2001\textra\tmore\n\n   \n2\t978-2\tTwo\tB\t2002\r\n";
        let report = parse(text);

        assert_eq!(report.books.len(), 2);
        assert!(report.skipped.is_empty(), "Blank lines are skipped silently");
    }

    #[test]
    fn test_fields_are_trimmed_and_quotes_kept() {
        let report = parse(" 3 \t 978-3 \t \"Quoted\" Title \t Author \t 2003 \n");

        assert_eq!(report.books.len(), 1);
        assert_eq!(report.books[0].id, Some(3));
        assert_eq!(report.books[0].isbn, "978-3");
        assert_eq!(report.books[0].title, "\"Quoted\" Title");
    }

    #[test]
    fn test_invalid_utf8_line_skipped() {
        let mut bytes = b"1\t978-1\tOne\tA\t2001\n".to_vec();
        bytes.extend_from_slice(b"2\t978-2\t\xff\xfe\tB\t2002\n");
        bytes.extend_from_slice(b"3\t978-3\tThree\tC\t2003\n");

        let report = parse_books(&bytes[..]);
        assert_eq!(report.books.len(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(report.skipped[0].reason, SkipReason::Unreadable(_)));
    }

    #[test]
    fn test_parse_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id\tisbn\ttitle\tauthor\tpublication_year").unwrap();
        writeln!(file, "1\t978-3-8362-9544-4\tJava ist auch eine Insel\tChristian Ullenboom\t2023").unwrap();

        let books = read_books_from_tsv(file.path());
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].author, "Christian Ullenboom");
    }

    #[test]
    fn test_missing_file() {
        let path = Path::new("/definitely/not/here/books.tsv");

        assert!(read_books_from_tsv(path).is_empty());
        assert!(matches!(
            parse_books_file(path),
            Err(CatalogError::SourceUnreadable { .. })
        ));
    }

    #[test]
    fn test_empty_source() {
        let report = parse("");
        assert!(report.books.is_empty());
        assert!(report.skipped.is_empty());
    }
}
