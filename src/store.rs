//! Append-only CSV persistence.
//!
//! One [`CsvStore`] per record mode: the header row fixes the column
//! order, and the first column is the clear-by-query key. Writes are
//! serialized through an internal mutex so concurrent resolutions never
//! interleave rows; minimal quoting keeps the file friendly to
//! spreadsheet consumers.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info};

use crate::error::Error;

/// Header row for book-mode rows.
pub const BOOK_HEADERS: [&str; 4] = ["search_query", "title", "author", "first_year_published"];
/// Header row for research-mode rows.
pub const RESEARCH_HEADERS: [&str; 4] = ["topic", "summary", "sources", "tools_used"];

/// Append-only CSV store for one record mode.
#[derive(Debug)]
pub struct CsvStore {
    path: PathBuf,
    headers: [&'static str; 4],
    lock: Mutex<()>,
}

impl CsvStore {
    /// Creates a store over a file path. The file is created lazily on
    /// first append.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, headers: [&'static str; 4]) -> Self {
        Self {
            path: path.into(),
            headers,
            lock: Mutex::new(()),
        }
    }

    /// The file backing this store.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the backing file exists and has content.
    #[must_use]
    pub fn has_data(&self) -> bool {
        std::fs::metadata(&self.path).is_ok_and(|m| m.len() > 0)
    }

    /// Appends one row, writing the header first when the file is new.
    pub fn append(&self, row: &[String; 4]) -> Result<(), Error> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;

        let write_header = !self.has_data();
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if write_header {
            writer.write_record(self.headers)?;
        }
        writer.write_record(row)?;
        writer.flush()?;
        debug!(path = %self.path.display(), "row appended");
        Ok(())
    }

    /// Raw file contents for serving, or `None` when no data exists.
    pub fn read_raw(&self) -> Result<Option<String>, Error> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        if !self.has_data() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(&self.path)?))
    }

    /// All data rows (header excluded), in file order.
    pub fn rows(&self) -> Result<Vec<Vec<String>>, Error> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        if !self.has_data() {
            return Ok(Vec::new());
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(rows)
    }

    /// Deletes the backing file. Missing file is not an error.
    pub fn clear_all(&self) -> Result<(), Error> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "store cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Rewrites the file without rows whose first column equals `query`.
    ///
    /// Returns the number of rows removed. A missing file clears nothing.
    pub fn clear_query(&self, query: &str) -> Result<usize, Error> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        if !self.has_data() {
            return Ok(0);
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;
        let mut kept: Vec<Vec<String>> = Vec::new();
        let mut removed = 0;
        for record in reader.records() {
            let record = record?;
            if record.get(0) == Some(query) {
                removed += 1;
            } else {
                kept.push(record.iter().map(str::to_string).collect());
            }
        }

        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record(self.headers)?;
        for row in &kept {
            writer.write_record(row)?;
        }
        writer.flush()?;
        info!(query, removed, "matching rows cleared");
        Ok(removed)
    }
}

fn poisoned() -> Error {
    Error::Io(std::io::Error::other("store lock poisoned"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book_row(query: &str) -> [String; 4] {
        [
            query.to_string(),
            "Title".to_string(),
            "Author".to_string(),
            "1937".to_string(),
        ]
    }

    fn temp_store() -> (tempfile::TempDir, CsvStore) {
        let dir = match tempfile::tempdir() {
            Ok(d) => d,
            Err(e) => unreachable!("tempdir failed: {e}"),
        };
        let store = CsvStore::new(dir.path().join("data.csv"), BOOK_HEADERS);
        (dir, store)
    }

    #[test]
    fn test_header_written_once() {
        let (_dir, store) = temp_store();
        assert!(store.append(&book_row("a")).is_ok());
        assert!(store.append(&book_row("b")).is_ok());

        let raw = match store.read_raw() {
            Ok(Some(raw)) => raw,
            other => unreachable!("expected data, got {other:?}"),
        };
        assert_eq!(raw.matches("search_query").count(), 1);
        assert_eq!(raw.lines().count(), 3);
    }

    #[test]
    fn test_empty_store_reads_none() {
        let (_dir, store) = temp_store();
        assert!(matches!(store.read_raw(), Ok(None)));
        assert!(!store.has_data());
    }

    #[test]
    fn test_clear_query_removes_only_matching_rows() {
        let (_dir, store) = temp_store();
        assert!(store.append(&book_row("dune")).is_ok());
        assert!(store.append(&book_row("hobbit")).is_ok());
        assert!(store.append(&book_row("dune")).is_ok());

        match store.clear_query("dune") {
            Ok(removed) => assert_eq!(removed, 2),
            Err(e) => unreachable!("clear failed: {e}"),
        }
        match store.rows() {
            Ok(rows) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0][0], "hobbit");
            }
            Err(e) => unreachable!("rows failed: {e}"),
        }
    }

    #[test]
    fn test_clear_query_on_missing_file_is_noop() {
        let (_dir, store) = temp_store();
        assert!(matches!(store.clear_query("anything"), Ok(0)));
    }

    #[test]
    fn test_clear_all_then_append_rewrites_header() {
        let (_dir, store) = temp_store();
        assert!(store.append(&book_row("a")).is_ok());
        assert!(store.clear_all().is_ok());
        assert!(!store.has_data());
        // Clearing a missing file twice is fine.
        assert!(store.clear_all().is_ok());

        assert!(store.append(&book_row("b")).is_ok());
        match store.rows() {
            Ok(rows) => assert_eq!(rows.len(), 1),
            Err(e) => unreachable!("rows failed: {e}"),
        }
    }

    #[test]
    fn test_fields_with_commas_round_trip() {
        let (_dir, store) = temp_store();
        let row = [
            "q".to_string(),
            "One, Two, Three".to_string(),
            "Last, First".to_string(),
            "1999".to_string(),
        ];
        assert!(store.append(&row).is_ok());
        match store.rows() {
            Ok(rows) => {
                assert_eq!(rows[0][1], "One, Two, Three");
                assert_eq!(rows[0][2], "Last, First");
            }
            Err(e) => unreachable!("rows failed: {e}"),
        }
    }
}
