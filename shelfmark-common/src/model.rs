//! Catalog data model shared across Shelfmark services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One bibliographic catalog entry, keyed by its accession number.
///
/// The accession number is assigned once (by an import or by sequential
/// allocation for manual entries) and never changes afterwards. Every other
/// field is an optional free-text value straight from the source material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub accession_number: i64,
    pub entry_date: Option<String>,
    pub author: Option<String>,
    pub author_display_name: Option<String>,
    pub title: Option<String>,
    pub publisher: Option<String>,
    pub edition: Option<String>,
    pub publication_year: Option<String>,
    pub publication_place: Option<String>,
    pub format: Option<String>,
    pub page_count: Option<String>,
    pub volume: Option<String>,
    pub acquisition_notes: Option<String>,
    pub isbn: Option<String>,
    pub extra1: Option<String>,
    pub extra2: Option<String>,
}

impl CatalogRecord {
    /// Create a bare record holding only an accession number.
    pub fn new(accession_number: i64) -> Self {
        Self {
            accession_number,
            entry_date: None,
            author: None,
            author_display_name: None,
            title: None,
            publisher: None,
            edition: None,
            publication_year: None,
            publication_place: None,
            format: None,
            page_count: None,
            volume: None,
            acquisition_notes: None,
            isbn: None,
            extra1: None,
            extra2: None,
        }
    }

    /// True when the record is a placeholder accession slot: every field
    /// except the accession number and the entry date is absent or blank.
    ///
    /// This predicate decides fill-vs-conflict classification during import,
    /// so blank strings count the same as missing values.
    pub fn is_empty(&self) -> bool {
        fn blank(v: &Option<String>) -> bool {
            v.as_deref().map_or(true, |s| s.trim().is_empty())
        }

        blank(&self.author)
            && blank(&self.author_display_name)
            && blank(&self.title)
            && blank(&self.publisher)
            && blank(&self.edition)
            && blank(&self.publication_year)
            && blank(&self.publication_place)
            && blank(&self.format)
            && blank(&self.page_count)
            && blank(&self.volume)
            && blank(&self.acquisition_notes)
            && blank(&self.isbn)
            && blank(&self.extra1)
            && blank(&self.extra2)
    }

    /// Copy every field except the accession number from `other`.
    ///
    /// The entry date is included: an applied overwrite replaces the full
    /// stored snapshot with the incoming one.
    pub fn overwrite_from(&mut self, other: &CatalogRecord) {
        self.entry_date = other.entry_date.clone();
        self.author = other.author.clone();
        self.author_display_name = other.author_display_name.clone();
        self.title = other.title.clone();
        self.publisher = other.publisher.clone();
        self.edition = other.edition.clone();
        self.publication_year = other.publication_year.clone();
        self.publication_place = other.publication_place.clone();
        self.format = other.format.clone();
        self.page_count = other.page_count.clone();
        self.volume = other.volume.clone();
        self.acquisition_notes = other.acquisition_notes.clone();
        self.isbn = other.isbn.clone();
        self.extra1 = other.extra1.clone();
        self.extra2 = other.extra2.clone();
    }
}

/// Append-only audit entry written once per completed import cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadLogEntry {
    pub id: i64,
    pub user: String,
    pub filename: String,
    pub rows_added: i64,
    pub rows_updated: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_record_is_empty() {
        let record = CatalogRecord::new(42);
        assert!(record.is_empty());
    }

    #[test]
    fn entry_date_does_not_affect_emptiness() {
        let mut record = CatalogRecord::new(42);
        record.entry_date = Some("2024-03-01".to_string());
        assert!(record.is_empty());
    }

    #[test]
    fn blank_strings_count_as_empty() {
        let mut record = CatalogRecord::new(42);
        record.title = Some("   ".to_string());
        assert!(record.is_empty());
    }

    #[test]
    fn any_populated_field_makes_record_non_empty() {
        let mut record = CatalogRecord::new(42);
        record.isbn = Some("978-3-16-148410-0".to_string());
        assert!(!record.is_empty());
    }

    #[test]
    fn overwrite_preserves_accession_number() {
        let mut target = CatalogRecord::new(7);
        target.title = Some("Old title".to_string());

        let mut incoming = CatalogRecord::new(999);
        incoming.title = Some("New title".to_string());
        incoming.entry_date = Some("2024-01-15".to_string());

        target.overwrite_from(&incoming);
        assert_eq!(target.accession_number, 7);
        assert_eq!(target.title.as_deref(), Some("New title"));
        assert_eq!(target.entry_date.as_deref(), Some("2024-01-15"));
    }
}
