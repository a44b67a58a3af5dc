//! Spreadsheet import reconciliation engine.
//!
//! Ingests a batch of already-tabular rows, classifies each against the
//! existing catalog (new / duplicate-in-file / duplicate-in-database /
//! fills-an-empty-record), stages the ambiguous cases for human review, and
//! applies the reviewer's decisions transactionally:
//!
//! 1. `normalize` - cell-level coercion rules
//! 2. `display_name` - author display-name derivation
//! 3. `classifier` - per-row classification and the transactional bulk insert
//! 4. `staging` - one pending batch per user, awaiting resolution
//! 5. `apply` - applies (or skips) the staged decisions and writes the audit entry

pub mod apply;
pub mod classifier;
pub mod display_name;
pub mod normalize;
pub mod staging;

pub use apply::{apply_resolution, skip_all, ResolveSelection, ResolveSummary};
pub use classifier::{classify_batch, ImportOutcome, RejectedRow};
pub use normalize::CellValue;
pub use staging::{PendingBatch, StagingStore};

use serde::{Deserialize, Serialize};
use shelfmark_common::CatalogRecord;

use display_name::derive_display_name;
use normalize::{normalize_accession, normalize_numeric_or_text, normalize_text};

/// One raw source row, label-to-field mapping already done at the ingestion
/// boundary. Every cell is still untyped; normalization happens when the
/// classifier converts the row into a `CatalogRecord`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRow {
    pub accession_number: CellValue,
    pub entry_date: CellValue,
    pub author: CellValue,
    pub author_display_name: CellValue,
    pub title: CellValue,
    pub publisher: CellValue,
    pub edition: CellValue,
    pub publication_year: CellValue,
    pub publication_place: CellValue,
    pub format: CellValue,
    pub page_count: CellValue,
    pub volume: CellValue,
    pub acquisition_notes: CellValue,
    pub isbn: CellValue,
    pub extra1: CellValue,
    pub extra2: CellValue,
}

impl RawRow {
    /// Normalized form of the accession cell, before integer parsing.
    pub fn raw_accession(&self) -> Option<String> {
        normalize_accession(&self.accession_number)
    }

    /// Normalize every field into a catalog record under the given accession
    /// number. Date-like and numeric-or-text columns keep annotated values
    /// intact; the display name falls back to derivation from the author
    /// column when the source supplied none.
    pub fn to_record(&self, accession_number: i64) -> CatalogRecord {
        let author = normalize_text(&self.author);
        let author_display_name = normalize_text(&self.author_display_name).or_else(|| {
            author
                .as_deref()
                .and_then(derive_display_name)
        });

        CatalogRecord {
            accession_number,
            entry_date: normalize_numeric_or_text(&self.entry_date),
            author,
            author_display_name,
            title: normalize_text(&self.title),
            publisher: normalize_text(&self.publisher),
            edition: normalize_text(&self.edition),
            publication_year: normalize_numeric_or_text(&self.publication_year),
            publication_place: normalize_text(&self.publication_place),
            format: normalize_text(&self.format),
            page_count: normalize_text(&self.page_count),
            volume: normalize_text(&self.volume),
            acquisition_notes: normalize_text(&self.acquisition_notes),
            isbn: normalize_numeric_or_text(&self.isbn),
            extra1: normalize_numeric_or_text(&self.extra1),
            extra2: normalize_numeric_or_text(&self.extra2),
        }
    }
}

/// A staged collision: the stored record and the incoming row share an
/// accession number and the stored record already carries data. A human
/// decides which version of the truth wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictPair {
    pub accession_number: i64,
    pub existing: CatalogRecord,
    pub incoming: CatalogRecord,
}

/// A staged match against an empty stored record: presumed to be a
/// placeholder accession slot awaiting data, offered as a fill rather than
/// a destructive overwrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillCandidate {
    pub accession_number: i64,
    pub existing_entry_date: Option<String>,
    pub incoming: CatalogRecord,
}
