//! Batch classification for uploaded spreadsheet rows.
//!
//! Every row lands in exactly one of four outcomes, decided in row order:
//!
//! - rejected: unusable or duplicated-in-file accession number
//! - insert: accession number unknown to the catalog, written immediately
//! - fill candidate: collides with an empty placeholder record, staged
//! - conflict: collides with a populated record, staged
//!
//! Unambiguous inserts are committed in one transaction before the function
//! returns; staged items wait in the user's pending batch for human review.

use serde::Serialize;
use shelfmark_common::Result;
use sqlx::SqlitePool;
use std::collections::HashSet;

use crate::db::{records, upload_log};

use super::staging::{PendingBatch, StagingStore};
use super::{ConflictPair, FillCandidate, RawRow};

/// A row excluded from the batch, with its spreadsheet row number
/// (1-based, counting the header as row 1).
#[derive(Debug, Clone, Serialize)]
pub struct RejectedRow {
    pub row: usize,
    pub reason: String,
}

/// Result of classifying one uploaded batch.
#[derive(Debug, Serialize)]
pub struct ImportOutcome {
    /// Rows inserted immediately.
    pub inserted: usize,
    /// Rows rejected during classification.
    pub rejected: usize,
    /// Collisions staged for review.
    pub conflicts: usize,
    /// Empty-record fills staged for review.
    pub fills: usize,
    /// True when conflicts or fills were staged and a human must resolve
    /// them before the import cycle completes.
    pub needs_review: bool,
    pub rejected_rows: Vec<RejectedRow>,
}

/// Classify a batch of rows against the current catalog.
///
/// Takes one snapshot of existing accession numbers at batch start; the
/// snapshot may go stale before resolution, which the applier tolerates by
/// re-reading each target before writing. When nothing needs review the
/// audit entry is written here and no batch is staged.
pub async fn classify_batch(
    pool: &SqlitePool,
    staging: &StagingStore,
    user: &str,
    filename: &str,
    rows: &[RawRow],
) -> Result<ImportOutcome> {
    let mut existing = records::list_accession_numbers(pool).await?;
    let mut seen_in_file: HashSet<i64> = HashSet::new();

    let mut new_records = Vec::new();
    let mut conflicts: Vec<ConflictPair> = Vec::new();
    let mut fills: Vec<FillCandidate> = Vec::new();
    let mut rejected_rows: Vec<RejectedRow> = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        // Spreadsheet row number: +1 for the header, +1 for 1-based counting.
        let row_number = index + 2;

        let accession = match row.raw_accession().and_then(|s| s.parse::<i64>().ok()) {
            Some(n) if n > 0 => n,
            _ => {
                rejected_rows.push(RejectedRow {
                    row: row_number,
                    reason: "invalid or missing accession number".to_string(),
                });
                continue;
            }
        };

        // First occurrence wins; later rows with the same number are dropped.
        if !seen_in_file.insert(accession) {
            rejected_rows.push(RejectedRow {
                row: row_number,
                reason: "duplicate accession number within file".to_string(),
            });
            continue;
        }

        if !existing.contains(&accession) {
            new_records.push(row.to_record(accession));
            existing.insert(accession);
            continue;
        }

        match records::find_by_accession(pool, accession).await? {
            // The snapshot said this number exists but the record is gone
            // (deleted since the snapshot); safe to insert.
            None => {
                new_records.push(row.to_record(accession));
            }
            Some(stored) if stored.is_empty() => {
                fills.push(FillCandidate {
                    accession_number: accession,
                    existing_entry_date: stored.entry_date,
                    incoming: row.to_record(accession),
                });
            }
            Some(stored) => {
                conflicts.push(ConflictPair {
                    accession_number: accession,
                    existing: stored,
                    incoming: row.to_record(accession),
                });
            }
        }
    }

    let inserted = records::bulk_insert(pool, &new_records).await? as usize;

    let outcome = ImportOutcome {
        inserted,
        rejected: rejected_rows.len(),
        conflicts: conflicts.len(),
        fills: fills.len(),
        needs_review: !conflicts.is_empty() || !fills.is_empty(),
        rejected_rows,
    };

    tracing::info!(
        user = %user,
        filename = %filename,
        inserted = outcome.inserted,
        rejected = outcome.rejected,
        conflicts = outcome.conflicts,
        fills = outcome.fills,
        "Batch classified"
    );

    if outcome.needs_review {
        staging
            .put(PendingBatch::new(
                user.to_string(),
                filename.to_string(),
                conflicts,
                fills,
                outcome.inserted,
                outcome.rejected,
            ))
            .await;
    } else {
        // Nothing to resolve: the import cycle completes right here, and any
        // stale batch from an earlier upload is discarded.
        staging.clear(user).await;
        upload_log::record_upload(pool, user, filename, outcome.inserted as i64, 0).await?;
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::import::CellValue;
    use shelfmark_common::CatalogRecord;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        db::init_tables(&pool).await.unwrap();
        pool
    }

    fn row(accession: CellValue, title: &str) -> RawRow {
        RawRow {
            accession_number: accession,
            title: CellValue::Text(title.to_string()),
            ..RawRow::default()
        }
    }

    #[tokio::test]
    async fn unparsable_and_zero_accessions_are_rejected() {
        let pool = setup_test_db().await;
        let staging = StagingStore::new(60);

        let rows = vec![
            row(CellValue::Text("A-123".to_string()), "bad text"),
            row(CellValue::Integer(0), "zero"),
            row(CellValue::Empty, "missing"),
            row(CellValue::Integer(10), "good"),
        ];

        let outcome = classify_batch(&pool, &staging, "maria", "batch.xlsx", &rows)
            .await
            .unwrap();

        assert_eq!(outcome.rejected, 3);
        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.conflicts, 0);
        assert_eq!(outcome.fills, 0);
        assert!(!outcome.needs_review);
        // Row numbers count the header, so the first data row is row 2.
        assert_eq!(outcome.rejected_rows[0].row, 2);
        assert_eq!(outcome.rejected_rows[2].row, 4);
    }

    #[tokio::test]
    async fn first_in_file_occurrence_wins() {
        let pool = setup_test_db().await;
        let staging = StagingStore::new(60);

        let rows = vec![
            row(CellValue::Integer(5), "first"),
            row(CellValue::Integer(5), "second"),
            row(CellValue::Text("5.0".to_string()), "third, float artifact"),
        ];

        let outcome = classify_batch(&pool, &staging, "maria", "batch.xlsx", &rows)
            .await
            .unwrap();

        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.rejected, 2);

        let stored = records::find_by_accession(&pool, 5).await.unwrap().unwrap();
        assert_eq!(stored.title.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn emptiness_decides_fill_versus_conflict() {
        let pool = setup_test_db().await;
        let staging = StagingStore::new(60);

        // Accession 1: empty placeholder. Accession 2: populated record.
        let mut placeholder = CatalogRecord::new(1);
        placeholder.entry_date = Some("2020-05-05".to_string());
        records::insert(&pool, &placeholder).await.unwrap();

        let mut populated = CatalogRecord::new(2);
        populated.title = Some("Existing title".to_string());
        records::insert(&pool, &populated).await.unwrap();

        let rows = vec![
            row(CellValue::Integer(1), "fills the placeholder"),
            row(CellValue::Integer(2), "collides with data"),
        ];

        let outcome = classify_batch(&pool, &staging, "maria", "batch.xlsx", &rows)
            .await
            .unwrap();

        assert_eq!(outcome.fills, 1);
        assert_eq!(outcome.conflicts, 1);
        assert_eq!(outcome.inserted, 0);
        assert!(outcome.needs_review);

        let batch = staging.get("maria").await.unwrap();
        assert_eq!(batch.fills[0].accession_number, 1);
        assert_eq!(
            batch.fills[0].existing_entry_date.as_deref(),
            Some("2020-05-05")
        );
        assert_eq!(batch.conflicts[0].accession_number, 2);
        assert_eq!(
            batch.conflicts[0].existing.title.as_deref(),
            Some("Existing title")
        );
        // Neither staged row touched the catalog yet.
        let untouched = records::find_by_accession(&pool, 2).await.unwrap().unwrap();
        assert_eq!(untouched.title.as_deref(), Some("Existing title"));
    }

    #[tokio::test]
    async fn clean_import_logs_audit_entry_without_staging() {
        let pool = setup_test_db().await;
        let staging = StagingStore::new(60);

        let rows = vec![
            row(CellValue::Integer(100), "one"),
            row(CellValue::Integer(101), "two"),
        ];

        let outcome = classify_batch(&pool, &staging, "maria", "clean.xlsx", &rows)
            .await
            .unwrap();

        assert!(!outcome.needs_review);
        assert!(staging.get("maria").await.is_none());

        let log = upload_log::list_recent(&pool, 10).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].filename, "clean.xlsx");
        assert_eq!(log[0].rows_added, 2);
        assert_eq!(log[0].rows_updated, 0);
    }

    #[tokio::test]
    async fn display_name_derived_when_absent() {
        let pool = setup_test_db().await;
        let staging = StagingStore::new(60);

        let mut with_author = row(CellValue::Integer(7), "title");
        with_author.author = CellValue::Text("Papadopoulos,Maria,Dr".to_string());

        let mut explicit = row(CellValue::Integer(8), "title");
        explicit.author = CellValue::Text("Papadopoulos,Nikos".to_string());
        explicit.author_display_name = CellValue::Text("N. Papadopoulos".to_string());

        classify_batch(&pool, &staging, "maria", "batch.xlsx", &[with_author, explicit])
            .await
            .unwrap();

        let derived = records::find_by_accession(&pool, 7).await.unwrap().unwrap();
        assert_eq!(
            derived.author_display_name.as_deref(),
            Some("Maria Papadopoulos Dr")
        );

        let kept = records::find_by_accession(&pool, 8).await.unwrap().unwrap();
        assert_eq!(kept.author_display_name.as_deref(), Some("N. Papadopoulos"));
    }
}
