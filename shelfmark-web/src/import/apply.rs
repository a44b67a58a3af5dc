//! Resolution of staged conflicts and fill candidates.
//!
//! The reviewer selects which staged items win by accession number; anything
//! not selected is left untouched in the catalog. Targets are re-read
//! immediately before writing because the classification snapshot may have
//! gone stale: a vanished target is skipped silently, a modified-but-present
//! one is overwritten (last writer wins). One audit entry closes the cycle
//! and the pending batch is destroyed either way.

use serde::{Deserialize, Serialize};
use shelfmark_common::{CatalogRecord, Error, Result};
use sqlx::SqlitePool;
use std::collections::HashSet;

use crate::db::{records, upload_log};

use super::staging::StagingStore;

/// The reviewer's choices: accession numbers (as strings, exactly as the
/// review form posts them) of the conflicts to overwrite and the empty
/// records to fill.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ResolveSelection {
    #[serde(default)]
    pub conflicts: HashSet<String>,
    #[serde(default)]
    pub fills: HashSet<String>,
}

/// Final summary of one resolved import cycle.
#[derive(Debug, Serialize)]
pub struct ResolveSummary {
    /// Rows inserted back when the batch was classified.
    pub rows_added: i64,
    /// Conflict overwrites plus fills applied now.
    pub rows_updated: i64,
    pub conflicts_applied: usize,
    pub fills_applied: usize,
    /// Staged items left untouched: unselected, or selected but vanished.
    pub skipped: usize,
    /// Individual saves that failed; the rest of the selection still ran.
    pub save_failures: usize,
    pub total_records: i64,
}

/// Write one incoming snapshot over a live record, skipping silently when
/// the target has vanished. Returns whether the write was applied.
async fn apply_incoming(
    pool: &SqlitePool,
    accession: i64,
    incoming: &CatalogRecord,
    save_failures: &mut usize,
) -> Result<bool> {
    let Some(mut live) = records::find_by_accession(pool, accession).await? else {
        tracing::info!(accession, "Staged target vanished before apply; skipping");
        return Ok(false);
    };

    live.overwrite_from(incoming);
    match records::save(pool, &live).await {
        Ok(()) => Ok(true),
        // A single failed save must not abort the remaining selections;
        // it is surfaced through the summary instead.
        Err(e) => {
            tracing::error!(accession, error = %e, "Failed to save staged record");
            *save_failures += 1;
            Ok(false)
        }
    }
}

/// Apply the reviewer's selections from the user's pending batch, write the
/// audit entry, and destroy the batch.
pub async fn apply_resolution(
    pool: &SqlitePool,
    staging: &StagingStore,
    user: &str,
    selection: &ResolveSelection,
) -> Result<ResolveSummary> {
    let batch = staging
        .get(user)
        .await
        .ok_or_else(|| Error::NotFound(format!("No pending batch for user: {}", user)))?;

    let mut conflicts_applied = 0;
    let mut fills_applied = 0;
    let mut skipped = 0;
    let mut save_failures = 0;

    for conflict in &batch.conflicts {
        if !selection
            .conflicts
            .contains(&conflict.accession_number.to_string())
        {
            skipped += 1;
            continue;
        }
        if apply_incoming(
            pool,
            conflict.accession_number,
            &conflict.incoming,
            &mut save_failures,
        )
        .await?
        {
            conflicts_applied += 1;
        } else {
            skipped += 1;
        }
    }

    for fill in &batch.fills {
        if !selection.fills.contains(&fill.accession_number.to_string()) {
            skipped += 1;
            continue;
        }
        if apply_incoming(pool, fill.accession_number, &fill.incoming, &mut save_failures).await? {
            fills_applied += 1;
        } else {
            skipped += 1;
        }
    }

    let rows_updated = (conflicts_applied + fills_applied) as i64;
    upload_log::record_upload(
        pool,
        user,
        &batch.filename,
        batch.inserted_count as i64,
        rows_updated,
    )
    .await?;

    staging.clear(user).await;

    tracing::info!(
        user = %user,
        batch_id = %batch.batch_id,
        conflicts_applied,
        fills_applied,
        skipped,
        save_failures,
        "Pending batch resolved"
    );

    Ok(ResolveSummary {
        rows_added: batch.inserted_count as i64,
        rows_updated,
        conflicts_applied,
        fills_applied,
        skipped,
        save_failures,
        total_records: records::count_all(pool).await?,
    })
}

/// Abandon every staged item: no field writes, one audit entry with zero
/// updates, pending batch destroyed.
pub async fn skip_all(
    pool: &SqlitePool,
    staging: &StagingStore,
    user: &str,
) -> Result<ResolveSummary> {
    let batch = staging
        .clear(user)
        .await
        .ok_or_else(|| Error::NotFound(format!("No pending batch for user: {}", user)))?;

    upload_log::record_upload(pool, user, &batch.filename, batch.inserted_count as i64, 0).await?;

    let skipped = batch.conflicts.len() + batch.fills.len();
    tracing::info!(
        user = %user,
        batch_id = %batch.batch_id,
        skipped,
        "Pending batch skipped; catalog unchanged"
    );

    Ok(ResolveSummary {
        rows_added: batch.inserted_count as i64,
        rows_updated: 0,
        conflicts_applied: 0,
        fills_applied: 0,
        skipped,
        save_failures: 0,
        total_records: records::count_all(pool).await?,
    })
}
