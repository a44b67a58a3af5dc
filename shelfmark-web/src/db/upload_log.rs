//! Upload audit log queries.
//!
//! One row per completed import cycle. Append-only: nothing in this service
//! ever mutates or deletes an entry.

use chrono::Utc;
use shelfmark_common::{Result, UploadLogEntry};
use sqlx::{Row, SqlitePool};

/// Record one completed import cycle.
pub async fn record_upload(
    pool: &SqlitePool,
    user: &str,
    filename: &str,
    rows_added: i64,
    rows_updated: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO upload_log (user, filename, rows_added, rows_updated, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(user)
    .bind(filename)
    .bind(rows_added)
    .bind(rows_updated)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    tracing::info!(
        user = %user,
        filename = %filename,
        rows_added,
        rows_updated,
        "Upload recorded in audit log"
    );

    Ok(())
}

/// Most recent upload entries, newest first.
pub async fn list_recent(pool: &SqlitePool, limit: i64) -> Result<Vec<UploadLogEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user, filename, rows_added, rows_updated, created_at
        FROM upload_log
        ORDER BY id DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let created_at: String = row.get("created_at");
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| {
                shelfmark_common::Error::Internal(format!("Failed to parse created_at: {}", e))
            })?
            .with_timezone(&Utc);

        entries.push(UploadLogEntry {
            id: row.get("id"),
            user: row.get("user"),
            filename: row.get("filename"),
            rows_added: row.get("rows_added"),
            rows_updated: row.get("rows_updated"),
            created_at,
        });
    }

    Ok(entries)
}
