//! Catalog record queries.
//!
//! The records table is the shared mutable catalog. Everything here goes
//! through the pool; writes that must be all-or-nothing (the import bulk
//! insert) run inside an explicit transaction.

use serde::{Deserialize, Serialize};
use shelfmark_common::{CatalogRecord, Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;

/// Records per browse page, matching the catalog list view.
pub const PAGE_SIZE: i64 = 200;

/// SQL predicate selecting empty placeholder records: every field except the
/// accession number and the entry date is NULL or blank. Must stay in step
/// with `CatalogRecord::is_empty`.
const EMPTY_PREDICATE: &str = "(author IS NULL OR trim(author) = '') \
     AND (author_display_name IS NULL OR trim(author_display_name) = '') \
     AND (title IS NULL OR trim(title) = '') \
     AND (publisher IS NULL OR trim(publisher) = '') \
     AND (edition IS NULL OR trim(edition) = '') \
     AND (publication_year IS NULL OR trim(publication_year) = '') \
     AND (publication_place IS NULL OR trim(publication_place) = '') \
     AND (format IS NULL OR trim(format) = '') \
     AND (page_count IS NULL OR trim(page_count) = '') \
     AND (volume IS NULL OR trim(volume) = '') \
     AND (acquisition_notes IS NULL OR trim(acquisition_notes) = '') \
     AND (isbn IS NULL OR trim(isbn) = '') \
     AND (extra1 IS NULL OR trim(extra1) = '') \
     AND (extra2 IS NULL OR trim(extra2) = '')";

const RECORD_COLUMNS: &str = "accession_number, entry_date, author, author_display_name, title, \
     publisher, edition, publication_year, publication_place, format, page_count, volume, \
     acquisition_notes, isbn, extra1, extra2";

fn record_from_row(row: &SqliteRow) -> CatalogRecord {
    CatalogRecord {
        accession_number: row.get("accession_number"),
        entry_date: row.get("entry_date"),
        author: row.get("author"),
        author_display_name: row.get("author_display_name"),
        title: row.get("title"),
        publisher: row.get("publisher"),
        edition: row.get("edition"),
        publication_year: row.get("publication_year"),
        publication_place: row.get("publication_place"),
        format: row.get("format"),
        page_count: row.get("page_count"),
        volume: row.get("volume"),
        acquisition_notes: row.get("acquisition_notes"),
        isbn: row.get("isbn"),
        extra1: row.get("extra1"),
        extra2: row.get("extra2"),
    }
}

/// Load one record by accession number.
pub async fn find_by_accession(pool: &SqlitePool, accession: i64) -> Result<Option<CatalogRecord>> {
    let row = sqlx::query(&format!(
        "SELECT {RECORD_COLUMNS} FROM records WHERE accession_number = ?"
    ))
    .bind(accession)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(record_from_row))
}

/// Snapshot of every accession number currently in the catalog.
pub async fn list_accession_numbers(pool: &SqlitePool) -> Result<HashSet<i64>> {
    let rows = sqlx::query("SELECT accession_number FROM records")
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().map(|r| r.get("accession_number")).collect())
}

/// Insert a batch of new records inside a single transaction.
///
/// A crash mid-import must not half-populate the catalog, so either every
/// queued record lands or none does.
pub async fn bulk_insert(pool: &SqlitePool, records: &[CatalogRecord]) -> Result<u64> {
    if records.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    for record in records {
        insert_in(&mut *tx, record).await?;
    }
    tx.commit().await?;

    Ok(records.len() as u64)
}

/// Insert one record.
pub async fn insert(pool: &SqlitePool, record: &CatalogRecord) -> Result<()> {
    insert_in(pool, record).await
}

async fn insert_in<'e, E>(executor: E, record: &CatalogRecord) -> Result<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(&format!(
        "INSERT INTO records ({RECORD_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(record.accession_number)
    .bind(&record.entry_date)
    .bind(&record.author)
    .bind(&record.author_display_name)
    .bind(&record.title)
    .bind(&record.publisher)
    .bind(&record.edition)
    .bind(&record.publication_year)
    .bind(&record.publication_place)
    .bind(&record.format)
    .bind(&record.page_count)
    .bind(&record.volume)
    .bind(&record.acquisition_notes)
    .bind(&record.isbn)
    .bind(&record.extra1)
    .bind(&record.extra2)
    .execute(executor)
    .await?;

    Ok(())
}

/// Persist every field of an existing record (the accession number is the
/// key and never changes).
pub async fn save(pool: &SqlitePool, record: &CatalogRecord) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE records SET
            entry_date = ?,
            author = ?,
            author_display_name = ?,
            title = ?,
            publisher = ?,
            edition = ?,
            publication_year = ?,
            publication_place = ?,
            format = ?,
            page_count = ?,
            volume = ?,
            acquisition_notes = ?,
            isbn = ?,
            extra1 = ?,
            extra2 = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE accession_number = ?
        "#,
    )
    .bind(&record.entry_date)
    .bind(&record.author)
    .bind(&record.author_display_name)
    .bind(&record.title)
    .bind(&record.publisher)
    .bind(&record.edition)
    .bind(&record.publication_year)
    .bind(&record.publication_place)
    .bind(&record.format)
    .bind(&record.page_count)
    .bind(&record.volume)
    .bind(&record.acquisition_notes)
    .bind(&record.isbn)
    .bind(&record.extra1)
    .bind(&record.extra2)
    .bind(record.accession_number)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!(
            "Record not found: {}",
            record.accession_number
        )));
    }

    Ok(())
}

/// Delete a record. Returns false when no such accession number exists.
pub async fn delete(pool: &SqlitePool, accession: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM records WHERE accession_number = ?")
        .bind(accession)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Total number of catalog records.
pub async fn count_all(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Highest accession number in the catalog, if any. Manual entry allocates
/// the next number from this.
pub async fn max_accession(pool: &SqlitePool) -> Result<Option<i64>> {
    let max: Option<i64> = sqlx::query_scalar("SELECT MAX(accession_number) FROM records")
        .fetch_one(pool)
        .await?;
    Ok(max)
}

/// Which column a catalog search targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchCategory {
    #[default]
    All,
    Accession,
    EntryDate,
    Title,
    Author,
    Publisher,
    Isbn,
}

/// Browse/search parameters for the paginated catalog listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordQuery {
    pub search: Option<String>,
    #[serde(default)]
    pub category: SearchCategory,
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub page: Option<i64>,
}

/// One page of catalog records plus navigation metadata.
#[derive(Debug, Serialize)]
pub struct RecordPage {
    pub records: Vec<CatalogRecord>,
    pub page: i64,
    pub total_pages: i64,
    pub total_records: i64,
    pub has_previous: bool,
    pub has_next: bool,
}

enum BindValue {
    Int(i64),
    Text(String),
}

fn build_filter(query: &RecordQuery) -> Option<(Vec<String>, Vec<BindValue>)> {
    let mut conditions = Vec::new();
    let mut binds = Vec::new();

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        match query.category {
            SearchCategory::All => {
                // Title or author match; a purely numeric term also matches
                // the accession number exactly.
                if let Ok(n) = search.parse::<i64>() {
                    conditions.push(
                        "(title LIKE '%' || ? || '%' OR author LIKE '%' || ? || '%' \
                         OR accession_number = ?)"
                            .to_string(),
                    );
                    binds.push(BindValue::Text(search.to_string()));
                    binds.push(BindValue::Text(search.to_string()));
                    binds.push(BindValue::Int(n));
                } else {
                    conditions.push(
                        "(title LIKE '%' || ? || '%' OR author LIKE '%' || ? || '%')".to_string(),
                    );
                    binds.push(BindValue::Text(search.to_string()));
                    binds.push(BindValue::Text(search.to_string()));
                }
            }
            SearchCategory::Accession => match search.parse::<i64>() {
                Ok(n) => {
                    conditions.push("accession_number = ?".to_string());
                    binds.push(BindValue::Int(n));
                }
                // Non-numeric input for a number search matches nothing.
                Err(_) => return None,
            },
            SearchCategory::EntryDate => {
                conditions.push("entry_date LIKE '%' || ? || '%'".to_string());
                binds.push(BindValue::Text(search.to_string()));
            }
            SearchCategory::Title => {
                conditions.push("title LIKE '%' || ? || '%'".to_string());
                binds.push(BindValue::Text(search.to_string()));
            }
            SearchCategory::Author => {
                conditions.push("author LIKE '%' || ? || '%'".to_string());
                binds.push(BindValue::Text(search.to_string()));
            }
            SearchCategory::Publisher => {
                conditions.push("publisher LIKE '%' || ? || '%'".to_string());
                binds.push(BindValue::Text(search.to_string()));
            }
            SearchCategory::Isbn => {
                conditions.push("isbn LIKE '%' || ? || '%'".to_string());
                binds.push(BindValue::Text(search.to_string()));
            }
        }
    }

    if let (Some(from), Some(to)) = (query.from, query.to) {
        conditions.push("accession_number >= ? AND accession_number <= ?".to_string());
        binds.push(BindValue::Int(from));
        binds.push(BindValue::Int(to));
    }

    Some((conditions, binds))
}

/// Paginated catalog browse with optional search and range filtering,
/// ordered by accession number.
pub async fn search_page(pool: &SqlitePool, query: &RecordQuery) -> Result<RecordPage> {
    let Some((conditions, binds)) = build_filter(query) else {
        // Unsatisfiable filter (e.g. non-numeric accession search).
        return Ok(RecordPage {
            records: vec![],
            page: 1,
            total_pages: 1,
            total_records: 0,
            has_previous: false,
            has_next: false,
        });
    };

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM records{where_clause}");
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for bind in &binds {
        count_query = match bind {
            BindValue::Int(i) => count_query.bind(*i),
            BindValue::Text(s) => count_query.bind(s.clone()),
        };
    }
    let total_records = count_query.fetch_one(pool).await?;

    let total_pages = ((total_records + PAGE_SIZE - 1) / PAGE_SIZE).max(1);
    let page = query.page.unwrap_or(1).clamp(1, total_pages);
    let offset = (page - 1) * PAGE_SIZE;

    let page_sql = format!(
        "SELECT {RECORD_COLUMNS} FROM records{where_clause} \
         ORDER BY accession_number LIMIT ? OFFSET ?"
    );
    let mut page_query = sqlx::query(&page_sql);
    for bind in &binds {
        page_query = match bind {
            BindValue::Int(i) => page_query.bind(*i),
            BindValue::Text(s) => page_query.bind(s.clone()),
        };
    }
    let rows = page_query
        .bind(PAGE_SIZE)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok(RecordPage {
        records: rows.iter().map(record_from_row).collect(),
        page,
        total_pages,
        total_records,
        has_previous: page > 1,
        has_next: page < total_pages,
    })
}

/// Count of empty placeholder records.
pub async fn count_incomplete(pool: &SqlitePool) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM records WHERE {EMPTY_PREDICATE}"))
            .fetch_one(pool)
            .await?;
    Ok(count)
}

/// Empty placeholder records in accession order, up to `limit`.
pub async fn list_incomplete(pool: &SqlitePool, limit: i64) -> Result<Vec<CatalogRecord>> {
    let rows = sqlx::query(&format!(
        "SELECT {RECORD_COLUMNS} FROM records WHERE {EMPTY_PREDICATE} \
         ORDER BY accession_number LIMIT ?"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(record_from_row).collect())
}

/// Batched slice of an accession range, for range export/printing.
pub async fn list_range(
    pool: &SqlitePool,
    from: i64,
    to: i64,
    offset: i64,
    limit: i64,
) -> Result<Vec<CatalogRecord>> {
    let rows = sqlx::query(&format!(
        "SELECT {RECORD_COLUMNS} FROM records \
         WHERE accession_number >= ? AND accession_number <= ? \
         ORDER BY accession_number LIMIT ? OFFSET ?"
    ))
    .bind(from)
    .bind(to)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(record_from_row).collect())
}

/// Number of records inside an accession range.
pub async fn count_range(pool: &SqlitePool, from: i64, to: i64) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM records WHERE accession_number >= ? AND accession_number <= ?",
    )
    .bind(from)
    .bind(to)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Up to ten distinct titles containing the query term.
pub async fn autocomplete_title(pool: &SqlitePool, term: &str) -> Result<Vec<String>> {
    autocomplete_column(pool, "title", term).await
}

/// Up to ten distinct publishers containing the query term.
pub async fn autocomplete_publisher(pool: &SqlitePool, term: &str) -> Result<Vec<String>> {
    autocomplete_column(pool, "publisher", term).await
}

async fn autocomplete_column(pool: &SqlitePool, column: &str, term: &str) -> Result<Vec<String>> {
    // `column` is always one of the hardcoded names above.
    let rows = sqlx::query(&format!(
        "SELECT DISTINCT {column} AS value FROM records \
         WHERE {column} LIKE '%' || ? || '%' ORDER BY value LIMIT 10"
    ))
    .bind(term)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .filter_map(|r| r.get::<Option<String>, _>("value"))
        .collect())
}
