//! Catalog CRUD, browse/search, autocomplete and range export handlers.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use shelfmark_common::CatalogRecord;

use crate::db::records;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Editable record fields, as posted by the manual entry/edit forms.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecordForm {
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

impl RecordForm {
    fn into_record(self, accession_number: i64) -> CatalogRecord {
        fn clean(v: Option<String>) -> Option<String> {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        }

        CatalogRecord {
            accession_number,
            entry_date: clean(self.entry_date),
            author: clean(self.author),
            author_display_name: clean(self.author_display_name),
            title: clean(self.title),
            publisher: clean(self.publisher),
            edition: clean(self.edition),
            publication_year: clean(self.publication_year),
            publication_place: clean(self.publication_place),
            format: clean(self.format),
            page_count: clean(self.page_count),
            volume: clean(self.volume),
            acquisition_notes: clean(self.acquisition_notes),
            isbn: clean(self.isbn),
            extra1: clean(self.extra1),
            extra2: clean(self.extra2),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateRecordRequest {
    /// Target accession number. Omitted for manual entry (the next free
    /// number is allocated); supplied to fill an existing placeholder.
    pub accession_number: Option<i64>,
    #[serde(flatten)]
    pub form: RecordForm,
}

#[derive(Debug, Serialize)]
pub struct CreateRecordResponse {
    pub record: CatalogRecord,
    /// True when an existing record was filled rather than a new one created.
    pub filled_existing: bool,
}

/// GET /records - paginated browse with search and range filtering.
pub async fn list_records(
    State(state): State<AppState>,
    Query(query): Query<records::RecordQuery>,
) -> ApiResult<Json<records::RecordPage>> {
    Ok(Json(records::search_page(&state.db, &query).await?))
}

/// GET /records/:accession
pub async fn get_record(
    State(state): State<AppState>,
    Path(accession): Path<i64>,
) -> ApiResult<Json<CatalogRecord>> {
    records::find_by_accession(&state.db, accession)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Record not found: {}", accession)))
}

/// POST /records - manual entry.
///
/// Without an accession number the record gets max(existing)+1. With one, an
/// existing record is overwritten (the fill-the-placeholder workflow) and a
/// missing one is created under exactly that number.
pub async fn create_record(
    State(state): State<AppState>,
    Json(request): Json<CreateRecordRequest>,
) -> ApiResult<Json<CreateRecordResponse>> {
    if let Some(n) = request.accession_number {
        if n <= 0 {
            return Err(ApiError::BadRequest(format!(
                "Accession number must be positive: {}",
                n
            )));
        }
    }

    match request.accession_number {
        Some(accession) => {
            let record = request.form.into_record(accession);
            if records::find_by_accession(&state.db, accession).await?.is_some() {
                records::save(&state.db, &record).await?;
                tracing::info!(accession, "Filled existing record via manual entry");
                Ok(Json(CreateRecordResponse {
                    record,
                    filled_existing: true,
                }))
            } else {
                records::insert(&state.db, &record).await?;
                tracing::info!(accession, "Created record with explicit accession number");
                Ok(Json(CreateRecordResponse {
                    record,
                    filled_existing: false,
                }))
            }
        }
        None => {
            let accession = records::max_accession(&state.db).await?.unwrap_or(0) + 1;
            let record = request.form.into_record(accession);
            records::insert(&state.db, &record).await?;
            tracing::info!(accession, "Created record with allocated accession number");
            Ok(Json(CreateRecordResponse {
                record,
                filled_existing: false,
            }))
        }
    }
}

/// PUT /records/:accession - full-field edit of an existing record.
pub async fn update_record(
    State(state): State<AppState>,
    Path(accession): Path<i64>,
    Json(form): Json<RecordForm>,
) -> ApiResult<Json<CatalogRecord>> {
    let record = form.into_record(accession);
    records::save(&state.db, &record).await?;
    Ok(Json(record))
}

/// DELETE /records/:accession
pub async fn delete_record(
    State(state): State<AppState>,
    Path(accession): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    if !records::delete(&state.db, accession).await? {
        return Err(ApiError::NotFound(format!("Record not found: {}", accession)));
    }
    tracing::info!(accession, "Record deleted");
    Ok(Json(serde_json::json!({ "deleted": accession })))
}

#[derive(Debug, Serialize)]
pub struct IncompleteResponse {
    pub count: i64,
    pub total_records: i64,
    /// First empty record, the next target of the fill workflow.
    pub first: Option<CatalogRecord>,
    /// Up to the first 100 empty records.
    pub records: Vec<CatalogRecord>,
}

/// GET /records/incomplete - empty placeholder records awaiting data.
pub async fn incomplete_records(
    State(state): State<AppState>,
) -> ApiResult<Json<IncompleteResponse>> {
    let count = records::count_incomplete(&state.db).await?;
    let listed = records::list_incomplete(&state.db, 100).await?;

    Ok(Json(IncompleteResponse {
        count,
        total_records: records::count_all(&state.db).await?,
        first: listed.first().cloned(),
        records: listed,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: i64,
    pub to: i64,
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "default_range_limit")]
    pub limit: i64,
}

fn default_range_limit() -> i64 {
    100
}

#[derive(Debug, Serialize)]
pub struct RangeResponse {
    pub records: Vec<CatalogRecord>,
    pub total_count: i64,
    pub has_more: bool,
}

/// GET /records/range - batched slice of an accession range for printing.
pub async fn record_range(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Json<RangeResponse>> {
    if query.from > query.to {
        return Err(ApiError::BadRequest(format!(
            "Invalid range: {} > {}",
            query.from, query.to
        )));
    }
    let limit = query.limit.clamp(1, 1000);

    let listed = records::list_range(&state.db, query.from, query.to, query.offset, limit).await?;
    let has_more = listed.len() as i64 == limit;

    Ok(Json(RangeResponse {
        total_count: records::count_range(&state.db, query.from, query.to).await?,
        records: listed,
        has_more,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AutocompleteQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct AutocompleteResponse {
    pub results: Vec<String>,
}

/// GET /autocomplete/title
pub async fn autocomplete_title(
    State(state): State<AppState>,
    Query(query): Query<AutocompleteQuery>,
) -> ApiResult<Json<AutocompleteResponse>> {
    Ok(Json(AutocompleteResponse {
        results: records::autocomplete_title(&state.db, &query.q).await?,
    }))
}

/// GET /autocomplete/publisher
pub async fn autocomplete_publisher(
    State(state): State<AppState>,
    Query(query): Query<AutocompleteQuery>,
) -> ApiResult<Json<AutocompleteResponse>> {
    Ok(Json(AutocompleteResponse {
        results: records::autocomplete_publisher(&state.db, &query.q).await?,
    }))
}

pub fn record_routes() -> Router<AppState> {
    Router::new()
        .route("/records", get(list_records).post(create_record))
        .route("/records/incomplete", get(incomplete_records))
        .route("/records/range", get(record_range))
        .route(
            "/records/:accession",
            get(get_record).put(update_record).delete(delete_record),
        )
        .route("/autocomplete/title", get(autocomplete_title))
        .route("/autocomplete/publisher", get(autocomplete_publisher))
}
