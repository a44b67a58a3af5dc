//! Integration tests for the shelfmark-web HTTP API.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;

/// Test helper: create test app with in-memory database
async fn create_test_app() -> (axum::Router, sqlx::SqlitePool) {
    let pool = sqlx::SqlitePool::connect(":memory:")
        .await
        .expect("Failed to create in-memory database");

    shelfmark_web::db::init_tables(&pool)
        .await
        .expect("Failed to initialize database schema");

    let state = shelfmark_web::AppState::new(pool.clone());
    let app = shelfmark_web::build_router(state);

    (app, pool)
}

async fn send_json(app: &axum::Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _pool) = create_test_app().await;

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["total_records"], 0);
}

#[tokio::test]
async fn manual_record_lifecycle() {
    let (app, _pool) = create_test_app().await;

    // Create without an accession number: allocated as max+1 = 1.
    let (status, created) = send_json(
        &app,
        "POST",
        "/records",
        json!({"title": "First book", "author": "Papadopoulos,Maria"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["record"]["accession_number"], 1);
    assert_eq!(created["filled_existing"], false);

    // Next manual entry gets the following number.
    let (_, second) = send_json(&app, "POST", "/records", json!({"title": "Second book"})).await;
    assert_eq!(second["record"]["accession_number"], 2);

    // Edit replaces the stored fields.
    let (status, updated) = send_json(
        &app,
        "PUT",
        "/records/1",
        json!({"title": "First book, 2nd ed.", "publisher": "Athens Press"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "First book, 2nd ed.");
    assert_eq!(updated["author"], Value::Null);

    let (status, fetched) = get(&app, "/records/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["publisher"], "Athens Press");

    // Delete, then the record is gone.
    let (status, _) = send_json(&app, "DELETE", "/records/1", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(&app, "/records/1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn editing_missing_record_is_not_found() {
    let (app, _pool) = create_test_app().await;

    let (status, body) = send_json(&app, "PUT", "/records/999", json!({"title": "x"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn browse_paginates_and_searches() {
    let (app, _pool) = create_test_app().await;

    for i in 1..=3 {
        let title = format!("Book {}", i);
        send_json(
            &app,
            "POST",
            "/records",
            json!({"accession_number": i * 10, "title": title, "author": "Common,Author"}),
        )
        .await;
    }

    let (status, page) = get(&app, "/records").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total_records"], 3);
    assert_eq!(page["records"].as_array().unwrap().len(), 3);
    assert_eq!(page["has_next"], false);

    // Category search on title.
    let (_, page) = get(&app, "/records?search=Book+2&category=title").await;
    assert_eq!(page["total_records"], 1);
    assert_eq!(page["records"][0]["accession_number"], 20);

    // Numeric all-search matches the accession number exactly.
    let (_, page) = get(&app, "/records?search=30").await;
    assert_eq!(page["total_records"], 1);

    // Non-numeric accession search matches nothing.
    let (_, page) = get(&app, "/records?search=abc&category=accession").await;
    assert_eq!(page["total_records"], 0);

    // Range filter.
    let (_, page) = get(&app, "/records?from=10&to=20").await;
    assert_eq!(page["total_records"], 2);
}

#[tokio::test]
async fn autocomplete_returns_distinct_matches() {
    let (app, _pool) = create_test_app().await;

    for (n, title) in [(1, "Greek History"), (2, "Greek History"), (3, "Roman Law")] {
        send_json(
            &app,
            "POST",
            "/records",
            json!({"accession_number": n, "title": title}),
        )
        .await;
    }

    let (status, body) = get(&app, "/autocomplete/title?q=Greek").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], json!(["Greek History"]));
}

#[tokio::test]
async fn incomplete_listing_reports_placeholders() {
    let (app, _pool) = create_test_app().await;

    send_json(&app, "POST", "/records", json!({"accession_number": 1})).await;
    send_json(
        &app,
        "POST",
        "/records",
        json!({"accession_number": 2, "title": "Filled"}),
    )
    .await;

    let (status, body) = get(&app, "/records/incomplete").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["total_records"], 2);
    assert_eq!(body["first"]["accession_number"], 1);
}

#[tokio::test]
async fn import_cycle_over_http() {
    let (app, _pool) = create_test_app().await;

    // Existing catalog: one placeholder, one populated record.
    send_json(&app, "POST", "/records", json!({"accession_number": 200})).await;
    send_json(
        &app,
        "POST",
        "/records",
        json!({"accession_number": 300, "title": "Older edition"}),
    )
    .await;

    let (status, outcome) = send_json(
        &app,
        "POST",
        "/import",
        json!({
            "user": "maria",
            "filename": "accessions.xlsx",
            "rows": [
                {"accession_number": 100, "title": "Brand new", "publication_year": 2012.0},
                {"accession_number": 200, "title": "Fills the slot"},
                {"accession_number": 300, "title": "Replacement"},
                {"accession_number": "not-a-number", "title": "Rejected"}
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["inserted"], 1);
    assert_eq!(outcome["fills"], 1);
    assert_eq!(outcome["conflicts"], 1);
    assert_eq!(outcome["rejected"], 1);
    assert_eq!(outcome["needs_review"], true);

    // Float artifact year was normalized on the inserted record.
    let (_, inserted) = get(&app, "/records/100").await;
    assert_eq!(inserted["publication_year"], "2012");

    let (status, pending) = get(&app, "/import/pending/maria").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending["conflicts"].as_array().unwrap().len(), 1);
    assert_eq!(pending["fills"].as_array().unwrap().len(), 1);

    let (status, summary) = send_json(
        &app,
        "POST",
        "/import/resolve",
        json!({"user": "maria", "conflicts": ["300"], "fills": ["200"]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["rows_added"], 1);
    assert_eq!(summary["rows_updated"], 2);

    // The batch is gone once resolved.
    let (status, _) = get(&app, "/import/pending/maria").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, log) = get(&app, "/import/log").await;
    assert_eq!(log["uploads"][0]["rows_added"], 1);
    assert_eq!(log["uploads"][0]["rows_updated"], 2);

    let (_, replaced) = get(&app, "/records/300").await;
    assert_eq!(replaced["title"], "Replacement");
}

#[tokio::test]
async fn skip_over_http_leaves_catalog_unchanged() {
    let (app, _pool) = create_test_app().await;

    send_json(
        &app,
        "POST",
        "/records",
        json!({"accession_number": 1, "title": "Original"}),
    )
    .await;

    send_json(
        &app,
        "POST",
        "/import",
        json!({
            "user": "maria",
            "filename": "batch.xlsx",
            "rows": [{"accession_number": 1, "title": "Incoming"}]
        }),
    )
    .await;

    let (status, summary) = send_json(&app, "POST", "/import/skip", json!({"user": "maria"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["rows_updated"], 0);

    let (_, record) = get(&app, "/records/1").await;
    assert_eq!(record["title"], "Original");
}

#[tokio::test]
async fn import_requires_user() {
    let (app, _pool) = create_test_app().await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/import",
        json!({"user": "  ", "filename": "x.xlsx", "rows": []}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}
