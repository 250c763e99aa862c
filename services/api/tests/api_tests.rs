//! Integration tests for the catalog HTTP API, driven through the full router
//! against the in-process store.

use api_lib::{
    adapters::{MemoryStore, WorkbookReader},
    config::Config,
    web::{build_router, AppState},
};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use catalog_core::access::AllowListPolicy;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot` method

const CLERK: &str = "clerk@school.edu";
const BOUNDARY: &str = "catalog-test-boundary";

/// Test helper: router backed by a fresh in-process store.
fn setup_app() -> Router {
    let config = Config::from_lookup(|name: &str| match name {
        "DATABASE_URL" => Some("memory://".to_string()),
        "AUTHORIZED_EMAILS" => Some(format!("{}, librarian@school.edu", CLERK)),
        _ => None,
    })
    .unwrap();
    let store = Arc::new(MemoryStore::new());
    let state = Arc::new(AppState {
        books: store.clone(),
        accounts: store,
        policy: Arc::new(AllowListPolicy::new(config.authorized_emails.iter())),
        spreadsheet: Arc::new(WorkbookReader::new()),
        config: Arc::new(config),
    });
    build_router(state).unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn extract_text(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    String::from_utf8(bytes.to_vec()).expect("Should be UTF-8")
}

fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: signs up `email` and returns the `session=...` cookie pair.
async fn sign_up(app: &Router, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/signup",
            None,
            json!({ "email": email, "password": "correct horse" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("Should set a session cookie");
    set_cookie.split(';').next().unwrap().to_string()
}

fn book(accession: &str, title: &str, year: i32) -> Value {
    json!({
        "accession_number": accession,
        "title": title,
        "author": "Thoreau, Henry David",
        "publisher": "Ticknor and Fields",
        "ddc": "818",
        "class_number": "3",
        "author_notation": "T39",
        "copyright_year": year,
        "copy": 1,
        "ris_number": 204,
        "date_added": "2024-05-01",
        "general_subject": "Solitude",
    })
}

async fn create_book(app: &Router, cookie: &str, body: Value) -> Value {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/books", Some(cookie), body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    extract_json(response.into_body()).await
}

fn multipart_upload(cookie: &str, file_name: &str, contents: &str) -> Request<Body> {
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: text/csv\r\n\r\n{c}\r\n--{b}--\r\n",
        b = BOUNDARY,
        f = file_name,
        c = contents
    );
    Request::builder()
        .method("POST")
        .uri("/books/import")
        .header(header::COOKIE, cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

// =============================================================================
// Health & Access Control
// =============================================================================

#[tokio::test]
async fn health_needs_no_session() {
    let app = setup_app();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response.into_body()).await["status"], "ok");
}

#[tokio::test]
async fn catalog_routes_require_a_session() {
    let app = setup_app();
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/books").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(get_request("/books", "session=forged"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn addresses_outside_the_allow_list_are_denied() {
    let app = setup_app();
    for path in ["/auth/signup", "/auth/login"] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                path,
                None,
                json!({ "email": "stranger@elsewhere.com", "password": "pw" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            extract_text(response.into_body()).await,
            "Access denied. Your email is not authorized to use this application."
        );
    }
}

#[tokio::test]
async fn login_and_logout_manage_the_session() {
    let app = setup_app();
    sign_up(&app, "Librarian@School.edu").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "email": "librarian@school.edu", "password": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "email": "librarian@school.edu", "password": "correct horse" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let response = app.clone().oneshot(get_request("/dashboard", &cookie)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/auth/logout", Some(&cookie), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get_request("/dashboard", &cookie)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn second_signup_for_an_address_conflicts() {
    let app = setup_app();
    sign_up(&app, CLERK).await;
    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/signup",
            None,
            json!({ "email": CLERK, "password": "another" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// =============================================================================
// Records
// =============================================================================

#[tokio::test]
async fn book_lifecycle() {
    let app = setup_app();
    let cookie = sign_up(&app, CLERK).await;

    let created = create_book(&app, &cookie, book("A100", "Walden", 1854)).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["copyright_year"], 1854);
    assert_eq!(created["date_added"], "2024-05-01T00:00:00.000Z");

    let response = app
        .clone()
        .oneshot(get_request(&format!("/books/{}", id), &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response.into_body()).await["title"], "Walden");

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/books/{}", id),
            Some(&cookie),
            json!({ "title": "Walden; or, Life in the Woods", "publisher": null }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = extract_json(response.into_body()).await;
    assert_eq!(updated["title"], "Walden; or, Life in the Woods");
    assert_eq!(updated["accession_number"], "A100");
    assert!(updated.get("publisher").is_none());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/books/{}", id))
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(get_request(&format!("/books/{}", id), &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_accession_numbers_conflict() {
    let app = setup_app();
    let cookie = sign_up(&app, CLERK).await;
    create_book(&app, &cookie, book("A100", "Walden", 1854)).await;
    let second = create_book(&app, &cookie, book("A101", "Civil Disobedience", 1849)).await;

    let response = app
        .clone()
        .oneshot(json_request("POST", "/books", Some(&cookie), book("A100", "Copy", 1900)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        extract_text(response.into_body()).await,
        "Accession number A100 already exists"
    );

    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/books/{}", second["id"].as_str().unwrap()),
            Some(&cookie),
            json!({ "accession_number": "A100" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn invalid_records_are_unprocessable() {
    let app = setup_app();
    let cookie = sign_up(&app, CLERK).await;
    let mut body = book("A100", "Walden", 1854);
    body["copyright_year"] = json!(999);
    body["isbn"] = json!("978-0-14");

    let response = app
        .oneshot(json_request("POST", "/books", Some(&cookie), body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let message = extract_text(response.into_body()).await;
    assert!(message.contains("copyright_year: Copyright Year must be between 1000 and"));
    assert!(message.contains("isbn: ISBN must have exactly 13 digits"));
}

#[tokio::test]
async fn listing_filters_sorts_and_pages() {
    let app = setup_app();
    let cookie = sign_up(&app, CLERK).await;
    create_book(&app, &cookie, book("A1", "Walden", 1854)).await;
    create_book(&app, &cookie, book("A2", "Civil Disobedience", 1849)).await;
    create_book(&app, &cookie, book("A3", "Cape Cod", 1865)).await;

    let response = app
        .clone()
        .oneshot(get_request(
            "/books?filter_field=copyright_year&filter_op=%3E&filter_value=1850&sort_field=copyright_year&sort_dir=desc",
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = extract_json(response.into_body()).await;
    assert_eq!(page["total_count"], 2);
    assert_eq!(page["items"][0]["title"], "Cape Cod");
    assert_eq!(page["items"][1]["title"], "Walden");

    let response = app
        .oneshot(json_request(
            "POST",
            "/books/search",
            Some(&cookie),
            json!({
                "page": 1,
                "page_size": 2,
                "sort": [{ "field": "title", "direction": "asc" }]
            }),
        ))
        .await
        .unwrap();
    let page = extract_json(response.into_body()).await;
    assert_eq!(page["total_count"], 3);
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
    assert_eq!(page["items"][0]["title"], "Walden");
}

// =============================================================================
// Import, Card, Dashboard, Schema
// =============================================================================

#[tokio::test]
async fn csv_import_reports_every_row() {
    let app = setup_app();
    let cookie = sign_up(&app, CLERK).await;
    create_book(&app, &cookie, book("A1", "Walden", 1854)).await;

    let csv = "Accession Number,Title,DDC,Class Number,Author Notation,Copyright Year,Copy,RIS Number,Date Added\r\n\
               A2,Cape Cod,818,3,T39,1865,1,205,2024-05-02\r\n\
               ,,,,,,,,\r\n\
               A3,The Maine Woods,818,3,T39,1864,one,206,2024-05-02\r\n\
               A1,Walden Again,818,3,T39,1854,2,207,2024-05-02";
    let response = app
        .clone()
        .oneshot(multipart_upload(&cookie, "books.csv", csv))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report = extract_json(response.into_body()).await;
    assert_eq!(report["severity"], "error");
    assert_eq!(report["total_rows"], 4);
    assert_eq!(report["created"], 1);
    assert_eq!(report["skipped"], 1);
    assert_eq!(report["validation_failures"], 1);
    assert_eq!(report["creation_failures"], 1);

    let failures: Vec<&str> = report["failures"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f.as_str().unwrap())
        .collect();
    assert_eq!(failures[0], "Row 3: skipped (empty row)");
    assert!(failures[1].starts_with("Row 4 (Title: The Maine Woods): Validation failed"));
    assert_eq!(
        failures[2],
        "Row 5 (Title: Walden Again): Creation failed — Accession number A1 already exists"
    );

    let response = app.oneshot(get_request("/dashboard", &cookie)).await.unwrap();
    assert_eq!(extract_json(response.into_body()).await["total_books"], 2);
}

#[tokio::test]
async fn header_only_upload_is_informational() {
    let app = setup_app();
    let cookie = sign_up(&app, CLERK).await;
    let response = app
        .oneshot(multipart_upload(&cookie, "books.csv", "Accession Number,Title"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report = extract_json(response.into_body()).await;
    assert_eq!(report["severity"], "info");
    assert_eq!(
        report["message"],
        "The spreadsheet is empty or has no data rows after the header."
    );
}

#[tokio::test]
async fn unreadable_workbook_is_rejected() {
    let app = setup_app();
    let cookie = sign_up(&app, CLERK).await;
    let response = app
        .oneshot(multipart_upload(&cookie, "books.xlsx", "not a workbook"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(extract_text(response.into_body())
        .await
        .starts_with("Error processing spreadsheet:"));
}

#[tokio::test]
async fn card_is_rendered_for_each_type() {
    let app = setup_app();
    let cookie = sign_up(&app, CLERK).await;
    let created = create_book(&app, &cookie, book("A100", "Walden", 1854)).await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(get_request(&format!("/books/{}/card?type=subject", id), &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let card = extract_json(response.into_body()).await;
    assert_eq!(card["card_type"], "subject");
    assert_eq!(card["call_number"][0], "CY");
    assert!(card["text"].as_str().unwrap().contains("Walden"));

    let response = app
        .oneshot(get_request(&format!("/books/{}/card?type=spine", id), &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn dashboard_and_schema() {
    let app = setup_app();
    let cookie = sign_up(&app, CLERK).await;
    create_book(&app, &cookie, book("A1", "Walden", 1854)).await;
    create_book(&app, &cookie, book("A2", "Cape Cod", 1865)).await;

    let response = app.clone().oneshot(get_request("/dashboard", &cookie)).await.unwrap();
    let stats = extract_json(response.into_body()).await;
    assert_eq!(stats["total_books"], 2);
    assert_eq!(stats["books_by_year"][0], json!({ "year": 1854, "count": 1 }));
    assert_eq!(stats["books_by_ddc"][0], json!({ "ddc": "818", "count": 2 }));

    let response = app.oneshot(get_request("/schema", &cookie)).await.unwrap();
    let schema = extract_json(response.into_body()).await;
    assert_eq!(schema[0]["name"], "id");
    assert_eq!(schema[1]["label"], "Accession Number");
}
