//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::auth::{self, AuthResponse, LoginRequest, SignupRequest};
use crate::web::state::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use catalog_core::card::{format_card, CatalogCard};
use catalog_core::catalog::{
    self, FilterItem, FilterOperator, ListQuery, Page, SortDirection, SortItem, DEFAULT_PAGE_SIZE,
};
use catalog_core::dashboard::{self, DashboardStats};
use catalog_core::domain::{BookRecord, CardType};
use catalog_core::import::{self, ImportReport};
use catalog_core::ports::PortError;
use catalog_core::schema::{FieldSpec, BOOK_FIELDS};
use catalog_core::validation::{describe_violations, RecordValidator, Violation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        schema_handler,
        list_books_handler,
        search_books_handler,
        create_book_handler,
        get_book_handler,
        update_book_handler,
        delete_book_handler,
        card_handler,
        import_handler,
        dashboard_handler,
    ),
    components(
        schemas(HealthResponse, SignupRequest, LoginRequest, AuthResponse)
    ),
    tags(
        (name = "Library Catalog API", description = "Cataloging, bulk import and card printing for a school library.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

type ApiResult<T> = Result<T, (StatusCode, String)>;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
}

/// Query string for `GET /books`: one optional filter and one optional sort key.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BooksParams {
    /// Zero-based page index.
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub filter_field: Option<String>,
    /// One of `contains`, `equals`, `startsWith`, `endsWith`, `>`, `<`.
    pub filter_op: Option<String>,
    pub filter_value: Option<String>,
    pub sort_field: Option<String>,
    /// `asc` or `desc`.
    pub sort_dir: Option<String>,
}

impl BooksParams {
    fn into_query(self) -> ApiResult<ListQuery> {
        let mut query = ListQuery {
            page: self.page.unwrap_or(0),
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            ..ListQuery::default()
        };
        if let (Some(field), Some(value)) = (self.filter_field, self.filter_value) {
            let operator = match self.filter_op.as_deref() {
                None => FilterOperator::Contains,
                Some(op) => op.parse().map_err(bad_request)?,
            };
            query.filters.push(FilterItem {
                field,
                operator,
                value: Value::String(value),
            });
        }
        if let Some(field) = self.sort_field {
            let direction = match self.sort_dir.as_deref() {
                None => SortDirection::Asc,
                Some(dir) => dir.parse().map_err(bad_request)?,
            };
            query.sort.push(SortItem { field, direction });
        }
        Ok(query)
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CardParams {
    /// `author`, `title` or `subject`; defaults to `author`.
    #[serde(rename = "type")]
    pub card_type: Option<String>,
}

/// A card as layout regions plus its fixed-grid text rendering.
#[derive(Serialize)]
pub struct CardResponse {
    #[serde(flatten)]
    card: CatalogCard,
    text: String,
}

//=========================================================================================
// Error Mapping
//=========================================================================================

fn bad_request(message: String) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, message)
}

fn port_failure(e: PortError) -> (StatusCode, String) {
    match e {
        PortError::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
        PortError::Duplicate(_) => (StatusCode::CONFLICT, e.to_string()),
        PortError::Parse(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, e.to_string()),
        PortError::Unexpected(_) => {
            error!("Store operation failed: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred".to_string(),
            )
        }
    }
}

fn invalid_record(violations: Vec<Violation>) -> (StatusCode, String) {
    (StatusCode::UNPROCESSABLE_ENTITY, describe_violations(&violations))
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// The ordered field schema shared by the grid, the import template and the card.
#[utoipa::path(
    get,
    path = "/schema",
    responses((status = 200, description = "Field name, label, kind and column width, in display order"))
)]
pub async fn schema_handler() -> Json<&'static [FieldSpec]> {
    Json(BOOK_FIELDS)
}

/// One page of the inventory.
#[utoipa::path(
    get,
    path = "/books",
    params(BooksParams),
    responses(
        (status = 200, description = "Matching books and the total match count"),
        (status = 400, description = "Unknown filter operator or sort direction")
    )
)]
pub async fn list_books_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BooksParams>,
) -> ApiResult<Json<Page<BookRecord>>> {
    let query = params.into_query()?;
    let page = catalog::get_many(state.books.as_ref(), &query)
        .await
        .map_err(port_failure)?;
    Ok(Json(page))
}

/// Inventory query with any number of filters and sort keys.
#[utoipa::path(
    post,
    path = "/books/search",
    request_body(content_type = "application/json", description = "Page, page size, filters and sort keys."),
    responses((status = 200, description = "Matching books and the total match count"))
)]
pub async fn search_books_handler(
    State(state): State<Arc<AppState>>,
    Json(query): Json<ListQuery>,
) -> ApiResult<Json<Page<BookRecord>>> {
    let page = catalog::get_many(state.books.as_ref(), &query)
        .await
        .map_err(port_failure)?;
    Ok(Json(page))
}

/// Catalog a single book.
///
/// Keys may be field names or column labels; values are coerced and validated
/// exactly like a spreadsheet row.
#[utoipa::path(
    post,
    path = "/books",
    request_body(content_type = "application/json", description = "The book's fields."),
    responses(
        (status = 201, description = "Book created"),
        (status = 409, description = "Accession number already in use"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn create_book_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult<impl IntoResponse> {
    let data = catalog::record_from_json(&body, &RecordValidator::default()).map_err(invalid_record)?;
    let record = catalog::create_checked(state.books.as_ref(), data)
        .await
        .map_err(port_failure)?;
    info!(id = %record.id, accession = %record.data.accession_number, "Book created");
    Ok((StatusCode::CREATED, Json(record)))
}

#[utoipa::path(
    get,
    path = "/books/{id}",
    params(("id" = Uuid, Path, description = "Book identifier")),
    responses(
        (status = 200, description = "The book"),
        (status = 404, description = "No such book")
    )
)]
pub async fn get_book_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<BookRecord>> {
    let record = state.books.get_one(id).await.map_err(port_failure)?;
    Ok(Json(record))
}

/// Partial update. The patch is merged over the stored record and the result is
/// validated as a whole; `null` clears a field.
#[utoipa::path(
    patch,
    path = "/books/{id}",
    params(("id" = Uuid, Path, description = "Book identifier")),
    request_body(content_type = "application/json", description = "Fields to change, keyed by field name."),
    responses(
        (status = 200, description = "The updated book"),
        (status = 404, description = "No such book"),
        (status = 409, description = "Accession number held by another book"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn update_book_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(patch): Json<Map<String, Value>>,
) -> ApiResult<Json<BookRecord>> {
    let existing = state.books.get_one(id).await.map_err(port_failure)?;
    let merged = catalog::merge_patch(&existing, &patch);
    let data = catalog::record_from_json(&merged, &RecordValidator::default()).map_err(invalid_record)?;
    let record = catalog::update_checked(state.books.as_ref(), id, data)
        .await
        .map_err(port_failure)?;
    Ok(Json(record))
}

#[utoipa::path(
    delete,
    path = "/books/{id}",
    params(("id" = Uuid, Path, description = "Book identifier")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "No such book")
    )
)]
pub async fn delete_book_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.books.delete_one(id).await.map_err(port_failure)?;
    info!(id = %id, "Book deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Formats a book as a printable catalog card.
#[utoipa::path(
    get,
    path = "/books/{id}/card",
    params(("id" = Uuid, Path, description = "Book identifier"), CardParams),
    responses(
        (status = 200, description = "Card regions and the card as monospace text"),
        (status = 400, description = "Unknown card type"),
        (status = 404, description = "No such book")
    )
)]
pub async fn card_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<CardParams>,
) -> ApiResult<Json<CardResponse>> {
    let card_type = match params.card_type.as_deref() {
        None => CardType::Author,
        Some(raw) => raw.parse::<CardType>().map_err(bad_request)?,
    };
    let record = state.books.get_one(id).await.map_err(port_failure)?;
    let card = format_card(&record.data, card_type);
    let text = card.render_text();
    Ok(Json(CardResponse { card, text }))
}

/// Bulk import from an uploaded spreadsheet.
///
/// Accepts a multipart/form-data request; the part named `file` (or the first
/// part carrying a file name) is imported. Row failures are reported in the
/// summary; only an unreadable file fails the request.
#[utoipa::path(
    post,
    path = "/books/import",
    request_body(content_type = "multipart/form-data", description = "A .xlsx, .xls, .ods or .csv file."),
    responses(
        (status = 200, description = "Import summary with per-row failures"),
        (status = 400, description = "Missing or unreadable file")
    )
)]
pub async fn import_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<ImportReport>> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Failed to read multipart data: {}", e)))?
    {
        if field.name() != Some("file") && field.file_name().is_none() {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload.xlsx").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| bad_request(format!("Failed to read file bytes: {}", e)))?;
        upload = Some((file_name, data));
        break;
    }
    let (file_name, data) =
        upload.ok_or_else(|| bad_request("Multipart form must include a file".to_string()))?;

    let summary = import::import_spreadsheet(
        state.spreadsheet.as_ref(),
        state.books.as_ref(),
        &RecordValidator::default(),
        &file_name,
        &data,
    )
    .await
    .map_err(|e| {
        warn!(file = %file_name, "Import aborted: {}", e);
        bad_request(e.to_string())
    })?;

    Ok(Json(summary.report()))
}

/// Collection statistics for the dashboard charts.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses((status = 200, description = "Total books and counts by copyright year and DDC"))
)]
pub async fn dashboard_handler(State(state): State<Arc<AppState>>) -> ApiResult<Json<DashboardStats>> {
    let books = state.books.list_all().await.map_err(port_failure)?;
    Ok(Json(dashboard::summarize(&books)))
}
