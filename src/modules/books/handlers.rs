//! One handler per catalog operation. Input is validated before the
//! repository is touched.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use catalog_http::error::AppError;
use catalog_http::extract::{ApiJson, ApiPath, ApiQuery};
use serde::Deserialize;

use super::models::{Book, BookPayload, DeleteResponse};
use super::repository::{BookRepository, ViewLimits};

/// Per-module state handed to every handler.
#[derive(Clone)]
pub struct BooksState {
    pub repository: Arc<dyn BookRepository>,
    pub limits: ViewLimits,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
}

fn validated(payload: &BookPayload) -> Result<(), AppError> {
    payload.validate().map_err(|errors| {
        let details = errors
            .into_iter()
            .map(|e| serde_json::json!({ "field": e.field, "error": e.error }))
            .collect();
        AppError::validation(details, "invalid book payload")
    })
}

/// GET /books
pub async fn list_books(State(state): State<BooksState>) -> Result<Json<Vec<Book>>, AppError> {
    let books = state.repository.list().await?;
    tracing::debug!(count = books.len(), "listed books");
    Ok(Json(books))
}

/// GET /books/{id}
pub async fn get_book(
    State(state): State<BooksState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Book>, AppError> {
    Ok(Json(state.repository.get(id).await?))
}

/// POST /books
pub async fn create_book(
    State(state): State<BooksState>,
    ApiJson(payload): ApiJson<BookPayload>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    validated(&payload)?;
    let book = state.repository.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// PUT /books/{id}
pub async fn update_book(
    State(state): State<BooksState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<BookPayload>,
) -> Result<Json<Book>, AppError> {
    validated(&payload)?;
    Ok(Json(state.repository.update(id, &payload).await?))
}

/// DELETE /books/{id}
pub async fn delete_book(
    State(state): State<BooksState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<DeleteResponse>, AppError> {
    state.repository.delete(id).await?;
    Ok(Json(DeleteResponse {
        message: "book deleted successfully".to_string(),
    }))
}

/// GET /books/search?q=
pub async fn search_books(
    State(state): State<BooksState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<Vec<Book>>, AppError> {
    let keyword = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::bad_request("missing query parameter q"))?;

    let books = state.repository.search(keyword).await?;
    tracing::debug!(keyword, count = books.len(), "searched books");
    Ok(Json(books))
}

/// GET /categories
pub async fn list_categories(
    State(state): State<BooksState>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.repository.categories().await?))
}

/// GET /books/featured
pub async fn featured_books(
    State(state): State<BooksState>,
) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(state.repository.featured(state.limits.featured).await?))
}

/// GET /books/new
pub async fn new_books(State(state): State<BooksState>) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(state.repository.newest(state.limits.newest).await?))
}

/// GET /books/discounted
pub async fn discounted_books(
    State(state): State<BooksState>,
) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(
        state.repository.discounted(state.limits.discounted).await?,
    ))
}
