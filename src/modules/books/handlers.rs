use axum::extract::{Path, State};
use shelf_http::{ApiResponse, AppError, CurrentUser, ListParams, Payload};

use super::models::{Book, CreateBook};
use super::service::BookService;

pub async fn create_book(
    State(service): State<BookService>,
    CurrentUser(identity): CurrentUser,
    Payload(payload): Payload<CreateBook>,
) -> Result<ApiResponse<Book>, AppError> {
    let book = service.create_book(payload, &identity.user_id).await?;
    Ok(ApiResponse::created("Book added successfully", book))
}

pub async fn list_books(
    State(service): State<BookService>,
    params: ListParams,
) -> Result<ApiResponse<Vec<Book>>, AppError> {
    let page = service
        .list_books(&params.pagination, &params.filters)
        .await?;
    Ok(ApiResponse::paginated("Books retrieved successfully", page))
}

pub async fn get_book(
    State(service): State<BookService>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Book>, AppError> {
    let book = service.get_book(&id).await?;
    Ok(ApiResponse::ok("Book retrieved successfully", book))
}

pub async fn health_check() -> &'static str {
    "books module is healthy"
}
