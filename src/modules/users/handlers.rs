use axum::extract::{Path, State};
use shelf_http::{ApiResponse, AppError, CurrentUser, ListParams, Payload};

use super::models::{
    CreateUser, PublicUser, ReadlistPayload, UpdateUser, UserProfile, WishlistPayload,
};
use super::service::UserService;

pub async fn create_user(
    State(service): State<UserService>,
    Payload(payload): Payload<CreateUser>,
) -> Result<ApiResponse<PublicUser>, AppError> {
    let user = service.create_user(payload).await?;
    Ok(ApiResponse::created("User registered successfully", user))
}

pub async fn list_users(
    State(service): State<UserService>,
    CurrentUser(identity): CurrentUser,
    params: ListParams,
) -> Result<ApiResponse<Vec<PublicUser>>, AppError> {
    identity.require_admin()?;
    let page = service
        .list_users(&params.pagination, &params.filters)
        .await?;
    Ok(ApiResponse::paginated("Users retrieved successfully", page))
}

pub async fn get_profile(
    State(service): State<UserService>,
    CurrentUser(identity): CurrentUser,
) -> Result<ApiResponse<UserProfile>, AppError> {
    let profile = service.get_user_profile(&identity.user_id).await?;
    Ok(ApiResponse::ok("Profile retrieved successfully", profile))
}

pub async fn add_to_wishlist(
    State(service): State<UserService>,
    CurrentUser(identity): CurrentUser,
    Payload(payload): Payload<WishlistPayload>,
) -> Result<ApiResponse<UserProfile>, AppError> {
    let profile = service
        .add_to_wishlist(&identity.user_id, &payload.book_id)
        .await?;
    Ok(ApiResponse::ok("Book added to wishlist", profile))
}

pub async fn remove_from_wishlist(
    State(service): State<UserService>,
    CurrentUser(identity): CurrentUser,
    Path(book_id): Path<String>,
) -> Result<ApiResponse<UserProfile>, AppError> {
    let profile = service
        .remove_from_wishlist(&identity.user_id, &book_id)
        .await?;
    Ok(ApiResponse::ok("Book removed from wishlist", profile))
}

pub async fn add_to_readlist(
    State(service): State<UserService>,
    CurrentUser(identity): CurrentUser,
    Payload(payload): Payload<ReadlistPayload>,
) -> Result<ApiResponse<UserProfile>, AppError> {
    let profile = service
        .add_to_readlist(&identity.user_id, payload)
        .await?;
    Ok(ApiResponse::ok("Book added to readlist", profile))
}

pub async fn mark_finished(
    State(service): State<UserService>,
    CurrentUser(identity): CurrentUser,
    Payload(payload): Payload<ReadlistPayload>,
) -> Result<ApiResponse<UserProfile>, AppError> {
    let profile = service.mark_finished(&identity.user_id, payload).await?;
    Ok(ApiResponse::ok("Book marked as finished", profile))
}

pub async fn get_user(
    State(service): State<UserService>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<PublicUser>, AppError> {
    identity.require_self_or_admin(&id)?;
    let user = service.get_user(&id).await?;
    Ok(ApiResponse::ok("User retrieved successfully", user))
}

pub async fn update_user(
    State(service): State<UserService>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
    Payload(payload): Payload<UpdateUser>,
) -> Result<ApiResponse<PublicUser>, AppError> {
    identity.require_self_or_admin(&id)?;
    let user = service.update_user(&id, payload).await?;
    Ok(ApiResponse::ok("User updated successfully", user))
}

pub async fn delete_user(
    State(service): State<UserService>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<PublicUser>, AppError> {
    identity.require_self_or_admin(&id)?;
    let user = service.delete_user(&id).await?;
    Ok(ApiResponse::ok("User deleted successfully", user))
}

pub async fn health_check() -> &'static str {
    "users module is healthy"
}
