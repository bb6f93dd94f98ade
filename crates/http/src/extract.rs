//! Request extractors whose rejections use the shelf error envelope

use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use shelf_authz::Identity;
use shelf_db::query::{split_query, Filters, PaginationOptions};

use crate::error::AppError;

/// The authenticated caller, read from the forwarded identity headers
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(Identity::from_headers(&parts.headers)?))
    }
}

/// Pagination options and filters of a list request
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub pagination: PaginationOptions,
    pub filters: Filters,
}

impl<S> FromRequestParts<S> for ListParams
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
        let (pagination, filters) = split_query(pairs);
        Ok(Self {
            pagination,
            filters,
        })
    }
}

/// JSON body whose decoding failures become validation errors
#[derive(Debug, Clone)]
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            AppError::validation(
                vec![json!({ "body": rejection.body_text() })],
                "invalid request body",
            )
        })?;
        Ok(Self(value))
    }
}
