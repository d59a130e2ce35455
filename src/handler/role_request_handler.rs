// src/handler/role_request_handler.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::{
    dtos::rolerequestdtos::{ReviewRoleRequestDto, RoleRequestQueryParams, SubmitRoleRequestDto},
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn role_request_handler() -> Router {
    Router::new()
        .route("/", get(list_requests).post(submit_request))
        .route("/me", get(get_own_pending_request))
        .route("/:request_id", put(review_request))
}

pub async fn submit_request(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<SubmitRoleRequestDto>,
) -> Result<impl IntoResponse, HttpError> {
    let request = app_state
        .role_request_service
        .submit_request(&auth.user, body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "data": request
        })),
    ))
}

pub async fn list_requests(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Query(params): Query<RoleRequestQueryParams>,
) -> Result<impl IntoResponse, HttpError> {
    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(20);

    let (requests, total) = app_state
        .role_request_service
        .list_requests(&auth.user, params)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "requests": requests,
            "results": total,
            "page": page,
            "limit": limit
        }
    })))
}

pub async fn get_own_pending_request(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let request = app_state
        .role_request_service
        .get_own_pending_request(&auth.user)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": request
    })))
}

pub async fn review_request(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(request_id): Path<Uuid>,
    Json(body): Json<ReviewRoleRequestDto>,
) -> Result<impl IntoResponse, HttpError> {
    let request = app_state
        .role_request_service
        .review_request(&auth.user, request_id, body)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": request
    })))
}
