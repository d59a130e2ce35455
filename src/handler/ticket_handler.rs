// src/handler/ticket_handler.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::{
    dtos::ticketdtos::{
        CreateReplyDto, CreateTicketDto, TicketListItemDto, TicketQueryParams, UpdateTicketDto,
        VoteTicketDto,
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn ticket_handler() -> Router {
    Router::new()
        .route("/", get(list_tickets).post(create_ticket))
        .route("/:ticket_id", get(get_ticket).put(update_ticket))
        .route("/:ticket_id/replies", post(add_reply))
        .route("/:ticket_id/vote", post(vote_ticket))
}

pub async fn create_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateTicketDto>,
) -> Result<impl IntoResponse, HttpError> {
    let ticket = app_state
        .ticket_service
        .create_ticket(&auth.user, body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "data": ticket
        })),
    ))
}

pub async fn list_tickets(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Query(params): Query<TicketQueryParams>,
) -> Result<impl IntoResponse, HttpError> {
    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(20);

    let (tickets, total) = app_state
        .ticket_service
        .list_tickets(&auth.user, params)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "tickets": TicketListItemDto::from_tickets(&tickets),
            "results": total,
            "page": page,
            "limit": limit
        }
    })))
}

pub async fn get_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let ticket = app_state
        .ticket_service
        .get_ticket(&auth.user, ticket_id)
        .await?;

    let score = ticket.score();
    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "ticket": ticket,
            "score": score
        }
    })))
}

pub async fn update_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<Uuid>,
    Json(body): Json<UpdateTicketDto>,
) -> Result<impl IntoResponse, HttpError> {
    let ticket = app_state
        .ticket_service
        .update_ticket(&auth.user, ticket_id, body)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": ticket
    })))
}

pub async fn add_reply(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<Uuid>,
    Json(body): Json<CreateReplyDto>,
) -> Result<impl IntoResponse, HttpError> {
    let entry = app_state
        .ticket_service
        .add_reply(&auth.user, ticket_id, body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "data": entry
        })),
    ))
}

pub async fn vote_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<Uuid>,
    Json(body): Json<VoteTicketDto>,
) -> Result<impl IntoResponse, HttpError> {
    let ticket = app_state
        .ticket_service
        .vote_ticket(&auth.user, ticket_id, body)
        .await?;

    let score = ticket.score();
    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "ticket": ticket,
            "score": score
        }
    })))
}
