// src/service/error.rs
use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::{db::db::StoreError, error::HttpError, models::usermodel::UserRole};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("You are not allowed to perform this action")]
    Forbidden,

    #[error("Ticket {0} not found")]
    TicketNotFound(Uuid),

    #[error("Role request {0} not found")]
    RequestNotFound(Uuid),

    #[error("No pending role request for this account")]
    PendingRequestNotFound,

    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("Role request {0} has already been reviewed")]
    AlreadyReviewed(Uuid),

    #[error("A pending role request already exists for this account")]
    DuplicatePendingRequest,

    #[error("Account already holds the {} role", .0.to_str())]
    AlreadyHasRole(UserRole),

    #[error("The record was modified concurrently, please retry")]
    Conflict,

    #[error("Storage error: {0}")]
    Storage(StoreError),
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        let message = error.to_string();
        HttpError::new(message, error.status_code())
    }
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) | ServiceError::AlreadyHasRole(_) => {
                StatusCode::BAD_REQUEST
            }

            ServiceError::Forbidden => StatusCode::FORBIDDEN,

            ServiceError::TicketNotFound(_)
            | ServiceError::RequestNotFound(_)
            | ServiceError::PendingRequestNotFound
            | ServiceError::UserNotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::AlreadyReviewed(_)
            | ServiceError::DuplicatePendingRequest
            | ServiceError::Conflict => StatusCode::CONFLICT,

            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
