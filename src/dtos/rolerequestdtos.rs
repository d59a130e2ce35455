// src/dtos/rolerequestdtos.rs
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::{rolerequestmodel::RoleRequestStatus, usermodel::UserRole};
use std::borrow::Cow;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitRoleRequestDto {
    #[validate(custom = "validate_requested_role")]
    pub requested_role: UserRole,

    #[validate(length(
        min = 10,
        max = 1000,
        message = "Reason must be between 10 and 1000 characters"
    ))]
    pub reason: String,
}

// Only agent and admin can be requested; nobody requests the base role.
fn validate_requested_role(role: &UserRole) -> Result<(), ValidationError> {
    match role {
        UserRole::Agent | UserRole::Admin => Ok(()),
        UserRole::User => {
            let mut err = ValidationError::new("invalid_requested_role");
            err.add_param(Cow::from("expected"), &"agent or admin");
            Err(err)
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReviewRoleRequestDto {
    pub decision: ReviewDecision,

    #[validate(length(max = 500, message = "Admin comment must be at most 500 characters"))]
    pub admin_comment: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RoleRequestQueryParams {
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<usize>,
    pub status: Option<RoleRequestStatus>,
}
