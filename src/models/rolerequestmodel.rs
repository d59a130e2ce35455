// src/models/rolerequestmodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::usermodel::UserRole;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoleRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RoleRequestStatus {
    pub fn to_str(&self) -> &str {
        match self {
            RoleRequestStatus::Pending => "pending",
            RoleRequestStatus::Approved => "approved",
            RoleRequestStatus::Rejected => "rejected",
        }
    }
}

/// A role-upgrade request. Name, email and current role are copied from the
/// requesting user at submission time so the record stays readable after the
/// account changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub current_role: UserRole,
    pub requested_role: UserRole,
    pub reason: String,
    pub status: RoleRequestStatus,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub admin_comment: Option<String>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}
