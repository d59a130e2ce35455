// src/service/role_request_service.rs
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{
        db::{DBClient, StoreError},
        rolerequestdb::RoleRequestExt,
        userdb::UserExt,
    },
    dtos::rolerequestdtos::{
        ReviewDecision, ReviewRoleRequestDto, RoleRequestQueryParams, SubmitRoleRequestDto,
    },
    models::{
        rolerequestmodel::{RoleRequest, RoleRequestStatus},
        usermodel::User,
    },
    policy,
    service::error::ServiceError,
};

#[derive(Debug, Clone)]
pub struct RoleRequestService {
    db_client: Arc<DBClient>,
}

impl RoleRequestService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    pub async fn submit_request(
        &self,
        actor: &User,
        dto: SubmitRoleRequestDto,
    ) -> Result<RoleRequest, ServiceError> {
        if !actor.is_active {
            return Err(ServiceError::Forbidden);
        }
        dto.validate()?;

        if dto.requested_role == actor.role {
            return Err(ServiceError::AlreadyHasRole(actor.role));
        }
        if !policy::can_request_role(actor.role, dto.requested_role) {
            return Err(ServiceError::Forbidden);
        }

        let request = RoleRequest {
            id: Uuid::new_v4(),
            user_id: actor.id,
            // Snapshot the requester as they are right now; the record stays
            // readable after the account changes.
            user_name: actor.name.clone(),
            user_email: actor.email.clone(),
            current_role: actor.role,
            requested_role: dto.requested_role,
            reason: dto.reason,
            status: RoleRequestStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            admin_comment: None,
            created_at: Utc::now(),
        };

        match self.db_client.insert_role_request(request).await {
            Ok(saved) => {
                tracing::info!(
                    "role request {} submitted by user {} for role {}",
                    saved.id,
                    actor.id,
                    saved.requested_role.to_str()
                );
                Ok(saved)
            }
            Err(StoreError::UniqueViolation(_)) => Err(ServiceError::DuplicatePendingRequest),
            Err(err) => Err(ServiceError::Storage(err)),
        }
    }

    pub async fn list_requests(
        &self,
        actor: &User,
        query: RoleRequestQueryParams,
    ) -> Result<(Vec<RoleRequest>, usize), ServiceError> {
        if !policy::can_review_role_request(actor.role) {
            return Err(ServiceError::Forbidden);
        }
        query.validate()?;

        let page = query.page.unwrap_or(1);
        let limit = query.limit.unwrap_or(20);

        self.db_client
            .find_role_requests(query.status, page, limit)
            .await
            .map_err(ServiceError::Storage)
    }

    pub async fn get_own_pending_request(&self, actor: &User) -> Result<RoleRequest, ServiceError> {
        self.db_client
            .get_pending_role_request(actor.id)
            .await
            .map_err(ServiceError::Storage)?
            .ok_or(ServiceError::PendingRequestNotFound)
    }

    pub async fn review_request(
        &self,
        actor: &User,
        request_id: Uuid,
        dto: ReviewRoleRequestDto,
    ) -> Result<RoleRequest, ServiceError> {
        if !policy::can_review_role_request(actor.role) {
            return Err(ServiceError::Forbidden);
        }
        dto.validate()?;

        let (mut request, version) = self
            .db_client
            .get_role_request(request_id)
            .await
            .map_err(ServiceError::Storage)?
            .ok_or(ServiceError::RequestNotFound(request_id))?;

        if request.status != RoleRequestStatus::Pending {
            return Err(ServiceError::AlreadyReviewed(request_id));
        }

        request.status = match dto.decision {
            ReviewDecision::Approved => RoleRequestStatus::Approved,
            ReviewDecision::Rejected => RoleRequestStatus::Rejected,
        };
        request.reviewed_by = Some(actor.id);
        request.reviewed_at = Some(Utc::now());
        request.admin_comment = dto.admin_comment;

        let reviewed = match self
            .db_client
            .update_role_request(request_id, version, request)
            .await
        {
            Ok(reviewed) => reviewed,
            // Reviewing is the only mutation a request ever sees, so a
            // version conflict means another admin got there first.
            Err(StoreError::Conflict) => return Err(ServiceError::AlreadyReviewed(request_id)),
            Err(StoreError::NotFound) => return Err(ServiceError::RequestNotFound(request_id)),
            Err(err) => return Err(ServiceError::Storage(err)),
        };

        // The role flip happens only after the review is durably recorded.
        if reviewed.status == RoleRequestStatus::Approved {
            match self
                .db_client
                .update_user_role(reviewed.user_id, reviewed.requested_role)
                .await
            {
                Ok(_) => {}
                Err(StoreError::NotFound) => {
                    tracing::error!(
                        "role request {} approved but user {} no longer exists",
                        reviewed.id,
                        reviewed.user_id
                    );
                    return Err(ServiceError::UserNotFound(reviewed.user_id));
                }
                Err(err) => return Err(ServiceError::Storage(err)),
            }
        }

        tracing::info!(
            "role request {} reviewed as {} by admin {}",
            reviewed.id,
            reviewed.status.to_str(),
            actor.id
        );
        Ok(reviewed)
    }
}
