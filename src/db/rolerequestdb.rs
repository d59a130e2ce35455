// src/db/rolerequestdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::{conditional_replace, insert_new, DBClient, StoreError};
use crate::models::rolerequestmodel::{RoleRequest, RoleRequestStatus};

#[async_trait]
pub trait RoleRequestExt {
    /// Inserts a new request. The `(user_id, pending)` uniqueness rule is
    /// enforced here, under the collection write lock, so two concurrent
    /// submissions cannot both pass an application-level check.
    async fn insert_role_request(&self, request: RoleRequest) -> Result<RoleRequest, StoreError>;

    async fn get_role_request(
        &self,
        request_id: Uuid,
    ) -> Result<Option<(RoleRequest, u64)>, StoreError>;

    async fn get_pending_role_request(
        &self,
        user_id: Uuid,
    ) -> Result<Option<RoleRequest>, StoreError>;

    /// Newest first, optionally narrowed by status, with the total match
    /// count for pagination.
    async fn find_role_requests(
        &self,
        status: Option<RoleRequestStatus>,
        page: u32,
        limit: usize,
    ) -> Result<(Vec<RoleRequest>, usize), StoreError>;

    async fn update_role_request(
        &self,
        request_id: Uuid,
        expected_version: u64,
        request: RoleRequest,
    ) -> Result<RoleRequest, StoreError>;
}

#[async_trait]
impl RoleRequestExt for DBClient {
    async fn insert_role_request(&self, request: RoleRequest) -> Result<RoleRequest, StoreError> {
        let mut role_requests = self.role_requests.write().await;

        if role_requests.values().any(|entry| {
            entry.doc.user_id == request.user_id
                && entry.doc.status == RoleRequestStatus::Pending
        }) {
            return Err(StoreError::UniqueViolation("role_requests.user_id_pending"));
        }

        Ok(insert_new(&mut role_requests, request.id, request))
    }

    async fn get_role_request(
        &self,
        request_id: Uuid,
    ) -> Result<Option<(RoleRequest, u64)>, StoreError> {
        let role_requests = self.role_requests.read().await;
        Ok(role_requests
            .get(&request_id)
            .map(|entry| (entry.doc.clone(), entry.version)))
    }

    async fn get_pending_role_request(
        &self,
        user_id: Uuid,
    ) -> Result<Option<RoleRequest>, StoreError> {
        let role_requests = self.role_requests.read().await;
        Ok(role_requests
            .values()
            .find(|entry| {
                entry.doc.user_id == user_id && entry.doc.status == RoleRequestStatus::Pending
            })
            .map(|entry| entry.doc.clone()))
    }

    async fn find_role_requests(
        &self,
        status: Option<RoleRequestStatus>,
        page: u32,
        limit: usize,
    ) -> Result<(Vec<RoleRequest>, usize), StoreError> {
        let role_requests = self.role_requests.read().await;

        let mut matched: Vec<RoleRequest> = role_requests
            .values()
            .filter(|entry| status.map_or(true, |status| entry.doc.status == status))
            .map(|entry| entry.doc.clone())
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matched.len();
        let offset = (page.saturating_sub(1) as usize) * limit;
        let page_items = matched.into_iter().skip(offset).take(limit).collect();

        Ok((page_items, total))
    }

    async fn update_role_request(
        &self,
        request_id: Uuid,
        expected_version: u64,
        request: RoleRequest,
    ) -> Result<RoleRequest, StoreError> {
        let mut role_requests = self.role_requests.write().await;
        conditional_replace(&mut role_requests, request_id, expected_version, request)
    }
}
