// src/db/userdb.rs
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::db::{conditional_replace, insert_new, DBClient, StoreError};
use crate::models::usermodel::{User, UserRole};

#[async_trait]
pub trait UserExt {
    async fn save_user<T: Into<String> + Send>(
        &self,
        name: T,
        email: T,
        password: T,
        role: UserRole,
    ) -> Result<User, StoreError>;

    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, StoreError>;

    async fn get_users(&self, page: u32, limit: usize) -> Result<Vec<User>, StoreError>;

    async fn user_count(&self) -> Result<i64, StoreError>;

    async fn update_user_role(&self, user_id: Uuid, role: UserRole) -> Result<User, StoreError>;

    async fn set_user_active(&self, user_id: Uuid, is_active: bool) -> Result<User, StoreError>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn save_user<T: Into<String> + Send>(
        &self,
        name: T,
        email: T,
        password: T,
        role: UserRole,
    ) -> Result<User, StoreError> {
        let email = email.into();
        let mut users = self.users.write().await;

        // Email uniqueness is enforced here, under the collection write lock.
        if users
            .values()
            .any(|entry| entry.doc.email.eq_ignore_ascii_case(&email))
        {
            return Err(StoreError::UniqueViolation("users.email"));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: name.into(),
            email,
            password: password.into(),
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        Ok(insert_new(&mut users, user.id, user))
    }

    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;

        if let Some(user_id) = user_id {
            return Ok(users.get(&user_id).map(|entry| entry.doc.clone()));
        }

        if let Some(email) = email {
            return Ok(users
                .values()
                .find(|entry| entry.doc.email.eq_ignore_ascii_case(email))
                .map(|entry| entry.doc.clone()));
        }

        Ok(None)
    }

    async fn get_users(&self, page: u32, limit: usize) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;

        let mut all: Vec<User> = users.values().map(|entry| entry.doc.clone()).collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let offset = (page.saturating_sub(1) as usize) * limit;
        Ok(all.into_iter().skip(offset).take(limit).collect())
    }

    async fn user_count(&self) -> Result<i64, StoreError> {
        let users = self.users.read().await;
        Ok(users.len() as i64)
    }

    async fn update_user_role(&self, user_id: Uuid, role: UserRole) -> Result<User, StoreError> {
        let mut users = self.users.write().await;

        let entry = users.get(&user_id).ok_or(StoreError::NotFound)?;
        let version = entry.version;
        let mut user = entry.doc.clone();
        user.role = role;
        user.updated_at = Utc::now();

        conditional_replace(&mut users, user_id, version, user)
    }

    async fn set_user_active(&self, user_id: Uuid, is_active: bool) -> Result<User, StoreError> {
        let mut users = self.users.write().await;

        let entry = users.get(&user_id).ok_or(StoreError::NotFound)?;
        let version = entry.version;
        let mut user = entry.doc.clone();
        user.is_active = is_active;
        user.updated_at = Utc::now();

        conditional_replace(&mut users, user_id, version, user)
    }
}
