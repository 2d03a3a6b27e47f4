use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tenauth_core::error::{TenauthError, TenauthResult};
use tenauth_core::models::normalize_identifier;
use tenauth_core::models::user::{CreateUser, UpdateUser, User};
use tenauth_core::repository::{
    PaginatedResult, Pagination, SessionRepository, UserRepository,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::MemorySessionRepository;

/// In-memory user store. Deleting a user also deletes the user's
/// sessions from the session store it was built with.
#[derive(Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    sessions: MemorySessionRepository,
}

impl MemoryUserRepository {
    /// A user store with a private session store of its own.
    pub fn new() -> Self {
        Self::default()
    }

    /// A user store whose deletions cascade into `sessions`.
    pub fn with_sessions(sessions: MemorySessionRepository) -> Self {
        Self {
            users: Arc::default(),
            sessions,
        }
    }
}

impl UserRepository for MemoryUserRepository {
    async fn create(&self, input: CreateUser) -> TenauthResult<User> {
        let email = normalize_identifier(&input.email);

        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.tenant_id == input.tenant_id && u.email == email)
        {
            return Err(TenauthError::AlreadyExists {
                entity: "user".into(),
            });
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            email,
            password_hash: input.password_hash,
            first_name: input.first_name,
            last_name: input.last_name,
            role: input.role,
            is_active: true,
            email_verified: false,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> TenauthResult<User> {
        self.users
            .read()
            .await
            .get(&id)
            .filter(|u| u.tenant_id == tenant_id)
            .cloned()
            .ok_or_else(|| TenauthError::not_found("user", id))
    }

    async fn get_by_email(&self, tenant_id: Uuid, email: &str) -> TenauthResult<User> {
        let email = normalize_identifier(email);
        self.users
            .read()
            .await
            .values()
            .find(|u| u.tenant_id == tenant_id && u.email == email)
            .cloned()
            .ok_or_else(|| TenauthError::not_found("user", format!("email={email}")))
    }

    async fn update(&self, tenant_id: Uuid, id: Uuid, input: UpdateUser) -> TenauthResult<User> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .filter(|u| u.tenant_id == tenant_id)
            .ok_or_else(|| TenauthError::not_found("user", id))?;

        if let Some(first_name) = input.first_name {
            user.first_name = Some(first_name);
        }
        if let Some(last_name) = input.last_name {
            user.last_name = Some(last_name);
        }
        if let Some(role) = input.role {
            user.role = role;
        }
        if let Some(is_active) = input.is_active {
            user.is_active = is_active;
        }
        if let Some(email_verified) = input.email_verified {
            user.email_verified = email_verified;
        }
        if let Some(password_hash) = input.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(last_login_at) = input.last_login_at {
            user.last_login_at = Some(last_login_at);
        }
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> TenauthResult<()> {
        let mut users = self.users.write().await;
        if users.get(&id).is_some_and(|u| u.tenant_id == tenant_id) {
            users.remove(&id);
        }
        drop(users);

        self.sessions.delete_user_sessions(tenant_id, id).await
    }

    async fn count_by_tenant(&self, tenant_id: Uuid) -> TenauthResult<u64> {
        let users = self.users.read().await;
        Ok(users.values().filter(|u| u.tenant_id == tenant_id).count() as u64)
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> TenauthResult<PaginatedResult<User>> {
        let users = self.users.read().await;
        let mut matching: Vec<User> = users
            .values()
            .filter(|u| u.tenant_id == tenant_id)
            .cloned()
            .collect();
        matching.sort_by_key(|u| u.created_at);

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .collect();

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
