//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. User and session repositories
//! require a `tenant_id` parameter to enforce data isolation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::TenauthResult;
use crate::models::{
    session::{CreateSession, Session},
    tenant::{CreateTenant, Tenant, UpdateTenant},
    user::{CreateUser, UpdateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Tenant (global scope)
// ---------------------------------------------------------------------------

/// Tenant lookups. Subdomain and domain arguments are expected to be
/// normalized by the caller; implementations normalize on write.
pub trait TenantRepository: Send + Sync {
    /// Provision a tenant. Fails with `AlreadyExists` when the
    /// subdomain or domain is taken.
    ///
    /// Subdomain uniqueness is enforced atomically. Domain uniqueness
    /// is checked before the insert and is best-effort against a
    /// concurrent provisioning of the same domain.
    fn create(&self, input: CreateTenant) -> impl Future<Output = TenauthResult<Tenant>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = TenauthResult<Tenant>> + Send;
    fn get_by_subdomain(
        &self,
        subdomain: &str,
    ) -> impl Future<Output = TenauthResult<Tenant>> + Send;
    fn get_by_domain(&self, domain: &str) -> impl Future<Output = TenauthResult<Tenant>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateTenant,
    ) -> impl Future<Output = TenauthResult<Tenant>> + Send;
}

// ---------------------------------------------------------------------------
// Tenant-scoped repositories
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    /// Insert a user. The (tenant_id, email) pair is unique; a
    /// violation fails with `AlreadyExists`.
    fn create(&self, input: CreateUser) -> impl Future<Output = TenauthResult<User>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = TenauthResult<User>> + Send;
    fn get_by_email(
        &self,
        tenant_id: Uuid,
        email: &str,
    ) -> impl Future<Output = TenauthResult<User>> + Send;
    fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = TenauthResult<User>> + Send;
    /// Hard-delete a user together with all of the user's sessions.
    /// Deleting an absent user is not an error.
    fn delete(&self, tenant_id: Uuid, id: Uuid) -> impl Future<Output = TenauthResult<()>> + Send;
    fn count_by_tenant(&self, tenant_id: Uuid) -> impl Future<Output = TenauthResult<u64>> + Send;
    /// Users of one tenant, oldest first.
    fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = TenauthResult<PaginatedResult<User>>> + Send;
}

pub trait SessionRepository: Send + Sync {
    fn create(&self, input: CreateSession)
    -> impl Future<Output = TenauthResult<Session>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = TenauthResult<Session>> + Send;
    /// Find the session of `user_id` whose current refresh token hash
    /// is `token_hash`.
    fn get_by_user_and_token_hash(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        token_hash: &str,
    ) -> impl Future<Output = TenauthResult<Session>> + Send;
    /// Atomically replace `expected_hash` with `new_hash` and set
    /// `last_used_at`. Fails with `NotFound` when the stored hash no
    /// longer equals `expected_hash`. Never touches `expires_at`.
    fn rotate_token(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        expected_hash: &str,
        new_hash: &str,
        used_at: DateTime<Utc>,
    ) -> impl Future<Output = TenauthResult<Session>> + Send;
    /// Delete one session of a user. Deleting an absent session is not
    /// an error.
    fn delete(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = TenauthResult<()>> + Send;
    fn delete_user_sessions(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = TenauthResult<()>> + Send;
}
