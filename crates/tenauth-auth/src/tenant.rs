//! Tenant resolution from identifiers and inbound requests.

use std::time::Duration;

use tenauth_core::error::TenauthResult;
use tenauth_core::models::normalize_identifier;
use tenauth_core::models::tenant::Tenant;
use tenauth_core::repository::TenantRepository;
use tracing::debug;
use uuid::Uuid;

use crate::error::AuthError;
use crate::service::bounded;

/// Maps an identifier (UUID, subdomain or custom domain) to an active
/// tenant.
pub struct TenantResolver<T: TenantRepository> {
    repo: T,
    store_timeout: Duration,
}

impl<T: TenantRepository> TenantResolver<T> {
    pub fn new(repo: T) -> Self {
        Self {
            repo,
            store_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Resolve a tenant identifier.
    ///
    /// A UUID is looked up by id only. Anything else is normalized and
    /// tried as a subdomain, then as a custom domain.
    pub async fn resolve(&self, identifier: &str) -> Result<Tenant, AuthError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(AuthError::TenantNotFound);
        }

        let found = if let Ok(id) = Uuid::parse_str(identifier) {
            debug!(tenant_id = %id, "resolving tenant by id");
            self.lookup(self.repo.get_by_id(id)).await?
        } else {
            let key = normalize_identifier(identifier);
            debug!(identifier = %key, "resolving tenant by subdomain");
            match self.lookup(self.repo.get_by_subdomain(&key)).await? {
                Some(tenant) => Some(tenant),
                None => {
                    debug!(identifier = %key, "no subdomain match, trying domain");
                    self.lookup(self.repo.get_by_domain(&key)).await?
                }
            }
        };

        let tenant = found.ok_or(AuthError::TenantNotFound)?;
        ensure_active(tenant)
    }

    pub async fn resolve_by_id(&self, tenant_id: Uuid) -> Result<Tenant, AuthError> {
        let tenant = self
            .lookup(self.repo.get_by_id(tenant_id))
            .await?
            .ok_or(AuthError::TenantNotFound)?;
        ensure_active(tenant)
    }

    /// Resolve the tenant of an inbound request. An explicit tenant id
    /// wins over the subdomain of the `Host` header.
    pub async fn resolve_request(
        &self,
        explicit_id: Option<&str>,
        host: Option<&str>,
    ) -> Result<Tenant, AuthError> {
        if let Some(id) = explicit_id.map(str::trim).filter(|s| !s.is_empty()) {
            return self.resolve(id).await;
        }
        if let Some(subdomain) = host.and_then(extract_subdomain) {
            return self.resolve(subdomain).await;
        }
        Err(AuthError::TenantContextMissing)
    }

    async fn lookup(
        &self,
        fut: impl Future<Output = TenauthResult<Tenant>>,
    ) -> Result<Option<Tenant>, AuthError> {
        match bounded(self.store_timeout, fut).await {
            Ok(tenant) => Ok(Some(tenant)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn ensure_active(tenant: Tenant) -> Result<Tenant, AuthError> {
    if tenant.is_active() {
        Ok(tenant)
    } else {
        debug!(tenant_id = %tenant.id, status = ?tenant.status, "tenant is not active");
        Err(AuthError::TenantInactive)
    }
}

/// First label of a host name, e.g. `acme` for `acme.example.com:8080`.
/// Hosts with a single label have no subdomain.
pub fn extract_subdomain(host: &str) -> Option<&str> {
    let host = host.trim();
    let host = host.split(':').next().unwrap_or(host);
    let (first, rest) = host.split_once('.')?;
    if first.is_empty() || rest.is_empty() {
        return None;
    }
    Some(first)
}
