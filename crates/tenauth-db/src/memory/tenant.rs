use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tenauth_core::error::{TenauthError, TenauthResult};
use tenauth_core::models::normalize_identifier;
use tenauth_core::models::tenant::{CreateTenant, Tenant, TenantStatus, UpdateTenant};
use tenauth_core::repository::TenantRepository;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct MemoryTenantRepository {
    tenants: Arc<RwLock<HashMap<Uuid, Tenant>>>,
}

impl MemoryTenantRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn find(&self, pred: impl Fn(&Tenant) -> bool, key: String) -> TenauthResult<Tenant> {
        self.tenants
            .read()
            .await
            .values()
            .find(|t| pred(*t))
            .cloned()
            .ok_or_else(|| TenauthError::not_found("tenant", key))
    }
}

impl TenantRepository for MemoryTenantRepository {
    async fn create(&self, input: CreateTenant) -> TenauthResult<Tenant> {
        let subdomain = normalize_identifier(&input.subdomain);
        let domain = input.domain.as_deref().map(normalize_identifier);

        let mut tenants = self.tenants.write().await;
        let taken = tenants
            .values()
            .any(|t| t.subdomain == subdomain || (domain.is_some() && t.domain == domain));
        if taken {
            return Err(TenauthError::AlreadyExists {
                entity: "tenant".into(),
            });
        }

        let now = Utc::now();
        let tenant = Tenant {
            id: Uuid::new_v4(),
            name: input.name,
            subdomain,
            domain,
            status: TenantStatus::Active,
            max_users: input.max_users,
            settings: input
                .settings
                .unwrap_or(serde_json::Value::Object(Default::default())),
            features: input
                .features
                .unwrap_or(serde_json::Value::Array(Vec::new())),
            created_at: now,
            updated_at: now,
        };
        tenants.insert(tenant.id, tenant.clone());
        Ok(tenant)
    }

    async fn get_by_id(&self, id: Uuid) -> TenauthResult<Tenant> {
        self.tenants
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| TenauthError::not_found("tenant", id))
    }

    async fn get_by_subdomain(&self, subdomain: &str) -> TenauthResult<Tenant> {
        let subdomain = normalize_identifier(subdomain);
        self.find(|t| t.subdomain == subdomain, format!("subdomain={subdomain}"))
            .await
    }

    async fn get_by_domain(&self, domain: &str) -> TenauthResult<Tenant> {
        let domain = normalize_identifier(domain);
        self.find(
            |t| t.domain.as_deref() == Some(domain.as_str()),
            format!("domain={domain}"),
        )
        .await
    }

    async fn update(&self, id: Uuid, input: UpdateTenant) -> TenauthResult<Tenant> {
        let mut tenants = self.tenants.write().await;
        let tenant = tenants
            .get_mut(&id)
            .ok_or_else(|| TenauthError::not_found("tenant", id))?;

        if let Some(name) = input.name {
            tenant.name = name;
        }
        if let Some(status) = input.status {
            tenant.status = status;
        }
        if let Some(max_users) = input.max_users {
            tenant.max_users = max_users;
        }
        if let Some(settings) = input.settings {
            tenant.settings = settings;
        }
        if let Some(features) = input.features {
            tenant.features = features;
        }
        tenant.updated_at = Utc::now();

        Ok(tenant.clone())
    }
}
