//! SurrealDB implementation of [`TenantRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tenauth_core::error::{TenauthError, TenauthResult};
use tenauth_core::models::normalize_identifier;
use tenauth_core::models::tenant::{CreateTenant, Tenant, TenantStatus, UpdateTenant};
use tenauth_core::repository::TenantRepository;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct TenantRow {
    name: String,
    subdomain: String,
    domain: Option<String>,
    status: String,
    max_users: u32,
    settings: serde_json::Value,
    features: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct TenantRowWithId {
    record_id: String,
    name: String,
    subdomain: String,
    domain: Option<String>,
    status: String,
    max_users: u32,
    settings: serde_json::Value,
    features: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

pub(crate) fn parse_status(s: &str) -> Result<TenantStatus, DbError> {
    match s {
        "Active" => Ok(TenantStatus::Active),
        "Suspended" => Ok(TenantStatus::Suspended),
        "Deleted" => Ok(TenantStatus::Deleted),
        other => Err(DbError::Decode(format!("unknown tenant status: {other}"))),
    }
}

pub(crate) fn status_to_string(s: TenantStatus) -> &'static str {
    match s {
        TenantStatus::Active => "Active",
        TenantStatus::Suspended => "Suspended",
        TenantStatus::Deleted => "Deleted",
    }
}

impl TenantRow {
    fn into_tenant(self, id: Uuid) -> Result<Tenant, DbError> {
        Ok(Tenant {
            id,
            name: self.name,
            subdomain: self.subdomain,
            domain: self.domain,
            status: parse_status(&self.status)?,
            max_users: self.max_users,
            settings: self.settings,
            features: self.features,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl TenantRowWithId {
    fn try_into_tenant(self) -> Result<Tenant, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        TenantRow {
            name: self.name,
            subdomain: self.subdomain,
            domain: self.domain,
            status: self.status,
            max_users: self.max_users,
            settings: self.settings,
            features: self.features,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_tenant(id)
    }
}

/// SurrealDB implementation of the Tenant repository.
#[derive(Clone)]
pub struct SurrealTenantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTenantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn find_one(&self, field: &'static str, value: String) -> TenauthResult<Tenant> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM tenant \
             WHERE {field} = $value LIMIT 1"
        );

        let mut result = self
            .db
            .query(query)
            .bind(("value", value.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: format!("{field}={value}"),
        })?;

        Ok(row.try_into_tenant()?)
    }
}

impl<C: Connection> TenantRepository for SurrealTenantRepository<C> {
    async fn create(&self, input: CreateTenant) -> TenauthResult<Tenant> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let subdomain = normalize_identifier(&input.subdomain);
        let domain = input.domain.as_deref().map(normalize_identifier);

        // Domains are optional, so uniqueness is checked here instead of
        // through a UNIQUE index. The check and the CREATE are separate
        // statements; a concurrent provisioning can slip between them.
        if let Some(domain) = &domain {
            match self.find_one("domain", domain.clone()).await {
                Ok(_) => {
                    return Err(TenauthError::AlreadyExists {
                        entity: "tenant".into(),
                    });
                }
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }

        let result = self
            .db
            .query(
                "CREATE type::record('tenant', $id) SET \
                 name = $name, subdomain = $subdomain, domain = $domain, \
                 status = 'Active', max_users = $max_users, \
                 settings = $settings, features = $features",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("subdomain", subdomain))
            .bind(("domain", domain))
            .bind(("max_users", input.max_users))
            .bind((
                "settings",
                input
                    .settings
                    .unwrap_or(serde_json::Value::Object(Default::default())),
            ))
            .bind((
                "features",
                input
                    .features
                    .unwrap_or(serde_json::Value::Array(Vec::new())),
            ))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("tenant", e))?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        Ok(row.into_tenant(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> TenauthResult<Tenant> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('tenant', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        Ok(row.into_tenant(id)?)
    }

    async fn get_by_subdomain(&self, subdomain: &str) -> TenauthResult<Tenant> {
        self.find_one("subdomain", normalize_identifier(subdomain))
            .await
    }

    async fn get_by_domain(&self, domain: &str) -> TenauthResult<Tenant> {
        self.find_one("domain", normalize_identifier(domain)).await
    }

    async fn update(&self, id: Uuid, input: UpdateTenant) -> TenauthResult<Tenant> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.max_users.is_some() {
            sets.push("max_users = $max_users");
        }
        if input.settings.is_some() {
            sets.push("settings = $settings");
        }
        if input.features.is_some() {
            sets.push("features = $features");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::record('tenant', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status_to_string(status).to_string()));
        }
        if let Some(max_users) = input.max_users {
            builder = builder.bind(("max_users", max_users));
        }
        if let Some(settings) = input.settings {
            builder = builder.bind(("settings", settings));
        }
        if let Some(features) = input.features {
            builder = builder.bind(("features", features));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("tenant", e))?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        Ok(row.into_tenant(id)?)
    }
}
