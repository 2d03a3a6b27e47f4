//! Tenant domain model.
//!
//! Tenants provide full data isolation. Every user and session is
//! scoped to exactly one tenant. Tenants are provisioned out of band;
//! the authentication flow only reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TenantStatus {
    Active,
    Suspended,
    Deleted,
}

/// An isolated customer organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// Globally unique, lowercase host label (e.g. `acme` in
    /// `acme.example.com`).
    pub subdomain: String,
    /// Optional globally unique custom domain, lowercase.
    pub domain: Option<String>,
    pub status: TenantStatus,
    /// Maximum number of users the tenant may hold.
    pub max_users: u32,
    /// Arbitrary key-value settings.
    pub settings: serde_json::Value,
    /// Enabled feature names (JSON array of strings).
    pub features: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    pub fn is_active(&self) -> bool {
        self.status == TenantStatus::Active
    }

    /// Whether `feature` is listed in the tenant's feature array.
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features
            .as_array()
            .is_some_and(|list| list.iter().any(|f| f.as_str() == Some(feature)))
    }
}

/// Fields required to provision a new tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    pub name: String,
    pub subdomain: String,
    pub domain: Option<String>,
    pub max_users: u32,
    pub settings: Option<serde_json::Value>,
    pub features: Option<serde_json::Value>,
}

/// Fields that can be updated on an existing tenant.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTenant {
    pub name: Option<String>,
    pub status: Option<TenantStatus>,
    pub max_users: Option<u32>,
    pub settings: Option<serde_json::Value>,
    pub features: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant_with_features(features: serde_json::Value) -> Tenant {
        Tenant {
            id: Uuid::new_v4(),
            name: "Acme".into(),
            subdomain: "acme".into(),
            domain: None,
            status: TenantStatus::Active,
            max_users: 10,
            settings: serde_json::json!({}),
            features,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn has_feature_reads_feature_array() {
        let tenant = tenant_with_features(serde_json::json!(["sso", "audit"]));
        assert!(tenant.has_feature("audit"));
        assert!(!tenant.has_feature("billing"));
    }

    #[test]
    fn has_feature_tolerates_non_array() {
        let tenant = tenant_with_features(serde_json::json!({"sso": true}));
        assert!(!tenant.has_feature("sso"));
    }

    #[test]
    fn only_active_status_is_active() {
        let mut tenant = tenant_with_features(serde_json::json!([]));
        assert!(tenant.is_active());
        tenant.status = TenantStatus::Suspended;
        assert!(!tenant.is_active());
        tenant.status = TenantStatus::Deleted;
        assert!(!tenant.is_active());
    }
}
