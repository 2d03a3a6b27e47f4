//! Integration tests for the User repository using in-memory
//! SurrealDB.

use chrono::{Duration, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use tenauth_core::models::session::CreateSession;
use tenauth_core::models::tenant::CreateTenant;
use tenauth_core::models::user::{CreateUser, UpdateUser, UserRole};
use tenauth_core::repository::{
    Pagination, SessionRepository, TenantRepository, UserRepository,
};
use tenauth_db::repository::{
    SurrealSessionRepository, SurrealTenantRepository, SurrealUserRepository,
};
use uuid::Uuid;

/// Helper: spin up in-memory DB, run migrations, create a tenant.
async fn setup() -> (Surreal<surrealdb::engine::local::Db>, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tenauth_db::run_migrations(&db).await.unwrap();

    let tenant = SurrealTenantRepository::new(db.clone())
        .create(CreateTenant {
            name: "Test Tenant".into(),
            subdomain: "test".into(),
            domain: None,
            max_users: 10,
            settings: None,
            features: None,
        })
        .await
        .unwrap();

    (db, tenant.id)
}

fn new_user(tenant_id: Uuid, email: &str) -> CreateUser {
    CreateUser {
        tenant_id,
        email: email.into(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
        first_name: Some("Alice".into()),
        last_name: None,
        role: UserRole::User,
    }
}

#[tokio::test]
async fn create_and_get_user() {
    let (db, tenant_id) = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(new_user(tenant_id, "Alice@Example.com"))
        .await
        .unwrap();

    assert_eq!(user.tenant_id, tenant_id);
    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.role, UserRole::User);
    assert!(user.is_active);
    assert!(user.last_login_at.is_none());

    let fetched = repo.get_by_id(tenant_id, user.id).await.unwrap();
    assert_eq!(fetched.id, user.id);
    assert_eq!(fetched.first_name.as_deref(), Some("Alice"));

    let by_email = repo
        .get_by_email(tenant_id, "ALICE@example.com")
        .await
        .unwrap();
    assert_eq!(by_email.id, user.id);
}

#[tokio::test]
async fn duplicate_email_in_tenant_rejected() {
    let (db, tenant_id) = setup().await;
    let repo = SurrealUserRepository::new(db);

    repo.create(new_user(tenant_id, "alice@example.com"))
        .await
        .unwrap();
    let result = repo.create(new_user(tenant_id, "alice@example.com")).await;
    assert!(result.is_err(), "duplicate email should be rejected");
}

#[tokio::test]
async fn same_email_in_other_tenant_allowed() {
    let (db, tenant_id) = setup().await;
    let repo = SurrealUserRepository::new(db);

    repo.create(new_user(tenant_id, "alice@example.com"))
        .await
        .unwrap();
    let other = repo
        .create(new_user(Uuid::new_v4(), "alice@example.com"))
        .await
        .unwrap();
    assert_ne!(other.tenant_id, tenant_id);
}

#[tokio::test]
async fn get_is_tenant_scoped() {
    let (db, tenant_id) = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(new_user(tenant_id, "alice@example.com"))
        .await
        .unwrap();

    let err = repo.get_by_id(Uuid::new_v4(), user.id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn update_records_last_login_and_status() {
    let (db, tenant_id) = setup().await;
    let repo = SurrealUserRepository::new(db);
    let user = repo
        .create(new_user(tenant_id, "alice@example.com"))
        .await
        .unwrap();

    let now = Utc::now();
    let updated = repo
        .update(
            tenant_id,
            user.id,
            UpdateUser {
                last_login_at: Some(now),
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(!updated.is_active);
    assert!(updated.last_login_at.is_some());
    assert_eq!(updated.email, "alice@example.com");
}

#[tokio::test]
async fn count_and_delete() {
    let (db, tenant_id) = setup().await;
    let repo = SurrealUserRepository::new(db);

    let alice = repo
        .create(new_user(tenant_id, "alice@example.com"))
        .await
        .unwrap();
    repo.create(new_user(tenant_id, "bob@example.com"))
        .await
        .unwrap();
    assert_eq!(repo.count_by_tenant(tenant_id).await.unwrap(), 2);
    assert_eq!(repo.count_by_tenant(Uuid::new_v4()).await.unwrap(), 0);

    repo.delete(tenant_id, alice.id).await.unwrap();
    assert_eq!(repo.count_by_tenant(tenant_id).await.unwrap(), 1);
    assert!(repo.get_by_id(tenant_id, alice.id).await.is_err());
}

#[tokio::test]
async fn list_users_paginated() {
    let (db, tenant_id) = setup().await;
    let repo = SurrealUserRepository::new(db);

    for i in 0..3 {
        repo.create(new_user(tenant_id, &format!("user{i}@example.com")))
            .await
            .unwrap();
    }

    let page = repo
        .list(
            tenant_id,
            Pagination {
                offset: 0,
                limit: 2,
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);
}

#[tokio::test]
async fn delete_removes_the_users_sessions() {
    let (db, tenant_id) = setup().await;
    let users = SurrealUserRepository::new(db.clone());
    let sessions = SurrealSessionRepository::new(db);

    let user = users.create(new_user(tenant_id, "a@x.com")).await.unwrap();
    let session = sessions
        .create(CreateSession {
            tenant_id,
            user_id: user.id,
            token_hash: "h1".into(),
            ip_address: None,
            user_agent: None,
            expires_at: Utc::now() + Duration::days(7),
        })
        .await
        .unwrap();

    users.delete(tenant_id, user.id).await.unwrap();

    assert!(
        sessions
            .get_by_id(tenant_id, session.id)
            .await
            .unwrap_err()
            .is_not_found()
    );
}
