//! Integration tests for the Session repository using in-memory
//! SurrealDB.

use chrono::{Duration, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use tenauth_core::models::session::CreateSession;
use tenauth_core::repository::SessionRepository;
use tenauth_db::repository::SurrealSessionRepository;
use uuid::Uuid;

async fn setup() -> (SurrealSessionRepository<surrealdb::engine::local::Db>, Uuid, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tenauth_db::run_migrations(&db).await.unwrap();

    (SurrealSessionRepository::new(db), Uuid::new_v4(), Uuid::new_v4())
}

fn new_session(tenant_id: Uuid, user_id: Uuid, hash: &str) -> CreateSession {
    CreateSession {
        tenant_id,
        user_id,
        token_hash: hash.into(),
        ip_address: Some("10.0.0.1".into()),
        user_agent: None,
        expires_at: Utc::now() + Duration::days(7),
    }
}

#[tokio::test]
async fn create_and_lookup_by_hash() {
    let (repo, tenant_id, user_id) = setup().await;

    let session = repo
        .create(new_session(tenant_id, user_id, "hash-1"))
        .await
        .unwrap();
    assert_eq!(session.user_id, user_id);
    assert_eq!(session.ip_address.as_deref(), Some("10.0.0.1"));

    let fetched = repo
        .get_by_user_and_token_hash(tenant_id, user_id, "hash-1")
        .await
        .unwrap();
    assert_eq!(fetched.id, session.id);

    // Another user cannot match the same hash.
    let other = repo
        .get_by_user_and_token_hash(tenant_id, Uuid::new_v4(), "hash-1")
        .await;
    assert!(other.is_err());
}

#[tokio::test]
async fn rotate_token_is_compare_and_swap() {
    let (repo, tenant_id, user_id) = setup().await;
    let session = repo
        .create(new_session(tenant_id, user_id, "old"))
        .await
        .unwrap();

    let used_at = Utc::now();
    let rotated = repo
        .rotate_token(tenant_id, session.id, "old", "new", used_at)
        .await
        .unwrap();
    assert_eq!(rotated.token_hash, "new");
    assert_eq!(rotated.expires_at, session.expires_at);

    // Stale hash loses.
    let stale = repo
        .rotate_token(tenant_id, session.id, "old", "newer", Utc::now())
        .await
        .unwrap_err();
    assert!(stale.is_not_found());

    let fetched = repo.get_by_id(tenant_id, session.id).await.unwrap();
    assert_eq!(fetched.token_hash, "new");
}

#[tokio::test]
async fn delete_is_idempotent_and_user_scoped() {
    let (repo, tenant_id, user_id) = setup().await;
    let session = repo
        .create(new_session(tenant_id, user_id, "h"))
        .await
        .unwrap();

    // Wrong user leaves the session in place.
    repo.delete(tenant_id, Uuid::new_v4(), session.id)
        .await
        .unwrap();
    assert!(repo.get_by_id(tenant_id, session.id).await.is_ok());

    repo.delete(tenant_id, user_id, session.id).await.unwrap();
    assert!(repo.get_by_id(tenant_id, session.id).await.is_err());

    repo.delete(tenant_id, user_id, session.id).await.unwrap();
}

#[tokio::test]
async fn delete_user_sessions_removes_all() {
    let (repo, tenant_id, user_id) = setup().await;
    for i in 0..3 {
        repo.create(new_session(tenant_id, user_id, &format!("s{i}")))
            .await
            .unwrap();
    }

    repo.delete_user_sessions(tenant_id, user_id).await.unwrap();

    for i in 0..3 {
        let result = repo
            .get_by_user_and_token_hash(tenant_id, user_id, &format!("s{i}"))
            .await;
        assert!(result.is_err());
    }
}
