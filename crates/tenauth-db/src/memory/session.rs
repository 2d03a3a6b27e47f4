use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tenauth_core::error::{TenauthError, TenauthResult};
use tenauth_core::models::session::{CreateSession, Session};
use tenauth_core::repository::SessionRepository;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct MemorySessionRepository {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions for a user, expired ones included.
    pub async fn count_for_user(&self, tenant_id: Uuid, user_id: Uuid) -> usize {
        self.sessions
            .read()
            .await
            .values()
            .filter(|s| s.tenant_id == tenant_id && s.user_id == user_id)
            .count()
    }
}

impl SessionRepository for MemorySessionRepository {
    async fn create(&self, input: CreateSession) -> TenauthResult<Session> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            user_id: input.user_id,
            token_hash: input.token_hash,
            ip_address: input.ip_address,
            user_agent: input.user_agent,
            expires_at: input.expires_at,
            created_at: now,
            last_used_at: now,
        };
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        Ok(session)
    }

    async fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> TenauthResult<Session> {
        self.sessions
            .read()
            .await
            .get(&id)
            .filter(|s| s.tenant_id == tenant_id)
            .cloned()
            .ok_or_else(|| TenauthError::not_found("session", id))
    }

    async fn get_by_user_and_token_hash(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        token_hash: &str,
    ) -> TenauthResult<Session> {
        self.sessions
            .read()
            .await
            .values()
            .find(|s| s.tenant_id == tenant_id && s.user_id == user_id && s.token_hash == token_hash)
            .cloned()
            .ok_or_else(|| TenauthError::not_found("session", format!("user={user_id}")))
    }

    async fn rotate_token(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        expected_hash: &str,
        new_hash: &str,
        used_at: DateTime<Utc>,
    ) -> TenauthResult<Session> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .filter(|s| s.tenant_id == tenant_id && s.token_hash == expected_hash)
            .ok_or_else(|| TenauthError::not_found("session", id))?;

        session.token_hash = new_hash.to_string();
        session.last_used_at = used_at;
        Ok(session.clone())
    }

    async fn delete(&self, tenant_id: Uuid, user_id: Uuid, id: Uuid) -> TenauthResult<()> {
        let mut sessions = self.sessions.write().await;
        if sessions
            .get(&id)
            .is_some_and(|s| s.tenant_id == tenant_id && s.user_id == user_id)
        {
            sessions.remove(&id);
        }
        Ok(())
    }

    async fn delete_user_sessions(&self, tenant_id: Uuid, user_id: Uuid) -> TenauthResult<()> {
        self.sessions
            .write()
            .await
            .retain(|_, s| !(s.tenant_id == tenant_id && s.user_id == user_id));
        Ok(())
    }
}
