//! Authentication service: registration, login, token refresh and
//! logout orchestration.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tenauth_core::error::{TenauthError, TenauthResult};
use tenauth_core::models::normalize_identifier;
use tenauth_core::models::session::CreateSession;
use tenauth_core::models::user::{CreateUser, UpdateUser, User, UserProfile, UserRole};
use tenauth_core::repository::{
    PaginatedResult, Pagination, SessionRepository, TenantRepository, UserRepository,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::tenant::TenantResolver;
use crate::token::{self, TokenKind, TokenService, ValidatedClaims};

const MAX_NAME_LENGTH: usize = 100;
const MAX_EMAIL_LENGTH: usize = 254;
const DECOY_PASSWORD: &str = "tenauth-login-decoy";

/// Input for the registration flow.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub tenant_id: Uuid,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Input for the login flow. Client address and user agent come from
/// the transport, not the request body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub tenant_id: Uuid,
    pub email: String,
    pub password: String,
    #[serde(skip)]
    pub ip_address: Option<String>,
    #[serde(skip)]
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshInput {
    pub refresh_token: String,
}

/// Token pair handed back to the client.
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    /// Session ID (can be used for logout).
    pub session_id: Uuid,
    /// Present after register and login, absent after refresh.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

/// Bound a store call by `limit`. An elapsed deadline drops the
/// inner future and reports [`TenauthError::Timeout`].
pub(crate) async fn bounded<T>(
    limit: Duration,
    fut: impl Future<Output = TenauthResult<T>>,
) -> TenauthResult<T> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| TenauthError::Timeout(limit.as_secs()))?
}

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate. Holds no mutable state of
/// its own; everything shared lives in the stores.
pub struct AuthService<T: TenantRepository, U: UserRepository, S: SessionRepository> {
    resolver: TenantResolver<T>,
    user_repo: U,
    session_repo: S,
    tokens: TokenService,
    config: AuthConfig,
    /// Verified against on unknown-email logins so both failure paths
    /// cost one Argon2 run.
    decoy_hash: String,
}

impl<T, U, S> AuthService<T, U, S>
where
    T: TenantRepository,
    U: UserRepository,
    S: SessionRepository,
{
    /// Build the service. Fails when the configured key material
    /// cannot be parsed.
    pub fn new(
        tenant_repo: T,
        user_repo: U,
        session_repo: S,
        config: AuthConfig,
    ) -> Result<Self, AuthError> {
        let tokens = TokenService::new(&config)?;
        let decoy_hash = decoy_hash(config.pepper.as_deref())?;
        let resolver = TenantResolver::new(tenant_repo)
            .with_store_timeout(Duration::from_secs(config.store_timeout_secs));

        Ok(Self {
            resolver,
            user_repo,
            session_repo,
            tokens,
            config,
            decoy_hash,
        })
    }

    pub fn resolver(&self) -> &TenantResolver<T> {
        &self.resolver
    }

    pub fn token_service(&self) -> &TokenService {
        &self.tokens
    }

    /// Create a user in an active tenant and open its first session.
    pub async fn register(&self, input: RegisterInput) -> Result<AuthResponse, AuthError> {
        let email = normalize_identifier(&input.email);
        self.validate_registration(&email, &input)?;

        let tenant = self.resolver.resolve_by_id(input.tenant_id).await?;

        let count = self.store(self.user_repo.count_by_tenant(tenant.id)).await?;
        if count >= u64::from(tenant.max_users) {
            warn!(tenant_id = %tenant.id, max_users = tenant.max_users, "registration rejected: tenant is full");
            return Err(AuthError::MaxUsersReached);
        }

        match self.store(self.user_repo.get_by_email(tenant.id, &email)).await {
            Ok(_) => return Err(AuthError::UserAlreadyExists),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }

        let password_hash = password::hash_password(&input.password, self.pepper())?;

        // Two concurrent registrations can both pass the lookup above;
        // the store's unique index decides.
        let user = self
            .store(self.user_repo.create(CreateUser {
                tenant_id: tenant.id,
                email,
                password_hash,
                first_name: input.first_name,
                last_name: input.last_name,
                role: UserRole::User,
            }))
            .await
            .map_err(|e| match e {
                TenauthError::AlreadyExists { .. } => AuthError::UserAlreadyExists,
                other => other.into(),
            })?;

        let response = self.open_session(&user, None, None).await?;
        info!(
            tenant_id = %tenant.id,
            user_id = %user.id,
            session_id = %response.session_id,
            "user registered"
        );
        Ok(response)
    }

    /// Authenticate a user with email and password and issue tokens.
    pub async fn login(&self, input: LoginInput) -> Result<AuthResponse, AuthError> {
        let tenant = self.resolver.resolve_by_id(input.tenant_id).await?;

        let user = match self
            .store(self.user_repo.get_by_email(tenant.id, &input.email))
            .await
        {
            Ok(user) => user,
            Err(e) if e.is_not_found() => {
                password::verify_password(&input.password, &self.decoy_hash, self.pepper());
                warn!(tenant_id = %tenant.id, "login rejected: unknown email");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        if !user.is_active {
            warn!(tenant_id = %tenant.id, user_id = %user.id, "login rejected: user inactive");
            return Err(AuthError::UserInactive);
        }

        if !password::verify_password(&input.password, &user.password_hash, self.pepper()) {
            warn!(tenant_id = %tenant.id, user_id = %user.id, "login rejected: bad password");
            return Err(AuthError::InvalidCredentials);
        }

        let user = self
            .store(self.user_repo.update(
                tenant.id,
                user.id,
                UpdateUser {
                    last_login_at: Some(Utc::now()),
                    ..Default::default()
                },
            ))
            .await?;

        let response = self
            .open_session(&user, input.ip_address, input.user_agent)
            .await?;
        info!(
            tenant_id = %tenant.id,
            user_id = %user.id,
            session_id = %response.session_id,
            "user logged in"
        );
        Ok(response)
    }

    /// Exchange a refresh token for a new token pair.
    ///
    /// The presented token is single-use: its session is rotated to the
    /// new token with a compare-and-swap, so a replay or a concurrent
    /// second use fails. Session expiry is not extended.
    pub async fn refresh(&self, input: RefreshInput) -> Result<AuthResponse, AuthError> {
        let claims = self
            .tokens
            .validate(&input.refresh_token, TokenKind::Refresh)
            .map_err(|e| {
                debug!(error = %e, "refresh token rejected");
                AuthError::InvalidRefreshToken
            })?;

        let old_hash = token::hash_refresh_token(&input.refresh_token);
        let session = match self
            .store(self.session_repo.get_by_user_and_token_hash(
                claims.tenant_id,
                claims.user_id,
                &old_hash,
            ))
            .await
        {
            Ok(session) => session,
            Err(e) if e.is_not_found() => {
                warn!(
                    tenant_id = %claims.tenant_id,
                    user_id = %claims.user_id,
                    "refresh rejected: no session for token"
                );
                return Err(AuthError::SessionExpired);
            }
            Err(e) => return Err(e.into()),
        };

        if session.is_expired() {
            debug!(session_id = %session.id, "refresh rejected: session expired");
            return Err(AuthError::SessionExpired);
        }

        let user = match self
            .store(self.user_repo.get_by_id(claims.tenant_id, claims.user_id))
            .await
        {
            Ok(user) if user.is_active => user,
            Ok(_) => return Err(AuthError::UserInactive),
            Err(e) if e.is_not_found() => return Err(AuthError::UserInactive),
            Err(e) => return Err(e.into()),
        };

        let access = self.tokens.issue_access(&user)?;
        let refresh = self.tokens.issue_refresh(&user)?;
        let new_hash = token::hash_refresh_token(&refresh.token);

        match self
            .store(self.session_repo.rotate_token(
                session.tenant_id,
                session.id,
                &old_hash,
                &new_hash,
                Utc::now(),
            ))
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                warn!(session_id = %session.id, "refresh rejected: token already rotated");
                return Err(AuthError::SessionExpired);
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            tenant_id = %user.tenant_id,
            user_id = %user.id,
            session_id = %session.id,
            "session refreshed"
        );
        Ok(AuthResponse {
            access_token: access.token,
            refresh_token: refresh.token,
            token_type: "Bearer",
            expires_in: self.tokens.access_lifetime_secs(),
            session_id: session.id,
            user: None,
        })
    }

    /// End one session of a user. Unknown sessions are ignored.
    pub async fn logout(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        session_id: Uuid,
    ) -> Result<(), AuthError> {
        self.store(self.session_repo.delete(tenant_id, user_id, session_id))
            .await?;
        info!(%tenant_id, %user_id, %session_id, "user logged out");
        Ok(())
    }

    /// Revoke all sessions for a user (e.g. on password change).
    pub async fn revoke_all_sessions(&self, tenant_id: Uuid, user_id: Uuid) -> Result<(), AuthError> {
        self.store(self.session_repo.delete_user_sessions(tenant_id, user_id))
            .await?;
        info!(%tenant_id, %user_id, "all sessions revoked");
        Ok(())
    }

    pub async fn get_profile(&self, tenant_id: Uuid, user_id: Uuid) -> Result<UserProfile, AuthError> {
        match self.store(self.user_repo.get_by_id(tenant_id, user_id)).await {
            Ok(user) => Ok(user.into()),
            Err(e) if e.is_not_found() => Err(AuthError::UserNotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Page through the users of the caller's tenant. Admins only.
    pub async fn list_users(
        &self,
        caller: &ValidatedClaims,
        pagination: Pagination,
    ) -> Result<PaginatedResult<UserProfile>, AuthError> {
        caller.require_role(UserRole::Admin)?;
        let tenant = self.resolver.resolve_by_id(caller.0.tenant_id).await?;

        let page = self.store(self.user_repo.list(tenant.id, pagination)).await?;
        debug!(tenant_id = %tenant.id, total = page.total, "listed users");

        Ok(PaginatedResult {
            items: page.items.into_iter().map(UserProfile::from).collect(),
            total: page.total,
            offset: page.offset,
            limit: page.limit,
        })
    }

    /// Validate an `Authorization` header for a request already
    /// resolved to `tenant_id`.
    pub fn authenticate(&self, authorization: &str, tenant_id: Uuid) -> Result<ValidatedClaims, AuthError> {
        let claims = self.tokens.authenticate_bearer(authorization)?;
        claims.ensure_tenant(tenant_id)?;
        Ok(claims)
    }

    async fn open_session(
        &self,
        user: &User,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<AuthResponse, AuthError> {
        let access = self.tokens.issue_access(user)?;
        let refresh = self.tokens.issue_refresh(user)?;
        let expires_at =
            Utc::now() + chrono::Duration::seconds(self.config.refresh_token_lifetime_secs as i64);

        let session = self
            .store(self.session_repo.create(CreateSession {
                tenant_id: user.tenant_id,
                user_id: user.id,
                token_hash: token::hash_refresh_token(&refresh.token),
                ip_address,
                user_agent,
                expires_at,
            }))
            .await?;

        Ok(AuthResponse {
            access_token: access.token,
            refresh_token: refresh.token,
            token_type: "Bearer",
            expires_in: self.tokens.access_lifetime_secs(),
            session_id: session.id,
            user: Some(UserProfile::from(user.clone())),
        })
    }

    fn validate_registration(&self, email: &str, input: &RegisterInput) -> Result<(), AuthError> {
        if !is_plausible_email(email) {
            return Err(AuthError::Validation("invalid email address".into()));
        }

        let min = self.config.min_password_length;
        if input.password.chars().count() < min {
            return Err(AuthError::Validation(format!(
                "password must be at least {min} characters"
            )));
        }

        for (field, value) in [("first_name", &input.first_name), ("last_name", &input.last_name)] {
            if let Some(value) = value {
                let len = value.trim().chars().count();
                if len == 0 || len > MAX_NAME_LENGTH {
                    return Err(AuthError::Validation(format!(
                        "{field} must be 1 to {MAX_NAME_LENGTH} characters"
                    )));
                }
            }
        }

        Ok(())
    }

    fn pepper(&self) -> Option<&str> {
        self.config.pepper.as_deref()
    }

    async fn store<R>(&self, fut: impl Future<Output = TenauthResult<R>>) -> TenauthResult<R> {
        bounded(Duration::from_secs(self.config.store_timeout_secs), fut).await
    }
}

/// A real Argon2id hash, with the same parameters as stored hashes,
/// of a password no user can have chosen.
fn decoy_hash(pepper: Option<&str>) -> Result<String, AuthError> {
    password::hash_password(DECOY_PASSWORD, pepper)
}

/// `local@domain.tld` with no whitespace. Deliverability is not checked.
fn is_plausible_email(email: &str) -> bool {
    if email.len() > MAX_EMAIL_LENGTH || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(is_plausible_email("alice@example.com"));
        assert!(is_plausible_email("a.b+c@mail.example.co"));
        assert!(!is_plausible_email("alice"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("alice@"));
        assert!(!is_plausible_email("alice@localhost"));
        assert!(!is_plausible_email("alice@@example.com"));
        assert!(!is_plausible_email("al ice@example.com"));
        assert!(!is_plausible_email("alice@.com"));
    }

    #[test]
    fn decoy_hash_costs_the_same_as_a_stored_hash() {
        let decoy = decoy_hash(Some("pepper")).unwrap();
        let stored = password::hash_password("password123", Some("pepper")).unwrap();

        // $argon2id$v=19$m=19456,t=2,p=1$salt$hash
        let params = |h: &str| h.split('$').take(4).collect::<Vec<_>>().join("$");
        assert_eq!(params(&decoy), params(&stored));
        assert!(decoy.starts_with("$argon2id$"));
        assert!(!password::verify_password("password123", &decoy, Some("pepper")));
    }

    #[tokio::test]
    async fn bounded_reports_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, TenauthError>(())
        };
        let err = bounded(Duration::from_millis(10), slow).await.unwrap_err();
        assert!(matches!(err, TenauthError::Timeout(_)));
    }
}
