//! Process configuration read from `TENAUTH_*` environment variables.
//!
//! A `.env` file in the working directory is loaded first when present.

use std::fs;

use anyhow::{Context, Result};
use tenauth_auth::AuthConfig;
use tenauth_db::{DbConfig, DbCredentials};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db: DbConfig,
    pub auth: AuthConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// Key material is taken inline from `TENAUTH_JWT_PRIVATE_KEY` /
    /// `TENAUTH_JWT_PUBLIC_KEY`, or read from the files named by the
    /// matching `*_PATH` variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_defaults = DbConfig::default();
        let endpoint = lookup("TENAUTH_DB_URL").unwrap_or(db_defaults.endpoint);
        // The embedded engine has no users to sign in as.
        let credentials = if endpoint.starts_with("mem:") {
            None
        } else {
            Some(DbCredentials {
                username: lookup("TENAUTH_DB_USERNAME").unwrap_or_else(|| "root".into()),
                password: lookup("TENAUTH_DB_PASSWORD").unwrap_or_else(|| "root".into()),
            })
        };
        let db = DbConfig {
            endpoint,
            namespace: lookup("TENAUTH_DB_NAMESPACE").unwrap_or(db_defaults.namespace),
            database: lookup("TENAUTH_DB_DATABASE").unwrap_or(db_defaults.database),
            credentials,
        };

        let defaults = AuthConfig::default();
        let auth = AuthConfig {
            jwt_private_key_pem: pem(&lookup, "TENAUTH_JWT_PRIVATE_KEY")?,
            jwt_public_key_pem: pem(&lookup, "TENAUTH_JWT_PUBLIC_KEY")?,
            access_token_lifetime_secs: number(
                &lookup,
                "TENAUTH_ACCESS_TOKEN_TTL_SECS",
                defaults.access_token_lifetime_secs,
            )?,
            refresh_token_lifetime_secs: number(
                &lookup,
                "TENAUTH_REFRESH_TOKEN_TTL_SECS",
                defaults.refresh_token_lifetime_secs,
            )?,
            jwt_issuer: lookup("TENAUTH_JWT_ISSUER").unwrap_or(defaults.jwt_issuer),
            pepper: lookup("TENAUTH_PEPPER").filter(|p| !p.is_empty()),
            min_password_length: number(
                &lookup,
                "TENAUTH_MIN_PASSWORD_LENGTH",
                defaults.min_password_length,
            )?,
            store_timeout_secs: number(
                &lookup,
                "TENAUTH_STORE_TIMEOUT_SECS",
                defaults.store_timeout_secs,
            )?,
        };

        Ok(Self { db, auth })
    }
}

fn pem(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    if let Some(inline) = lookup(key) {
        return Ok(inline);
    }
    let path_key = format!("{key}_PATH");
    let path = lookup(&path_key).with_context(|| format!("either {key} or {path_key} must be set"))?;
    fs::read_to_string(&path).with_context(|| format!("reading {path_key} ({path})"))
}

fn number<N>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: N) -> Result<N>
where
    N: std::str::FromStr,
    N::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a number, got {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("TENAUTH_JWT_PRIVATE_KEY", "private"),
            ("TENAUTH_JWT_PUBLIC_KEY", "public"),
        ]))
        .unwrap();

        assert_eq!(config.db.namespace, "tenauth");
        assert_eq!(config.auth.jwt_private_key_pem, "private");
        assert_eq!(config.auth.access_token_lifetime_secs, 3600);
        assert_eq!(config.auth.refresh_token_lifetime_secs, 604_800);
        assert_eq!(config.auth.min_password_length, 8);
        assert!(config.auth.pepper.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("TENAUTH_JWT_PRIVATE_KEY", "private"),
            ("TENAUTH_JWT_PUBLIC_KEY", "public"),
            ("TENAUTH_DB_URL", "ws://db:8000"),
            ("TENAUTH_DB_USERNAME", "tenauth"),
            ("TENAUTH_ACCESS_TOKEN_TTL_SECS", "900"),
            ("TENAUTH_PEPPER", "pepper"),
            ("TENAUTH_STORE_TIMEOUT_SECS", " 2 "),
        ]))
        .unwrap();

        assert_eq!(config.db.endpoint, "ws://db:8000");
        let credentials = config.db.credentials.unwrap();
        assert_eq!(credentials.username, "tenauth");
        assert_eq!(credentials.password, "root");
        assert_eq!(config.auth.access_token_lifetime_secs, 900);
        assert_eq!(config.auth.pepper.as_deref(), Some("pepper"));
        assert_eq!(config.auth.store_timeout_secs, 2);
    }

    #[test]
    fn embedded_store_needs_no_credentials() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("TENAUTH_JWT_PRIVATE_KEY", "private"),
            ("TENAUTH_JWT_PUBLIC_KEY", "public"),
            ("TENAUTH_DB_URL", "mem://"),
            ("TENAUTH_DB_USERNAME", "ignored"),
        ]))
        .unwrap();

        assert_eq!(config.db.endpoint, "mem://");
        assert!(config.db.credentials.is_none());
    }

    #[test]
    fn missing_keys_and_bad_numbers_fail() {
        assert!(ServerConfig::from_lookup(lookup(&[])).is_err());
        assert!(
            ServerConfig::from_lookup(lookup(&[
                ("TENAUTH_JWT_PRIVATE_KEY", "private"),
                ("TENAUTH_JWT_PUBLIC_KEY", "public"),
                ("TENAUTH_MIN_PASSWORD_LENGTH", "eight"),
            ]))
            .is_err()
        );
    }
}
