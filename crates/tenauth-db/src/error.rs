//! Database-specific error types and conversions.

use tenauth_core::error::TenauthError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("cannot reach store at {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: surrealdb::Error,
    },

    #[error("sign-in as {username} rejected: {source}")]
    SignIn {
        username: String,
        #[source]
        source: surrealdb::Error,
    },

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Corrupt row: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity}")]
    AlreadyExists { entity: String },
}

impl DbError {
    /// Classify a failed statement, turning unique-index violations
    /// into [`DbError::AlreadyExists`].
    pub(crate) fn from_statement(entity: &str, err: impl std::fmt::Display) -> Self {
        let message = err.to_string();
        if message.contains("already contains") || message.contains("already exists") {
            DbError::AlreadyExists {
                entity: entity.into(),
            }
        } else {
            DbError::Query(message)
        }
    }
}

impl From<DbError> for TenauthError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => TenauthError::NotFound { entity, id },
            DbError::AlreadyExists { entity } => TenauthError::AlreadyExists { entity },
            other => TenauthError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_index_violation_maps_to_already_exists() {
        let err = DbError::from_statement(
            "user",
            "Database index `idx_user_tenant_email` already contains ['t', 'a@x.com']",
        );
        assert!(matches!(err, DbError::AlreadyExists { .. }));
        assert!(matches!(
            TenauthError::from(err),
            TenauthError::AlreadyExists { .. }
        ));
    }

    #[test]
    fn other_statement_errors_are_database_errors() {
        let err = DbError::from_statement("user", "Found NONE for field `email`");
        assert!(matches!(TenauthError::from(err), TenauthError::Database(_)));
    }
}
