//! tenauth Auth: tenant resolution, Argon2id password hashing, JWT
//! issuance/validation and the authentication orchestrator.

pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod tenant;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{AuthResponse, AuthService, LoginInput, RefreshInput, RegisterInput};
pub use tenant::TenantResolver;
pub use token::{TokenClaims, TokenKind, TokenService, ValidatedClaims};
