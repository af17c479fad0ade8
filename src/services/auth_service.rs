use async_trait::async_trait;
use thiserror::Error;

use crate::db::Account;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Covers unknown emails, wrong passwords, and disabled accounts alike
    /// so a caller cannot distinguish which one failed.
    #[error("Unable to authenticate with provided credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Check credentials and return the matching active account
    async fn authenticate(&self, email: &str, password: &str) -> Result<Account, AuthError>;

    /// Return the account's bearer token key, creating one on first use.
    /// Subsequent calls return the same key.
    async fn issue_or_get_token(&self, account_id: i32) -> Result<String, AuthError>;

    /// Resolve a bearer token key to its owning active account
    async fn resolve_token(&self, key: &str) -> Result<Account, AuthError>;
}
