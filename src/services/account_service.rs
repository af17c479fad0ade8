use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::db::{Account, NewAccount};

#[derive(Debug, Error)]
pub enum AccountError {
    /// A field-level rejection, rendered as `{"<field>": ["<message>"]}`
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("Account not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AccountError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for AccountError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Public view of an account, shaped for API responses
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub email: String,
    pub name: String,
}

impl From<Account> for Profile {
    fn from(account: Account) -> Self {
        Self {
            email: account.email,
            name: account.name,
        }
    }
}

/// Partial profile update; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub password: Option<String>,
}

#[async_trait]
pub trait AccountService: Send + Sync {
    /// Register a new account. The email must be non-blank and not already
    /// registered; the password is optional and hashed before storage.
    async fn create_account(&self, new: NewAccount) -> Result<Profile, AccountError>;

    /// Create an account with staff and superuser privileges
    async fn create_superuser(&self, email: &str, password: &str) -> Result<Profile, AccountError>;

    async fn get_profile(&self, account_id: i32) -> Result<Profile, AccountError>;

    async fn update_profile(
        &self,
        account_id: i32,
        update: ProfileUpdate,
    ) -> Result<Profile, AccountError>;
}
