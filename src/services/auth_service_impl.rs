use async_trait::async_trait;

use super::auth_service::{AuthError, AuthService};
use crate::db::{Account, Store, normalize_email};

pub struct SeaOrmAuthService {
    store: Store,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Account, AuthError> {
        let email = normalize_email(email);

        let valid = self
            .store
            .verify_account_password(&email, password)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        let account = self
            .store
            .find_account_by_email(&email)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;

        if !account.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(account)
    }

    async fn issue_or_get_token(&self, account_id: i32) -> Result<String, AuthError> {
        self.store
            .get_or_create_token(account_id)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    async fn resolve_token(&self, key: &str) -> Result<Account, AuthError> {
        let account = self
            .store
            .find_account_by_token(key)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::InvalidToken)?;

        if !account.is_active {
            return Err(AuthError::InvalidToken);
        }

        Ok(account)
    }
}
