use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use thiserror::Error;
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::accounts;

/// Account data returned from the repository (without the password hash)
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<accounts::Model> for Account {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            is_active: model.is_active,
            is_staff: model.is_staff,
            is_superuser: model.is_superuser,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Fields for a new account row. The password is hashed before insert;
/// `None` stores a NULL hash, which can never authenticate.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: Option<String>,
    pub name: String,
}

#[derive(Debug, Error)]
pub enum AccountRepoError {
    /// The unique index on email rejected the row. Covers the racing-insert
    /// case where a plain lookup would have said the email was free.
    #[error("email already registered")]
    DuplicateEmail,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub struct AccountRepository {
    conn: DatabaseConnection,
    security: SecurityConfig,
}

impl AccountRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection, security: SecurityConfig) -> Self {
        Self { conn, security }
    }

    /// Insert a new account. The email is normalized before storage so the
    /// unique index sees one spelling per address.
    pub async fn insert(&self, new: NewAccount) -> Result<Account, AccountRepoError> {
        let email = normalize_email(&new.email);

        let password_hash = match new.password {
            Some(password) => {
                let security = self.security.clone();
                let hash = task::spawn_blocking(move || hash_password(&password, &security))
                    .await
                    .context("Password hashing task panicked")??;
                Some(hash)
            }
            None => None,
        };

        let now = chrono::Utc::now().to_rfc3339();

        let row = accounts::ActiveModel {
            email: Set(email),
            name: Set(new.name),
            password_hash: Set(password_hash),
            is_active: Set(true),
            is_staff: Set(false),
            is_superuser: Set(false),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        match row.insert(&self.conn).await {
            Ok(model) => Ok(Account::from(model)),
            Err(err) if is_unique_violation(&err) => Err(AccountRepoError::DuplicateEmail),
            Err(err) => Err(AccountRepoError::Other(
                anyhow::Error::from(err).context("Failed to insert account"),
            )),
        }
    }

    /// Get account by normalized email
    pub async fn get_by_email(&self, email: &str) -> Result<Option<Account>> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query account by email")?;

        Ok(account.map(Account::from))
    }

    /// Get account by ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<Account>> {
        let account = accounts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account by ID")?;

        Ok(account.map(Account::from))
    }

    /// Verify a password for the account with the given normalized email.
    /// Returns `false` for unknown emails and NULL hashes so the caller can
    /// keep the failure indistinguishable from a wrong password. The miss
    /// paths still pay for one full Argon2 run, keeping them
    /// indistinguishable through response timing as well.
    /// Note: uses `spawn_blocking` because Argon2 verification is
    /// CPU-intensive and would block the async runtime if run directly.
    pub async fn verify_password(&self, email: &str, password: &str) -> Result<bool> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query account for password verification")?;

        let stored_hash = account.and_then(|a| a.password_hash);

        let password = password.to_string();
        let security = self.security.clone();

        let is_valid = task::spawn_blocking(move || match stored_hash {
            Some(hash) => {
                let parsed_hash = PasswordHash::new(&hash)
                    .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

                let argon2 = Argon2::default();
                Ok::<bool, anyhow::Error>(
                    argon2
                        .verify_password(password.as_bytes(), &parsed_hash)
                        .is_ok(),
                )
            }
            None => {
                hash_password(&password, &security)?;
                Ok(false)
            }
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid)
    }

    /// Update name and/or password for an account. A new password is hashed
    /// before storage; `updated_at` is always refreshed.
    pub async fn update_profile(
        &self,
        id: i32,
        name: Option<String>,
        password: Option<String>,
    ) -> Result<Account> {
        let account = accounts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account for profile update")?
            .ok_or_else(|| anyhow::anyhow!("Account not found: {id}"))?;

        let mut active: accounts::ActiveModel = account.into();

        if let Some(name) = name {
            active.name = Set(name);
        }

        if let Some(password) = password {
            let security = self.security.clone();
            let new_hash = task::spawn_blocking(move || hash_password(&password, &security))
                .await
                .context("Password hashing task panicked")??;
            active.password_hash = Set(Some(new_hash));
        }

        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        let model = active.update(&self.conn).await?;

        Ok(Account::from(model))
    }

    /// Set the staff and superuser flags for an account
    pub async fn set_superuser(&self, id: i32) -> Result<Account> {
        let account = accounts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account for superuser promotion")?
            .ok_or_else(|| anyhow::anyhow!("Account not found: {id}"))?;

        let mut active: accounts::ActiveModel = account.into();
        active.is_staff = Set(true);
        active.is_superuser = Set(true);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        let model = active.update(&self.conn).await?;

        Ok(Account::from(model))
    }
}

fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    )
}

/// Normalize an email address: trim surrounding whitespace and lower-case
/// the domain segment. The local part keeps its case.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Hash a password using Argon2id with params from the security config.
pub fn hash_password(password: &str, security: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        security.argon2_memory_cost_kib,
        security.argon2_time_cost,
        security.argon2_parallelism,
        None, // output length (use default)
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email_lowercases_domain() {
        assert_eq!(normalize_email("Test@EXAMPLE.COM"), "Test@example.com");
        assert_eq!(normalize_email("test2@Example.com"), "test2@example.com");
    }

    #[test]
    fn test_normalize_email_preserves_local_part() {
        assert_eq!(normalize_email("TEST3@EXAMPLE.COM"), "TEST3@example.com");
    }

    #[test]
    fn test_normalize_email_trims_whitespace() {
        assert_eq!(normalize_email("  test@example.com "), "test@example.com");
    }

    #[test]
    fn test_normalize_email_without_at_sign() {
        assert_eq!(normalize_email("not-an-email"), "not-an-email");
    }

    #[test]
    fn test_hash_password_verifies_and_differs_from_plaintext() {
        let security = SecurityConfig::default();
        let hash = hash_password("testpass123", &security).unwrap();

        assert_ne!(hash, "testpass123");
        assert!(hash.starts_with("$argon2id$"));

        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"testpass123", &parsed)
                .is_ok()
        );
        assert!(
            Argon2::default()
                .verify_password(b"wrongpass", &parsed)
                .is_err()
        );
    }

    #[test]
    fn test_hash_password_is_salted() {
        let security = SecurityConfig::default();
        let first = hash_password("testpass123", &security).unwrap();
        let second = hash_password("testpass123", &security).unwrap();
        assert_ne!(first, second);
    }
}
