use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use super::account::Account;
use crate::entities::{accounts, tokens};

pub struct TokenRepository {
    conn: DatabaseConnection,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Return the existing token key for an account, or mint and persist a
    /// new one. Idempotent: repeated calls never bind a second key to the
    /// same account. A racing double-issue is resolved by the unique index
    /// on `account_id`; the loser re-reads the winner's key.
    pub async fn get_or_create(&self, account_id: i32) -> Result<String> {
        if let Some(existing) = self.get_key_for_account(account_id).await? {
            return Ok(existing);
        }

        let key = generate_token_key();
        let now = chrono::Utc::now().to_rfc3339();

        let row = tokens::ActiveModel {
            key: Set(key.clone()),
            account_id: Set(account_id),
            created_at: Set(now),
            ..Default::default()
        };

        match row.insert(&self.conn).await {
            Ok(_) => Ok(key),
            Err(err) if is_unique_violation(&err) => self
                .get_key_for_account(account_id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Token missing after insert conflict")),
            Err(err) => Err(anyhow::Error::from(err).context("Failed to insert token")),
        }
    }

    async fn get_key_for_account(&self, account_id: i32) -> Result<Option<String>> {
        let token = tokens::Entity::find()
            .filter(tokens::Column::AccountId.eq(account_id))
            .one(&self.conn)
            .await
            .context("Failed to query token by account")?;

        Ok(token.map(|t| t.key))
    }

    /// Resolve a token key to its owning account
    pub async fn get_account(&self, key: &str) -> Result<Option<Account>> {
        let token = tokens::Entity::find()
            .filter(tokens::Column::Key.eq(key))
            .one(&self.conn)
            .await
            .context("Failed to query token by key")?;

        let Some(token) = token else {
            return Ok(None);
        };

        let account = accounts::Entity::find_by_id(token.account_id)
            .one(&self.conn)
            .await
            .context("Failed to query token owner")?;

        Ok(account.map(Account::from))
    }
}

fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    )
}

/// Generate a random bearer token key (40 character hex string)
#[must_use]
pub fn generate_token_key() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 20] = rng.random();

    bytes.iter().fold(String::with_capacity(40), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_key_shape() {
        let key = generate_token_key();
        assert_eq!(key.len(), 40);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_token_key_unique() {
        assert_ne!(generate_token_key(), generate_token_key());
    }
}
