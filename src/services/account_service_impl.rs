use async_trait::async_trait;

use super::account_service::{AccountError, AccountService, Profile, ProfileUpdate};
use crate::db::{AccountRepoError, NewAccount, Store};

pub struct SeaOrmAccountService {
    store: Store,
}

impl SeaOrmAccountService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AccountService for SeaOrmAccountService {
    async fn create_account(&self, new: NewAccount) -> Result<Profile, AccountError> {
        if new.email.trim().is_empty() {
            return Err(AccountError::validation(
                "email",
                "This field may not be blank.",
            ));
        }

        match self.store.create_account(new).await {
            Ok(account) => Ok(Profile::from(account)),
            Err(AccountRepoError::DuplicateEmail) => Err(AccountError::validation(
                "email",
                "An account with this email already exists.",
            )),
            Err(AccountRepoError::Other(err)) => Err(AccountError::Database(err.to_string())),
        }
    }

    async fn create_superuser(&self, email: &str, password: &str) -> Result<Profile, AccountError> {
        if email.trim().is_empty() {
            return Err(AccountError::validation(
                "email",
                "This field may not be blank.",
            ));
        }

        let account = match self
            .store
            .create_account(NewAccount {
                email: email.to_string(),
                password: Some(password.to_string()),
                name: String::new(),
            })
            .await
        {
            Ok(account) => account,
            Err(AccountRepoError::DuplicateEmail) => {
                return Err(AccountError::validation(
                    "email",
                    "An account with this email already exists.",
                ));
            }
            Err(AccountRepoError::Other(err)) => {
                return Err(AccountError::Database(err.to_string()));
            }
        };

        // Promote through the id returned by the insert; no re-fetch that
        // could race with a concurrent change.
        let promoted = self.store.promote_to_superuser(account.id).await?;

        Ok(Profile::from(promoted))
    }

    async fn get_profile(&self, account_id: i32) -> Result<Profile, AccountError> {
        let account = self
            .store
            .find_account_by_id(account_id)
            .await?
            .ok_or(AccountError::NotFound)?;

        Ok(Profile::from(account))
    }

    async fn update_profile(
        &self,
        account_id: i32,
        update: ProfileUpdate,
    ) -> Result<Profile, AccountError> {
        let account = self
            .store
            .update_account_profile(account_id, update.name, update.password)
            .await?;

        Ok(Profile::from(account))
    }
}
