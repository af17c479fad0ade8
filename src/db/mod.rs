use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;

pub mod migrator;
pub mod repositories;

pub use repositories::account::{
    Account, AccountRepoError, NewAccount, hash_password, normalize_email,
};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
    security: SecurityConfig,
}

impl Store {
    pub async fn new(db_url: &str, security: SecurityConfig) -> Result<Self> {
        Self::with_pool_options(db_url, security, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        security: SecurityConfig,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // An in-memory sqlite database exists per connection, so the pool
        // must stay at a single connection or each acquire may see an
        // empty schema.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        if !in_memory {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn, security })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn account_repo(&self) -> repositories::account::AccountRepository {
        repositories::account::AccountRepository::new(self.conn.clone(), self.security.clone())
    }

    fn token_repo(&self) -> repositories::token::TokenRepository {
        repositories::token::TokenRepository::new(self.conn.clone())
    }

    pub async fn create_account(&self, new: NewAccount) -> Result<Account, AccountRepoError> {
        self.account_repo().insert(new).await
    }

    pub async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.account_repo().get_by_email(email).await
    }

    pub async fn find_account_by_id(&self, id: i32) -> Result<Option<Account>> {
        self.account_repo().get_by_id(id).await
    }

    pub async fn verify_account_password(&self, email: &str, password: &str) -> Result<bool> {
        self.account_repo().verify_password(email, password).await
    }

    pub async fn update_account_profile(
        &self,
        id: i32,
        name: Option<String>,
        password: Option<String>,
    ) -> Result<Account> {
        self.account_repo().update_profile(id, name, password).await
    }

    pub async fn promote_to_superuser(&self, id: i32) -> Result<Account> {
        self.account_repo().set_superuser(id).await
    }

    pub async fn get_or_create_token(&self, account_id: i32) -> Result<String> {
        self.token_repo().get_or_create(account_id).await
    }

    pub async fn find_account_by_token(&self, key: &str) -> Result<Option<Account>> {
        self.token_repo().get_account(key).await
    }
}

/// Block until the database accepts connections, probing once per interval.
pub async fn wait_for_database(db_url: &str, interval: Duration) -> Result<()> {
    info!("Waiting for database");

    loop {
        match probe(db_url).await {
            Ok(()) => {
                info!("Database available");
                return Ok(());
            }
            Err(_) => {
                info!("Database unavailable, waiting {}s", interval.as_secs());
                tokio::time::sleep(interval).await;
            }
        }
    }
}

async fn probe(db_url: &str) -> Result<()> {
    let conn = Database::connect(db_url).await?;
    let backend = conn.get_database_backend();
    conn.query_one(Statement::from_string(backend, "SELECT 1".to_string()))
        .await?;
    Ok(())
}
