use std::sync::Arc;

use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

use accountd::config::SecurityConfig;
use accountd::db::{NewAccount, Store};
use accountd::entities::accounts;
use accountd::services::{
    AccountError, AccountService, AuthError, AuthService, SeaOrmAccountService, SeaOrmAuthService,
};

async fn spawn_store() -> Store {
    Store::new("sqlite::memory:", SecurityConfig::default())
        .await
        .expect("Failed to create store")
}

fn new_account(email: &str, password: &str, name: &str) -> NewAccount {
    NewAccount {
        email: email.to_string(),
        password: Some(password.to_string()),
        name: name.to_string(),
    }
}

#[tokio::test]
async fn test_create_account_hashes_password() {
    let store = spawn_store().await;
    let service = SeaOrmAccountService::new(store.clone());

    service
        .create_account(new_account("test@example.com", "testpass123", "Test"))
        .await
        .unwrap();

    let row = accounts::Entity::find()
        .filter(accounts::Column::Email.eq("test@example.com"))
        .one(&store.conn)
        .await
        .unwrap()
        .unwrap();

    let hash = row.password_hash.unwrap();
    assert_ne!(hash, "testpass123");
    assert!(hash.starts_with("$argon2id$"));

    assert!(
        store
            .verify_account_password("test@example.com", "testpass123")
            .await
            .unwrap()
    );
    assert!(
        !store
            .verify_account_password("test@example.com", "wrongpass")
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_create_account_normalizes_email_domain() {
    let store = spawn_store().await;
    let service = SeaOrmAccountService::new(store.clone());

    let profile = service
        .create_account(new_account("Test@EXAMPLE.COM", "testpass123", "Test"))
        .await
        .unwrap();

    assert_eq!(profile.email, "Test@example.com");

    let stored = store
        .find_account_by_email("Test@example.com")
        .await
        .unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn test_create_account_rejects_blank_email() {
    let store = spawn_store().await;
    let service = SeaOrmAccountService::new(store);

    let err = service
        .create_account(new_account("   ", "testpass123", "Test"))
        .await
        .unwrap_err();

    match err {
        AccountError::Validation { field, .. } => assert_eq!(field, "email"),
        other => panic!("Unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_create_account_rejects_duplicate_email() {
    let store = spawn_store().await;
    let service = SeaOrmAccountService::new(store);

    service
        .create_account(new_account("test@example.com", "testpass123", "Test"))
        .await
        .unwrap();

    let err = service
        .create_account(new_account("test@example.com", "otherpass123", "Other"))
        .await
        .unwrap_err();

    match err {
        AccountError::Validation { field, .. } => assert_eq!(field, "email"),
        other => panic!("Unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_authenticate_failures_are_indistinguishable() {
    let store = spawn_store().await;
    let accounts_svc = SeaOrmAccountService::new(store.clone());
    let auth = SeaOrmAuthService::new(store);

    accounts_svc
        .create_account(new_account("test@example.com", "testpass123", "Test"))
        .await
        .unwrap();

    let unknown_email = auth
        .authenticate("nobody@example.com", "testpass123")
        .await
        .unwrap_err();
    let wrong_password = auth
        .authenticate("test@example.com", "wrongpass")
        .await
        .unwrap_err();

    assert_eq!(unknown_email.to_string(), wrong_password.to_string());
    assert!(matches!(unknown_email, AuthError::InvalidCredentials));
    assert!(matches!(wrong_password, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn test_issue_token_is_idempotent() {
    let store = spawn_store().await;
    let accounts_svc = SeaOrmAccountService::new(store.clone());
    let auth = SeaOrmAuthService::new(store.clone());

    accounts_svc
        .create_account(new_account("test@example.com", "testpass123", "Test"))
        .await
        .unwrap();

    let account = store
        .find_account_by_email("test@example.com")
        .await
        .unwrap()
        .unwrap();

    let first = auth.issue_or_get_token(account.id).await.unwrap();
    let second = auth.issue_or_get_token(account.id).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 40);

    let resolved = auth.resolve_token(&first).await.unwrap();
    assert_eq!(resolved.id, account.id);
}

#[tokio::test]
async fn test_inactive_account_cannot_authenticate_or_resolve() {
    let store = spawn_store().await;
    let accounts_svc = SeaOrmAccountService::new(store.clone());
    let auth = SeaOrmAuthService::new(store.clone());

    accounts_svc
        .create_account(new_account("test@example.com", "testpass123", "Test"))
        .await
        .unwrap();

    let account = store
        .find_account_by_email("test@example.com")
        .await
        .unwrap()
        .unwrap();

    let token = auth.issue_or_get_token(account.id).await.unwrap();

    let row = accounts::Entity::find_by_id(account.id)
        .one(&store.conn)
        .await
        .unwrap()
        .unwrap();
    let mut active: accounts::ActiveModel = row.into();
    active.is_active = Set(false);
    active.update(&store.conn).await.unwrap();

    let err = auth
        .authenticate("test@example.com", "testpass123")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));

    let err = auth.resolve_token(&token).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken));
}

#[tokio::test]
async fn test_verify_password_false_without_usable_password() {
    let store = spawn_store().await;

    // Unknown email
    assert!(
        !store
            .verify_account_password("nobody@example.com", "testpass123")
            .await
            .unwrap()
    );

    // Account created without a password can never authenticate
    store
        .create_account(NewAccount {
            email: "nopass@example.com".to_string(),
            password: None,
            name: "No Pass".to_string(),
        })
        .await
        .unwrap();

    assert!(
        !store
            .verify_account_password("nopass@example.com", "testpass123")
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_create_superuser_duplicate_email_rejected() {
    let store = spawn_store().await;
    let service = SeaOrmAccountService::new(store);

    service
        .create_superuser("admin@example.com", "adminpass123")
        .await
        .unwrap();

    let err = service
        .create_superuser("admin@example.com", "otherpass123")
        .await
        .unwrap_err();

    match err {
        AccountError::Validation { field, .. } => assert_eq!(field, "email"),
        other => panic!("Unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_create_superuser_sets_flags() {
    let store = spawn_store().await;
    let service = SeaOrmAccountService::new(store.clone());

    service
        .create_superuser("admin@example.com", "adminpass123")
        .await
        .unwrap();

    let account = store
        .find_account_by_email("admin@example.com")
        .await
        .unwrap()
        .unwrap();

    assert!(account.is_staff);
    assert!(account.is_superuser);
    assert!(account.is_active);
}

#[tokio::test]
async fn test_update_profile_via_trait_object() {
    let store = spawn_store().await;
    let service: Arc<dyn AccountService> = Arc::new(SeaOrmAccountService::new(store.clone()));

    service
        .create_account(new_account("test@example.com", "testpass123", "Old"))
        .await
        .unwrap();

    let account = store
        .find_account_by_email("test@example.com")
        .await
        .unwrap()
        .unwrap();

    let profile = service
        .update_profile(
            account.id,
            accountd::services::ProfileUpdate {
                name: Some("New".to_string()),
                password: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(profile.name, "New");
    assert_eq!(profile.email, "test@example.com");
}
