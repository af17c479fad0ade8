pub use super::accounts::Entity as Accounts;
pub use super::tokens::Entity as Tokens;
