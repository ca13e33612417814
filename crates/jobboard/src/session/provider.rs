use async_trait::async_trait;

use super::domain::{UserId, UserRecord};

/// External identity provider that owns credentials.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_account(&self, email: &str, password: &str) -> Result<UserId, IdentityError>;

    async fn verify(&self, email: &str, password: &str) -> Result<UserId, IdentityError>;
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("an account already exists for {0}")]
    EmailTaken(String),
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Document collection holding user profiles keyed by uid.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn save(&self, record: UserRecord) -> Result<(), DirectoryError>;

    async fn find(&self, uid: &UserId) -> Result<Option<UserRecord>, DirectoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("user directory unavailable: {0}")]
    Unavailable(String),
}
