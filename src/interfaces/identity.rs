use async_trait::async_trait;
use crate::error::Result;
use crate::types::ids::UserId;

/// A registered account as seen by the external auth service.
#[derive(Clone, Debug)]
pub struct UserAccount {
    pub user_id: UserId,
    pub email: String,
    pub display_name: String,
}

/// Resolves registered accounts. Account creation, password handling and
/// email verification live entirely on the other side of this seam.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>>;
    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserAccount>>;
}
