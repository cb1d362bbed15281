use async_trait::async_trait;
use crate::error::Result;
use crate::finance::category::CategoryRecord;
use crate::types::ids::{CategoryId, UserId};

/// Read-only category lookup used to validate references on expense,
/// income and investment records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryDirectory: Send + Sync {
    async fn find(&self, id: CategoryId, owner: UserId) -> Result<Option<CategoryRecord>>;
}
