use async_trait::async_trait;
use crate::error::Result;
use crate::ledger::record::{CounterpartKey, Direction, LoanRecord, NaturalKey};
use crate::types::ids::{LoanId, UserId};

/// Keyed storage for loan records. `direction` selects the record family
/// (lent vs. borrowed); the two families are stored independently.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoanStore: Send + Sync {
    async fn insert(&self, direction: Direction, record: LoanRecord) -> Result<LoanRecord>;

    async fn update(&self, direction: Direction, record: LoanRecord) -> Result<LoanRecord>;

    async fn delete(&self, direction: Direction, id: LoanId) -> Result<()>;

    async fn find_by_id_and_owner(
        &self,
        direction: Direction,
        id: LoanId,
        owner: UserId,
    ) -> Result<Option<LoanRecord>>;

    /// Finds a non-Cleared record matching the full natural key, in any
    /// owner's scope. Used for duplicate detection at creation time.
    async fn find_active_by_key(
        &self,
        direction: Direction,
        key: &NaturalKey,
    ) -> Result<Option<LoanRecord>>;

    /// Finds the mirrored record in the given family by the reduced
    /// natural key. The lookup can legitimately miss (counterpart never
    /// registered); that is not an error.
    async fn find_counterpart(
        &self,
        direction: Direction,
        key: &CounterpartKey,
    ) -> Result<Option<LoanRecord>>;

    async fn list_by_owner(&self, direction: Direction, owner: UserId) -> Result<Vec<LoanRecord>>;
}
