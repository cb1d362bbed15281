use async_trait::async_trait;
use crate::error::Result;
use crate::finance::category::CategoryRecord;
use crate::finance::expense::ExpenseRecord;
use crate::finance::income::IncomeRecord;
use crate::finance::investment::InvestmentRecord;
use crate::types::ids::{CategoryId, ExpenseId, IncomeId, InvestmentId, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    async fn insert(&self, record: ExpenseRecord) -> Result<ExpenseRecord>;
    async fn update(&self, record: ExpenseRecord) -> Result<ExpenseRecord>;
    async fn delete(&self, id: ExpenseId) -> Result<()>;
    async fn find_by_id_and_owner(&self, id: ExpenseId, owner: UserId)
        -> Result<Option<ExpenseRecord>>;
    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<ExpenseRecord>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IncomeStore: Send + Sync {
    async fn insert(&self, record: IncomeRecord) -> Result<IncomeRecord>;
    async fn update(&self, record: IncomeRecord) -> Result<IncomeRecord>;
    async fn delete(&self, id: IncomeId) -> Result<()>;
    async fn find_by_id_and_owner(&self, id: IncomeId, owner: UserId)
        -> Result<Option<IncomeRecord>>;
    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<IncomeRecord>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InvestmentStore: Send + Sync {
    async fn insert(&self, record: InvestmentRecord) -> Result<InvestmentRecord>;
    async fn update(&self, record: InvestmentRecord) -> Result<InvestmentRecord>;
    async fn delete(&self, id: InvestmentId) -> Result<()>;
    async fn find_by_id_and_owner(
        &self,
        id: InvestmentId,
        owner: UserId,
    ) -> Result<Option<InvestmentRecord>>;
    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<InvestmentRecord>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn insert(&self, record: CategoryRecord) -> Result<CategoryRecord>;
    async fn delete(&self, id: CategoryId, owner: UserId) -> Result<bool>;
    async fn find_by_id_and_owner(
        &self,
        id: CategoryId,
        owner: UserId,
    ) -> Result<Option<CategoryRecord>>;
    async fn find_by_name(
        &self,
        owner: UserId,
        kind: crate::finance::category::CategoryKind,
        name: &str,
    ) -> Result<Option<CategoryRecord>>;
    async fn list_by_owner(
        &self,
        owner: UserId,
        kind: Option<crate::finance::category::CategoryKind>,
    ) -> Result<Vec<CategoryRecord>>;
}
