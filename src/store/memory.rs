use std::collections::HashMap;
use async_trait::async_trait;
use tokio::sync::RwLock;
use crate::error::{Error, Result};
use crate::finance::category::{CategoryKind, CategoryRecord};
use crate::finance::expense::ExpenseRecord;
use crate::finance::income::IncomeRecord;
use crate::finance::investment::InvestmentRecord;
use crate::interfaces::category_directory::CategoryDirectory;
use crate::interfaces::finance_store::{CategoryStore, ExpenseStore, IncomeStore, InvestmentStore};
use crate::interfaces::identity::{IdentityResolver, UserAccount};
use crate::interfaces::loan_store::LoanStore;
use crate::ledger::record::{CounterpartKey, Direction, LoanRecord, LoanStatus, NaturalKey};
use crate::types::ids::{CategoryId, ExpenseId, IncomeId, InvestmentId, LoanId, UserId};

/// Process-local document store backing every storage seam. Each record
/// family lives in its own keyed collection, like collections in the
/// document database a deployment would use.
pub struct InMemoryStore {
    lent: RwLock<HashMap<LoanId, LoanRecord>>,
    borrowed: RwLock<HashMap<LoanId, LoanRecord>>,
    expenses: RwLock<HashMap<ExpenseId, ExpenseRecord>>,
    incomes: RwLock<HashMap<IncomeId, IncomeRecord>>,
    investments: RwLock<HashMap<InvestmentId, InvestmentRecord>>,
    categories: RwLock<HashMap<CategoryId, CategoryRecord>>,
    accounts: RwLock<HashMap<UserId, UserAccount>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore {
            lent: RwLock::new(HashMap::new()),
            borrowed: RwLock::new(HashMap::new()),
            expenses: RwLock::new(HashMap::new()),
            incomes: RwLock::new(HashMap::new()),
            investments: RwLock::new(HashMap::new()),
            categories: RwLock::new(HashMap::new()),
            accounts: RwLock::new(HashMap::new()),
        }
    }

    /// Registers an account in the identity directory. Account creation
    /// itself belongs to the external auth service; this mirrors its
    /// registry for resolution.
    pub async fn register_account(&self, account: UserAccount) {
        self.accounts.write().await.insert(account.user_id, account);
    }

    fn loans(&self, direction: Direction) -> &RwLock<HashMap<LoanId, LoanRecord>> {
        match direction {
            Direction::Lend => &self.lent,
            Direction::Borrow => &self.borrowed,
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        InMemoryStore::new()
    }
}

#[async_trait]
impl LoanStore for InMemoryStore {
    async fn insert(&self, direction: Direction, record: LoanRecord) -> Result<LoanRecord> {
        let mut loans = self.loans(direction).write().await;
        loans.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(&self, direction: Direction, record: LoanRecord) -> Result<LoanRecord> {
        let mut loans = self.loans(direction).write().await;
        if !loans.contains_key(&record.id) {
            return Err(Error::Storage(format!("no record with id {}", record.id)));
        }
        loans.insert(record.id, record.clone());
        Ok(record)
    }

    async fn delete(&self, direction: Direction, id: LoanId) -> Result<()> {
        self.loans(direction).write().await.remove(&id);
        Ok(())
    }

    async fn find_by_id_and_owner(
        &self,
        direction: Direction,
        id: LoanId,
        owner: UserId,
    ) -> Result<Option<LoanRecord>> {
        let loans = self.loans(direction).read().await;
        Ok(loans
            .get(&id)
            .filter(|record| record.owner_id == owner)
            .cloned())
    }

    async fn find_active_by_key(
        &self,
        direction: Direction,
        key: &NaturalKey,
    ) -> Result<Option<LoanRecord>> {
        let loans = self.loans(direction).read().await;
        Ok(loans
            .values()
            .find(|record| record.status != LoanStatus::Cleared && record.natural_key() == *key)
            .cloned())
    }

    async fn find_counterpart(
        &self,
        direction: Direction,
        key: &CounterpartKey,
    ) -> Result<Option<LoanRecord>> {
        let loans = self.loans(direction).read().await;
        Ok(loans
            .values()
            .find(|record| record.counterpart_key() == *key)
            .cloned())
    }

    async fn list_by_owner(&self, direction: Direction, owner: UserId) -> Result<Vec<LoanRecord>> {
        let loans = self.loans(direction).read().await;
        Ok(loans
            .values()
            .filter(|record| record.owner_id == owner)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl IdentityResolver for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .values()
            .find(|account| account.email == email)
            .cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserAccount>> {
        Ok(self.accounts.read().await.get(&user_id).cloned())
    }
}

#[async_trait]
impl ExpenseStore for InMemoryStore {
    async fn insert(&self, record: ExpenseRecord) -> Result<ExpenseRecord> {
        self.expenses.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(&self, record: ExpenseRecord) -> Result<ExpenseRecord> {
        let mut expenses = self.expenses.write().await;
        if !expenses.contains_key(&record.id) {
            return Err(Error::Storage(format!("no record with id {}", record.id)));
        }
        expenses.insert(record.id, record.clone());
        Ok(record)
    }

    async fn delete(&self, id: ExpenseId) -> Result<()> {
        self.expenses.write().await.remove(&id);
        Ok(())
    }

    async fn find_by_id_and_owner(
        &self,
        id: ExpenseId,
        owner: UserId,
    ) -> Result<Option<ExpenseRecord>> {
        let expenses = self.expenses.read().await;
        Ok(expenses
            .get(&id)
            .filter(|record| record.owner_id == owner)
            .cloned())
    }

    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<ExpenseRecord>> {
        let expenses = self.expenses.read().await;
        Ok(expenses
            .values()
            .filter(|record| record.owner_id == owner)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl IncomeStore for InMemoryStore {
    async fn insert(&self, record: IncomeRecord) -> Result<IncomeRecord> {
        self.incomes.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(&self, record: IncomeRecord) -> Result<IncomeRecord> {
        let mut incomes = self.incomes.write().await;
        if !incomes.contains_key(&record.id) {
            return Err(Error::Storage(format!("no record with id {}", record.id)));
        }
        incomes.insert(record.id, record.clone());
        Ok(record)
    }

    async fn delete(&self, id: IncomeId) -> Result<()> {
        self.incomes.write().await.remove(&id);
        Ok(())
    }

    async fn find_by_id_and_owner(
        &self,
        id: IncomeId,
        owner: UserId,
    ) -> Result<Option<IncomeRecord>> {
        let incomes = self.incomes.read().await;
        Ok(incomes
            .get(&id)
            .filter(|record| record.owner_id == owner)
            .cloned())
    }

    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<IncomeRecord>> {
        let incomes = self.incomes.read().await;
        Ok(incomes
            .values()
            .filter(|record| record.owner_id == owner)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl InvestmentStore for InMemoryStore {
    async fn insert(&self, record: InvestmentRecord) -> Result<InvestmentRecord> {
        self.investments.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(&self, record: InvestmentRecord) -> Result<InvestmentRecord> {
        let mut investments = self.investments.write().await;
        if !investments.contains_key(&record.id) {
            return Err(Error::Storage(format!("no record with id {}", record.id)));
        }
        investments.insert(record.id, record.clone());
        Ok(record)
    }

    async fn delete(&self, id: InvestmentId) -> Result<()> {
        self.investments.write().await.remove(&id);
        Ok(())
    }

    async fn find_by_id_and_owner(
        &self,
        id: InvestmentId,
        owner: UserId,
    ) -> Result<Option<InvestmentRecord>> {
        let investments = self.investments.read().await;
        Ok(investments
            .get(&id)
            .filter(|record| record.owner_id == owner)
            .cloned())
    }

    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<InvestmentRecord>> {
        let investments = self.investments.read().await;
        Ok(investments
            .values()
            .filter(|record| record.owner_id == owner)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CategoryStore for InMemoryStore {
    async fn insert(&self, record: CategoryRecord) -> Result<CategoryRecord> {
        self.categories.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn delete(&self, id: CategoryId, owner: UserId) -> Result<bool> {
        let mut categories = self.categories.write().await;
        match categories.get(&id) {
            Some(record) if record.owner_id == owner => {
                categories.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_by_id_and_owner(
        &self,
        id: CategoryId,
        owner: UserId,
    ) -> Result<Option<CategoryRecord>> {
        let categories = self.categories.read().await;
        Ok(categories
            .get(&id)
            .filter(|record| record.owner_id == owner)
            .cloned())
    }

    async fn find_by_name(
        &self,
        owner: UserId,
        kind: CategoryKind,
        name: &str,
    ) -> Result<Option<CategoryRecord>> {
        let categories = self.categories.read().await;
        Ok(categories
            .values()
            .find(|record| record.owner_id == owner && record.kind == kind && record.name == name)
            .cloned())
    }

    async fn list_by_owner(
        &self,
        owner: UserId,
        kind: Option<CategoryKind>,
    ) -> Result<Vec<CategoryRecord>> {
        let categories = self.categories.read().await;
        Ok(categories
            .values()
            .filter(|record| record.owner_id == owner)
            .filter(|record| kind.map_or(true, |kind| record.kind == kind))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CategoryDirectory for InMemoryStore {
    async fn find(&self, id: CategoryId, owner: UserId) -> Result<Option<CategoryRecord>> {
        CategoryStore::find_by_id_and_owner(self, id, owner).await
    }
}
