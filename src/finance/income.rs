use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};
use crate::finance::expense::month_range;
use crate::interfaces::category_directory::CategoryDirectory;
use crate::interfaces::finance_store::IncomeStore;
use crate::types::amount::Amount;
use crate::types::ids::{CategoryId, IncomeId, UserId};

/// An income record; `source_id` references an Income-kind category.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeRecord {
    pub id: IncomeId,
    pub owner_id: UserId,
    pub amount: Amount,
    #[serde(rename = "source")]
    pub source_id: CategoryId,
    pub description: String,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
pub struct IncomeDraft {
    pub amount: Option<Amount>,
    pub source: Option<CategoryId>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

pub struct IncomeService {
    store: Arc<dyn IncomeStore>,
    categories: Arc<dyn CategoryDirectory>,
}

impl IncomeService {
    pub fn new(store: Arc<dyn IncomeStore>, categories: Arc<dyn CategoryDirectory>) -> Self {
        IncomeService { store, categories }
    }

    pub async fn create(&self, owner: UserId, draft: IncomeDraft) -> Result<IncomeRecord> {
        let (Some(amount), Some(source), Some(description)) = (
            draft.amount,
            draft.source,
            draft.description.filter(|d| !d.trim().is_empty()),
        ) else {
            return Err(Error::validation(
                "body",
                "All required fields must be provided.",
            ));
        };

        if !amount.is_positive() {
            return Err(Error::validation(
                "amount",
                "Amount must be greater than zero.",
            ));
        }
        self.categories
            .find(source, owner)
            .await?
            .ok_or(Error::NotFound { what: "Category" })?;

        let now = Utc::now();
        let record = IncomeRecord {
            id: IncomeId::new(),
            owner_id: owner,
            amount,
            source_id: source,
            description: description.trim().to_string(),
            // A missing date means "today".
            date: draft.date.unwrap_or(now),
            created_at: now,
            updated_at: now,
        };
        self.store.insert(record).await
    }

    pub async fn list(&self, owner: UserId) -> Result<(Vec<IncomeRecord>, Amount)> {
        let mut records = self.store.list_by_owner(owner).await?;
        records.sort_by(|a, b| b.date.cmp(&a.date));
        let total = records
            .iter()
            .fold(Amount::zero(), |sum, record| sum + record.amount);
        Ok((records, total))
    }

    pub async fn month_total(&self, owner: UserId, month: u32, year: i32) -> Result<Amount> {
        let (start, end) = month_range(month, year)?;
        let total = self
            .store
            .list_by_owner(owner)
            .await?
            .iter()
            .filter(|record| record.date >= start && record.date < end)
            .fold(Amount::zero(), |sum, record| sum + record.amount);
        Ok(total)
    }

    pub async fn update(
        &self,
        owner: UserId,
        id: IncomeId,
        draft: IncomeDraft,
    ) -> Result<IncomeRecord> {
        let mut record = self
            .store
            .find_by_id_and_owner(id, owner)
            .await?
            .ok_or(Error::NotFound { what: "Income" })?;

        if let Some(amount) = draft.amount {
            if !amount.is_positive() {
                return Err(Error::validation(
                    "amount",
                    "Amount must be greater than zero.",
                ));
            }
            record.amount = amount;
        }
        if let Some(source) = draft.source {
            self.categories
                .find(source, owner)
                .await?
                .ok_or(Error::NotFound { what: "Category" })?;
            record.source_id = source;
        }
        if let Some(description) = draft.description.filter(|d| !d.trim().is_empty()) {
            record.description = description.trim().to_string();
        }
        if let Some(date) = draft.date {
            record.date = date;
        }
        record.updated_at = Utc::now();

        self.store.update(record).await
    }

    pub async fn delete(&self, owner: UserId, id: IncomeId) -> Result<()> {
        self.store
            .find_by_id_and_owner(id, owner)
            .await?
            .ok_or(Error::NotFound { what: "Income" })?;
        self.store.delete(id).await
    }
}
