use std::sync::Arc;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};
use crate::interfaces::category_directory::CategoryDirectory;
use crate::interfaces::finance_store::ExpenseStore;
use crate::types::amount::Amount;
use crate::types::ids::{CategoryId, ExpenseId, UserId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseType {
    Personal,
    Family,
}

impl ExpenseType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "personal" => Some(ExpenseType::Personal),
            "family" => Some(ExpenseType::Family),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecord {
    pub id: ExpenseId,
    pub owner_id: UserId,
    pub amount: Amount,
    #[serde(rename = "category")]
    pub category_id: CategoryId,
    pub description: String,
    pub expense_type: ExpenseType,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
pub struct ExpenseDraft {
    pub amount: Option<Amount>,
    pub category: Option<CategoryId>,
    pub description: Option<String>,
    pub expense_type: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

pub struct ExpenseService {
    store: Arc<dyn ExpenseStore>,
    categories: Arc<dyn CategoryDirectory>,
}

impl ExpenseService {
    pub fn new(store: Arc<dyn ExpenseStore>, categories: Arc<dyn CategoryDirectory>) -> Self {
        ExpenseService { store, categories }
    }

    pub async fn create(&self, owner: UserId, draft: ExpenseDraft) -> Result<ExpenseRecord> {
        let (Some(amount), Some(category), Some(description), Some(expense_type), Some(date)) = (
            draft.amount,
            draft.category,
            draft.description.filter(|d| !d.trim().is_empty()),
            draft.expense_type,
            draft.date,
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
        let expense_type = ExpenseType::parse(&expense_type)
            .ok_or_else(|| Error::validation("expenseType", "Invalid expense type."))?;
        self.require_category(category, owner).await?;

        let now = Utc::now();
        let record = ExpenseRecord {
            id: ExpenseId::new(),
            owner_id: owner,
            amount,
            category_id: category,
            description: description.trim().to_string(),
            expense_type,
            date,
            created_at: now,
            updated_at: now,
        };
        self.store.insert(record).await
    }

    /// Owner's expenses, newest first, with the overall total.
    pub async fn list(&self, owner: UserId) -> Result<(Vec<ExpenseRecord>, Amount)> {
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
        id: ExpenseId,
        draft: ExpenseDraft,
    ) -> Result<ExpenseRecord> {
        let mut record = self
            .store
            .find_by_id_and_owner(id, owner)
            .await?
            .ok_or(Error::NotFound { what: "Expense" })?;

        if let Some(amount) = draft.amount {
            if !amount.is_positive() {
                return Err(Error::validation(
                    "amount",
                    "Amount must be greater than zero.",
                ));
            }
            record.amount = amount;
        }
        if let Some(expense_type) = draft.expense_type.as_deref() {
            record.expense_type = ExpenseType::parse(expense_type)
                .ok_or_else(|| Error::validation("expenseType", "Invalid expense type."))?;
        }
        if let Some(category) = draft.category {
            self.require_category(category, owner).await?;
            record.category_id = category;
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

    pub async fn delete(&self, owner: UserId, id: ExpenseId) -> Result<()> {
        self.store
            .find_by_id_and_owner(id, owner)
            .await?
            .ok_or(Error::NotFound { what: "Expense" })?;
        self.store.delete(id).await
    }

    async fn require_category(&self, id: CategoryId, owner: UserId) -> Result<()> {
        self.categories
            .find(id, owner)
            .await?
            .ok_or(Error::NotFound { what: "Category" })?;
        Ok(())
    }
}

/// Half-open UTC range covering the given calendar month.
pub fn month_range(month: u32, year: i32) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    if !(1..=12).contains(&month) {
        return Err(Error::validation("month", "Month and year are required."));
    }
    let start = Utc
        .with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| Error::validation("month", "Month and year are required."))?;
    let end = if month == 12 {
        Utc.with_ymd_and_hms(year + 1, 1, 1, 0, 0, 0)
    } else {
        Utc.with_ymd_and_hms(year, month + 1, 1, 0, 0, 0)
    }
    .single()
    .ok_or_else(|| Error::validation("month", "Month and year are required."))?;
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::category::{CategoryKind, CategoryService};
    use crate::store::memory::InMemoryStore;

    async fn setup() -> (ExpenseService, UserId, CategoryId) {
        let store = Arc::new(InMemoryStore::new());
        let owner = UserId::new();
        let category = CategoryService::new(store.clone())
            .create(owner, Some("Groceries".to_string()), Some(CategoryKind::Expense), None)
            .await
            .unwrap();
        (ExpenseService::new(store.clone(), store), owner, category.id)
    }

    fn draft(amount: i64, category: CategoryId, date: DateTime<Utc>) -> ExpenseDraft {
        ExpenseDraft {
            amount: Some(Amount::from_i64(amount)),
            category: Some(category),
            description: Some("weekly shop".to_string()),
            expense_type: Some("personal".to_string()),
            date: Some(date),
        }
    }

    #[tokio::test]
    async fn create_rejects_unknown_category() {
        let (service, owner, _) = setup().await;
        let err = service
            .create(owner, draft(100, CategoryId::new(), Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { what: "Category" }));
    }

    #[tokio::test]
    async fn create_rejects_non_positive_amount_and_bad_type() {
        let (service, owner, category) = setup().await;
        let err = service
            .create(owner, draft(0, category, Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        let mut bad_type = draft(100, category, Utc::now());
        bad_type.expense_type = Some("corporate".to_string());
        let err = service.create(owner, bad_type).await.unwrap_err();
        assert!(matches!(err, Error::Validation { field: "expenseType", .. }));
    }

    #[tokio::test]
    async fn list_is_newest_first_with_total() {
        let (service, owner, category) = setup().await;
        let old = Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap();
        let new = Utc.with_ymd_and_hms(2026, 3, 5, 0, 0, 0).unwrap();
        service.create(owner, draft(100, category, old)).await.unwrap();
        service.create(owner, draft(250, category, new)).await.unwrap();

        let (records, total) = service.list(owner).await.unwrap();
        assert_eq!(records[0].amount, Amount::from_i64(250));
        assert_eq!(total, Amount::from_i64(350));
    }

    #[tokio::test]
    async fn month_total_only_counts_the_requested_month() {
        let (service, owner, category) = setup().await;
        let january = Utc.with_ymd_and_hms(2026, 1, 31, 23, 59, 59).unwrap();
        let february = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        service.create(owner, draft(100, category, january)).await.unwrap();
        service.create(owner, draft(40, category, february)).await.unwrap();

        assert_eq!(
            service.month_total(owner, 1, 2026).await.unwrap(),
            Amount::from_i64(100)
        );
        assert_eq!(
            service.month_total(owner, 2, 2026).await.unwrap(),
            Amount::from_i64(40)
        );
        assert!(service.month_total(owner, 13, 2026).await.is_err());
    }

    #[tokio::test]
    async fn update_and_delete_are_owner_scoped() {
        let (service, owner, category) = setup().await;
        let record = service
            .create(owner, draft(100, category, Utc::now()))
            .await
            .unwrap();

        let err = service
            .update(UserId::new(), record.id, ExpenseDraft::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));

        let updated = service
            .update(
                owner,
                record.id,
                ExpenseDraft {
                    amount: Some(Amount::from_i64(75)),
                    ..ExpenseDraft::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.amount, Amount::from_i64(75));

        service.delete(owner, record.id).await.unwrap();
        assert!(service.delete(owner, record.id).await.is_err());
    }
}
