use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};
use crate::interfaces::category_directory::CategoryDirectory;
use crate::interfaces::finance_store::InvestmentStore;
use crate::types::amount::Amount;
use crate::types::ids::{CategoryId, InvestmentId, UserId};

/// A holding on some platform; `investment_type_id` references an
/// Investment-kind category.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentRecord {
    pub id: InvestmentId,
    pub owner_id: UserId,
    pub name: String,
    #[serde(rename = "investmentType")]
    pub investment_type_id: CategoryId,
    pub platform: String,
    pub current_amount: Amount,
    pub invested_amount: Amount,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
pub struct InvestmentDraft {
    pub name: Option<String>,
    pub investment_type: Option<CategoryId>,
    pub platform: Option<String>,
    pub current_amount: Option<Amount>,
    pub invested_amount: Option<Amount>,
    pub description: Option<String>,
}

/// Portfolio totals returned alongside the listing.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_invested: Amount,
    pub total_current: Amount,
    pub total_gain: Amount,
}

pub struct InvestmentService {
    store: Arc<dyn InvestmentStore>,
    categories: Arc<dyn CategoryDirectory>,
}

impl InvestmentService {
    pub fn new(store: Arc<dyn InvestmentStore>, categories: Arc<dyn CategoryDirectory>) -> Self {
        InvestmentService { store, categories }
    }

    pub async fn create(&self, owner: UserId, draft: InvestmentDraft) -> Result<InvestmentRecord> {
        let (Some(name), Some(investment_type), Some(platform), Some(current), Some(invested)) = (
            draft.name.filter(|n| !n.trim().is_empty()),
            draft.investment_type,
            draft.platform.filter(|p| !p.trim().is_empty()),
            draft.current_amount,
            draft.invested_amount,
        ) else {
            return Err(Error::validation(
                "body",
                "All required fields must be filled.",
            ));
        };

        self.categories
            .find(investment_type, owner)
            .await?
            .ok_or(Error::NotFound { what: "Category" })?;

        let now = Utc::now();
        let record = InvestmentRecord {
            id: InvestmentId::new(),
            owner_id: owner,
            name: name.trim().to_string(),
            investment_type_id: investment_type,
            platform: platform.trim().to_string(),
            current_amount: current,
            invested_amount: invested,
            description: draft.description,
            created_at: now,
            updated_at: now,
        };
        self.store.insert(record).await
    }

    pub async fn list(&self, owner: UserId) -> Result<(Vec<InvestmentRecord>, PortfolioSummary)> {
        let mut records = self.store.list_by_owner(owner).await?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total_invested = records
            .iter()
            .fold(Amount::zero(), |sum, record| sum + record.invested_amount);
        let total_current = records
            .iter()
            .fold(Amount::zero(), |sum, record| sum + record.current_amount);
        let summary = PortfolioSummary {
            total_invested,
            total_current,
            total_gain: total_current - total_invested,
        };
        Ok((records, summary))
    }

    pub async fn update(
        &self,
        owner: UserId,
        id: InvestmentId,
        draft: InvestmentDraft,
    ) -> Result<InvestmentRecord> {
        let mut record = self
            .store
            .find_by_id_and_owner(id, owner)
            .await?
            .ok_or(Error::NotFound { what: "Investment" })?;

        if let Some(name) = draft.name.filter(|n| !n.trim().is_empty()) {
            record.name = name.trim().to_string();
        }
        if let Some(investment_type) = draft.investment_type {
            self.categories
                .find(investment_type, owner)
                .await?
                .ok_or(Error::NotFound { what: "Category" })?;
            record.investment_type_id = investment_type;
        }
        if let Some(platform) = draft.platform.filter(|p| !p.trim().is_empty()) {
            record.platform = platform.trim().to_string();
        }
        if let Some(current) = draft.current_amount {
            record.current_amount = current;
        }
        if let Some(invested) = draft.invested_amount {
            record.invested_amount = invested;
        }
        if let Some(description) = draft.description {
            record.description = Some(description);
        }
        record.updated_at = Utc::now();

        self.store.update(record).await
    }

    pub async fn delete(&self, owner: UserId, id: InvestmentId) -> Result<()> {
        self.store
            .find_by_id_and_owner(id, owner)
            .await?
            .ok_or(Error::NotFound { what: "Investment" })?;
        self.store.delete(id).await
    }
}
