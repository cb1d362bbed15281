use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};
use crate::interfaces::finance_store::CategoryStore;
use crate::types::ids::{CategoryId, UserId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryKind {
    Expense,
    Income,
    Investment,
}

/// A user-defined grouping label for expenses, income sources and
/// investment types.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRecord {
    pub id: CategoryId,
    pub owner_id: UserId,
    pub name: String,
    #[serde(rename = "categoryType")]
    pub kind: CategoryKind,
    pub icon_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub struct CategoryService {
    store: Arc<dyn CategoryStore>,
}

impl CategoryService {
    pub fn new(store: Arc<dyn CategoryStore>) -> Self {
        CategoryService { store }
    }

    pub async fn create(
        &self,
        owner: UserId,
        name: Option<String>,
        kind: Option<CategoryKind>,
        icon_image: Option<String>,
    ) -> Result<CategoryRecord> {
        let (Some(name), Some(kind)) = (name.filter(|n| !n.trim().is_empty()), kind) else {
            return Err(Error::validation(
                "name",
                "Category name and type are required!",
            ));
        };

        if self.store.find_by_name(owner, kind, &name).await?.is_some() {
            return Err(Error::DuplicateCategory);
        }

        let record = CategoryRecord {
            id: CategoryId::new(),
            owner_id: owner,
            name,
            kind,
            icon_image,
            created_at: Utc::now(),
        };
        self.store.insert(record).await
    }

    pub async fn list(
        &self,
        owner: UserId,
        kind: Option<CategoryKind>,
    ) -> Result<Vec<CategoryRecord>> {
        self.store.list_by_owner(owner, kind).await
    }

    pub async fn delete(&self, owner: UserId, id: CategoryId) -> Result<()> {
        if !self.store.delete(id, owner).await? {
            return Err(Error::NotFound { what: "Category" });
        }
        Ok(())
    }
}
