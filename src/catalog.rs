//! Read-side collaborators: the item catalog and the user directory.
//!
//! The negotiation core never owns items or users; it looks them up through
//! these traits. In-memory implementations back the tests and the scenario
//! runner.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{ItemRef, UserId};
use crate::Amount;

/// Catalog view of a session or content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub item: ItemRef,
    pub title: String,
    pub base_price: Amount,
    /// The teacher who listed the item.
    pub owner: UserId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Teacher,
    Student,
}

/// Directory view of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub display_name: String,
    pub avatar: Option<String>,
    pub role: UserRole,
}

#[async_trait]
pub trait ItemCatalog: Send + Sync {
    async fn item(&self, item: ItemRef) -> Result<Option<ItemSummary>>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user(&self, id: UserId) -> Result<Option<UserSummary>>;
}

pub type SharedItemCatalog = Arc<dyn ItemCatalog>;
pub type SharedUserDirectory = Arc<dyn UserDirectory>;

#[derive(Default)]
pub struct InMemoryCatalog(Mutex<HashMap<ItemRef, ItemSummary>>);

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, summary: ItemSummary) {
        self.0.lock().expect("lock").insert(summary.item, summary);
    }
}

#[async_trait]
impl ItemCatalog for InMemoryCatalog {
    async fn item(&self, item: ItemRef) -> Result<Option<ItemSummary>> {
        Ok(self.0.lock().expect("lock").get(&item).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryDirectory(Mutex<HashMap<UserId, UserSummary>>);

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, summary: UserSummary) {
        self.0.lock().expect("lock").insert(summary.id, summary);
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn user(&self, id: UserId) -> Result<Option<UserSummary>> {
        Ok(self.0.lock().expect("lock").get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn catalog_lookup() {
        let catalog = InMemoryCatalog::new();
        let item = ItemRef::Session(Uuid::new_v4());
        let owner = Uuid::new_v4();
        catalog.insert(ItemSummary {
            item,
            title: "Intro to Watercolor".to_string(),
            base_price: Amount::from_float(1000.0),
            owner,
        });

        let found = catalog.item(item).await.unwrap().unwrap();
        assert_eq!(found.title, "Intro to Watercolor");
        assert_eq!(found.owner, owner);

        let missing = catalog.item(ItemRef::Content(Uuid::new_v4())).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn directory_lookup() {
        let directory = InMemoryDirectory::new();
        let id = Uuid::new_v4();
        directory.insert(UserSummary {
            id,
            display_name: "Ada".to_string(),
            avatar: None,
            role: UserRole::Teacher,
        });

        let found = directory.user(id).await.unwrap().unwrap();
        assert_eq!(found.display_name, "Ada");
        assert!(directory.user(Uuid::new_v4()).await.unwrap().is_none());
    }
}
