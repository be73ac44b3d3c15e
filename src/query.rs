//! Read-side bid queries.
//!
//! Joins a bid with its item and participant display info for presentation.
//! Never mutates; safe to call concurrently with any write.

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::catalog::{SharedItemCatalog, SharedUserDirectory, UserSummary};
use crate::engine::Bid;
use crate::model::{BidId, BidStatus, UserId};
use crate::policy;
use crate::store::{BidFilter, SharedBidStore};
use crate::Amount;

/// A bid joined with the display data the UI needs.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedBid {
    pub bid: Bid,
    pub item_title: String,
    pub base_price: Amount,
    /// Discount of the current proposal against the listed price.
    pub discount_percent: u8,
    pub student: UserSummary,
    pub teacher: UserSummary,
}

pub struct BidQueryService {
    store: SharedBidStore,
    catalog: SharedItemCatalog,
    directory: SharedUserDirectory,
}

impl BidQueryService {
    pub fn new(
        store: SharedBidStore,
        catalog: SharedItemCatalog,
        directory: SharedUserDirectory,
    ) -> Self {
        Self {
            store,
            catalog,
            directory,
        }
    }

    /// Bids submitted by a student, newest first.
    pub async fn list_for_student(
        &self,
        student: UserId,
        status: Option<BidStatus>,
    ) -> Result<Vec<EnrichedBid>> {
        self.list(BidFilter {
            student: Some(student),
            status,
            ..Default::default()
        })
        .await
    }

    /// Bids addressed to a teacher, newest first.
    pub async fn list_for_teacher(
        &self,
        teacher: UserId,
        status: Option<BidStatus>,
    ) -> Result<Vec<EnrichedBid>> {
        self.list(BidFilter {
            teacher: Some(teacher),
            status,
            ..Default::default()
        })
        .await
    }

    pub async fn get_by_id(&self, id: BidId) -> Result<Option<EnrichedBid>> {
        match self.store.fetch(id).await? {
            Some(bid) => Ok(Some(self.enrich(bid).await?)),
            None => Ok(None),
        }
    }

    async fn list(&self, filter: BidFilter) -> Result<Vec<EnrichedBid>> {
        let mut bids = self.store.query(&filter).await?;
        bids.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut enriched = Vec::with_capacity(bids.len());
        for bid in bids {
            enriched.push(self.enrich(bid).await?);
        }
        Ok(enriched)
    }

    async fn enrich(&self, bid: Bid) -> Result<EnrichedBid> {
        let item = self
            .catalog
            .item(bid.item)
            .await?
            .ok_or_else(|| anyhow!("bid {} references unknown item {}", bid.id, bid.item))?;
        let student = self.lookup_user(bid.student).await?;
        let teacher = self.lookup_user(bid.teacher).await?;

        let discount_percent = policy::discount_percent(item.base_price, bid.proposed_price);

        Ok(EnrichedBid {
            item_title: item.title,
            base_price: item.base_price,
            discount_percent,
            student,
            teacher,
            bid,
        })
    }

    async fn lookup_user(&self, id: UserId) -> Result<UserSummary> {
        self.directory
            .user(id)
            .await?
            .ok_or_else(|| anyhow!("unknown user {id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{InMemoryCatalog, InMemoryDirectory, ItemSummary, UserRole};
    use crate::model::{ItemRef, NewBid};
    use crate::store::{BidStore, InMemoryBidStore};
    use std::sync::Arc;
    use uuid::Uuid;

    struct Fixture {
        service: BidQueryService,
        store: Arc<InMemoryBidStore>,
        student: UserId,
        teacher: UserId,
        item: ItemRef,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryBidStore::new());
        let catalog = Arc::new(InMemoryCatalog::new());
        let directory = Arc::new(InMemoryDirectory::new());

        let student = Uuid::new_v4();
        let teacher = Uuid::new_v4();
        let item = ItemRef::Session(Uuid::new_v4());

        catalog.insert(ItemSummary {
            item,
            title: "Jazz Piano".to_string(),
            base_price: Amount::from_float(1000.0),
            owner: teacher,
        });
        directory.insert(UserSummary {
            id: student,
            display_name: "Sam".to_string(),
            avatar: None,
            role: UserRole::Student,
        });
        directory.insert(UserSummary {
            id: teacher,
            display_name: "Thea".to_string(),
            avatar: Some("thea.png".to_string()),
            role: UserRole::Teacher,
        });

        let service = BidQueryService::new(store.clone(), catalog, directory);
        Fixture {
            service,
            store,
            student,
            teacher,
            item,
        }
    }

    async fn insert_bid(f: &Fixture, price: f64) -> Bid {
        let bid = Bid::create(NewBid {
            id: None,
            student: f.student,
            teacher: f.teacher,
            item: f.item,
            proposed_price: Amount::from_float(price),
            message: None,
        })
        .unwrap();
        f.store.insert(bid.clone()).await.unwrap();
        bid
    }

    #[tokio::test]
    async fn get_by_id_enriches_with_item_and_users() {
        let f = fixture();
        let bid = insert_bid(&f, 600.0).await;

        let enriched = f.service.get_by_id(bid.id).await.unwrap().unwrap();
        assert_eq!(enriched.item_title, "Jazz Piano");
        assert_eq!(enriched.base_price, Amount::from_float(1000.0));
        assert_eq!(enriched.discount_percent, 40);
        assert_eq!(enriched.student.display_name, "Sam");
        assert_eq!(enriched.teacher.display_name, "Thea");
        assert_eq!(enriched.bid, bid);
    }

    #[tokio::test]
    async fn get_by_id_missing_is_none() {
        let f = fixture();
        assert!(f.service.get_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lists_are_newest_first() {
        let f = fixture();
        let first = insert_bid(&f, 500.0).await;
        let second = insert_bid(&f, 700.0).await;

        let listed = f.service.list_for_student(f.student, None).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].bid.id, second.id);
        assert_eq!(listed[1].bid.id, first.id);

        let for_teacher = f.service.list_for_teacher(f.teacher, None).await.unwrap();
        assert_eq!(for_teacher.len(), 2);
        assert_eq!(for_teacher[0].bid.id, second.id);
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let f = fixture();
        insert_bid(&f, 500.0).await;
        let cancelled = {
            let mut bid = insert_bid(&f, 700.0).await;
            let pending = bid.clone();
            bid.cancel();
            f.store
                .update_if_status(bid.id, pending.status, &bid)
                .await
                .unwrap();
            bid
        };

        let listed = f
            .service
            .list_for_student(f.student, Some(BidStatus::Cancelled))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].bid.id, cancelled.id);
    }

    #[tokio::test]
    async fn list_for_other_users_is_empty() {
        let f = fixture();
        insert_bid(&f, 500.0).await;
        let listed = f
            .service
            .list_for_student(Uuid::new_v4(), None)
            .await
            .unwrap();
        assert!(listed.is_empty());
    }
}
