//! Durable storage for bids.
//!
//! The engine never mutates a bid blindly: every status change goes through
//! [`BidStore::update_if_status`], a compare-and-swap tagged on the expected
//! current status. Concurrent transitions on the same bid therefore serialize
//! at the store, and the loser of the race observes a `false` swap.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::engine::Bid;
use crate::model::{BidId, BidStatus, ItemRef, UserId};

/// Filter for [`BidStore::query`]; unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct BidFilter {
    pub student: Option<UserId>,
    pub teacher: Option<UserId>,
    pub status: Option<BidStatus>,
    pub item: Option<ItemRef>,
}

impl BidFilter {
    pub fn matches(&self, bid: &Bid) -> bool {
        self.student.is_none_or(|s| bid.student == s)
            && self.teacher.is_none_or(|t| bid.teacher == t)
            && self.status.is_none_or(|st| bid.status == st)
            && self.item.is_none_or(|i| bid.item == i)
    }
}

#[async_trait]
pub trait BidStore: Send + Sync {
    /// Insert a new bid; fails if the id already exists.
    async fn insert(&self, bid: Bid) -> Result<()>;

    async fn fetch(&self, id: BidId) -> Result<Option<Bid>>;

    /// Persist `bid` only if the stored record currently has status
    /// `expected`. Returns whether the swap happened.
    async fn update_if_status(&self, id: BidId, expected: BidStatus, bid: &Bid) -> Result<bool>;

    /// Administrative purge. Returns whether a record was removed.
    async fn remove(&self, id: BidId) -> Result<bool>;

    async fn query(&self, filter: &BidFilter) -> Result<Vec<Bid>>;
}

pub type SharedBidStore = Arc<dyn BidStore>;

#[derive(Default)]
pub struct InMemoryBidStore(Mutex<BTreeMap<BidId, Bid>>);

impl InMemoryBidStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> SharedBidStore {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl BidStore for InMemoryBidStore {
    async fn insert(&self, bid: Bid) -> Result<()> {
        let mut bids = self.0.lock().expect("lock");
        if bids.contains_key(&bid.id) {
            bail!("bid {} already exists", bid.id);
        }
        bids.insert(bid.id, bid);
        Ok(())
    }

    async fn fetch(&self, id: BidId) -> Result<Option<Bid>> {
        Ok(self.0.lock().expect("lock").get(&id).cloned())
    }

    async fn update_if_status(&self, id: BidId, expected: BidStatus, bid: &Bid) -> Result<bool> {
        let mut bids = self.0.lock().expect("lock");
        match bids.get(&id) {
            Some(current) if current.status == expected => {
                bids.insert(id, bid.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove(&self, id: BidId) -> Result<bool> {
        Ok(self.0.lock().expect("lock").remove(&id).is_some())
    }

    async fn query(&self, filter: &BidFilter) -> Result<Vec<Bid>> {
        Ok(self
            .0
            .lock()
            .expect("lock")
            .values()
            .filter(|bid| filter.matches(bid))
            .cloned()
            .collect())
    }
}
