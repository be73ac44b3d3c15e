//! Side effects of bid transitions: enrollment grants and notifications.
//!
//! The grant is consequential and participates in the transition's atomicity
//! contract (the engine rolls the status back if it fails). Notifications are
//! best-effort: a dispatch failure is logged and swallowed, never failing the
//! transition.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine::Bid;
use crate::model::{BidId, ItemRef, UserId};
use crate::Amount;

/// The enrollment (session) or unlock (content) record created on acceptance.
/// Owned by the ledger collaborator; the core treats it as an opaque write.
#[derive(Debug, Clone, PartialEq)]
pub struct Grant {
    pub student: UserId,
    pub item: ItemRef,
    pub amount_paid: Amount,
    pub origin_bid: BidId,
}

#[async_trait]
pub trait EnrollmentLedger: Send + Sync {
    async fn grant(&self, grant: Grant) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BidReceived,
    BidAccepted,
    BidRejected,
    CounterOffer,
    CounterAccepted,
    CounterRejected,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub recipient: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub bid: BidId,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn dispatch(&self, notification: Notification) -> Result<()>;
}

/// Runs the consequential and best-effort writes triggered by transitions.
pub struct Effects {
    ledger: Arc<dyn EnrollmentLedger>,
    notifier: Arc<dyn Notifier>,
}

impl Effects {
    pub fn new(ledger: Arc<dyn EnrollmentLedger>, notifier: Arc<dyn Notifier>) -> Self {
        Self { ledger, notifier }
    }

    /// Create the enrollment/unlock grant for an accepted bid. The caller is
    /// responsible for compensating the status transition if this fails.
    pub async fn grant_enrollment(&self, bid: &Bid, final_price: Amount) -> Result<()> {
        self.ledger
            .grant(Grant {
                student: bid.student,
                item: bid.item,
                amount_paid: final_price,
                origin_bid: bid.id,
            })
            .await
    }

    /// Best-effort notification dispatch; failures are logged and swallowed.
    pub async fn notify(&self, bid: &Bid, recipient: UserId, kind: NotificationKind) {
        let (title, body) = message_for(bid, kind);
        let notification = Notification {
            recipient,
            kind,
            title,
            body,
            bid: bid.id,
        };
        if let Err(error) = self.notifier.dispatch(notification).await {
            warn!(
                bid = %bid.id,
                recipient = %recipient,
                ?kind,
                %error,
                "notification dispatch failed"
            );
        }
    }
}

fn message_for(bid: &Bid, kind: NotificationKind) -> (String, String) {
    match kind {
        NotificationKind::BidReceived => (
            "New bid received".to_string(),
            format!(
                "A student offered {} for your {}",
                bid.proposed_price, bid.item
            ),
        ),
        NotificationKind::BidAccepted => (
            "Bid accepted".to_string(),
            format!(
                "Your bid of {} for {} was accepted",
                bid.proposed_price, bid.item
            ),
        ),
        NotificationKind::BidRejected => (
            "Bid declined".to_string(),
            format!(
                "Your bid of {} for {} was declined",
                bid.proposed_price, bid.item
            ),
        ),
        NotificationKind::CounterOffer => {
            let price = bid
                .counter_offer
                .as_ref()
                .map(|c| c.price.to_string())
                .unwrap_or_default();
            (
                "Counter-offer received".to_string(),
                format!("The teacher countered with {} for {}", price, bid.item),
            )
        }
        NotificationKind::CounterAccepted => (
            "Counter-offer accepted".to_string(),
            format!(
                "The student accepted your counter of {} for {}",
                bid.proposed_price, bid.item
            ),
        ),
        NotificationKind::CounterRejected => (
            "Counter-offer declined".to_string(),
            format!("The student declined your counter for {}", bid.item),
        ),
    }
}

/// Records grants; doubles as the ledger for tests and the scenario runner.
#[derive(Default)]
pub struct InMemoryLedger(Mutex<Vec<Grant>>);

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grants(&self) -> Vec<Grant> {
        self.0.lock().expect("lock").clone()
    }
}

#[async_trait]
impl EnrollmentLedger for InMemoryLedger {
    async fn grant(&self, grant: Grant) -> Result<()> {
        self.0.lock().expect("lock").push(grant);
        Ok(())
    }
}

/// Records notifications instead of delivering them.
#[derive(Default)]
pub struct InMemoryNotifier(Mutex<Vec<Notification>>);

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.0.lock().expect("lock").clone()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn dispatch(&self, notification: Notification) -> Result<()> {
        self.0.lock().expect("lock").push(notification);
        Ok(())
    }
}
