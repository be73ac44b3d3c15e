use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::InvalidBidInput;
use crate::model::{BidId, BidStatus, CounterOffer, ItemRef, NewBid, UserId};
use crate::Amount;

/// One negotiation thread between a student and a teacher over one item.
///
/// Transitions mutate in place and refresh `updated_at`; the guards deciding
/// whether a transition is allowed live in the engine, which also persists
/// every mutation under a compare-and-swap on the previous status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub id: BidId,
    pub item: ItemRef,
    pub student: UserId,
    pub teacher: UserId,
    /// The student's current offer. Immutable after creation, except when a
    /// counter-offer is accepted: then it records the final agreed price.
    pub proposed_price: Amount,
    pub message: Option<String>,
    pub status: BidStatus,
    /// Present if and only if `status == Countered`.
    pub counter_offer: Option<CounterOffer>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bid {
    /// Validate creation input and build a pending bid.
    pub fn create(input: NewBid) -> Result<Self, InvalidBidInput> {
        if !input.proposed_price.is_positive() {
            return Err(InvalidBidInput::NonPositivePrice);
        }
        if input.student == input.teacher {
            return Err(InvalidBidInput::SelfBid);
        }

        let now = Utc::now();
        Ok(Self {
            id: input.id.unwrap_or_else(Uuid::new_v4),
            item: input.item,
            student: input.student,
            teacher: input.teacher,
            proposed_price: input.proposed_price,
            message: input.message,
            status: BidStatus::Pending,
            counter_offer: None,
            created_at: now,
            updated_at: now,
        })
    }

    fn enter(&mut self, status: BidStatus) {
        self.status = status;
        if status != BidStatus::Countered {
            self.counter_offer = None;
        }
        self.updated_at = Utc::now();
    }

    /// Pending -> Accepted at the proposed price.
    pub fn accept(&mut self) {
        self.enter(BidStatus::Accepted);
    }

    /// Pending -> Rejected.
    pub fn reject(&mut self) {
        self.enter(BidStatus::Rejected);
    }

    /// Pending -> Countered with the teacher's alternate offer.
    pub fn counter(&mut self, offer: CounterOffer) {
        self.counter_offer = Some(offer);
        self.enter(BidStatus::Countered);
    }

    /// Countered -> Accepted; the counter price becomes the final agreed price.
    pub fn accept_counter(&mut self) {
        if let Some(counter) = self.counter_offer.take() {
            self.proposed_price = counter.price;
        }
        self.enter(BidStatus::Accepted);
    }

    /// Countered -> Rejected.
    pub fn reject_counter(&mut self) {
        self.enter(BidStatus::Rejected);
    }

    /// Pending or Countered -> Cancelled.
    pub fn cancel(&mut self) {
        self.enter(BidStatus::Cancelled);
    }
}
