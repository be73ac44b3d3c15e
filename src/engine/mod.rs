//! Bid negotiation engine.
//!
//! The state machine governing how a student's price proposal moves through
//! pending -> countered -> accepted/rejected/cancelled, together with the side
//! effects that must land with each transition. Every status mutation is
//! persisted under a compare-and-swap on the previous status, so concurrent
//! transitions on the same bid serialize and the loser observes
//! `AlreadyFinalized`.

use tokio_stream::{Stream, StreamExt};
use tracing::{error, info};

use crate::catalog::SharedItemCatalog;
use crate::effects::{Effects, NotificationKind};
use crate::model::{BidId, BidStatus, Command, CounterOffer, NewBid, TeacherAction, UserId};
use crate::policy;
use crate::store::SharedBidStore;

mod state;
pub use state::Bid;

mod error;
pub use error::{BidError, InvalidBidInput, InvalidCounterInput};

/// The bid negotiation engine.
///
/// Stateless between calls: each operation loads the bid, checks the guards,
/// applies the transition, and commits. The catalog is consulted for the base
/// price on submit; grants and notifications go through [`Effects`].
pub struct BidEngine {
    store: SharedBidStore,
    catalog: SharedItemCatalog,
    effects: Effects,
}

/// Public API
impl BidEngine {
    pub fn new(store: SharedBidStore, catalog: SharedItemCatalog, effects: Effects) -> Self {
        Self {
            store,
            catalog,
            effects,
        }
    }

    /// Drive the engine with a stream of commands. Failed commands are
    /// logged and skipped; the stream keeps going.
    pub async fn run(&self, mut stream: impl Stream<Item = Command> + Unpin) {
        while let Some(command) = stream.next().await {
            let _ = self.apply(command).await;
        }
    }

    /// Apply a single command, logging the outcome.
    pub async fn apply(&self, command: Command) -> Result<Bid, BidError> {
        match command {
            Command::Submit(input) => {
                let (student, item) = (input.student, input.item);
                let result = self.submit(input).await;
                match &result {
                    Ok(bid) => info!(bid = %bid.id, %student, %item, "submit applied"),
                    Err(e) => info!(%student, %item, reason = %e, "submit skipped"),
                }
                result
            }
            Command::TeacherRespond {
                bid,
                caller,
                action,
            } => {
                let result = self.teacher_respond(bid, caller, action).await;
                Self::log_result("teacher_respond", bid, caller, &result);
                result
            }
            Command::StudentRespond {
                bid,
                caller,
                accept,
            } => {
                let result = self.student_respond(bid, caller, accept).await;
                Self::log_result("student_respond", bid, caller, &result);
                result
            }
            Command::Cancel { bid, caller } => {
                let result = self.cancel(bid, caller).await;
                Self::log_result("cancel", bid, caller, &result);
                result
            }
        }
    }

    /// Create a new pending bid after validating it against the pricing
    /// policy, and notify the teacher.
    pub async fn submit(&self, input: NewBid) -> Result<Bid, BidError> {
        let item = self
            .catalog
            .item(input.item)
            .await?
            .ok_or(InvalidBidInput::UnknownItem(input.item))?;

        if !policy::is_within_bounds(item.base_price, input.proposed_price) {
            return Err(BidError::OutOfRange {
                proposed: input.proposed_price,
                min: policy::minimum_bid(item.base_price),
                max: policy::maximum_bid(item.base_price),
            });
        }

        let bid = Bid::create(input)?;
        self.store.insert(bid.clone()).await?;

        self.effects
            .notify(&bid, bid.teacher, NotificationKind::BidReceived)
            .await;

        Ok(bid)
    }

    /// Teacher accepts, rejects, or counters a pending bid.
    pub async fn teacher_respond(
        &self,
        bid_id: BidId,
        caller: UserId,
        action: TeacherAction,
    ) -> Result<Bid, BidError> {
        let bid = self.load(bid_id).await?;
        if bid.status != BidStatus::Pending {
            return Err(BidError::AlreadyFinalized {
                bid: bid_id,
                status: bid.status,
            });
        }
        if caller != bid.teacher {
            return Err(BidError::NotAuthorized {
                bid: bid_id,
                caller,
                action: "respond to",
            });
        }

        match action {
            TeacherAction::Accept => {
                let mut updated = bid.clone();
                updated.accept();
                self.commit_accept(bid, updated, NotificationKind::BidAccepted)
                    .await
            }
            TeacherAction::Reject => {
                let mut updated = bid.clone();
                updated.reject();
                let updated = self.commit(BidStatus::Pending, updated).await?;
                self.effects
                    .notify(&updated, updated.student, NotificationKind::BidRejected)
                    .await;
                Ok(updated)
            }
            TeacherAction::Counter { price, message } => {
                // The teacher sets the price, so a counter is not bounded by
                // the student floor. Any positive price is admissible.
                if !price.is_positive() {
                    return Err(InvalidCounterInput::NonPositivePrice.into());
                }
                let mut updated = bid.clone();
                updated.counter(CounterOffer { price, message });
                let updated = self.commit(BidStatus::Pending, updated).await?;
                self.effects
                    .notify(&updated, updated.student, NotificationKind::CounterOffer)
                    .await;
                Ok(updated)
            }
        }
    }

    /// Student accepts or rejects a counter-offer.
    pub async fn student_respond(
        &self,
        bid_id: BidId,
        caller: UserId,
        accept: bool,
    ) -> Result<Bid, BidError> {
        let bid = self.load(bid_id).await?;
        if bid.status != BidStatus::Countered {
            return Err(BidError::AlreadyFinalized {
                bid: bid_id,
                status: bid.status,
            });
        }
        if caller != bid.student {
            return Err(BidError::NotAuthorized {
                bid: bid_id,
                caller,
                action: "respond to",
            });
        }

        if accept {
            let mut updated = bid.clone();
            updated.accept_counter();
            self.commit_accept(bid, updated, NotificationKind::CounterAccepted)
                .await
        } else {
            let mut updated = bid.clone();
            updated.reject_counter();
            let updated = self.commit(BidStatus::Countered, updated).await?;
            self.effects
                .notify(&updated, updated.teacher, NotificationKind::CounterRejected)
                .await;
            Ok(updated)
        }
    }

    /// Student withdraws an active bid. No notification per the transition
    /// table.
    pub async fn cancel(&self, bid_id: BidId, caller: UserId) -> Result<Bid, BidError> {
        let bid = self.load(bid_id).await?;
        if bid.status.is_terminal() {
            return Err(BidError::AlreadyFinalized {
                bid: bid_id,
                status: bid.status,
            });
        }
        if caller != bid.student {
            return Err(BidError::NotAuthorized {
                bid: bid_id,
                caller,
                action: "cancel",
            });
        }

        let expected = bid.status;
        let mut updated = bid;
        updated.cancel();
        self.commit(expected, updated).await
    }
}

/// Private API
impl BidEngine {
    fn log_result(op: &str, bid: BidId, caller: UserId, result: &Result<Bid, BidError>) {
        match result {
            Ok(updated) => {
                info!(%bid, %caller, status = %updated.status, "{op} applied");
            }
            Err(e) => {
                info!(%bid, %caller, reason = %e, "{op} skipped");
            }
        }
    }

    async fn load(&self, id: BidId) -> Result<Bid, BidError> {
        self.store.fetch(id).await?.ok_or(BidError::NotFound(id))
    }

    /// Commit a non-granting transition under the status CAS.
    async fn commit(&self, expected: BidStatus, updated: Bid) -> Result<Bid, BidError> {
        if self
            .store
            .update_if_status(updated.id, expected, &updated)
            .await?
        {
            Ok(updated)
        } else {
            Err(self.lost_race(updated.id).await)
        }
    }

    /// Commit an accepting transition: status first under the CAS, then the
    /// enrollment grant. If the grant fails, the pre-transition record is
    /// restored and `GrantFailed` is surfaced; the bid must never remain
    /// accepted without a grant.
    async fn commit_accept(
        &self,
        original: Bid,
        updated: Bid,
        kind: NotificationKind,
    ) -> Result<Bid, BidError> {
        let expected = original.status;
        if !self
            .store
            .update_if_status(updated.id, expected, &updated)
            .await?
        {
            return Err(self.lost_race(updated.id).await);
        }

        let final_price = updated.proposed_price;
        if let Err(source) = self.effects.grant_enrollment(&updated, final_price).await {
            match self
                .store
                .update_if_status(original.id, BidStatus::Accepted, &original)
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    error!(bid = %original.id, "rollback lost: bid left accepted state concurrently");
                }
                Err(error) => {
                    error!(bid = %original.id, %error, "failed to roll back accepted status");
                }
            }
            return Err(BidError::GrantFailed {
                bid: original.id,
                source,
            });
        }

        let recipient = match kind {
            NotificationKind::CounterAccepted => updated.teacher,
            _ => updated.student,
        };
        self.effects.notify(&updated, recipient, kind).await;

        Ok(updated)
    }

    async fn lost_race(&self, id: BidId) -> BidError {
        match self.store.fetch(id).await {
            Ok(Some(current)) => BidError::AlreadyFinalized {
                bid: id,
                status: current.status,
            },
            Ok(None) => BidError::NotFound(id),
            Err(e) => BidError::Storage(e),
        }
    }
}
