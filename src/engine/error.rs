//! Error types for bid negotiation.

use thiserror::Error;

use crate::model::{BidId, BidStatus, ItemRef, UserId};
use crate::Amount;

/// Top-level error returned by the [`BidEngine`](super::BidEngine) operations.
///
/// Every transition failure is a distinct kind so callers can react precisely
/// (404 for `NotFound`, 403 for `NotAuthorized`, 409 for `AlreadyFinalized`,
/// and so on).
#[derive(Debug, Error)]
pub enum BidError {
    #[error("invalid bid: {0}")]
    InvalidInput(#[from] InvalidBidInput),

    #[error("invalid counter-offer: {0}")]
    InvalidCounter(#[from] InvalidCounterInput),

    /// Proposed price outside the policy range; bounds included for UX.
    #[error("proposed price {proposed} is outside the allowed range [{min}, {max}]")]
    OutOfRange {
        proposed: Amount,
        min: Amount,
        max: Amount,
    },

    #[error("bid {0} not found")]
    NotFound(BidId),

    #[error("user {caller} may not {action} bid {bid}")]
    NotAuthorized {
        bid: BidId,
        caller: UserId,
        action: &'static str,
    },

    /// The bid is terminal, or not in the state the action expects. Also the
    /// outcome of losing a concurrent-transition race on the same bid.
    #[error("bid {bid} is already finalized ({status})")]
    AlreadyFinalized { bid: BidId, status: BidStatus },

    /// The enrollment grant failed; the status transition has been rolled
    /// back and the bid is left in its pre-transition state.
    #[error("enrollment grant failed for bid {bid}, transition rolled back")]
    GrantFailed {
        bid: BidId,
        #[source]
        source: anyhow::Error,
    },

    #[error("storage error")]
    Storage(#[from] anyhow::Error),
}

/// Malformed bid creation input, rejected before any state change.
#[derive(Debug, Error, PartialEq)]
pub enum InvalidBidInput {
    #[error("proposed price must be positive")]
    NonPositivePrice,

    #[error("student and teacher must be different users")]
    SelfBid,

    #[error("exactly one of session_id or content_id must be set")]
    AmbiguousItem,

    #[error("one of session_id or content_id must be set")]
    MissingItem,

    #[error("unknown item: {0}")]
    UnknownItem(ItemRef),
}

/// Malformed counter-offer input.
#[derive(Debug, Error, PartialEq)]
pub enum InvalidCounterInput {
    #[error("counter price must be positive")]
    NonPositivePrice,

    #[error("counter action requires a price")]
    MissingPrice,
}
