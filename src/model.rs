//! Core domain types for the bid negotiation engine.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Amount;

/// Bid identifier.
pub type BidId = Uuid;

/// User identifier (students and teachers live in the same directory).
pub type UserId = Uuid;

/// Catalog item identifier.
pub type ItemId = Uuid;

/// Reference to the item a bid negotiates over.
///
/// Exactly one of session/content, enforced by the type: a bid pointing at
/// both (or neither) is unrepresentable past the parsing boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ItemRef {
    Session(ItemId),
    Content(ItemId),
}

impl ItemRef {
    pub fn id(&self) -> ItemId {
        match self {
            ItemRef::Session(id) | ItemRef::Content(id) => *id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ItemRef::Session(_) => "session",
            ItemRef::Content(_) => "content",
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.id())
    }
}

/// Negotiation lifecycle state of a bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    /// Submitted by the student, awaiting the teacher's response.
    #[default]
    Pending,
    /// Teacher countered, awaiting the student's response.
    Countered,
    /// Agreement reached (terminal).
    Accepted,
    /// Declined by either party (terminal).
    Rejected,
    /// Withdrawn by the student (terminal).
    Cancelled,
}

impl BidStatus {
    /// Terminal states admit no further transition.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected | Self::Cancelled)
    }

    pub const fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for BidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BidStatus::Pending => "pending",
            BidStatus::Countered => "countered",
            BidStatus::Accepted => "accepted",
            BidStatus::Rejected => "rejected",
            BidStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// A teacher's alternate price proposal, embedded in a bid while it is
/// in the `Countered` state and cleared on every other transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterOffer {
    pub price: Amount,
    pub message: Option<String>,
}

/// Input for creating a bid.
#[derive(Debug, Clone)]
pub struct NewBid {
    /// Caller-assigned id for idempotent retries; a fresh v4 id otherwise.
    pub id: Option<BidId>,
    pub student: UserId,
    pub teacher: UserId,
    pub item: ItemRef,
    pub proposed_price: Amount,
    pub message: Option<String>,
}

/// A teacher's response to a pending bid.
#[derive(Debug, Clone)]
pub enum TeacherAction {
    Accept,
    Reject,
    Counter {
        price: Amount,
        message: Option<String>,
    },
}

/// A command representing the possible inputs of the engine.
/// Commands carry their caller; the engine checks the caller is the
/// expected participant for the action.
#[derive(Debug, Clone)]
pub enum Command {
    /// Student proposes a price for an item.
    Submit(NewBid),
    /// Teacher accepts, rejects, or counters a pending bid.
    TeacherRespond {
        bid: BidId,
        caller: UserId,
        action: TeacherAction,
    },
    /// Student accepts or rejects a counter-offer.
    StudentRespond {
        bid: BidId,
        caller: UserId,
        accept: bool,
    },
    /// Student withdraws an active bid.
    Cancel { bid: BidId, caller: UserId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!BidStatus::Pending.is_terminal());
        assert!(!BidStatus::Countered.is_terminal());
        assert!(BidStatus::Accepted.is_terminal());
        assert!(BidStatus::Rejected.is_terminal());
        assert!(BidStatus::Cancelled.is_terminal());
    }

    #[test]
    fn active_is_negation_of_terminal() {
        for status in [
            BidStatus::Pending,
            BidStatus::Countered,
            BidStatus::Accepted,
            BidStatus::Rejected,
            BidStatus::Cancelled,
        ] {
            assert_eq!(status.is_active(), !status.is_terminal());
        }
    }

    #[test]
    fn status_default_is_pending() {
        assert_eq!(BidStatus::default(), BidStatus::Pending);
    }

    #[test]
    fn item_ref_serde_is_tagged() {
        let id = Uuid::nil();
        let json = serde_json::to_string(&ItemRef::Session(id)).unwrap();
        assert_eq!(
            json,
            format!(r#"{{"kind":"session","id":"{id}"}}"#)
        );

        let back: ItemRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ItemRef::Session(id));
    }

    #[test]
    fn item_ref_accessors() {
        let id = Uuid::new_v4();
        assert_eq!(ItemRef::Content(id).id(), id);
        assert_eq!(ItemRef::Content(id).kind(), "content");
        assert_eq!(ItemRef::Session(id).kind(), "session");
    }
}
