//! JSON request boundary.
//!
//! The wire shape mirrors the duck-typed bodies the UI sends (separate
//! optional `session_id`/`content_id` fields, a string action discriminator)
//! and converts them into the strongly typed [`Command`] the engine consumes,
//! so illegal combinations are rejected here and unrepresentable downstream.

use serde::Deserialize;

use crate::engine::{BidError, InvalidBidInput, InvalidCounterInput};
use crate::model::{BidId, Command, ItemId, ItemRef, NewBid, TeacherAction, UserId};
use crate::Amount;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RespondAction {
    Accept,
    Reject,
    Counter,
}

/// One operation against the negotiation surface, as received on the wire.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Submit {
        #[serde(default)]
        bid_id: Option<BidId>,
        student_id: UserId,
        teacher_id: UserId,
        #[serde(default)]
        session_id: Option<ItemId>,
        #[serde(default)]
        content_id: Option<ItemId>,
        proposed_price: Amount,
        #[serde(default)]
        message: Option<String>,
    },
    TeacherRespond {
        bid_id: BidId,
        caller_id: UserId,
        action: RespondAction,
        #[serde(default)]
        counter_price: Option<Amount>,
        #[serde(default)]
        counter_message: Option<String>,
    },
    StudentRespond {
        bid_id: BidId,
        caller_id: UserId,
        accept: bool,
    },
    Cancel {
        bid_id: BidId,
        caller_id: UserId,
    },
}

impl Request {
    /// Validate the request shape and produce an engine command.
    pub fn into_command(self) -> Result<Command, BidError> {
        match self {
            Request::Submit {
                bid_id,
                student_id,
                teacher_id,
                session_id,
                content_id,
                proposed_price,
                message,
            } => {
                let item = match (session_id, content_id) {
                    (Some(session), None) => ItemRef::Session(session),
                    (None, Some(content)) => ItemRef::Content(content),
                    (Some(_), Some(_)) => return Err(InvalidBidInput::AmbiguousItem.into()),
                    (None, None) => return Err(InvalidBidInput::MissingItem.into()),
                };
                Ok(Command::Submit(NewBid {
                    id: bid_id,
                    student: student_id,
                    teacher: teacher_id,
                    item,
                    proposed_price,
                    message,
                }))
            }
            Request::TeacherRespond {
                bid_id,
                caller_id,
                action,
                counter_price,
                counter_message,
            } => {
                let action = match action {
                    RespondAction::Accept => TeacherAction::Accept,
                    RespondAction::Reject => TeacherAction::Reject,
                    RespondAction::Counter => {
                        let price = counter_price.ok_or(InvalidCounterInput::MissingPrice)?;
                        TeacherAction::Counter {
                            price,
                            message: counter_message,
                        }
                    }
                };
                Ok(Command::TeacherRespond {
                    bid: bid_id,
                    caller: caller_id,
                    action,
                })
            }
            Request::StudentRespond {
                bid_id,
                caller_id,
                accept,
            } => Ok(Command::StudentRespond {
                bid: bid_id,
                caller: caller_id,
                accept,
            }),
            Request::Cancel { bid_id, caller_id } => Ok(Command::Cancel {
                bid: bid_id,
                caller: caller_id,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn parse(json: &str) -> Request {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn submit_with_session_id() {
        let student = Uuid::new_v4();
        let teacher = Uuid::new_v4();
        let session = Uuid::new_v4();
        let request = parse(&format!(
            r#"{{"op":"submit","student_id":"{student}","teacher_id":"{teacher}",
                "session_id":"{session}","proposed_price":600,"message":"hi"}}"#
        ));

        match request.into_command().unwrap() {
            Command::Submit(input) => {
                assert_eq!(input.student, student);
                assert_eq!(input.teacher, teacher);
                assert_eq!(input.item, ItemRef::Session(session));
                assert_eq!(input.proposed_price, Amount::from_float(600.0));
                assert_eq!(input.message.as_deref(), Some("hi"));
                assert!(input.id.is_none());
            }
            other => panic!("expected submit, got {other:?}"),
        }
    }

    #[test]
    fn submit_with_both_item_ids_is_ambiguous() {
        let id = Uuid::new_v4();
        let request = parse(&format!(
            r#"{{"op":"submit","student_id":"{id}","teacher_id":"{id}",
                "session_id":"{id}","content_id":"{id}","proposed_price":600}}"#
        ));
        let err = request.into_command().unwrap_err();
        assert!(matches!(
            err,
            BidError::InvalidInput(InvalidBidInput::AmbiguousItem)
        ));
    }

    #[test]
    fn submit_with_neither_item_id_is_missing() {
        let id = Uuid::new_v4();
        let request = parse(&format!(
            r#"{{"op":"submit","student_id":"{id}","teacher_id":"{id}","proposed_price":600}}"#
        ));
        let err = request.into_command().unwrap_err();
        assert!(matches!(
            err,
            BidError::InvalidInput(InvalidBidInput::MissingItem)
        ));
    }

    #[test]
    fn counter_requires_price() {
        let id = Uuid::new_v4();
        let request = parse(&format!(
            r#"{{"op":"teacher_respond","bid_id":"{id}","caller_id":"{id}","action":"counter"}}"#
        ));
        let err = request.into_command().unwrap_err();
        assert!(matches!(
            err,
            BidError::InvalidCounter(InvalidCounterInput::MissingPrice)
        ));
    }

    #[test]
    fn counter_with_price_and_message() {
        let id = Uuid::new_v4();
        let request = parse(&format!(
            r#"{{"op":"teacher_respond","bid_id":"{id}","caller_id":"{id}",
                "action":"counter","counter_price":800,"counter_message":"meet me halfway"}}"#
        ));
        match request.into_command().unwrap() {
            Command::TeacherRespond {
                action: TeacherAction::Counter { price, message },
                ..
            } => {
                assert_eq!(price, Amount::from_float(800.0));
                assert_eq!(message.as_deref(), Some("meet me halfway"));
            }
            other => panic!("expected counter, got {other:?}"),
        }
    }

    #[test]
    fn student_respond_and_cancel() {
        let bid = Uuid::new_v4();
        let caller = Uuid::new_v4();

        let request = parse(&format!(
            r#"{{"op":"student_respond","bid_id":"{bid}","caller_id":"{caller}","accept":true}}"#
        ));
        assert!(matches!(
            request.into_command().unwrap(),
            Command::StudentRespond { accept: true, .. }
        ));

        let request = parse(&format!(
            r#"{{"op":"cancel","bid_id":"{bid}","caller_id":"{caller}"}}"#
        ));
        assert!(matches!(
            request.into_command().unwrap(),
            Command::Cancel { .. }
        ));
    }

    #[test]
    fn unknown_op_fails_to_parse() {
        let result: Result<Request, _> = serde_json::from_str(r#"{"op":"pay"}"#);
        assert!(result.is_err());
    }
}
