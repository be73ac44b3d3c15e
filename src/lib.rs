pub mod amount;
pub mod catalog;
pub mod effects;
pub mod engine;
pub mod model;
pub mod policy;
pub mod query;
pub mod request;
pub mod store;

pub use amount::Amount;
pub use engine::{Bid, BidEngine, BidError};
pub use model::{BidId, BidStatus, Command, ItemRef, UserId};
