mod now;
mod pubsub;

pub use now::Now;
pub(crate) use pubsub::AuctionSender;
