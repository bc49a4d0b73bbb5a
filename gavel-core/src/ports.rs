mod auction;
mod notification;
mod settlement;

pub use auction::{
    AuctionRepository, BidFailure, BidPlacement, BuyNowFailure, BuyNowReceipt, CancelFailure,
    CreateFailure, RelistFailure, SweepOutcome, Transition,
};
pub use notification::NotificationRepository;
pub use settlement::{SettlementGateway, SettlementRepository};

/// Base trait for every repository interface, fixing the infrastructure
/// error type.
///
/// Domain-level failures are not errors: operations that can fail for
/// domain reasons return the double-result shape
/// `Result<Result<T, Failure>, Self::Error>`, where the outer error is
/// the adapter's (connection lost, corrupt row) and the inner failure
/// is a typed outcome the caller is expected to handle.
pub trait Repository {
    /// The adapter's infrastructure error
    type Error: std::error::Error + Send + Sync + 'static;
}

/// The "marker" trait that is used everywhere and implies implementation of all the above
pub trait MarketRepository:
    AuctionRepository + NotificationRepository + SettlementRepository + Clone + Send + Sync + 'static
{
}
