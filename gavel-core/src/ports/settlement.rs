use crate::models::{AuctionId, BidderId, SettlementError, SettlementRequest, SettlementStatus};
use std::future::Future;
use time::OffsetDateTime;

/// Repository interface for the payment bookkeeping of finalized sales.
///
/// One row per sold auction, upserted as the settlement advances
/// through pending, settled, or failed. Settlement state never feeds
/// back into the auction record: a failure here is retryable and the
/// `sold` status stands.
pub trait SettlementRepository: super::Repository {
    /// Upsert the payment status of a finalized sale
    fn record_settlement(
        &self,
        auction_id: AuctionId,
        buyer_id: BidderId,
        amount: i64,
        status: SettlementStatus,
        timestamp: OffsetDateTime,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// The boundary to the external payment service.
///
/// Only the engine's use of it is specified: the engine invokes it once
/// per sale, under a timeout it supplies, after the `sold` transition
/// has committed. What the provider does internally is its own affair.
pub trait SettlementGateway: Send + Sync + 'static {
    /// Attempt to settle the sale with the payment provider
    fn settle(
        &self,
        request: &SettlementRequest,
    ) -> impl Future<Output = Result<(), SettlementError>> + Send;
}
