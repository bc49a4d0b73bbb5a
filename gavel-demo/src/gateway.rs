use gavel_core::models::{SettlementError, SettlementRequest};
use gavel_core::ports::SettlementGateway;
use tracing::{Level, event};

/// A stand-in payment provider: approves every settlement and logs it.
/// A real integration sits behind the same trait, and its failures and
/// timeouts are already handled by the settlement worker.
pub struct LogSettlement;

impl SettlementGateway for LogSettlement {
    async fn settle(&self, request: &SettlementRequest) -> Result<(), SettlementError> {
        event!(
            Level::INFO,
            auction_id = %request.auction_id,
            buyer_id = %request.buyer_id,
            amount = request.amount,
            "settlement accepted"
        );
        Ok(())
    }
}
