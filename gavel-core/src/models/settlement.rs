use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{AuctionId, BidderId};

/// Payment state of a finalized sale.
///
/// This is bookkeeping on the order, strictly downstream of the
/// auction: a failed or timed-out settlement is retryable and never
/// reverts the committed `sold` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SettlementStatus {
    /// Handed to the payment provider, awaiting its answer
    Pending,
    /// The provider confirmed the charge
    Settled,
    /// The provider declined, or did not answer in time
    Failed,
}

impl SettlementStatus {
    /// The kebab-case name, as serialized and as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Settled => "settled",
            Self::Failed => "failed",
        }
    }

    /// The inverse of [`SettlementStatus::as_str`]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "settled" => Some(Self::Settled),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// The hand-off to the payment provider once a sale is final
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementRequest {
    /// The sold auction
    pub auction_id: AuctionId,
    /// Who pays
    pub buyer_id: BidderId,
    /// Who gets paid
    pub seller_id: BidderId,
    /// The sale price, in integer minor units
    pub amount: i64,
}

/// Why the payment provider did not confirm a charge
#[derive(Debug, Error)]
pub enum SettlementError {
    /// The provider answered and said no
    #[error("settlement declined: {0}")]
    Declined(String),
    /// The provider could not be reached
    #[error("settlement provider unavailable: {0}")]
    Unavailable(String),
}
