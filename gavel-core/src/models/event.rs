use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{AuctionStatus, BidderId};

/// A state-change event published to an auction's subscribers.
///
/// One variant per wire event, each with a fixed field set. Delivery is
/// best-effort and at-most-once per subscriber: there is no replay
/// queue, and a late-joining subscriber is expected to fetch a snapshot
/// from the store instead of relying on historical events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum AuctionEvent {
    /// A bid was validated and applied
    BidAccepted {
        /// The new standing price
        current_bid: i64,
        /// The new ledger length
        total_bids: u32,
        /// Who placed the winning-so-far bid
        bidder_id: BidderId,
        /// When the bid was accepted
        #[serde(with = "time::serde::rfc3339")]
        timestamp: OffsetDateTime,
    },
    /// Periodic tick while the auction is live
    Countdown {
        /// Whole seconds until close, never negative
        remaining: u64,
    },
    /// The auction crossed the configured urgency threshold; sent once
    /// per auction per crossing
    AuctionEndingSoon,
    /// The auction reached a terminal state by elapsing or by buy-now
    AuctionEnded {
        /// The terminal state, ended or sold
        status: AuctionStatus,
        /// The winner, when the auction sold
        #[serde(default, skip_serializing_if = "Option::is_none")]
        winner: Option<BidderId>,
        /// The sale price, when the auction sold
        #[serde(default, skip_serializing_if = "Option::is_none")]
        final_price: Option<i64>,
    },
    /// The seller withdrew the auction before any bids arrived
    AuctionCancelled,
}

impl AuctionEvent {
    /// The wire name of this event, used to tag the delivery channel
    pub fn name(&self) -> &'static str {
        match self {
            Self::BidAccepted { .. } => "bid-accepted",
            Self::Countdown { .. } => "countdown",
            Self::AuctionEndingSoon => "auction-ending-soon",
            Self::AuctionEnded { .. } => "auction-ended",
            Self::AuctionCancelled => "auction-cancelled",
        }
    }
}
