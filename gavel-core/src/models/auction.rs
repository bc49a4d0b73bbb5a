use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use super::{AuctionId, BidderId};

/// The lifecycle state of an auction.
///
/// Transitions only move along `scheduled → live → {ended, sold}`, with
/// `live → cancelled` permitted while no bids have been accepted. Note
/// that "ending soon" is deliberately absent: it is an urgency signal
/// derived from the clock at publication time, not a persisted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuctionStatus {
    /// Created but not yet open for bidding
    Scheduled,
    /// Open for bidding
    Live,
    /// Closed without a sale (no bids, or reserve unmet)
    Ended,
    /// Closed with a winner
    Sold,
    /// Withdrawn by the seller before any bids arrived
    Cancelled,
}

impl AuctionStatus {
    /// Whether bids are currently accepted
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }

    /// Whether this state admits no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ended | Self::Sold | Self::Cancelled)
    }

    /// The kebab-case name, as serialized and as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Live => "live",
            Self::Ended => "ended",
            Self::Sold => "sold",
            Self::Cancelled => "cancelled",
        }
    }

    /// The inverse of [`AuctionStatus::as_str`]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "scheduled" => Some(Self::Scheduled),
            "live" => Some(Self::Live),
            "ended" => Some(Self::Ended),
            "sold" => Some(Self::Sold),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in an auction's bid ledger.
///
/// The ledger is append-only and its insertion order is both the
/// chronological and the ranking order: amounts are strictly increasing,
/// so the most recent entry is always the highest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    /// Who placed the bid
    pub bidder_id: BidderId,
    /// The offered amount, in integer minor units
    pub amount: i64,
    /// When the bid was accepted
    #[serde(with = "time::serde::rfc3339")]
    pub placed_at: OffsetDateTime,
}

/// The authoritative state of one auction.
///
/// All monetary fields are integer minor units. The mutable fields
/// (`current_bid`, `total_bids`, `bid_history`, `status`, and the
/// winner/relist links) are only ever written through the conditional
/// update path of the record store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionRecord {
    /// The unique, immutable identifier of this auction
    pub auction_id: AuctionId,
    /// The owning user
    pub seller_id: BidderId,
    /// When bidding opens
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    /// When bidding closes
    #[serde(with = "time::serde::rfc3339")]
    pub end_time: OffsetDateTime,
    /// The price bidding starts from
    pub starting_bid: i64,
    /// Hidden minimum sale price; if unmet at close, no sale occurs
    pub reserve_price: Option<i64>,
    /// Price at which a bidder may immediately end the auction in their favor
    pub buy_now_price: Option<i64>,
    /// Fixed increment override; when unset, the 5%-or-at-least-1 default applies
    pub bid_increment: Option<i64>,
    /// The standing price; starts at `starting_bid` and never decreases
    pub current_bid: i64,
    /// Count of accepted bids; always equals `bid_history.len()`
    pub total_bids: u32,
    /// The append-only bid ledger
    pub bid_history: Vec<Bid>,
    /// Set if and only if `status` is [`AuctionStatus::Sold`]
    pub winner: Option<BidderId>,
    /// Set if and only if `status` is [`AuctionStatus::Sold`]
    pub winning_bid: Option<i64>,
    /// The auction this one was relisted from, when it has a predecessor
    pub relist_of: Option<AuctionId>,
    /// The auction this one was relisted as, once relisted
    pub relisted_as: Option<AuctionId>,
    /// The lifecycle state
    pub status: AuctionStatus,
}

impl AuctionRecord {
    /// The smallest amount by which a new bid must exceed the standing price.
    ///
    /// When the seller did not fix an increment, it is 5% of the standing
    /// price, and never less than one minor unit. This is the
    /// authoritative computation; any client-side recomputation is
    /// advisory only.
    pub fn minimum_increment(&self) -> i64 {
        self.bid_increment
            .unwrap_or_else(|| (self.current_bid / 20).max(1))
    }

    /// The smallest acceptable next bid
    pub fn minimum_next_bid(&self) -> i64 {
        self.current_bid + self.minimum_increment()
    }

    /// Time left until the auction closes, clamped to zero
    pub fn remaining(&self, now: OffsetDateTime) -> Duration {
        if now >= self.end_time {
            Duration::ZERO
        } else {
            self.end_time - now
        }
    }

    /// Whether `amount` meets or exceeds the configured buy-now price.
    ///
    /// A bid at this level closes the sale in the same atomic step that
    /// accepts it, rather than leaving the auction live at or above the
    /// price a buyer could take it for outright.
    pub fn meets_buy_now(&self, amount: i64) -> bool {
        self.buy_now_price.is_some_and(|price| amount >= price)
    }

    /// The bidder currently holding the top of the ledger, if any
    pub fn high_bidder(&self) -> Option<BidderId> {
        self.bid_history.last().map(|bid| bid.bidder_id)
    }

    /// How the auction resolves once its end time has elapsed: a sale
    /// requires at least one bid and, when a reserve was set, a standing
    /// price that meets it. Everything else (including the zero-bid
    /// case) closes without a sale.
    pub fn close_outcome(&self) -> CloseOutcome {
        if self.total_bids > 0
            && self
                .reserve_price
                .is_none_or(|reserve| self.current_bid >= reserve)
        {
            CloseOutcome::Sold
        } else {
            CloseOutcome::Ended
        }
    }

    /// The client-facing view of this record
    pub fn snapshot(&self, now: OffsetDateTime) -> AuctionSnapshot {
        AuctionSnapshot {
            status: self.status,
            current_bid: self.current_bid,
            total_bids: self.total_bids,
            minimum_next_bid: self.minimum_next_bid(),
            bid_history: self.bid_history.clone(),
            remaining: self.remaining(now).whole_seconds().max(0) as u64,
            winner: self.winner,
        }
    }
}

/// How an elapsed auction resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// At least one bid and any reserve met
    Sold,
    /// No bids, or the reserve went unmet
    Ended,
}

/// Parameters for inserting a fresh auction record.
///
/// Listing creation itself lives outside the engine, but relisting and
/// administrative seeding both need an insertion path, so the schedule
/// constraints are enforced here as well.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionDraft {
    /// The owning user
    pub seller_id: BidderId,
    /// When bidding opens
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    /// When bidding closes
    #[serde(with = "time::serde::rfc3339")]
    pub end_time: OffsetDateTime,
    /// The price bidding starts from
    pub starting_bid: i64,
    /// Hidden minimum sale price
    #[serde(default)]
    pub reserve_price: Option<i64>,
    /// Immediate-purchase price
    #[serde(default)]
    pub buy_now_price: Option<i64>,
    /// Fixed increment override
    #[serde(default)]
    pub bid_increment: Option<i64>,
}

impl AuctionDraft {
    /// The shortest permitted auction
    pub const MINIMUM_DURATION: Duration = Duration::HOUR;

    /// Whether the draft's times form a valid schedule
    pub fn schedule_is_valid(&self) -> bool {
        self.end_time > self.start_time
            && self.end_time - self.start_time >= Self::MINIMUM_DURATION
    }

    /// Materialize the draft as a scheduled record with an empty ledger
    pub fn into_record(self, auction_id: AuctionId) -> AuctionRecord {
        AuctionRecord {
            auction_id,
            seller_id: self.seller_id,
            start_time: self.start_time,
            end_time: self.end_time,
            starting_bid: self.starting_bid,
            reserve_price: self.reserve_price,
            buy_now_price: self.buy_now_price,
            bid_increment: self.bid_increment,
            current_bid: self.starting_bid,
            total_bids: 0,
            bid_history: Vec::new(),
            winner: None,
            winning_bid: None,
            relist_of: None,
            relisted_as: None,
            status: AuctionStatus::Scheduled,
        }
    }
}

/// Fresh timing, and optionally adjusted pricing, for relisting an
/// ended auction. Prices not supplied here are inherited from the
/// source record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelistRequest {
    /// When the new auction opens; must not be in the past
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    /// When the new auction closes
    #[serde(with = "time::serde::rfc3339")]
    pub end_time: OffsetDateTime,
    /// Replacement starting price
    #[serde(default)]
    pub starting_bid: Option<i64>,
    /// Replacement reserve
    #[serde(default)]
    pub reserve_price: Option<i64>,
    /// Replacement increment
    #[serde(default)]
    pub bid_increment: Option<i64>,
}

/// The client-facing view of an auction: everything a late-joining
/// subscriber needs, since the event channel carries no history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionSnapshot {
    /// The lifecycle state
    pub status: AuctionStatus,
    /// The standing price
    pub current_bid: i64,
    /// Count of accepted bids
    pub total_bids: u32,
    /// The authoritative minimum acceptable next bid
    pub minimum_next_bid: i64,
    /// The full ledger, oldest first
    pub bid_history: Vec<Bid>,
    /// Whole seconds until close, zero once elapsed
    pub remaining: u64,
    /// The winner, for sold auctions
    pub winner: Option<BidderId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(starting_bid: i64) -> AuctionRecord {
        let now = OffsetDateTime::now_utc();
        AuctionDraft {
            seller_id: BidderId::random(),
            start_time: now,
            end_time: now + Duration::hours(2),
            starting_bid,
            reserve_price: None,
            buy_now_price: None,
            bid_increment: None,
        }
        .into_record(AuctionId::random())
    }

    #[test]
    fn default_increment_is_five_percent_with_a_floor() {
        let auction = record(100);
        assert_eq!(auction.minimum_increment(), 5);
        assert_eq!(auction.minimum_next_bid(), 105);

        // Below 20 minor units, 5% rounds to zero and the floor applies
        let auction = record(10);
        assert_eq!(auction.minimum_increment(), 1);
        assert_eq!(auction.minimum_next_bid(), 11);
    }

    #[test]
    fn fixed_increment_overrides_the_default() {
        let mut auction = record(100);
        auction.bid_increment = Some(25);
        assert_eq!(auction.minimum_next_bid(), 125);
    }

    #[test]
    fn remaining_never_goes_negative() {
        let auction = record(100);
        assert_eq!(
            auction.remaining(auction.end_time + Duration::minutes(5)),
            Duration::ZERO
        );
        assert_eq!(
            auction.remaining(auction.end_time - Duration::seconds(30)),
            Duration::seconds(30)
        );
    }

    #[test]
    fn close_outcome_respects_bids_and_reserve() {
        let mut auction = record(100);
        assert_eq!(auction.close_outcome(), CloseOutcome::Ended);

        auction.total_bids = 1;
        auction.current_bid = 120;
        assert_eq!(auction.close_outcome(), CloseOutcome::Sold);

        auction.reserve_price = Some(150);
        assert_eq!(auction.close_outcome(), CloseOutcome::Ended);

        auction.current_bid = 150;
        assert_eq!(auction.close_outcome(), CloseOutcome::Sold);
    }

    #[test]
    fn schedule_validation_enforces_the_minimum_duration() {
        let now = OffsetDateTime::now_utc();
        let mut draft = AuctionDraft {
            seller_id: BidderId::random(),
            start_time: now,
            end_time: now + Duration::minutes(30),
            starting_bid: 100,
            reserve_price: None,
            buy_now_price: None,
            bid_increment: None,
        };
        assert!(!draft.schedule_is_valid());

        draft.end_time = now + Duration::hours(1);
        assert!(draft.schedule_is_valid());

        draft.end_time = now - Duration::hours(1);
        assert!(!draft.schedule_is_valid());
    }
}
