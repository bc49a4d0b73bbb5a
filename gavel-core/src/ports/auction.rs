use crate::models::{
    AuctionDraft, AuctionId, AuctionRecord, AuctionStatus, BidderId, Config, RelistRequest,
};
use std::future::Future;
use time::OffsetDateTime;

/// The ways placing a bid can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidFailure {
    /// No auction with the requested id
    AuctionNotFound,
    /// The auction exists but is not accepting bids
    AuctionNotLive {
        /// The state it is in instead
        status: AuctionStatus,
    },
    /// The amount does not meet the increment rule; the caller can
    /// retry at or above `minimum`
    BidTooLow {
        /// The current minimum acceptable bid
        minimum: i64,
    },
    /// The price moved twice while this bid was being applied; the
    /// caller should re-fetch a snapshot before retrying
    Conflict,
}

/// The ways an immediate purchase can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuyNowFailure {
    /// No auction with the requested id
    AuctionNotFound,
    /// The auction exists but is not open
    AuctionNotLive {
        /// The state it is in instead
        status: AuctionStatus,
    },
    /// The seller configured no buy-now price
    BuyNowUnavailable,
    /// A concurrent finalization won the race to the terminal state
    AlreadyFinalized,
}

/// The ways a cancellation can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelFailure {
    /// No auction with the requested id
    AuctionNotFound,
    /// Only live auctions may be cancelled
    AuctionNotLive {
        /// The state it is in instead
        status: AuctionStatus,
    },
    /// Bids have been accepted; the auction must run its course
    ActiveBids {
        /// How many bids stand in the way
        total_bids: u32,
    },
}

/// The ways a relist can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelistFailure {
    /// No auction with the requested id
    AuctionNotFound,
    /// Only ended (not sold, not cancelled) auctions may be relisted
    NotEligible {
        /// The state it is in instead
        status: AuctionStatus,
    },
    /// The source auction already has a successor
    AlreadyRelisted,
    /// The requested times do not form a valid schedule
    InvalidSchedule,
}

/// The ways inserting a fresh record can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateFailure {
    /// The draft's times do not form a valid schedule
    InvalidSchedule,
}

/// A successfully applied bid
#[derive(Debug)]
pub struct BidPlacement {
    /// The auction after the bid was applied
    pub auction: AuctionRecord,
    /// The bidder who lost the top of the ledger, when there was one
    /// other than the new bidder
    pub outbid: Option<BidderId>,
    /// True when the bid met the buy-now price and the same atomic step
    /// closed the sale
    pub finalized: bool,
}

/// A successful immediate purchase
#[derive(Debug)]
pub struct BuyNowReceipt {
    /// The auction after finalization
    pub auction: AuctionRecord,
    /// The price the sale closed at
    pub final_price: i64,
}

/// One auction advanced by a sweep
#[derive(Debug)]
pub struct Transition {
    /// The state the sweep observed before writing
    pub from: AuctionStatus,
    /// The record after the transition applied
    pub auction: AuctionRecord,
}

/// Everything one sweep did and saw: the transitions it applied, and
/// the auctions live afterwards (which feed countdown and ending-soon
/// publication)
#[derive(Debug)]
pub struct SweepOutcome {
    /// Transitions applied this sweep
    pub transitions: Vec<Transition>,
    /// All auctions live once the sweep finished
    pub live: Vec<AuctionRecord>,
}

/// Repository interface for the auction record store.
///
/// The unit of serialization is one auction record: implementations
/// must linearize all mutations of a given id relative to each other,
/// while operations on different auctions proceed independently. Every
/// mutation goes through a conditional write keyed on the state the
/// writer last observed; an unconditional overwrite is never permitted.
pub trait AuctionRepository: super::Repository {
    /// The engine configuration this store was opened with
    fn config(&self) -> &Config;

    /// Insert a fresh record in the scheduled state
    fn create_auction(
        &self,
        draft: AuctionDraft,
        timestamp: OffsetDateTime,
    ) -> impl Future<Output = Result<Result<AuctionRecord, CreateFailure>, Self::Error>> + Send;

    /// Fetch one record with its full ledger
    fn get_auction(
        &self,
        auction_id: AuctionId,
    ) -> impl Future<Output = Result<Option<AuctionRecord>, Self::Error>> + Send;

    /// Validate and atomically apply a single bid.
    ///
    /// Acceptance is effectively a compare-and-swap on the standing
    /// price: of two callers racing at the same price, at most one may
    /// win it. A lost conditional write is retried internally exactly
    /// once against fresh state; a second loss returns
    /// [`BidFailure::Conflict`]. A bid is never silently dropped and
    /// never applied at a stale price. A bid meeting the buy-now price
    /// finalizes the auction to sold in the same atomic step.
    fn place_bid(
        &self,
        auction_id: AuctionId,
        bidder_id: BidderId,
        amount: i64,
        timestamp: OffsetDateTime,
    ) -> impl Future<Output = Result<Result<BidPlacement, BidFailure>, Self::Error>> + Send;

    /// Atomically short-circuit a live auction to sold at its buy-now
    /// price.
    ///
    /// Mutually exclusive with a racing top-of-market bid: exactly one
    /// finalizer wins the transition, and the loser sees
    /// [`BuyNowFailure::AlreadyFinalized`].
    fn buy_now(
        &self,
        auction_id: AuctionId,
        buyer_id: BidderId,
        timestamp: OffsetDateTime,
    ) -> impl Future<Output = Result<Result<BuyNowReceipt, BuyNowFailure>, Self::Error>> + Send;

    /// Withdraw a live auction that has accepted no bids
    fn cancel_auction(
        &self,
        auction_id: AuctionId,
        timestamp: OffsetDateTime,
    ) -> impl Future<Output = Result<Result<AuctionRecord, CancelFailure>, Self::Error>> + Send;

    /// Create a successor auction from an ended, unsold source.
    ///
    /// The new record copies the source's pricing unless overridden,
    /// starts with an empty ledger in the scheduled state, and the two
    /// records are linked bidirectionally and immutably.
    fn relist_auction(
        &self,
        auction_id: AuctionId,
        request: RelistRequest,
        timestamp: OffsetDateTime,
    ) -> impl Future<Output = Result<Result<AuctionRecord, RelistFailure>, Self::Error>> + Send;

    /// Advance every non-terminal auction by elapsed time: scheduled
    /// auctions whose start has passed go live, and live auctions whose
    /// end has passed close per their reserve and ledger.
    ///
    /// Each transition is a conditional write against the observed
    /// state; one that loses a race to a concurrent bid or buy-now is
    /// skipped silently and re-evaluated on the next sweep.
    fn sweep(
        &self,
        timestamp: OffsetDateTime,
    ) -> impl Future<Output = Result<SweepOutcome, Self::Error>> + Send;
}
