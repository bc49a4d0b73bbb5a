use gavel_core::models::{AuctionDraft, AuctionId, BidderId, Config};
use gavel_core::ports::AuctionRepository;
use gavel_sqlite::db::Database;
use time::{Duration, OffsetDateTime};

pub fn open() -> Database {
    Database::open(None, Some(&Config::default())).expect("in-memory database")
}

/// A draft that is already past its start time, so a single sweep
/// promotes it to live.
pub fn draft(seller_id: BidderId, now: OffsetDateTime) -> AuctionDraft {
    AuctionDraft {
        seller_id,
        start_time: now - Duration::minutes(5),
        end_time: now + Duration::hours(2),
        starting_bid: 100,
        reserve_price: None,
        buy_now_price: None,
        bid_increment: None,
    }
}

/// A draft whose whole window is already in the past, so two sweeps
/// walk it through live into its terminal state.
pub fn elapsed_draft(seller_id: BidderId, now: OffsetDateTime) -> AuctionDraft {
    AuctionDraft {
        seller_id,
        start_time: now - Duration::hours(3),
        end_time: now - Duration::hours(1),
        starting_bid: 100,
        reserve_price: None,
        buy_now_price: None,
        bid_increment: None,
    }
}

pub async fn live_auction(db: &Database, draft: AuctionDraft, now: OffsetDateTime) -> AuctionId {
    let record = db.create_auction(draft, now).await.unwrap().unwrap();
    db.sweep(now).await.unwrap();
    record.auction_id
}
