mod common;

use gavel_core::models::{AuctionStatus, BidderId, RelistRequest};
use gavel_core::ports::{AuctionRepository, RelistFailure};
use time::{Duration, OffsetDateTime};

fn request(now: OffsetDateTime) -> RelistRequest {
    RelistRequest {
        start_time: now + Duration::minutes(10),
        end_time: now + Duration::hours(2),
        starting_bid: None,
        reserve_price: None,
        bid_increment: None,
    }
}

async fn ended_auction(
    db: &gavel_sqlite::db::Database,
    now: OffsetDateTime,
) -> gavel_core::models::AuctionId {
    let record = db
        .create_auction(common::elapsed_draft(BidderId::random(), now), now)
        .await
        .unwrap()
        .unwrap();
    db.sweep(now).await.unwrap();
    db.sweep(now).await.unwrap();
    record.auction_id
}

#[tokio::test]
async fn relisting_links_a_fresh_scheduled_auction() {
    let db = common::open();
    let now = OffsetDateTime::now_utc();

    let source_id = ended_auction(&db, now).await;
    let successor = db
        .relist_auction(source_id, request(now), now)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(successor.status, AuctionStatus::Scheduled);
    assert_eq!(successor.relist_of, Some(source_id));
    assert!(successor.bid_history.is_empty());
    assert_eq!(successor.total_bids, 0);
    assert_eq!(successor.current_bid, successor.starting_bid);

    let source = db.get_auction(source_id).await.unwrap().unwrap();
    assert_eq!(source.relisted_as, Some(successor.auction_id));
    assert_eq!(source.status, AuctionStatus::Ended);
}

#[tokio::test]
async fn pricing_is_inherited_unless_overridden() {
    let db = common::open();
    let now = OffsetDateTime::now_utc();

    let mut draft = common::elapsed_draft(BidderId::random(), now);
    draft.starting_bid = 250;
    draft.reserve_price = Some(400);
    draft.bid_increment = Some(25);
    let record = db.create_auction(draft, now).await.unwrap().unwrap();
    db.sweep(now).await.unwrap();
    db.sweep(now).await.unwrap();

    let inherited = db
        .relist_auction(record.auction_id, request(now), now)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(inherited.starting_bid, 250);
    assert_eq!(inherited.reserve_price, Some(400));
    assert_eq!(inherited.bid_increment, Some(25));

    // A second source, this time overriding the pricing
    let source_id = ended_auction(&db, now).await;
    let mut overridden = request(now);
    overridden.starting_bid = Some(80);
    overridden.reserve_price = Some(120);
    let successor = db
        .relist_auction(source_id, overridden, now)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(successor.starting_bid, 80);
    assert_eq!(successor.current_bid, 80);
    assert_eq!(successor.reserve_price, Some(120));
}

#[tokio::test]
async fn only_ended_auctions_are_eligible() {
    let db = common::open();
    let now = OffsetDateTime::now_utc();

    // Sold via buy-now
    let mut draft = common::draft(BidderId::random(), now);
    draft.buy_now_price = Some(400);
    let sold_id = common::live_auction(&db, draft, now).await;
    db.buy_now(sold_id, BidderId::random(), now)
        .await
        .unwrap()
        .unwrap();

    let failure = db
        .relist_auction(sold_id, request(now), now)
        .await
        .unwrap()
        .unwrap_err();
    assert_eq!(
        failure,
        RelistFailure::NotEligible {
            status: AuctionStatus::Sold
        }
    );

    // Still live
    let live_id = common::live_auction(&db, common::draft(BidderId::random(), now), now).await;
    let failure = db
        .relist_auction(live_id, request(now), now)
        .await
        .unwrap()
        .unwrap_err();
    assert_eq!(
        failure,
        RelistFailure::NotEligible {
            status: AuctionStatus::Live
        }
    );
}

#[tokio::test]
async fn an_auction_relists_at_most_once() {
    let db = common::open();
    let now = OffsetDateTime::now_utc();

    let source_id = ended_auction(&db, now).await;
    db.relist_auction(source_id, request(now), now)
        .await
        .unwrap()
        .unwrap();

    let failure = db
        .relist_auction(source_id, request(now), now)
        .await
        .unwrap()
        .unwrap_err();
    assert_eq!(failure, RelistFailure::AlreadyRelisted);
}

#[tokio::test]
async fn relist_schedules_must_be_in_the_future_and_long_enough() {
    let db = common::open();
    let now = OffsetDateTime::now_utc();

    let source_id = ended_auction(&db, now).await;

    let mut past = request(now);
    past.start_time = now - Duration::minutes(1);
    let failure = db
        .relist_auction(source_id, past, now)
        .await
        .unwrap()
        .unwrap_err();
    assert_eq!(failure, RelistFailure::InvalidSchedule);

    let mut short = request(now);
    short.end_time = short.start_time + Duration::minutes(30);
    let failure = db
        .relist_auction(source_id, short, now)
        .await
        .unwrap()
        .unwrap_err();
    assert_eq!(failure, RelistFailure::InvalidSchedule);

    let failure = db
        .relist_auction(gavel_core::models::AuctionId::random(), request(now), now)
        .await
        .unwrap()
        .unwrap_err();
    assert_eq!(failure, RelistFailure::AuctionNotFound);
}
