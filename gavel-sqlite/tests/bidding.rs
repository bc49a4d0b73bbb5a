mod common;

use gavel_core::models::{AuctionStatus, BidderId};
use gavel_core::ports::{AuctionRepository, BidFailure, BuyNowFailure};
use time::OffsetDateTime;

#[tokio::test]
async fn increments_follow_the_five_percent_rule() {
    let db = common::open();
    let now = OffsetDateTime::now_utc();
    let seller = BidderId::random();
    let bidder = BidderId::random();

    let auction_id = common::live_auction(&db, common::draft(seller, now), now).await;

    // Starting bid 100, so the first acceptable bid is 105
    let failure = db
        .place_bid(auction_id, bidder, 102, now)
        .await
        .unwrap()
        .unwrap_err();
    assert_eq!(failure, BidFailure::BidTooLow { minimum: 105 });

    let placement = db
        .place_bid(auction_id, bidder, 105, now)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(placement.auction.current_bid, 105);
    assert_eq!(placement.auction.total_bids, 1);
    assert!(!placement.finalized);
    assert!(placement.outbid.is_none());
}

#[tokio::test]
async fn the_ledger_is_monotonic_and_counted() {
    let db = common::open();
    let now = OffsetDateTime::now_utc();
    let seller = BidderId::random();
    let alice = BidderId::random();
    let bob = BidderId::random();

    let auction_id = common::live_auction(&db, common::draft(seller, now), now).await;

    let mut minimum = 105;
    for (i, bidder) in [alice, bob, alice, bob].into_iter().enumerate() {
        let placement = db
            .place_bid(auction_id, bidder, minimum, now + time::Duration::seconds(i as i64))
            .await
            .unwrap()
            .unwrap();
        minimum = placement.auction.minimum_next_bid();
    }

    let auction = db.get_auction(auction_id).await.unwrap().unwrap();
    assert_eq!(auction.total_bids as usize, auction.bid_history.len());
    assert_eq!(
        auction.current_bid,
        auction.bid_history.last().unwrap().amount
    );
    assert_eq!(auction.high_bidder(), Some(bob));

    // Every entry tops the one before it by at least the increment that
    // applied at that price
    let mut price = auction.starting_bid;
    for bid in &auction.bid_history {
        assert!(bid.amount >= price + (price / 20).max(1));
        price = bid.amount;
    }
}

#[tokio::test]
async fn outbid_reports_the_displaced_bidder() {
    let db = common::open();
    let now = OffsetDateTime::now_utc();
    let alice = BidderId::random();
    let bob = BidderId::random();

    let auction_id = common::live_auction(&db, common::draft(BidderId::random(), now), now).await;

    db.place_bid(auction_id, alice, 105, now)
        .await
        .unwrap()
        .unwrap();

    let placement = db
        .place_bid(auction_id, bob, 120, now)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(placement.outbid, Some(alice));

    // Raising your own bid displaces nobody
    let placement = db
        .place_bid(auction_id, bob, 140, now)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(placement.outbid, None);
}

#[tokio::test]
async fn bids_are_rejected_off_the_live_state() {
    let db = common::open();
    let now = OffsetDateTime::now_utc();
    let bidder = BidderId::random();

    let missing = gavel_core::models::AuctionId::random();
    let failure = db
        .place_bid(missing, bidder, 105, now)
        .await
        .unwrap()
        .unwrap_err();
    assert_eq!(failure, BidFailure::AuctionNotFound);

    // Still scheduled: created but never swept past its start time
    let mut draft = common::draft(BidderId::random(), now);
    draft.start_time = now + time::Duration::hours(1);
    draft.end_time = now + time::Duration::hours(3);
    let record = db.create_auction(draft, now).await.unwrap().unwrap();

    let failure = db
        .place_bid(record.auction_id, bidder, 105, now)
        .await
        .unwrap()
        .unwrap_err();
    assert_eq!(
        failure,
        BidFailure::AuctionNotLive {
            status: AuctionStatus::Scheduled
        }
    );
}

#[tokio::test]
async fn a_bid_at_the_buy_now_price_closes_the_sale() {
    let db = common::open();
    let now = OffsetDateTime::now_utc();
    let bidder = BidderId::random();

    let mut draft = common::draft(BidderId::random(), now);
    draft.starting_bid = 480;
    draft.buy_now_price = Some(500);
    draft.bid_increment = Some(10);
    let auction_id = common::live_auction(&db, draft, now).await;

    let placement = db
        .place_bid(auction_id, bidder, 500, now)
        .await
        .unwrap()
        .unwrap();
    assert!(placement.finalized);

    let auction = db.get_auction(auction_id).await.unwrap().unwrap();
    assert_eq!(auction.status, AuctionStatus::Sold);
    assert_eq!(auction.winner, Some(bidder));
    assert_eq!(auction.winning_bid, Some(500));
    assert_eq!(auction.current_bid, 500);
}

#[tokio::test(flavor = "multi_thread")]
async fn racing_bids_cannot_both_win_the_same_price() {
    let db = common::open();
    let now = OffsetDateTime::now_utc();
    let alice = BidderId::random();
    let bob = BidderId::random();

    let auction_id = common::live_auction(&db, common::draft(BidderId::random(), now), now).await;

    let a = {
        let db = db.clone();
        tokio::spawn(async move { db.place_bid(auction_id, alice, 105, now).await })
    };
    let b = {
        let db = db.clone();
        tokio::spawn(async move { db.place_bid(auction_id, bob, 105, now).await })
    };

    let outcomes = [a.await.unwrap().unwrap(), b.await.unwrap().unwrap()];
    let winners = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    assert_eq!(winners, 1, "exactly one bid may win the old price");

    // The loser was told the fresh minimum, never silently applied
    let loser = outcomes
        .iter()
        .find_map(|outcome| outcome.as_ref().err())
        .unwrap();
    assert!(matches!(
        loser,
        BidFailure::BidTooLow { minimum: 110 } | BidFailure::Conflict
    ));

    let auction = db.get_auction(auction_id).await.unwrap().unwrap();
    assert_eq!(auction.current_bid, 105);
    assert_eq!(auction.total_bids, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn buy_now_and_racing_buy_now_finalize_exactly_once() {
    let db = common::open();
    let now = OffsetDateTime::now_utc();
    let alice = BidderId::random();
    let bob = BidderId::random();

    let mut draft = common::draft(BidderId::random(), now);
    draft.buy_now_price = Some(400);
    let auction_id = common::live_auction(&db, draft, now).await;

    let a = {
        let db = db.clone();
        tokio::spawn(async move { db.buy_now(auction_id, alice, now).await })
    };
    let b = {
        let db = db.clone();
        tokio::spawn(async move { db.buy_now(auction_id, bob, now).await })
    };

    let outcomes = [a.await.unwrap().unwrap(), b.await.unwrap().unwrap()];
    let winners = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    assert_eq!(winners, 1, "exactly one finalizer may win");

    let loser = outcomes
        .iter()
        .find_map(|outcome| outcome.as_ref().err())
        .unwrap();
    assert!(matches!(
        loser,
        BuyNowFailure::AlreadyFinalized
            | BuyNowFailure::AuctionNotLive {
                status: AuctionStatus::Sold
            }
    ));

    let auction = db.get_auction(auction_id).await.unwrap().unwrap();
    assert_eq!(auction.status, AuctionStatus::Sold);
    assert_eq!(auction.winning_bid, Some(400));
    assert!(auction.winner == Some(alice) || auction.winner == Some(bob));
}

#[tokio::test(flavor = "multi_thread")]
async fn buy_now_and_a_finalizing_bid_cannot_both_close_the_sale() {
    let db = common::open();
    let now = OffsetDateTime::now_utc();
    let bidder = BidderId::random();
    let buyer = BidderId::random();

    let mut draft = common::draft(BidderId::random(), now);
    draft.buy_now_price = Some(400);
    draft.bid_increment = Some(10);
    let auction_id = common::live_auction(&db, draft, now).await;

    // A bid at the buy-now price finalizes, so these two race for the
    // same terminal transition
    let bid = {
        let db = db.clone();
        tokio::spawn(async move { db.place_bid(auction_id, bidder, 400, now).await })
    };
    let purchase = {
        let db = db.clone();
        tokio::spawn(async move { db.buy_now(auction_id, buyer, now).await })
    };

    let bid = bid.await.unwrap().unwrap();
    let purchase = purchase.await.unwrap().unwrap();
    assert!(
        bid.is_ok() != purchase.is_ok(),
        "exactly one of the finalizers may win"
    );

    let auction = db.get_auction(auction_id).await.unwrap().unwrap();
    assert_eq!(auction.status, AuctionStatus::Sold);
    assert_eq!(auction.winning_bid, Some(400));
    if bid.is_ok() {
        assert_eq!(auction.winner, Some(bidder));
        assert_eq!(auction.total_bids, 1);
    } else {
        assert_eq!(auction.winner, Some(buyer));
        assert_eq!(auction.total_bids, 0);
    }
}

#[tokio::test]
async fn buy_now_requires_a_configured_price() {
    let db = common::open();
    let now = OffsetDateTime::now_utc();

    let auction_id = common::live_auction(&db, common::draft(BidderId::random(), now), now).await;

    let failure = db
        .buy_now(auction_id, BidderId::random(), now)
        .await
        .unwrap()
        .unwrap_err();
    assert_eq!(failure, BuyNowFailure::BuyNowUnavailable);
}

#[tokio::test]
async fn buy_now_leaves_the_ledger_alone() {
    let db = common::open();
    let now = OffsetDateTime::now_utc();
    let alice = BidderId::random();
    let bob = BidderId::random();

    let mut draft = common::draft(BidderId::random(), now);
    draft.buy_now_price = Some(400);
    let auction_id = common::live_auction(&db, draft, now).await;

    db.place_bid(auction_id, alice, 105, now)
        .await
        .unwrap()
        .unwrap();

    let receipt = db.buy_now(auction_id, bob, now).await.unwrap().unwrap();
    assert_eq!(receipt.final_price, 400);

    // The purchase is not a bid: the ledger and standing price are as
    // the last bid left them, and the sale price lives in winning_bid.
    let auction = db.get_auction(auction_id).await.unwrap().unwrap();
    assert_eq!(auction.total_bids, 1);
    assert_eq!(auction.current_bid, 105);
    assert_eq!(auction.winning_bid, Some(400));
    assert_eq!(auction.winner, Some(bob));
}
