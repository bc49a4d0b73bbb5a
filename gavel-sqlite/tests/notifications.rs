mod common;

use gavel_core::models::{BidderId, NotificationDraft, NotificationKind, SettlementStatus};
use gavel_core::ports::{AuctionRepository, NotificationRepository, SettlementRepository};
use time::{Duration, OffsetDateTime};

#[tokio::test]
async fn duplicate_notifications_are_a_no_op() {
    let db = common::open();
    let now = OffsetDateTime::now_utc();
    let recipient = BidderId::random();

    let record = db
        .create_auction(common::draft(BidderId::random(), now), now)
        .await
        .unwrap()
        .unwrap();

    let draft = NotificationDraft {
        kind: NotificationKind::Outbid,
        auction_id: record.auction_id,
        recipient,
        amount: Some(120),
    };

    // At-least-once delivery: the second recording must not duplicate
    db.record_notification(draft.clone(), now).await.unwrap();
    db.record_notification(draft.clone(), now + Duration::seconds(1))
        .await
        .unwrap();

    let inbox = db.inbox(recipient).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, NotificationKind::Outbid);
    assert_eq!(inbox[0].amount, Some(120));
    assert!(!inbox[0].read);

    // A different kind on the same auction is a distinct notification
    db.record_notification(
        NotificationDraft {
            kind: NotificationKind::Won,
            ..draft
        },
        now,
    )
    .await
    .unwrap();
    assert_eq!(db.inbox(recipient).await.unwrap().len(), 2);
}

#[tokio::test]
async fn mark_read_clears_the_whole_inbox() {
    let db = common::open();
    let now = OffsetDateTime::now_utc();
    let recipient = BidderId::random();

    for _ in 0..3 {
        let record = db
            .create_auction(common::draft(BidderId::random(), now), now)
            .await
            .unwrap()
            .unwrap();
        db.record_notification(
            NotificationDraft {
                kind: NotificationKind::Outbid,
                auction_id: record.auction_id,
                recipient,
                amount: None,
            },
            now,
        )
        .await
        .unwrap();
    }

    assert_eq!(db.mark_read(recipient).await.unwrap(), 3);
    assert!(db.inbox(recipient).await.unwrap().iter().all(|n| n.read));

    // Nothing left unread
    assert_eq!(db.mark_read(recipient).await.unwrap(), 0);
}

#[tokio::test]
async fn settlements_upsert_by_auction() {
    let db = common::open();
    let now = OffsetDateTime::now_utc();
    let buyer = BidderId::random();

    let record = db
        .create_auction(common::draft(BidderId::random(), now), now)
        .await
        .unwrap()
        .unwrap();

    db.record_settlement(record.auction_id, buyer, 400, SettlementStatus::Pending, now)
        .await
        .unwrap();

    // A retry that fails, then one that lands; the latest status wins
    db.record_settlement(
        record.auction_id,
        buyer,
        400,
        SettlementStatus::Failed,
        now + Duration::seconds(1),
    )
    .await
    .unwrap();
    db.record_settlement(
        record.auction_id,
        buyer,
        400,
        SettlementStatus::Settled,
        now + Duration::seconds(2),
    )
    .await
    .unwrap();

    let ctx = db.connect(false).unwrap();
    let status: String = ctx
        .query_row(
            "select status from settlement where auction_id = ?1",
            (*record.auction_id,),
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(status, "settled");
}
