use crate::AppState;
use axum::response::sse::Event;
use gavel_core::{
    models::{
        AuctionEvent, AuctionId, AuctionRecord, AuctionStatus, BidderId, NotificationDraft,
        NotificationKind, SettlementRequest,
    },
    ports::{BidPlacement, MarketRepository, NotificationRepository, Transition},
};
use time::OffsetDateTime;
use tracing::{Level, event};

// Every state change funnels through this module, so the bid, buy-now,
// cancel, and scheduler paths publish the same events and record the
// same notifications no matter who drove the transition.

/// Push one event to the auction's subscribers, if it has any.
///
/// Delivery is the watch channel's latest-value semantics: best-effort,
/// at most once per subscriber, no replay for late joiners.
pub(crate) fn publish<T: MarketRepository>(
    state: &AppState<T>,
    auction_id: AuctionId,
    payload: &AuctionEvent,
) {
    if let Some(channel) = state.auction_sender.get(&auction_id) {
        let _ = channel.send_replace(Ok(Event::default()
            .event(payload.name())
            .data(serde_json::to_string(payload).expect("infallible!"))));
    }
}

/// After-effects of an accepted bid: announce the new price, notify the
/// displaced bidder, and close the sale if the bid met the buy-now
/// price.
pub(crate) async fn bid_accepted<T: MarketRepository>(
    state: &AppState<T>,
    placement: &BidPlacement,
    bidder_id: BidderId,
    timestamp: OffsetDateTime,
) -> Result<(), T::Error> {
    let auction = &placement.auction;

    publish(
        state,
        auction.auction_id,
        &AuctionEvent::BidAccepted {
            current_bid: auction.current_bid,
            total_bids: auction.total_bids,
            bidder_id,
            timestamp,
        },
    );

    if let Some(previous) = placement.outbid {
        state
            .market
            .record_notification(
                NotificationDraft {
                    kind: NotificationKind::Outbid,
                    auction_id: auction.auction_id,
                    recipient: previous,
                    amount: Some(auction.current_bid),
                },
                timestamp,
            )
            .await?;
    }

    if placement.finalized {
        sale_closed(state, auction, timestamp).await?;
    }

    Ok(())
}

/// After-effects of a finalized sale, whether by buy-now, by a bid at
/// the buy-now price, or by the sweep closing a reserve-met auction.
pub(crate) async fn sale_closed<T: MarketRepository>(
    state: &AppState<T>,
    auction: &AuctionRecord,
    timestamp: OffsetDateTime,
) -> Result<(), T::Error> {
    publish(
        state,
        auction.auction_id,
        &AuctionEvent::AuctionEnded {
            status: auction.status,
            winner: auction.winner,
            final_price: auction.winning_bid,
        },
    );

    if let (Some(winner), Some(price)) = (auction.winner, auction.winning_bid) {
        state
            .market
            .record_notification(
                NotificationDraft {
                    kind: NotificationKind::Won,
                    auction_id: auction.auction_id,
                    recipient: winner,
                    amount: Some(price),
                },
                timestamp,
            )
            .await?;
        state
            .market
            .record_notification(
                NotificationDraft {
                    kind: NotificationKind::Sold,
                    auction_id: auction.auction_id,
                    recipient: auction.seller_id,
                    amount: Some(price),
                },
                timestamp,
            )
            .await?;

        // Hand the committed sale to the settlement worker
        let request = SettlementRequest {
            auction_id: auction.auction_id,
            buyer_id: winner,
            seller_id: auction.seller_id,
            amount: price,
        };
        if state.settle_queue.send(request).await.is_err() {
            event!(Level::ERROR, auction_id = %auction.auction_id, "settlement worker is gone");
        }
    }

    Ok(())
}

/// After-effects of an auction closing without a sale
pub(crate) async fn ended_unsold<T: MarketRepository>(
    state: &AppState<T>,
    auction: &AuctionRecord,
    timestamp: OffsetDateTime,
) -> Result<(), T::Error> {
    publish(
        state,
        auction.auction_id,
        &AuctionEvent::AuctionEnded {
            status: auction.status,
            winner: None,
            final_price: None,
        },
    );

    state
        .market
        .record_notification(
            NotificationDraft {
                kind: NotificationKind::Ended,
                auction_id: auction.auction_id,
                recipient: auction.seller_id,
                amount: None,
            },
            timestamp,
        )
        .await?;

    Ok(())
}

/// Publish a sweep transition. Going live needs no announcement of its
/// own (the countdown starts on the next tick); the terminal states
/// share their path with the request-driven finalizers.
pub(crate) async fn transition<T: MarketRepository>(
    state: &AppState<T>,
    transition: &Transition,
    timestamp: OffsetDateTime,
) -> Result<(), T::Error> {
    match transition.auction.status {
        AuctionStatus::Sold => sale_closed(state, &transition.auction, timestamp).await,
        AuctionStatus::Ended => ended_unsold(state, &transition.auction, timestamp).await,
        _ => Ok(()),
    }
}
