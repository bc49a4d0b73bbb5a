use crate::{
    AppState, fanout,
    utils::{AuctionSender, Now},
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{
        Sse,
        sse::{Event, KeepAlive, KeepAliveStream},
    },
    routing,
};
use gavel_core::{
    models::{AuctionEvent, AuctionId, AuctionSnapshot, AuctionStatus, BidderId, RelistRequest},
    ports::{
        AuctionRepository, BidFailure, BuyNowFailure, CancelFailure, MarketRepository,
        RelistFailure,
    },
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio_stream::wrappers::WatchStream;
use tracing::{Level, event};

pub fn router<T: MarketRepository>() -> Router<AppState<T>> {
    Router::new()
        // The snapshot late joiners fetch instead of replaying events
        .route("/{auction_id}", routing::get(get_snapshot))
        .route("/{auction_id}/bids", routing::post(post_bid))
        .route("/{auction_id}/buy-now", routing::post(post_buy_now))
        .route("/{auction_id}/cancel", routing::post(post_cancel))
        .route("/{auction_id}/relist", routing::post(post_relist))
        // The SSE subscription; unsubscribing is disconnecting
        .route("/{auction_id}/stream", routing::get(stream))
}

/// The uniform error body. Always a machine-readable tag, plus enough
/// context to retry correctly: the current minimum for a rejected bid,
/// the current status for a state conflict.
#[derive(Serialize)]
struct ApiError {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    minimum: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<AuctionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_bids: Option<u32>,
}

impl ApiError {
    fn new(error: &'static str) -> Self {
        Self {
            error,
            minimum: None,
            status: None,
            total_bids: None,
        }
    }
}

type Failure = (StatusCode, Json<ApiError>);

fn internal<E: std::fmt::Debug>(error: E) -> Failure {
    event!(Level::ERROR, ?error);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError::new("internal")),
    )
}

fn bid_failure(failure: BidFailure) -> Failure {
    match failure {
        BidFailure::AuctionNotFound => {
            (StatusCode::NOT_FOUND, Json(ApiError::new("auction-not-found")))
        }
        BidFailure::AuctionNotLive { status } => (
            StatusCode::CONFLICT,
            Json(ApiError {
                status: Some(status),
                ..ApiError::new("auction-not-live")
            }),
        ),
        BidFailure::BidTooLow { minimum } => (
            StatusCode::CONFLICT,
            Json(ApiError {
                minimum: Some(minimum),
                ..ApiError::new("bid-too-low")
            }),
        ),
        BidFailure::Conflict => (StatusCode::CONFLICT, Json(ApiError::new("conflict"))),
    }
}

fn buy_now_failure(failure: BuyNowFailure) -> Failure {
    match failure {
        BuyNowFailure::AuctionNotFound => {
            (StatusCode::NOT_FOUND, Json(ApiError::new("auction-not-found")))
        }
        BuyNowFailure::AuctionNotLive { status } => (
            StatusCode::CONFLICT,
            Json(ApiError {
                status: Some(status),
                ..ApiError::new("auction-not-live")
            }),
        ),
        BuyNowFailure::BuyNowUnavailable => (
            StatusCode::CONFLICT,
            Json(ApiError::new("buy-now-unavailable")),
        ),
        BuyNowFailure::AlreadyFinalized => (
            StatusCode::CONFLICT,
            Json(ApiError::new("already-finalized")),
        ),
    }
}

fn cancel_failure(failure: CancelFailure) -> Failure {
    match failure {
        CancelFailure::AuctionNotFound => {
            (StatusCode::NOT_FOUND, Json(ApiError::new("auction-not-found")))
        }
        CancelFailure::AuctionNotLive { status } => (
            StatusCode::CONFLICT,
            Json(ApiError {
                status: Some(status),
                ..ApiError::new("auction-not-live")
            }),
        ),
        CancelFailure::ActiveBids { total_bids } => (
            StatusCode::CONFLICT,
            Json(ApiError {
                total_bids: Some(total_bids),
                ..ApiError::new("active-bids")
            }),
        ),
    }
}

fn relist_failure(failure: RelistFailure) -> Failure {
    match failure {
        RelistFailure::AuctionNotFound => {
            (StatusCode::NOT_FOUND, Json(ApiError::new("auction-not-found")))
        }
        RelistFailure::NotEligible { status } => (
            StatusCode::CONFLICT,
            Json(ApiError {
                status: Some(status),
                ..ApiError::new("not-eligible")
            }),
        ),
        RelistFailure::AlreadyRelisted => (
            StatusCode::CONFLICT,
            Json(ApiError::new("already-relisted")),
        ),
        RelistFailure::InvalidSchedule => (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new("invalid-schedule")),
        ),
    }
}

async fn get_snapshot<T: MarketRepository>(
    State(state): State<AppState<T>>,
    Path(auction_id): Path<AuctionId>,
    Now(now): Now,
) -> Result<Json<AuctionSnapshot>, Failure> {
    let auction = AuctionRepository::get_auction(&state.market, auction_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, Json(ApiError::new("auction-not-found"))))?;

    Ok(Json(auction.snapshot(now)))
}

#[derive(Deserialize)]
struct BidDto {
    bidder_id: BidderId,
    amount: i64,
}

#[derive(Serialize)]
struct BidReceiptDto {
    current_bid: i64,
    total_bids: u32,
}

async fn post_bid<T: MarketRepository>(
    State(state): State<AppState<T>>,
    Path(auction_id): Path<AuctionId>,
    Now(now): Now,
    Json(BidDto { bidder_id, amount }): Json<BidDto>,
) -> Result<Json<BidReceiptDto>, Failure> {
    let placement = AuctionRepository::place_bid(&state.market, auction_id, bidder_id, amount, now)
        .await
        .map_err(internal)?
        .map_err(bid_failure)?;

    fanout::bid_accepted(&state, &placement, bidder_id, now)
        .await
        .map_err(internal)?;

    Ok(Json(BidReceiptDto {
        current_bid: placement.auction.current_bid,
        total_bids: placement.auction.total_bids,
    }))
}

#[derive(Deserialize)]
struct BuyNowDto {
    bidder_id: BidderId,
}

#[derive(Serialize)]
struct BuyNowReceiptDto {
    final_price: i64,
}

async fn post_buy_now<T: MarketRepository>(
    State(state): State<AppState<T>>,
    Path(auction_id): Path<AuctionId>,
    Now(now): Now,
    Json(BuyNowDto { bidder_id }): Json<BuyNowDto>,
) -> Result<Json<BuyNowReceiptDto>, Failure> {
    let receipt = AuctionRepository::buy_now(&state.market, auction_id, bidder_id, now)
        .await
        .map_err(internal)?
        .map_err(buy_now_failure)?;

    fanout::sale_closed(&state, &receipt.auction, now)
        .await
        .map_err(internal)?;

    Ok(Json(BuyNowReceiptDto {
        final_price: receipt.final_price,
    }))
}

async fn post_cancel<T: MarketRepository>(
    State(state): State<AppState<T>>,
    Path(auction_id): Path<AuctionId>,
    Now(now): Now,
) -> Result<Json<serde_json::Value>, Failure> {
    AuctionRepository::cancel_auction(&state.market, auction_id, now)
        .await
        .map_err(internal)?
        .map_err(cancel_failure)?;

    fanout::publish(&state, auction_id, &AuctionEvent::AuctionCancelled);

    Ok(Json(serde_json::json!({})))
}

#[derive(Serialize)]
struct RelistReceiptDto {
    new_auction_id: AuctionId,
}

async fn post_relist<T: MarketRepository>(
    State(state): State<AppState<T>>,
    Path(auction_id): Path<AuctionId>,
    Now(now): Now,
    Json(request): Json<RelistRequest>,
) -> Result<Json<RelistReceiptDto>, Failure> {
    let successor = AuctionRepository::relist_auction(&state.market, auction_id, request, now)
        .await
        .map_err(internal)?
        .map_err(relist_failure)?;

    Ok(Json(RelistReceiptDto {
        new_auction_id: successor.auction_id,
    }))
}

async fn stream(
    Path(auction_id): Path<AuctionId>,
    sender: AuctionSender,
) -> Sse<KeepAliveStream<WatchStream<Result<Event, Infallible>>>> {
    let rcv = sender.get_receiver(auction_id);
    Sse::new(WatchStream::new(rcv)).keep_alive(KeepAlive::default())
}
