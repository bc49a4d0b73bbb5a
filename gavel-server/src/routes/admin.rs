use crate::{AppState, Now, fanout};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing,
};
use gavel_core::{
    models::{AuctionDraft, AuctionRecord},
    ports::{AuctionRepository, CreateFailure, MarketRepository},
};
use serde::Serialize;
use tracing::{Level, event};

// These stand in for the out-of-scope listing workflow and for
// operational tooling: seeding auction records, and forcing a lifecycle
// sweep without waiting for the scheduler's next tick.

pub fn router<T: MarketRepository>() -> Router<AppState<T>> {
    Router::new()
        .route("/auctions", routing::post(post_auction))
        .route("/sweep", routing::post(post_sweep))
}

async fn post_auction<T: MarketRepository>(
    State(state): State<AppState<T>>,
    Now(now): Now,
    Json(draft): Json<AuctionDraft>,
) -> Result<Json<AuctionRecord>, StatusCode> {
    let record = AuctionRepository::create_auction(&state.market, draft, now)
        .await
        .map_err(|error| {
            event!(Level::ERROR, ?error);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|CreateFailure::InvalidSchedule| StatusCode::BAD_REQUEST)?;

    Ok(Json(record))
}

#[derive(Serialize)]
struct SweepReceiptDto {
    transitions: usize,
    live: usize,
}

async fn post_sweep<T: MarketRepository>(
    State(state): State<AppState<T>>,
    Now(now): Now,
) -> Result<Json<SweepReceiptDto>, StatusCode> {
    let outcome = AuctionRepository::sweep(&state.market, now)
        .await
        .map_err(|error| {
            event!(Level::ERROR, ?error);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    for transition in &outcome.transitions {
        fanout::transition(&state, transition, now)
            .await
            .map_err(|error| {
                event!(Level::ERROR, ?error);
                StatusCode::INTERNAL_SERVER_ERROR
            })?;
    }

    Ok(Json(SweepReceiptDto {
        transitions: outcome.transitions.len(),
        live: outcome.live.len(),
    }))
}
