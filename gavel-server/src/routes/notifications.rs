use crate::AppState;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing,
};
use gavel_core::{
    models::{BidderId, NotificationRecord},
    ports::{MarketRepository, NotificationRepository},
};
use serde::Serialize;
use tracing::{Level, event};

pub fn router<T: MarketRepository>() -> Router<AppState<T>> {
    Router::new()
        .route("/{bidder_id}", routing::get(get_inbox))
        .route("/{bidder_id}/read", routing::post(post_read))
}

async fn get_inbox<T: MarketRepository>(
    State(state): State<AppState<T>>,
    Path(bidder_id): Path<BidderId>,
) -> Result<Json<Vec<NotificationRecord>>, StatusCode> {
    let inbox = NotificationRepository::inbox(&state.market, bidder_id)
        .await
        .map_err(|error| {
            event!(Level::ERROR, ?error);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(inbox))
}

#[derive(Serialize)]
struct ReadReceiptDto {
    updated: usize,
}

async fn post_read<T: MarketRepository>(
    State(state): State<AppState<T>>,
    Path(bidder_id): Path<BidderId>,
) -> Result<Json<ReadReceiptDto>, StatusCode> {
    let updated = NotificationRepository::mark_read(&state.market, bidder_id)
        .await
        .map_err(|error| {
            event!(Level::ERROR, ?error);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(ReadReceiptDto { updated }))
}
