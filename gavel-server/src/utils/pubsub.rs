use crate::AppState;
use axum::{extract::FromRequestParts, http::request::Parts, response::sse::Event};
use gavel_core::{models::AuctionId, ports::MarketRepository};
use rustc_hash::FxBuildHasher;
use std::{convert::Infallible, sync::Arc};
use tokio::sync::watch;

type Sender<T> = Arc<dashmap::DashMap<T, watch::Sender<Result<Event, Infallible>>, FxBuildHasher>>;

/// Extract the per-auction subscriber registry from the app state.
///
/// Each auction gets one watch channel, created lazily when the first
/// observer joins; the channel's latest-value semantics give each
/// subscriber at most one delivery per published event, and a
/// subscription lives exactly as long as its connection.
pub struct AuctionSender(pub Sender<AuctionId>);

impl AuctionSender {
    pub fn get_receiver(
        &self,
        auction_id: AuctionId,
    ) -> watch::Receiver<Result<Event, Infallible>> {
        match self.0.entry(auction_id) {
            dashmap::Entry::Occupied(entry) => entry.get().subscribe(),
            dashmap::Entry::Vacant(entry) => {
                let (snd, rcv) = watch::channel(Ok(Event::default().comment("")));
                entry.insert(snd);
                rcv
            }
        }
    }
}

impl<T: MarketRepository> FromRequestParts<AppState<T>> for AuctionSender
where
    AppState<T>: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        _: &mut Parts,
        state: &AppState<T>,
    ) -> Result<Self, Self::Rejection> {
        Ok(AuctionSender(state.auction_sender.clone()))
    }
}
