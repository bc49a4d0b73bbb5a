//! The transport layer of the auction engine: an HTTP API for bids,
//! buy-nows, cancellation, and relisting, a server-sent-events surface
//! for per-auction subscriptions, the periodic lifecycle scheduler, and
//! the background settlement worker. All state changes funnel through a
//! single fan-out path, so every caller observes the same events and
//! notifications no matter which mutation produced them.

use gavel_core::{
    models::{AuctionId, SettlementRequest, SettlementStatus},
    ports::{AuctionRepository, MarketRepository, SettlementGateway, SettlementRepository},
};

use axum::Router;
use axum::http::header;
use axum::response::sse::Event;
use rustc_hash::FxBuildHasher;
use std::sync::Arc;
use std::{convert::Infallible, net::SocketAddr};
use time::OffsetDateTime;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::try_join;
use tower_http::cors;
use tracing::{Level, event};

mod fanout;
mod routes;
mod scheduler;
mod utils;

pub use scheduler::Scheduler;
pub use utils::Now;

type SenderMap<T> =
    Arc<dashmap::DashMap<T, watch::Sender<Result<Event, Infallible>>, FxBuildHasher>>;

#[derive(Clone)]
pub struct AppState<T: MarketRepository> {
    market: T,
    settle_queue: mpsc::Sender<SettlementRequest>,
    auction_sender: SenderMap<AuctionId>,
}

pub fn state<T: MarketRepository>(
    market: T,
    gateway: impl SettlementGateway,
) -> (AppState<T>, JoinHandle<Result<(), T::Error>>) {
    // Settlement happens off the request path: finalization enqueues
    // here, and this worker talks to the payment provider. The sold
    // state is committed before anything lands on this queue, so a
    // failure below is recorded on the order and never rolls back.
    let (settle_sender, mut settle_receiver) = mpsc::channel::<SettlementRequest>(24);

    let auction_sender: SenderMap<AuctionId> = Default::default();

    let settler = {
        let market = market.clone();
        tokio::spawn(async move {
            let timeout = market.config().settlement_timeout;

            while let Some(request) = settle_receiver.recv().await {
                market
                    .record_settlement(
                        request.auction_id,
                        request.buyer_id,
                        request.amount,
                        SettlementStatus::Pending,
                        OffsetDateTime::now_utc(),
                    )
                    .await?;

                let status = match tokio::time::timeout(timeout, gateway.settle(&request)).await {
                    Ok(Ok(())) => SettlementStatus::Settled,
                    Ok(Err(error)) => {
                        event!(Level::WARN, %error, auction_id = %request.auction_id, "settlement failed");
                        SettlementStatus::Failed
                    }
                    Err(_) => {
                        event!(Level::WARN, auction_id = %request.auction_id, "settlement timed out");
                        SettlementStatus::Failed
                    }
                };

                market
                    .record_settlement(
                        request.auction_id,
                        request.buyer_id,
                        request.amount,
                        status,
                        OffsetDateTime::now_utc(),
                    )
                    .await?;
            }

            Result::<(), T::Error>::Ok(())
        })
    };

    let state = AppState {
        market,
        settle_queue: settle_sender,
        auction_sender,
    };

    (state, settler)
}

pub fn router<T: MarketRepository>(state: AppState<T>) -> Router {
    // To allow for web app access, we use a permissive CORS policy. Notably,
    // this strips any implicit authorization, making this a pretty decent policy.
    let policy = cors::CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods(cors::Any)
        .allow_headers([header::CONTENT_TYPE]);

    // Wire it together
    let app = Router::new()
        // Snapshots, bids, buy-now, cancellation, relisting, and the
        // SSE subscription for each auction
        .nest("/v0/auctions", routes::auctions::router())
        // The persisted inbox
        .nest("/v0/notifications", routes::notifications::router())
        // Seeding and the on-demand sweep
        .nest("/admin", routes::admin::router());

    app.layer(policy).with_state(state)
}

// The binary can simply provide the configuration to this function to launch
// the server alongside the lifecycle scheduler and settlement worker.
pub async fn start<T: MarketRepository>(
    api_port: u16,
    market: T,
    gateway: impl SettlementGateway,
    sweep_every: std::time::Duration,
) {
    // Setup the HTTP server
    let listener = tokio::net::TcpListener::bind(SocketAddr::new([0, 0, 0, 0].into(), api_port))
        .await
        .expect("Unable to bind local port");
    event!(
        Level::INFO,
        "Listening for requests on {}",
        listener.local_addr().unwrap()
    );

    let (app_state, settler) = state(market, gateway);

    let sweeper = tokio::spawn(
        Scheduler {
            every: sweep_every,
        }
        .run(app_state.clone()),
    );

    let server = tokio::spawn(async move { axum::serve(listener, router(app_state)).await });

    let _ = try_join!(settler, sweeper, server).expect("shutdown");
}
