use crate::{AppState, fanout};
use gavel_core::{
    models::{AuctionEvent, AuctionId},
    ports::{AuctionRepository, MarketRepository},
};
use rustc_hash::FxHashSet;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{Level, event};

/// The periodic sweep driving time-based transitions.
///
/// Each tick advances scheduled and elapsed auctions through the store,
/// publishes the resulting transitions, sends every live auction's
/// subscribers a countdown, and announces ending-soon exactly once per
/// auction per crossing of the configured threshold. A tick that loses
/// a transition race to a concurrent bid or buy-now simply skips that
/// auction; the next tick re-evaluates it.
pub struct Scheduler {
    /// How often to sweep
    pub every: Duration,
}

impl Scheduler {
    pub async fn run<T: MarketRepository>(self, state: AppState<T>) -> Result<(), T::Error> {
        let ending_soon = state.market.config().ending_soon_within.as_secs();

        // Per-process memory of who has been announced as ending soon;
        // entries drop out when the auction leaves the live state.
        let mut announced: FxHashSet<AuctionId> = FxHashSet::default();

        let mut interval = tokio::time::interval(self.every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let now = OffsetDateTime::now_utc();

            let outcome = state.market.sweep(now).await?;

            for transition in &outcome.transitions {
                event!(
                    Level::INFO,
                    auction_id = %transition.auction.auction_id,
                    from = %transition.from,
                    to = %transition.auction.status,
                    "auction transitioned"
                );
                fanout::transition(&state, transition, now).await?;
            }

            let mut live = FxHashSet::default();
            for auction in &outcome.live {
                live.insert(auction.auction_id);

                let remaining = auction.remaining(now).whole_seconds().max(0) as u64;
                fanout::publish(&state, auction.auction_id, &AuctionEvent::Countdown { remaining });

                if remaining <= ending_soon && announced.insert(auction.auction_id) {
                    fanout::publish(&state, auction.auction_id, &AuctionEvent::AuctionEndingSoon);
                }
            }

            announced.retain(|auction_id| live.contains(auction_id));
        }
    }
}
