use crate::{DateTime, db};
use gavel_core::{
    models::{
        AuctionDraft, AuctionId, AuctionRecord, AuctionStatus, Bid, BidderId, CloseOutcome, Config,
        RelistRequest,
    },
    ports::{
        AuctionRepository, BidFailure, BidPlacement, BuyNowFailure, BuyNowReceipt, CancelFailure,
        CreateFailure, RelistFailure, SweepOutcome, Transition,
    },
};
use rusqlite::{Connection, TransactionBehavior};
use time::OffsetDateTime;
use uuid::Uuid;

// An auction row together with its version counter. The version never
// leaves this crate: it exists so every update can re-check the state
// it was computed from.
struct Stored {
    record: AuctionRecord,
    version: i64,
}

fn load(conn: &Connection, auction_id: AuctionId) -> Result<Option<Stored>, db::Error> {
    let mut stmt = conn.prepare(
        r#"
        select
            seller_id, start_time, end_time, starting_bid, reserve_price,
            buy_now_price, bid_increment, current_bid, total_bids, status,
            winner_id, winning_bid, relist_of, relisted_as, version
        from
            auction
        where
            auction_id = ?1
        "#,
    )?;

    let mut rows = stmt.query_and_then((*auction_id,), |row| -> Result<Stored, db::Error> {
        let status: String = row.get(9)?;
        Ok(Stored {
            version: row.get(14)?,
            record: AuctionRecord {
                auction_id,
                seller_id: row.get::<_, Uuid>(0)?.into(),
                start_time: row.get::<_, DateTime>(1)?.into(),
                end_time: row.get::<_, DateTime>(2)?.into(),
                starting_bid: row.get(3)?,
                reserve_price: row.get(4)?,
                buy_now_price: row.get(5)?,
                bid_increment: row.get(6)?,
                current_bid: row.get(7)?,
                total_bids: row.get(8)?,
                status: AuctionStatus::parse(&status).ok_or_else(|| {
                    db::Error::Malformed(format!("unknown auction status {status}"))
                })?,
                winner: row.get::<_, Option<Uuid>>(10)?.map(Into::into),
                winning_bid: row.get(11)?,
                relist_of: row.get::<_, Option<Uuid>>(12)?.map(Into::into),
                relisted_as: row.get::<_, Option<Uuid>>(13)?.map(Into::into),
                bid_history: Vec::new(),
            },
        })
    })?;

    rows.next().transpose()
}

fn load_bids(conn: &Connection, auction_id: AuctionId) -> Result<Vec<Bid>, db::Error> {
    let mut stmt = conn.prepare(
        r#"
        select
            bidder_id, amount, placed_at
        from
            bid
        where
            auction_id = ?1
        order by
            id asc
        "#,
    )?;

    stmt.query_and_then((*auction_id,), |row| -> Result<Bid, db::Error> {
        Ok(Bid {
            bidder_id: row.get::<_, Uuid>(0)?.into(),
            amount: row.get(1)?,
            placed_at: row.get::<_, DateTime>(2)?.into(),
        })
    })?
    .collect()
}

fn load_full(conn: &Connection, auction_id: AuctionId) -> Result<Option<AuctionRecord>, db::Error> {
    let Some(stored) = load(conn, auction_id)? else {
        return Ok(None);
    };
    let mut record = stored.record;
    record.bid_history = load_bids(conn, auction_id)?;
    Ok(Some(record))
}

fn insert(conn: &Connection, record: &AuctionRecord) -> Result<(), db::Error> {
    conn.execute(
        r#"
        insert into auction (
            auction_id, seller_id, start_time, end_time, starting_bid,
            reserve_price, buy_now_price, bid_increment, current_bid,
            total_bids, status, relist_of
        ) values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, ?10, ?11)
        "#,
        (
            *record.auction_id,
            *record.seller_id,
            DateTime::from(record.start_time),
            DateTime::from(record.end_time),
            record.starting_bid,
            record.reserve_price,
            record.buy_now_price,
            record.bid_increment,
            record.current_bid,
            record.status.as_str(),
            record.relist_of.map(|id| *id),
        ),
    )?;
    Ok(())
}

impl AuctionRepository for db::Database {
    fn config(&self) -> &Config {
        self.engine_config()
    }

    async fn create_auction(
        &self,
        draft: AuctionDraft,
        _timestamp: OffsetDateTime,
    ) -> Result<Result<AuctionRecord, CreateFailure>, Self::Error> {
        if !draft.schedule_is_valid() {
            return Ok(Err(CreateFailure::InvalidSchedule));
        }

        let record = draft.into_record(AuctionId::random());
        let ctx = self.connect(true)?;
        insert(&ctx, &record)?;

        Ok(Ok(record))
    }

    async fn get_auction(
        &self,
        auction_id: AuctionId,
    ) -> Result<Option<AuctionRecord>, Self::Error> {
        let ctx = self.connect(false)?;
        load_full(&ctx, auction_id)
    }

    async fn place_bid(
        &self,
        auction_id: AuctionId,
        bidder_id: BidderId,
        amount: i64,
        timestamp: OffsetDateTime,
    ) -> Result<Result<BidPlacement, BidFailure>, Self::Error> {
        // Optimistic per-record discipline: observe without locking,
        // validate, then apply with a write conditional on the observed
        // version. A lost write means the price moved under us; we
        // revalidate against fresh state exactly once before giving up.
        for _ in 0..2 {
            let (stored, outbid) = {
                let ctx = self.connect(false)?;
                let Some(stored) = load(&ctx, auction_id)? else {
                    return Ok(Err(BidFailure::AuctionNotFound));
                };
                let outbid = last_bidder(&ctx, auction_id)?;
                (stored, outbid)
            };

            if !stored.record.status.is_live() {
                return Ok(Err(BidFailure::AuctionNotLive {
                    status: stored.record.status,
                }));
            }

            let minimum = stored.record.minimum_next_bid();
            if amount < minimum {
                return Ok(Err(BidFailure::BidTooLow { minimum }));
            }

            let finalized = stored.record.meets_buy_now(amount);

            let mut ctx = self.connect(true)?;
            let tx = ctx.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let applied = if finalized {
                tx.execute(
                    r#"
                    update auction set
                        current_bid = ?3, total_bids = total_bids + 1,
                        status = 'sold', winner_id = ?4, winning_bid = ?3,
                        version = version + 1
                    where
                        auction_id = ?1 and version = ?2 and status = 'live'
                    "#,
                    (*auction_id, stored.version, amount, *bidder_id),
                )?
            } else {
                tx.execute(
                    r#"
                    update auction set
                        current_bid = ?3, total_bids = total_bids + 1,
                        version = version + 1
                    where
                        auction_id = ?1 and version = ?2 and status = 'live'
                    "#,
                    (*auction_id, stored.version, amount),
                )?
            };

            if applied == 0 {
                continue;
            }

            tx.execute(
                "insert into bid (auction_id, bidder_id, amount, placed_at) values (?1, ?2, ?3, ?4)",
                (*auction_id, *bidder_id, amount, DateTime::from(timestamp)),
            )?;

            let auction = load_full(&tx, auction_id)?.ok_or_else(|| {
                db::Error::Malformed(format!("auction {auction_id} vanished mid-update"))
            })?;
            tx.commit()?;

            return Ok(Ok(BidPlacement {
                auction,
                outbid: outbid.filter(|previous| *previous != bidder_id),
                finalized,
            }));
        }

        Ok(Err(BidFailure::Conflict))
    }

    async fn buy_now(
        &self,
        auction_id: AuctionId,
        buyer_id: BidderId,
        _timestamp: OffsetDateTime,
    ) -> Result<Result<BuyNowReceipt, BuyNowFailure>, Self::Error> {
        let mut first_attempt = true;

        for _ in 0..2 {
            let stored = {
                let ctx = self.connect(false)?;
                let Some(stored) = load(&ctx, auction_id)? else {
                    return Ok(Err(BuyNowFailure::AuctionNotFound));
                };
                stored
            };

            if !stored.record.status.is_live() {
                // On a retry, a terminal state means the race we just
                // lost was the other finalizer.
                return Ok(Err(
                    if !first_attempt && stored.record.status.is_terminal() {
                        BuyNowFailure::AlreadyFinalized
                    } else {
                        BuyNowFailure::AuctionNotLive {
                            status: stored.record.status,
                        }
                    },
                ));
            }

            let Some(price) = stored.record.buy_now_price else {
                return Ok(Err(BuyNowFailure::BuyNowUnavailable));
            };

            let mut ctx = self.connect(true)?;
            let tx = ctx.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let applied = tx.execute(
                r#"
                update auction set
                    status = 'sold', winner_id = ?3, winning_bid = ?4,
                    version = version + 1
                where
                    auction_id = ?1 and version = ?2 and status = 'live'
                "#,
                (*auction_id, stored.version, *buyer_id, price),
            )?;

            if applied == 0 {
                first_attempt = false;
                continue;
            }

            let auction = load_full(&tx, auction_id)?.ok_or_else(|| {
                db::Error::Malformed(format!("auction {auction_id} vanished mid-update"))
            })?;
            tx.commit()?;

            return Ok(Ok(BuyNowReceipt {
                auction,
                final_price: price,
            }));
        }

        Ok(Err(BuyNowFailure::AlreadyFinalized))
    }

    async fn cancel_auction(
        &self,
        auction_id: AuctionId,
        _timestamp: OffsetDateTime,
    ) -> Result<Result<AuctionRecord, CancelFailure>, Self::Error> {
        let mut ctx = self.connect(true)?;
        let tx = ctx.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(stored) = load(&tx, auction_id)? else {
            return Ok(Err(CancelFailure::AuctionNotFound));
        };

        if !stored.record.status.is_live() {
            return Ok(Err(CancelFailure::AuctionNotLive {
                status: stored.record.status,
            }));
        }

        if stored.record.total_bids > 0 {
            return Ok(Err(CancelFailure::ActiveBids {
                total_bids: stored.record.total_bids,
            }));
        }

        tx.execute(
            r#"
            update auction set
                status = 'cancelled', version = version + 1
            where
                auction_id = ?1 and version = ?2 and status = 'live'
            "#,
            (*auction_id, stored.version),
        )?;

        let auction = load_full(&tx, auction_id)?.ok_or_else(|| {
            db::Error::Malformed(format!("auction {auction_id} vanished mid-update"))
        })?;
        tx.commit()?;

        Ok(Ok(auction))
    }

    async fn relist_auction(
        &self,
        auction_id: AuctionId,
        request: RelistRequest,
        timestamp: OffsetDateTime,
    ) -> Result<Result<AuctionRecord, RelistFailure>, Self::Error> {
        let mut ctx = self.connect(true)?;
        let tx = ctx.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(stored) = load(&tx, auction_id)? else {
            return Ok(Err(RelistFailure::AuctionNotFound));
        };

        if stored.record.status != AuctionStatus::Ended {
            return Ok(Err(RelistFailure::NotEligible {
                status: stored.record.status,
            }));
        }

        if stored.record.relisted_as.is_some() {
            return Ok(Err(RelistFailure::AlreadyRelisted));
        }

        let draft = AuctionDraft {
            seller_id: stored.record.seller_id,
            start_time: request.start_time,
            end_time: request.end_time,
            starting_bid: request.starting_bid.unwrap_or(stored.record.starting_bid),
            reserve_price: request.reserve_price.or(stored.record.reserve_price),
            buy_now_price: stored.record.buy_now_price,
            bid_increment: request.bid_increment.or(stored.record.bid_increment),
        };

        if request.start_time < timestamp || !draft.schedule_is_valid() {
            return Ok(Err(RelistFailure::InvalidSchedule));
        }

        let mut successor = draft.into_record(AuctionId::random());
        successor.relist_of = Some(auction_id);
        insert(&tx, &successor)?;

        // The back-link is written conditionally like everything else;
        // losing it means another relist slipped in first.
        let applied = tx.execute(
            r#"
            update auction set
                relisted_as = ?3, version = version + 1
            where
                auction_id = ?1 and version = ?2 and relisted_as is null
            "#,
            (*auction_id, stored.version, *successor.auction_id),
        )?;

        if applied == 0 {
            return Ok(Err(RelistFailure::AlreadyRelisted));
        }

        tx.commit()?;

        Ok(Ok(successor))
    }

    async fn sweep(&self, timestamp: OffsetDateTime) -> Result<SweepOutcome, Self::Error> {
        // Observe the candidates without locking. Each transition below
        // is its own conditional write: a bid or buy-now that lands
        // between this read and our write simply wins, and the auction
        // is re-evaluated on the next sweep.
        let candidates = {
            let ctx = self.connect(false)?;
            let mut stmt = ctx.prepare(
                "select auction_id from auction where status in ('scheduled', 'live')",
            )?;
            stmt.query_and_then((), |row| -> Result<AuctionId, db::Error> {
                Ok(row.get::<_, Uuid>(0)?.into())
            })?
            .collect::<Result<Vec<_>, _>>()?
        };

        let mut transitions = Vec::new();
        let mut ctx = self.connect(true)?;

        for auction_id in candidates {
            let (stored, winner) = {
                let reader = self.connect(false)?;
                let Some(stored) = load(&reader, auction_id)? else {
                    continue;
                };
                let winner = last_bidder(&reader, auction_id)?;
                (stored, winner)
            };

            let from = stored.record.status;
            let tx = ctx.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let applied = match from {
                AuctionStatus::Scheduled if timestamp >= stored.record.start_time => tx.execute(
                    r#"
                    update auction set
                        status = 'live', version = version + 1
                    where
                        auction_id = ?1 and version = ?2 and status = 'scheduled'
                    "#,
                    (*auction_id, stored.version),
                )?,
                AuctionStatus::Live if timestamp >= stored.record.end_time => {
                    match stored.record.close_outcome() {
                        CloseOutcome::Sold => {
                            let winner = winner.ok_or_else(|| {
                                db::Error::Malformed(format!(
                                    "auction {auction_id} has bids but an empty ledger"
                                ))
                            })?;
                            tx.execute(
                                r#"
                                update auction set
                                    status = 'sold', winner_id = ?3,
                                    winning_bid = current_bid, version = version + 1
                                where
                                    auction_id = ?1 and version = ?2 and status = 'live'
                                "#,
                                (*auction_id, stored.version, *winner),
                            )?
                        }
                        CloseOutcome::Ended => tx.execute(
                            r#"
                            update auction set
                                status = 'ended', version = version + 1
                            where
                                auction_id = ?1 and version = ?2 and status = 'live'
                            "#,
                            (*auction_id, stored.version),
                        )?,
                    }
                }
                _ => 0,
            };

            if applied == 1 {
                if let Some(auction) = load_full(&tx, auction_id)? {
                    transitions.push(Transition { from, auction });
                }
            }
            tx.commit()?;
        }

        // Everything still (or newly) live feeds countdown publication.
        let live = {
            let ctx = self.connect(false)?;
            let ids = {
                let mut stmt = ctx.prepare("select auction_id from auction where status = 'live'")?;
                stmt.query_and_then((), |row| -> Result<AuctionId, db::Error> {
                    Ok(row.get::<_, Uuid>(0)?.into())
                })?
                .collect::<Result<Vec<_>, _>>()?
            };
            let mut live = Vec::with_capacity(ids.len());
            for auction_id in ids {
                if let Some(record) = load_full(&ctx, auction_id)? {
                    live.push(record);
                }
            }
            live
        };

        Ok(SweepOutcome { transitions, live })
    }
}

fn last_bidder(conn: &Connection, auction_id: AuctionId) -> Result<Option<BidderId>, db::Error> {
    let mut stmt = conn.prepare(
        "select bidder_id from bid where auction_id = ?1 order by id desc limit 1",
    )?;
    let mut rows = stmt.query_and_then((*auction_id,), |row| -> Result<BidderId, db::Error> {
        Ok(row.get::<_, Uuid>(0)?.into())
    })?;
    rows.next().transpose()
}
