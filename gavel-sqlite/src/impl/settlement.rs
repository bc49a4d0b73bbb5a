use crate::{DateTime, db};
use gavel_core::{
    models::{AuctionId, BidderId, SettlementStatus},
    ports::SettlementRepository,
};

impl SettlementRepository for db::Database {
    async fn record_settlement(
        &self,
        auction_id: AuctionId,
        buyer_id: BidderId,
        amount: i64,
        status: SettlementStatus,
        timestamp: time::OffsetDateTime,
    ) -> Result<(), Self::Error> {
        let ctx = self.connect(true)?;

        // One row per sold auction; retries and status changes land as
        // upserts. The auction's own `sold` state is never touched from
        // here.
        ctx.execute(
            r#"
            insert into settlement (auction_id, buyer_id, amount, status, updated_at)
            values (?1, ?2, ?3, ?4, ?5)
            on conflict (auction_id) do update set
                status = excluded.status,
                updated_at = excluded.updated_at
            "#,
            (
                *auction_id,
                *buyer_id,
                amount,
                status.as_str(),
                DateTime::from(timestamp),
            ),
        )?;

        Ok(())
    }
}
