use crate::{DateTime, db};
use gavel_core::{
    models::{BidderId, NotificationDraft, NotificationKind, NotificationRecord},
    ports::NotificationRepository,
};
use uuid::Uuid;

impl NotificationRepository for db::Database {
    async fn record_notification(
        &self,
        draft: NotificationDraft,
        timestamp: time::OffsetDateTime,
    ) -> Result<(), Self::Error> {
        let ctx = self.connect(true)?;

        // The unique (auction_id, kind, recipient) triple makes this an
        // at-least-once channel with no-op duplicates.
        ctx.execute(
            r#"
            insert into notification (kind, auction_id, recipient, amount, created_at)
            values (?1, ?2, ?3, ?4, ?5)
            on conflict (auction_id, kind, recipient) do nothing
            "#,
            (
                draft.kind.as_str(),
                *draft.auction_id,
                *draft.recipient,
                draft.amount,
                DateTime::from(timestamp),
            ),
        )?;

        Ok(())
    }

    async fn inbox(&self, recipient: BidderId) -> Result<Vec<NotificationRecord>, Self::Error> {
        let ctx = self.connect(false)?;
        let mut stmt = ctx.prepare(
            r#"
            select
                kind, auction_id, amount, created_at, read
            from
                notification
            where
                recipient = ?1
            order by
                created_at desc, id desc
            "#,
        )?;

        stmt.query_and_then(
            (*recipient,),
            |row| -> Result<NotificationRecord, db::Error> {
                let kind: String = row.get(0)?;
                Ok(NotificationRecord {
                    kind: NotificationKind::parse(&kind).ok_or_else(|| {
                        db::Error::Malformed(format!("unknown notification kind {kind}"))
                    })?,
                    auction_id: row.get::<_, Uuid>(1)?.into(),
                    recipient,
                    amount: row.get(2)?,
                    created_at: row.get::<_, DateTime>(3)?.into(),
                    read: row.get(4)?,
                })
            },
        )?
        .collect()
    }

    async fn mark_read(&self, recipient: BidderId) -> Result<usize, Self::Error> {
        let ctx = self.connect(true)?;
        let changed = ctx.execute(
            "update notification set read = 1 where recipient = ?1 and read = 0",
            (*recipient,),
        )?;
        Ok(changed)
    }
}
