use crate::models::{BidderId, NotificationDraft, NotificationRecord};
use std::future::Future;
use time::OffsetDateTime;

/// Repository interface for the persisted, point-to-point notification
/// channel (outbid, won, sold, ended).
///
/// These records are independent of the live event fan-out: they are
/// delivered at-least-once, with `(auction_id, kind, recipient)` as the
/// idempotency key, so a duplicate recording is a no-op.
pub trait NotificationRepository: super::Repository {
    /// Record a notification, ignoring duplicates of the idempotency key
    fn record_notification(
        &self,
        draft: NotificationDraft,
        timestamp: OffsetDateTime,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// All notifications addressed to the recipient, newest first
    fn inbox(
        &self,
        recipient: BidderId,
    ) -> impl Future<Output = Result<Vec<NotificationRecord>, Self::Error>> + Send;

    /// Mark everything in the recipient's inbox read, returning how
    /// many records changed
    fn mark_read(
        &self,
        recipient: BidderId,
    ) -> impl Future<Output = Result<usize, Self::Error>> + Send;
}
