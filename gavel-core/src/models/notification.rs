use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{AuctionId, BidderId};

/// What a point-to-point notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    /// Someone topped the recipient's bid
    Outbid,
    /// The recipient won the auction
    Won,
    /// The recipient's auction sold
    Sold,
    /// The recipient's auction closed without a sale
    Ended,
}

impl NotificationKind {
    /// The kebab-case name, as serialized and as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Outbid => "outbid",
            Self::Won => "won",
            Self::Sold => "sold",
            Self::Ended => "ended",
        }
    }

    /// The inverse of [`NotificationKind::as_str`]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "outbid" => Some(Self::Outbid),
            "won" => Some(Self::Won),
            "sold" => Some(Self::Sold),
            "ended" => Some(Self::Ended),
            _ => None,
        }
    }
}

/// A notification to be recorded for a user's inbox.
///
/// The triple `(auction_id, kind, recipient)` is the idempotency key:
/// delivery is at-least-once, and recording the same draft twice is a
/// no-op on the receiving side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationDraft {
    /// What happened
    pub kind: NotificationKind,
    /// The auction it happened on
    pub auction_id: AuctionId,
    /// Who should see it
    pub recipient: BidderId,
    /// The associated amount, where one makes sense (the new standing
    /// price for an outbid, the sale price for won/sold)
    pub amount: Option<i64>,
}

/// A persisted inbox entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// What happened
    pub kind: NotificationKind,
    /// The auction it happened on
    pub auction_id: AuctionId,
    /// Who it is addressed to
    pub recipient: BidderId,
    /// The associated amount, where one makes sense
    pub amount: Option<i64>,
    /// When it was recorded
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Whether the recipient has seen it
    pub read: bool,
}
