mod auction;
mod config;
mod event;
mod notification;
mod settlement;

pub use auction::{
    AuctionDraft, AuctionRecord, AuctionSnapshot, AuctionStatus, Bid, CloseOutcome, RelistRequest,
};
pub use config::Config;
pub use event::AuctionEvent;
pub use notification::{NotificationDraft, NotificationKind, NotificationRecord};
pub use settlement::{SettlementError, SettlementRequest, SettlementStatus};

macro_rules! uuid_wrapper {
    ($struct: ident) => {
        /// A UUID newtype
        #[derive(
            Debug,
            Hash,
            PartialEq,
            Eq,
            Clone,
            Copy,
            serde::Serialize,
            serde::Deserialize,
            PartialOrd,
            Ord,
        )]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $struct(uuid::Uuid);

        impl $struct {
            /// Generate a fresh random id
            pub fn random() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl From<uuid::Uuid> for $struct {
            fn from(value: uuid::Uuid) -> Self {
                Self(value)
            }
        }

        impl Into<uuid::Uuid> for $struct {
            fn into(self) -> uuid::Uuid {
                self.0
            }
        }

        impl TryFrom<&str> for $struct {
            type Error = <uuid::Uuid as std::str::FromStr>::Err;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Ok(Self(<uuid::Uuid as std::str::FromStr>::from_str(value)?))
            }
        }

        impl Into<String> for $struct {
            fn into(self) -> String {
                self.0.to_string()
            }
        }

        impl std::ops::Deref for $struct {
            type Target = uuid::Uuid;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl std::fmt::Display for $struct {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_wrapper!(AuctionId);
uuid_wrapper!(BidderId);
