//! Platform identifiers
//!
//! Rooms, channels, users and messages are all identified by opaque 64-bit
//! snowflakes on the chat platform. Distinct newtypes keep them from being
//! mixed up at call sites.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                s.parse::<u64>().map(Self)
            }
        }
    };
}

snowflake_id!(
    /// One independent playback context (a guild on the chat platform)
    RoomId
);
snowflake_id!(
    /// Text channel used for commands, status displays and error replies
    TextChannelId
);
snowflake_id!(
    /// Voice channel the transport streams into
    VoiceChannelId
);
snowflake_id!(
    /// Chat user
    UserId
);
snowflake_id!(
    /// Chat message
    MessageId
);
