//! Identifier newtypes.
//!
//! All identifiers are opaque strings as far as the core is concerned.
//! The channel adapter decides how they map onto the underlying messaging
//! platform (chat ids, message ids, file ids); the core never inspects them.

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$docs:meta])* $name:ident) => {
        $(#[$docs])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type! {
    /// Identifies one wizard session.
    ///
    /// Stable for the lifetime of a single intake conversation. The adapter
    /// typically derives it from the conversation thread, but the core only
    /// requires that it stays stable and is never reused after the session
    /// is consumed or expired.
    SessionId
}

id_type! {
    /// Identifies a ticket. Assigned once by the ticket store, never reused.
    TicketId
}

id_type! {
    /// Identifies the channel (chat, group, thread) a session originated from.
    ChannelId
}

id_type! {
    /// Identifies the person interacting with the bot or dashboard.
    UserId
}

id_type! {
    /// Reference to an uploaded media object (photo, document).
    ///
    /// The core stores these references verbatim; upload and retrieval are
    /// handled by the channel adapter.
    MediaRef
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_round_trip() {
        let id = SessionId::new("chat-42:msg-7");
        assert_eq!(id.to_string(), "chat-42:msg-7");
        assert_eq!(id.as_str(), "chat-42:msg-7");
    }

    #[test]
    fn test_from_str_and_string() {
        assert_eq!(TicketId::from("T-00001"), TicketId::new("T-00001"));
        assert_eq!(
            UserId::from(String::from("u-9")),
            UserId::new("u-9".to_string())
        );
    }

    #[test]
    fn test_serde_is_transparent_string() {
        let id = ChannelId::new("room-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"room-1\"");
        let back: ChannelId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
