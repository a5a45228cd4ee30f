use serde::{Deserialize, Serialize};

use crate::api::AuthAction;
use crate::models::{ChannelId, ServerId, User};

/// Which top-level screen the client is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum View {
    /// Login or registration prompt
    Auth(AuthAction),
    /// Server list with the selected channel's feed
    Channels,
    /// Flat contact roster, nothing selected
    Contacts,
}

/// State-change notifications published by the client for the front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientEvent {
    /// The active session was set, restored or cleared
    SessionChanged { user: Option<User> },

    /// The client switched screens
    ViewChanged { view: View },

    /// The server list was replaced
    ServersLoaded { count: usize },

    /// The contact roster was replaced
    ContactsLoaded { count: usize },

    /// The selected server and/or channel changed
    SelectionChanged {
        server_id: Option<ServerId>,
        channel_id: Option<ChannelId>,
    },

    /// The feed of the selected channel was replaced
    MessagesLoaded { channel_id: ChannelId, count: usize },

    /// A message was accepted by the messages endpoint
    MessageSent { channel_id: ChannelId },
}

impl ClientEvent {
    /// Returns the channel this event is about, if any.
    pub fn channel_id(&self) -> Option<ChannelId> {
        match self {
            Self::MessagesLoaded { channel_id, .. } => Some(*channel_id),
            Self::MessageSent { channel_id } => Some(*channel_id),
            Self::SelectionChanged { channel_id, .. } => *channel_id,
            _ => None,
        }
    }
}
