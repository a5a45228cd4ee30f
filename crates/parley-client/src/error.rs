use parley_api::ApiError;
use parley_types::{ChannelId, ServerId};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("session store error: {0:#}")]
    Store(#[from] anyhow::Error),

    #[error("message is empty")]
    EmptyMessage,

    #[error("no channel selected")]
    NoChannelSelected,

    #[error("not logged in")]
    NotLoggedIn,

    #[error("unknown server {0}")]
    UnknownServer(ServerId),

    #[error("channel {0} is not part of the selected server")]
    UnknownChannel(ChannelId),
}

impl ClientError {
    /// Local validation failures never reach the network.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::EmptyMessage
                | Self::NoChannelSelected
                | Self::NotLoggedIn
                | Self::UnknownServer(_)
                | Self::UnknownChannel(_)
        )
    }
}
