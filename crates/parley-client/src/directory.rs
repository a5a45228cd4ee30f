use tracing::{debug, info, warn};

use parley_types::events::ClientEvent;
use parley_types::{ChannelId, ServerId, UserId};

use crate::client::ChatClient;
use crate::error::ClientError;
use crate::state::FeedChange;

impl ChatClient {
    /// Replaces the server list of `user_id`. With nothing selected yet, the
    /// first server and its first channel are selected, which starts polling.
    pub async fn load_servers(&self, user_id: UserId) -> Result<usize, ClientError> {
        let servers = self
            .inner
            .api
            .servers(user_id)
            .await
            .inspect_err(|e| warn!("Failed to load servers: {}", e))?;

        let count = servers.len();
        let applied = self.inner.transition(|state| match state.apply_servers(user_id, servers) {
            Some(change) => (true, change),
            None => (false, FeedChange::Unchanged),
        });

        if applied {
            info!("Loaded {} servers for user {}", count, user_id);
            self.inner.publish(ClientEvent::ServersLoaded { count });
        } else {
            debug!("Dropped servers for logged-out user {}", user_id);
        }

        Ok(count)
    }

    pub async fn load_contacts(&self, user_id: UserId) -> Result<usize, ClientError> {
        let contacts = self
            .inner
            .api
            .contacts(user_id)
            .await
            .inspect_err(|e| warn!("Failed to load contacts: {}", e))?;

        let count = contacts.len();
        let applied = self.inner.state().apply_contacts(user_id, contacts);

        if applied {
            info!("Loaded {} contacts for user {}", count, user_id);
            self.inner.publish(ClientEvent::ContactsLoaded { count });
        } else {
            debug!("Dropped contacts for logged-out user {}", user_id);
        }

        Ok(count)
    }

    pub fn select_server(&self, server_id: ServerId) -> Result<(), ClientError> {
        self.inner
            .try_transition(|state| state.select_server(server_id))
            .inspect(|_| info!("Opened server {}", server_id))
            .inspect_err(|e| debug!("Ignoring server selection: {}", e))
    }

    pub fn select_channel(&self, channel_id: ChannelId) -> Result<(), ClientError> {
        self.inner
            .try_transition(|state| state.select_channel(channel_id))
            .inspect(|_| info!("Opened channel {}", channel_id))
            .inspect_err(|e| debug!("Ignoring channel selection: {}", e))
    }

    /// Opens the contact roster; no server or channel stays selected.
    pub fn show_contacts(&self) {
        self.inner.transition(|state| ((), state.show_contacts()));
        info!("Opened contacts");
    }
}
