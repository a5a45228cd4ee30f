use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::info;

use parley_api::{ChatApi, HttpApi};
use parley_store::Database;
use parley_types::ChannelId;
use parley_types::api::Credentials;
use parley_types::events::ClientEvent;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::feed::Poller;
use crate::state::{ChatState, FeedChange};

const EVENT_CAPACITY: usize = 256;

/// Handle to the chat client. Cheap to clone; all clones share one state.
///
/// Methods that change the selected channel spawn or cancel the poll task
/// and must run inside a tokio runtime.
#[derive(Clone)]
pub struct ChatClient {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) api: Arc<dyn ChatApi>,
    pub(crate) store: Arc<Database>,
    state: Mutex<ChatState>,
    feed: Poller,
    events: broadcast::Sender<ClientEvent>,
}

impl ChatClient {
    pub fn new(api: Arc<dyn ChatApi>, store: Database, poll_interval: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(ClientInner {
                api,
                store: Arc::new(store),
                state: Mutex::new(ChatState::new()),
                feed: Poller::new(poll_interval),
                events,
            }),
        }
    }

    /// HTTP endpoints plus the on-disk session store named in `config`.
    pub fn from_config(config: &ClientConfig) -> anyhow::Result<Self> {
        let api = HttpApi::with_timeout(config.endpoints.clone(), config.http_timeout)?;
        let store = Database::open(&config.session_db)?;
        Ok(Self::new(Arc::new(api), store, config.poll_interval))
    }

    /// Subscribe to state-change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.inner.events.subscribe()
    }

    /// A copy of the current state for rendering.
    pub fn snapshot(&self) -> ChatState {
        self.inner.state().clone()
    }

    /// The channel the poller is currently fetching, if any.
    pub fn polling_channel(&self) -> Option<ChannelId> {
        self.inner.feed.channel()
    }

    /// Number of poll tasks that have not exited yet.
    pub fn live_pollers(&self) -> usize {
        self.inner.feed.live()
    }

    pub fn toggle_auth_mode(&self) {
        self.inner.transition(|state| {
            state.toggle_auth_mode();
            ((), FeedChange::Unchanged)
        });
    }

    pub fn set_auth_form(&self, credentials: Credentials) {
        self.inner.state().set_auth_form(credentials);
    }

    /// Stops polling. State is kept so the client can be inspected afterwards.
    pub fn shutdown(&self) {
        self.inner.feed.on_channel_deselected();
        info!("Chat client shut down");
    }
}

impl ClientInner {
    pub(crate) fn state(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn publish(&self, event: ClientEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Runs a state transition and applies the feed change it asks for while
    /// still holding the state lock, so poller restarts follow the order of
    /// the transitions. View and selection changes are published.
    pub(crate) fn transition<T>(self: &Arc<Self>, f: impl FnOnce(&mut ChatState) -> (T, FeedChange)) -> T {
        let mut state = self.state();
        let view = state.view();
        let selection = (state.selected_server_id(), state.selected_channel_id());

        let (out, change) = f(&mut state);

        match change {
            FeedChange::Start(channel_id) => self.feed.on_channel_selected(channel_id, Arc::downgrade(self)),
            FeedChange::Stop => self.feed.on_channel_deselected(),
            FeedChange::Unchanged => {}
        }

        if state.view() != view {
            self.publish(ClientEvent::ViewChanged { view: state.view() });
        }

        let (server_id, channel_id) = (state.selected_server_id(), state.selected_channel_id());
        if (server_id, channel_id) != selection {
            self.publish(ClientEvent::SelectionChanged { server_id, channel_id });
        }

        out
    }

    /// Like [`transition`](Self::transition) for fallible transitions; a
    /// failed transition changes nothing.
    pub(crate) fn try_transition(
        self: &Arc<Self>,
        f: impl FnOnce(&mut ChatState) -> Result<FeedChange, ClientError>,
    ) -> Result<(), ClientError> {
        self.transition(|state| match f(state) {
            Ok(change) => (Ok(()), change),
            Err(e) => (Err(e), FeedChange::Unchanged),
        })
    }

    /// Runs a blocking store operation off the async runtime.
    pub(crate) async fn with_store<T, F>(&self, f: F) -> Result<T, ClientError>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        let result = tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| anyhow::anyhow!("store task failed: {}", e))?;
        Ok(result?)
    }
}
