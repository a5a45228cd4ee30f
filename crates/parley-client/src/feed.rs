use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use parley_types::ChannelId;
use parley_types::events::ClientEvent;

use crate::client::{ChatClient, ClientInner};
use crate::error::ClientError;

/// Owns the single message poller. Replacing or dropping the handle cancels
/// the previous task.
pub(crate) struct Poller {
    period: Duration,
    current: Mutex<Option<PollHandle>>,
    live: Arc<AtomicUsize>,
}

struct PollHandle {
    channel_id: ChannelId,
    cancel: CancellationToken,
    _task: JoinHandle<()>,
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Counts a poll task as live from spawn until the task is gone.
struct LiveGuard(Arc<AtomicUsize>);

impl LiveGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Poller {
    pub(crate) fn new(period: Duration) -> Self {
        Self {
            period,
            current: Mutex::new(None),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn current(&self) -> MutexGuard<'_, Option<PollHandle>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetches `channel_id` immediately and then every period, replacing
    /// whatever poller ran before.
    pub(crate) fn on_channel_selected(&self, channel_id: ChannelId, client: Weak<ClientInner>) {
        let cancel = CancellationToken::new();
        let guard = LiveGuard::new(self.live.clone());
        let task = tokio::spawn(run_poll_loop(client, channel_id, self.period, cancel.clone(), guard));

        let previous = self.current().replace(PollHandle {
            channel_id,
            cancel,
            _task: task,
        });

        if let Some(previous) = previous {
            debug!("Stopped polling channel {}", previous.channel_id);
        }
        debug!("Polling channel {} every {:?}", channel_id, self.period);
    }

    pub(crate) fn on_channel_deselected(&self) {
        if let Some(previous) = self.current().take() {
            debug!("Stopped polling channel {}", previous.channel_id);
        }
    }

    pub(crate) fn channel(&self) -> Option<ChannelId> {
        self.current().as_ref().map(|h| h.channel_id)
    }

    pub(crate) fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

async fn run_poll_loop(
    client: Weak<ClientInner>,
    channel_id: ChannelId,
    period: Duration,
    cancel: CancellationToken,
    _live: LiveGuard,
) {
    // The first tick completes immediately.
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let Some(inner) = client.upgrade() else {
            break;
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = inner.refresh_messages(channel_id) => {}
        }
    }

    debug!("Poller for channel {} exited", channel_id);
}

impl ClientInner {
    /// Fetches a channel's feed and commits it if the channel is still
    /// selected. Returns whether the result was committed.
    pub(crate) async fn refresh_messages(&self, channel_id: ChannelId) -> Result<bool, ClientError> {
        let messages = self.api.messages(channel_id).await.inspect_err(|e| {
            warn!("Failed to load messages for channel {}: {}", channel_id, e);
        })?;

        let count = messages.len();
        let committed = self.state().apply_messages(channel_id, messages);

        if committed {
            debug!("Channel {}: {} messages", channel_id, count);
            self.publish(ClientEvent::MessagesLoaded { channel_id, count });
        } else {
            debug!("Dropped stale messages for channel {}", channel_id);
        }

        Ok(committed)
    }
}

impl ChatClient {
    /// One-off fetch of a channel's feed. Results for a channel that is not
    /// selected are discarded.
    pub async fn load_messages(&self, channel_id: ChannelId) -> Result<bool, ClientError> {
        self.inner.refresh_messages(channel_id).await
    }

    pub fn set_draft(&self, draft: impl Into<String>) {
        self.inner.state().set_draft(draft);
    }

    /// Posts the draft to the selected channel as the logged-in user, then
    /// reloads the feed without waiting for the next poll.
    ///
    /// Empty drafts, a missing channel or a missing session are rejected
    /// before any request is made.
    pub async fn send_message(&self) -> Result<(), ClientError> {
        let request = self.inner.state().prepare_send();
        let request = request.inspect_err(|e| debug!("Not sending: {}", e))?;

        self.inner.api.send_message(&request).await.inspect_err(|e| {
            warn!("Failed to send message to channel {}: {}", request.channel_id, e);
        })?;

        self.inner.state().finish_send(&request);
        self.inner.publish(ClientEvent::MessageSent {
            channel_id: request.channel_id,
        });

        // Already logged inside; the send itself succeeded.
        let _ = self.inner.refresh_messages(request.channel_id).await;

        Ok(())
    }
}
