use tracing::{debug, info, warn};

use parley_types::User;
use parley_types::api::{AuthAction, Credentials};
use parley_types::events::{ClientEvent, View};

use crate::client::ChatClient;
use crate::error::ClientError;
use crate::state::FeedChange;

impl ChatClient {
    /// Restores the persisted session without asking the server. Falls back
    /// to the login prompt when nothing usable is stored.
    pub async fn restore_session(&self) -> Option<User> {
        match self.inner.with_store(|db| db.load_session()).await {
            Ok(Some(user)) => {
                info!("Restored session for {} ({})", user.username, user.id);
                self.start_session(user.clone()).await;
                Some(user)
            }
            Ok(None) => {
                debug!("No stored session");
                self.prompt_login();
                None
            }
            Err(e) => {
                warn!("Discarding unreadable session: {}", e);
                if let Err(e) = self.inner.with_store(|db| db.clear_session()).await {
                    warn!("Failed to clear session: {}", e);
                }
                self.prompt_login();
                None
            }
        }
    }

    pub async fn login(&self, credentials: Credentials) -> Result<User, ClientError> {
        self.authenticate(AuthAction::Login, credentials).await
    }

    pub async fn register(&self, credentials: Credentials) -> Result<User, ClientError> {
        self.authenticate(AuthAction::Register, credentials).await
    }

    /// Submits the auth form in whatever mode the prompt is showing.
    pub async fn submit_auth(&self) -> Result<User, ClientError> {
        let (action, credentials) = {
            let state = self.inner.state();
            let action = match state.view() {
                View::Auth(action) => action,
                _ => AuthAction::Login,
            };
            (action, state.auth_form().clone())
        };
        self.authenticate(action, credentials).await
    }

    /// Drops the session locally and on disk and returns to the login prompt.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let previous = self.inner.transition(|state| {
            let previous = state.user().map(|u| u.id);
            (previous, state.end_session())
        });
        self.inner.publish(ClientEvent::SessionChanged { user: None });

        if let Some(user_id) = previous {
            info!("User {} logged out", user_id);
        }

        self.inner
            .with_store(|db| db.clear_session())
            .await
            .inspect_err(|e| warn!("Failed to clear persisted session: {}", e))
    }

    async fn authenticate(&self, action: AuthAction, credentials: Credentials) -> Result<User, ClientError> {
        self.inner.state().set_auth_form(credentials.clone());

        let user = self
            .inner
            .api
            .authenticate(action, &credentials)
            .await
            .inspect_err(|e| warn!("Auth {:?} failed: {}", action, e))?;

        info!("Authenticated {} ({})", user.username, user.id);

        let persisted = user.clone();
        if let Err(e) = self.inner.with_store(move |db| db.save_session(&persisted)).await {
            warn!("Failed to persist session: {}", e);
        }

        self.start_session(user.clone()).await;
        Ok(user)
    }

    /// Installs `user` and loads their directory.
    async fn start_session(&self, user: User) {
        let user_id = user.id;
        self.inner
            .transition(|state| ((), state.begin_session(user.clone())));
        self.inner.publish(ClientEvent::SessionChanged { user: Some(user) });

        let (servers, contacts) = tokio::join!(self.load_servers(user_id), self.load_contacts(user_id));
        if servers.is_err() || contacts.is_err() {
            debug!("Directory for user {} is incomplete", user_id);
        }
    }

    fn prompt_login(&self) {
        self.inner.transition(|state| {
            state.prompt_login();
            ((), FeedChange::Unchanged)
        });
    }
}
