use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::trace;

use parley_types::api::{AuthAction, Credentials, SendMessageRequest};
use parley_types::{ChannelId, Contact, Message, Server, User, UserId};

use crate::error::ApiError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// The four remote resources the client talks to.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Log in or register. Fails with [`ApiError::Rejected`] when the
    /// endpoint answers without a user.
    async fn authenticate(&self, action: AuthAction, credentials: &Credentials) -> Result<User, ApiError>;

    async fn servers(&self, user_id: UserId) -> Result<Vec<Server>, ApiError>;

    async fn contacts(&self, user_id: UserId) -> Result<Vec<Contact>, ApiError>;

    /// Recent messages of a channel, newest first, exactly as the endpoint
    /// returns them.
    async fn messages(&self, channel_id: ChannelId) -> Result<Vec<Message>, ApiError>;

    async fn send_message(&self, request: &SendMessageRequest) -> Result<(), ApiError>;
}

/// Endpoint URLs. Each resource is a separate function URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub auth: String,
    pub messages: String,
    pub servers: String,
    pub contacts: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            auth: "https://functions.poehali.dev/3e44251f-4b4d-4b14-835e-1a64b73d6f50".into(),
            messages: "https://functions.poehali.dev/94d25c78-0d81-4778-be0d-be15b72364a8".into(),
            servers: "https://functions.poehali.dev/d66d043c-8989-477c-bff6-80b2774216ba".into(),
            contacts: "https://functions.poehali.dev/361861d6-5f30-46d6-baa6-6bffd39e06e4".into(),
        }
    }
}

impl Endpoints {
    /// All four resources mounted under one base URL (`/auth`, `/messages`,
    /// `/servers`, `/contacts`).
    pub fn under(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            auth: format!("{}/auth", base),
            messages: format!("{}/messages", base),
            servers: format!("{}/servers", base),
            contacts: format!("{}/contacts", base),
        }
    }
}

/// reqwest-backed [`ChatApi`].
#[derive(Clone)]
pub struct HttpApi {
    pub(crate) client: Client,
    pub(crate) endpoints: Endpoints,
}

impl HttpApi {
    pub fn new(endpoints: Endpoints) -> Result<Self, ApiError> {
        Self::with_timeout(endpoints, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(endpoints: Endpoints, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoints })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }
}

#[async_trait]
impl ChatApi for HttpApi {
    async fn authenticate(&self, action: AuthAction, credentials: &Credentials) -> Result<User, ApiError> {
        self.post_auth(action, credentials).await
    }

    async fn servers(&self, user_id: UserId) -> Result<Vec<Server>, ApiError> {
        self.get_servers(user_id).await
    }

    async fn contacts(&self, user_id: UserId) -> Result<Vec<Contact>, ApiError> {
        self.get_contacts(user_id).await
    }

    async fn messages(&self, channel_id: ChannelId) -> Result<Vec<Message>, ApiError> {
        self.get_messages(channel_id).await
    }

    async fn send_message(&self, request: &SendMessageRequest) -> Result<(), ApiError> {
        self.post_message(request).await
    }
}

/// Reads the whole body and decodes it, rejecting non-2xx statuses.
pub(crate) async fn decode_success<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    let status = resp.status();
    let body = resp.text().await?;
    trace!("{} -> {} bytes", status, body.len());

    if !status.is_success() {
        return Err(ApiError::Status { status, body });
    }

    Ok(serde_json::from_str(&body)?)
}
