use serde::{Deserialize, Serialize};

use crate::models::{ChannelId, Contact, Message, Server, User, UserId, null_as_default};

// -- Auth --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthAction {
    Login,
    Register,
}

impl AuthAction {
    pub fn toggled(self) -> Self {
        match self {
            Self::Login => Self::Register,
            Self::Register => Self::Login,
        }
    }
}

/// What the user typed into the auth prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn login(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: String::new(),
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn register(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    /// Builds the request body. The username only travels with `register`.
    pub fn to_request(&self, action: AuthAction) -> AuthRequest {
        AuthRequest {
            action,
            username: match action {
                AuthAction::Register => Some(self.username.clone()),
                AuthAction::Login => None,
            },
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequest {
    pub action: AuthAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub email: String,
    pub password: String,
}

/// A missing `user` is how the auth endpoint signals failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// -- Directory --

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServersResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub servers: Vec<Server>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub contacts: Vec<Contact>,
}

// -- Messages --

/// Messages arrive newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagesResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub channel_id: ChannelId,
    pub user_id: UserId,
    pub content: String,
}
