use parley_types::api::{AuthAction, Credentials, SendMessageRequest};
use parley_types::events::View;
use parley_types::{Channel, ChannelId, Contact, Message, Server, ServerId, User, UserId};

use crate::error::ClientError;

/// What the message poller has to do after a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedChange {
    Unchanged,
    /// A (different) channel is now selected; restart polling for it.
    Start(ChannelId),
    /// No channel is selected any more; stop polling.
    Stop,
}

/// Local client state. Every mutation goes through a transition method so
/// the selection invariants hold:
///
/// - at most one server and one channel are selected,
/// - the selected channel belongs to the selected server,
/// - the contacts view selects nothing,
/// - `messages` always belongs to the selected channel.
#[derive(Debug, Clone)]
pub struct ChatState {
    user: Option<User>,
    view: View,
    auth_form: Credentials,
    servers: Vec<Server>,
    contacts: Vec<Contact>,
    selected_server: Option<ServerId>,
    selected_channel: Option<ChannelId>,
    /// Oldest first.
    messages: Vec<Message>,
    draft: String,
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatState {
    pub fn new() -> Self {
        Self {
            user: None,
            view: View::Auth(AuthAction::Login),
            auth_form: Credentials::default(),
            servers: Vec::new(),
            contacts: Vec::new(),
            selected_server: None,
            selected_channel: None,
            messages: Vec::new(),
            draft: String::new(),
        }
    }

    // -- Accessors --

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn auth_form(&self) -> &Credentials {
        &self.auth_form
    }

    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn selected_server_id(&self) -> Option<ServerId> {
        self.selected_server
    }

    pub fn selected_channel_id(&self) -> Option<ChannelId> {
        self.selected_channel
    }

    pub fn selected_server(&self) -> Option<&Server> {
        let id = self.selected_server?;
        self.servers.iter().find(|s| s.id == id)
    }

    pub fn selected_channel(&self) -> Option<&Channel> {
        let id = self.selected_channel?;
        self.selected_server()?.channel(id)
    }

    // -- Session --

    /// Installs a freshly authenticated or restored user. Everything that
    /// belonged to a previous session is dropped.
    pub fn begin_session(&mut self, user: User) -> FeedChange {
        self.user = Some(user);
        self.view = View::Channels;
        self.auth_form.password.clear();
        self.servers.clear();
        self.contacts.clear();
        self.selected_server = None;
        self.draft.clear();
        self.set_channel(None)
    }

    pub fn end_session(&mut self) -> FeedChange {
        self.user = None;
        self.view = View::Auth(AuthAction::Login);
        self.auth_form = Credentials::default();
        self.servers.clear();
        self.contacts.clear();
        self.selected_server = None;
        self.draft.clear();
        self.set_channel(None)
    }

    /// Shows the login prompt without touching any session data.
    pub fn prompt_login(&mut self) {
        self.view = View::Auth(AuthAction::Login);
    }

    /// Flips the auth prompt between login and registration.
    pub fn toggle_auth_mode(&mut self) {
        if let View::Auth(mode) = self.view {
            self.view = View::Auth(mode.toggled());
        }
    }

    pub fn set_auth_form(&mut self, credentials: Credentials) {
        self.auth_form = credentials;
    }

    // -- Directory --

    /// Replaces the server list. Returns `None` if the response belongs to a
    /// user that is no longer logged in.
    pub fn apply_servers(&mut self, user_id: UserId, servers: Vec<Server>) -> Option<FeedChange> {
        if !self.is_current_user(user_id) {
            return None;
        }

        self.servers = servers;

        if self.view != View::Channels {
            return Some(FeedChange::Unchanged);
        }

        // Keep a selection that is still valid; otherwise fall back to the
        // first server and its first channel.
        if let Some(server) = self.selected_server() {
            let channel_valid = self
                .selected_channel
                .is_some_and(|id| server.channel(id).is_some());
            if channel_valid {
                return Some(FeedChange::Unchanged);
            }
            let first = server.first_channel().map(|c| c.id);
            return Some(self.set_channel(first));
        }

        let first_server = self.servers.first();
        let server_id = first_server.map(|s| s.id);
        let channel_id = first_server.and_then(|s| s.first_channel()).map(|c| c.id);
        self.selected_server = server_id;
        Some(self.set_channel(channel_id))
    }

    /// Replaces the contact roster. Returns false for a stale response.
    pub fn apply_contacts(&mut self, user_id: UserId, contacts: Vec<Contact>) -> bool {
        if !self.is_current_user(user_id) {
            return false;
        }
        self.contacts = contacts;
        true
    }

    // -- Navigation --

    /// Opens a server and its first channel (no channel if it has none).
    pub fn select_server(&mut self, server_id: ServerId) -> Result<FeedChange, ClientError> {
        let server = self
            .servers
            .iter()
            .find(|s| s.id == server_id)
            .ok_or(ClientError::UnknownServer(server_id))?;

        let first = server.first_channel().map(|c| c.id);
        self.view = View::Channels;

        if self.selected_server == Some(server_id) && self.selected_channel.is_some() {
            return Ok(FeedChange::Unchanged);
        }

        self.selected_server = Some(server_id);
        Ok(self.set_channel(first))
    }

    /// Only channels of the selected server can be selected.
    pub fn select_channel(&mut self, channel_id: ChannelId) -> Result<FeedChange, ClientError> {
        let belongs = self
            .selected_server()
            .is_some_and(|server| server.channel(channel_id).is_some());
        if !belongs {
            return Err(ClientError::UnknownChannel(channel_id));
        }

        Ok(self.set_channel(Some(channel_id)))
    }

    pub fn show_contacts(&mut self) -> FeedChange {
        self.view = View::Contacts;
        self.selected_server = None;
        self.set_channel(None)
    }

    // -- Feed --

    /// Commits a poll result given newest first. Returns false (and leaves
    /// the feed alone) if the channel is no longer selected.
    pub fn apply_messages(&mut self, channel_id: ChannelId, mut newest_first: Vec<Message>) -> bool {
        if self.selected_channel != Some(channel_id) {
            return false;
        }
        newest_first.reverse();
        self.messages = newest_first;
        true
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    /// Validates the draft against the current selection and session.
    /// Nothing is sent when this fails.
    pub fn prepare_send(&self) -> Result<SendMessageRequest, ClientError> {
        if self.draft.trim().is_empty() {
            return Err(ClientError::EmptyMessage);
        }
        let channel_id = self.selected_channel.ok_or(ClientError::NoChannelSelected)?;
        let user = self.user.as_ref().ok_or(ClientError::NotLoggedIn)?;

        Ok(SendMessageRequest {
            channel_id,
            user_id: user.id,
            content: self.draft.clone(),
        })
    }

    /// Clears the input after a successful send, unless it was edited while
    /// the request was in flight.
    pub fn finish_send(&mut self, sent: &SendMessageRequest) {
        if self.draft == sent.content {
            self.draft.clear();
        }
    }

    fn is_current_user(&self, user_id: UserId) -> bool {
        self.user.as_ref().is_some_and(|u| u.id == user_id)
    }

    fn set_channel(&mut self, channel_id: Option<ChannelId>) -> FeedChange {
        if self.selected_channel == channel_id {
            return FeedChange::Unchanged;
        }

        self.selected_channel = channel_id;
        self.messages.clear();

        match channel_id {
            Some(id) => FeedChange::Start(id),
            None => FeedChange::Stop,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use parley_types::MessageId;

    use super::*;

    fn user(id: i64) -> User {
        User {
            id: UserId(id),
            username: format!("user{id}"),
            email: String::new(),
            avatar_url: None,
            status: None,
        }
    }

    fn channel(id: i64) -> Channel {
        Channel {
            id: ChannelId(id),
            name: format!("c{id}"),
            kind: "text".into(),
        }
    }

    fn server(id: i64, channels: &[i64]) -> Server {
        Server {
            id: ServerId(id),
            name: format!("s{id}"),
            icon_url: String::new(),
            channels: channels.iter().copied().map(channel).collect(),
        }
    }

    fn message(id: i64, secs: i64) -> Message {
        Message {
            id: MessageId(id),
            content: format!("m{id}"),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs),
            user_id: UserId(1),
            username: "user1".into(),
            avatar_url: None,
        }
    }

    fn logged_in() -> ChatState {
        let mut state = ChatState::new();
        state.begin_session(user(1));
        state
    }

    #[test]
    fn starts_at_login_prompt() {
        let state = ChatState::new();
        assert_eq!(state.view(), View::Auth(AuthAction::Login));
        assert!(state.user().is_none());
    }

    #[test]
    fn toggle_auth_mode_only_in_prompt() {
        let mut state = ChatState::new();
        state.toggle_auth_mode();
        assert_eq!(state.view(), View::Auth(AuthAction::Register));

        state.begin_session(user(1));
        state.toggle_auth_mode();
        assert_eq!(state.view(), View::Channels);
    }

    #[test]
    fn first_server_and_channel_are_auto_selected() {
        let mut state = logged_in();
        let change = state.apply_servers(UserId(1), vec![server(5, &[9, 10]), server(6, &[11])]);

        assert_eq!(change, Some(FeedChange::Start(ChannelId(9))));
        assert_eq!(state.selected_server_id(), Some(ServerId(5)));
        assert_eq!(state.selected_channel().map(|c| c.name.as_str()), Some("c9"));
    }

    #[test]
    fn refresh_keeps_valid_selection() {
        let mut state = logged_in();
        state.apply_servers(UserId(1), vec![server(5, &[9]), server(6, &[11, 12])]);
        state.select_server(ServerId(6)).unwrap();
        state.select_channel(ChannelId(12)).unwrap();

        let change = state.apply_servers(UserId(1), vec![server(5, &[9]), server(6, &[11, 12])]);
        assert_eq!(change, Some(FeedChange::Unchanged));
        assert_eq!(state.selected_channel_id(), Some(ChannelId(12)));
    }

    #[test]
    fn refresh_reselects_when_server_vanishes() {
        let mut state = logged_in();
        state.apply_servers(UserId(1), vec![server(5, &[9]), server(6, &[11])]);
        state.select_server(ServerId(6)).unwrap();

        let change = state.apply_servers(UserId(1), vec![server(5, &[9])]);
        assert_eq!(change, Some(FeedChange::Start(ChannelId(9))));
        assert_eq!(state.selected_server_id(), Some(ServerId(5)));
    }

    #[test]
    fn empty_server_list_is_valid() {
        let mut state = logged_in();
        assert_eq!(state.apply_servers(UserId(1), vec![]), Some(FeedChange::Unchanged));
        assert!(state.selected_server().is_none());
        assert!(state.selected_channel_id().is_none());
    }

    #[test]
    fn server_without_channels_selects_no_channel() {
        let mut state = logged_in();
        state.apply_servers(UserId(1), vec![server(5, &[9]), server(6, &[])]);

        assert_eq!(state.select_server(ServerId(6)).unwrap(), FeedChange::Stop);
        assert_eq!(state.selected_server_id(), Some(ServerId(6)));
        assert!(state.selected_channel_id().is_none());
    }

    #[test]
    fn stale_directory_responses_are_dropped() {
        let mut state = logged_in();
        assert_eq!(state.apply_servers(UserId(2), vec![server(5, &[9])]), None);
        assert!(!state.apply_contacts(UserId(2), vec![user(3)]));
        assert!(state.servers().is_empty());
        assert!(state.contacts().is_empty());
    }

    #[test]
    fn channel_must_belong_to_selected_server() {
        let mut state = logged_in();
        state.apply_servers(UserId(1), vec![server(5, &[9]), server(6, &[11])]);

        assert!(matches!(
            state.select_channel(ChannelId(11)),
            Err(ClientError::UnknownChannel(ChannelId(11)))
        ));
        assert_eq!(state.selected_channel_id(), Some(ChannelId(9)));
        assert!(matches!(
            state.select_server(ServerId(42)),
            Err(ClientError::UnknownServer(ServerId(42)))
        ));
    }

    #[test]
    fn switching_channel_clears_feed() {
        let mut state = logged_in();
        state.apply_servers(UserId(1), vec![server(5, &[9, 10])]);
        assert!(state.apply_messages(ChannelId(9), vec![message(2, 2), message(1, 1)]));
        assert_eq!(state.messages().len(), 2);

        assert_eq!(state.select_channel(ChannelId(10)).unwrap(), FeedChange::Start(ChannelId(10)));
        assert!(state.messages().is_empty());

        assert_eq!(state.select_channel(ChannelId(10)).unwrap(), FeedChange::Unchanged);
    }

    #[test]
    fn contacts_view_deselects_everything() {
        let mut state = logged_in();
        state.apply_servers(UserId(1), vec![server(5, &[9])]);
        state.apply_messages(ChannelId(9), vec![message(1, 1)]);

        assert_eq!(state.show_contacts(), FeedChange::Stop);
        assert_eq!(state.view(), View::Contacts);
        assert!(state.selected_server_id().is_none());
        assert!(state.selected_channel_id().is_none());
        assert!(state.messages().is_empty());

        // Directory refreshes do not pull the user out of the roster.
        assert_eq!(state.apply_servers(UserId(1), vec![server(5, &[9])]), Some(FeedChange::Unchanged));
        assert!(state.selected_server_id().is_none());

        assert_eq!(state.select_server(ServerId(5)).unwrap(), FeedChange::Start(ChannelId(9)));
        assert_eq!(state.view(), View::Channels);
    }

    #[test]
    fn messages_are_stored_oldest_first() {
        let mut state = logged_in();
        state.apply_servers(UserId(1), vec![server(5, &[9])]);

        let newest_first = vec![message(3, 30), message(2, 20), message(1, 10)];
        assert!(state.apply_messages(ChannelId(9), newest_first));

        let ids: Vec<_> = state.messages().iter().map(|m| m.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(state.messages().windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }

    #[test]
    fn stale_feed_is_discarded() {
        let mut state = logged_in();
        state.apply_servers(UserId(1), vec![server(5, &[9, 10])]);
        state.select_channel(ChannelId(10)).unwrap();

        assert!(!state.apply_messages(ChannelId(9), vec![message(1, 1)]));
        assert!(state.messages().is_empty());
    }

    #[test]
    fn send_validation() {
        let mut state = ChatState::new();
        state.set_draft("hi");
        assert!(matches!(state.prepare_send(), Err(ClientError::NoChannelSelected)));

        let mut state = logged_in();
        state.apply_servers(UserId(1), vec![server(5, &[9])]);
        for blank in ["", "   ", "\n\t"] {
            state.set_draft(blank);
            assert!(matches!(state.prepare_send(), Err(ClientError::EmptyMessage)));
        }

        state.set_draft(" hi ");
        let request = state.prepare_send().unwrap();
        assert_eq!(request.channel_id, ChannelId(9));
        assert_eq!(request.user_id, UserId(1));
        assert_eq!(request.content, " hi ");

        state.finish_send(&request);
        assert_eq!(state.draft(), "");
    }

    #[test]
    fn draft_edited_during_send_is_kept() {
        let mut state = logged_in();
        state.apply_servers(UserId(1), vec![server(5, &[9])]);
        state.set_draft("hi");
        let request = state.prepare_send().unwrap();

        state.set_draft("hi there");
        state.finish_send(&request);
        assert_eq!(state.draft(), "hi there");
    }

    #[test]
    fn end_session_resets_everything() {
        let mut state = logged_in();
        state.apply_servers(UserId(1), vec![server(5, &[9])]);
        state.apply_contacts(UserId(1), vec![user(2)]);
        state.set_draft("unsent");

        assert_eq!(state.end_session(), FeedChange::Stop);
        assert!(state.user().is_none());
        assert!(state.servers().is_empty());
        assert!(state.contacts().is_empty());
        assert_eq!(state.draft(), "");
        assert_eq!(state.view(), View::Auth(AuthAction::Login));
    }

    #[test]
    fn begin_session_forgets_password() {
        let mut state = ChatState::new();
        state.set_auth_form(Credentials::login("a@b.com", "x"));
        state.begin_session(user(1));
        assert_eq!(state.auth_form().email, "a@b.com");
        assert_eq!(state.auth_form().password, "");
    }
}
