use std::collections::HashSet;

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

use parley_client::{ChatClient, ChatState};
use parley_types::events::{ClientEvent, View};
use parley_types::{ChannelId, Message, MessageId};

/// Prints state changes until the event stream closes.
pub async fn run(client: ChatClient, mut events: broadcast::Receiver<ClientEvent>) {
    let mut printed = Printed::default();

    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(n)) => {
                warn!("Renderer skipped {} events", n);
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        let state = client.snapshot();
        match event {
            ClientEvent::SessionChanged { user: Some(user) } => {
                println!("* logged in as {} <{}>", user.username, user.email);
            }
            ClientEvent::SessionChanged { user: None } => println!("* logged out"),
            ClientEvent::ViewChanged { view } => print_view(view),
            ClientEvent::ServersLoaded { .. } => print_servers(&state),
            ClientEvent::ContactsLoaded { count } => println!("* {} contacts", count),
            ClientEvent::SelectionChanged { channel_id, .. } => {
                printed.reset(channel_id);
                if let (Some(server), Some(channel)) = (state.selected_server(), state.selected_channel()) {
                    println!("* {} #{}", server.name, channel.name);
                }
            }
            ClientEvent::MessagesLoaded { channel_id, .. } => {
                if state.selected_channel_id() == Some(channel_id) {
                    for message in printed.unseen(channel_id, state.messages()) {
                        print_message(message);
                    }
                }
            }
            ClientEvent::MessageSent { .. } => {}
        }
    }
}

pub fn print_view(view: View) {
    match view {
        View::Auth(action) => println!("* {:?}: /login <email> <password> or /register <username> <email> <password>", action),
        View::Channels => {}
        View::Contacts => println!("* contacts"),
    }
}

pub fn print_servers(state: &ChatState) {
    for server in state.servers() {
        let marker = if state.selected_server_id() == Some(server.id) { ">" } else { " " };
        println!("{} [{}] {}", marker, server.id, server.name);
        for channel in &server.channels {
            println!("      [{}] #{} ({})", channel.id, channel.name, channel.kind);
        }
    }
}

pub fn print_contacts(state: &ChatState) {
    for contact in state.contacts() {
        let status = contact.status.as_deref().unwrap_or("offline");
        println!("  [{}] {} ({})", contact.id, contact.username, status);
    }
}

fn print_message(message: &Message) {
    println!(
        "{} {}: {}",
        message.created_at.format("%H:%M"),
        message.username,
        message.content
    );
}

/// Message ids already shown for the open channel, so each poll only
/// prints what is new.
#[derive(Default)]
struct Printed {
    channel: Option<ChannelId>,
    seen: HashSet<MessageId>,
}

impl Printed {
    fn reset(&mut self, channel: Option<ChannelId>) {
        if self.channel != channel {
            self.channel = channel;
            self.seen.clear();
        }
    }

    fn unseen<'a>(&mut self, channel: ChannelId, messages: &'a [Message]) -> Vec<&'a Message> {
        self.reset(Some(channel));
        messages.iter().filter(|m| self.seen.insert(m.id)).collect()
    }
}
