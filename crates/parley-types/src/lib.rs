pub mod api;
pub mod events;
pub mod models;

pub use models::{Channel, ChannelId, Contact, Message, MessageId, Server, ServerId, User, UserId};
