pub mod client;
pub mod config;
pub mod directory;
pub mod error;
pub mod feed;
pub mod session;
pub mod state;

pub use client::ChatClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use state::{ChatState, FeedChange};
