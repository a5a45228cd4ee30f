pub mod auth;
pub mod client;
pub mod directory;
pub mod error;
pub mod messages;

pub use client::{ChatApi, Endpoints, HttpApi};
pub use error::ApiError;
pub use reqwest::StatusCode;
