use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

id_type!(UserId);
id_type!(ServerId);
id_type!(ChannelId);
id_type!(MessageId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Roster entries are plain users; the roster carries no relationship data.
pub type Contact = User;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub id: ServerId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub icon_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub channels: Vec<Channel>,
}

impl Server {
    pub fn first_channel(&self) -> Option<&Channel> {
        self.channels.first()
    }

    pub fn channel(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    #[serde(rename = "type", default = "default_channel_kind")]
    pub kind: String,
}

fn default_channel_kind() -> String {
    "text".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub content: String,
    #[serde(deserialize_with = "timestamp")]
    pub created_at: DateTime<Utc>,
    pub user_id: UserId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Treats an explicit JSON `null` the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts RFC 3339 as well as the naive "YYYY-MM-DD HH:MM:SS[.ffffff]" form
/// that the message backend emits. Naive timestamps are taken as UTC.
fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    raw.parse::<DateTime<Utc>>().or_else(|_| {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
            .map(|ndt| ndt.and_utc())
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn user_tolerates_missing_optional_fields() {
        let user: User = serde_json::from_str(r#"{"id":1,"username":"a"}"#).unwrap();
        assert_eq!(user.id, UserId(1));
        assert_eq!(user.username, "a");
        assert_eq!(user.email, "");
        assert!(user.avatar_url.is_none());
        assert!(user.status.is_none());
    }

    #[test]
    fn contact_ignores_friendship_column() {
        let contact: Contact = serde_json::from_str(
            r#"{"id":2,"username":"b","email":"b@x.io","avatar_url":null,"status":"online","friendship_status":null}"#,
        )
        .unwrap();
        assert_eq!(contact.status.as_deref(), Some("online"));
        assert!(contact.avatar_url.is_none());
    }

    #[test]
    fn server_defaults_icon_and_channel_kind() {
        let server: Server =
            serde_json::from_str(r#"{"id":5,"name":"S","channels":[{"id":9,"name":"general"}]}"#).unwrap();
        assert_eq!(server.icon_url, "");
        assert_eq!(server.first_channel().map(|c| c.id), Some(ChannelId(9)));
        assert_eq!(server.channels[0].kind, "text");
        assert!(server.channel(ChannelId(10)).is_none());
    }

    #[test]
    fn server_with_null_channels_is_empty() {
        let server: Server =
            serde_json::from_str(r#"{"id":1,"name":"S","icon_url":null,"channels":null}"#).unwrap();
        assert!(server.channels.is_empty());
        assert!(server.first_channel().is_none());
    }

    #[test]
    fn parses_backend_naive_timestamp() {
        let ts = parse_timestamp("2024-03-01 12:30:45.123456").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2024, 3, 1));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (12, 30, 45));

        let ts = parse_timestamp("2024-03-01 12:30:45").unwrap();
        assert_eq!(ts.second(), 45);
    }

    #[test]
    fn parses_rfc3339_timestamp() {
        let ts = parse_timestamp("2024-03-01T10:00:00+02:00").unwrap();
        assert_eq!(ts.hour(), 8);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn message_rejects_garbage_timestamp() {
        let raw = r#"{"id":1,"content":"hi","created_at":"soon","user_id":1,"username":"a"}"#;
        assert!(serde_json::from_str::<Message>(raw).is_err());
    }
}
