use parley_types::api::Credentials;
use parley_types::{ChannelId, ServerId};

/// One line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login(Credentials),
    Register(Credentials),
    Logout,
    Servers,
    Server(ServerId),
    Channel(ChannelId),
    Contacts,
    Help,
    Quit,
    /// Anything that is not a command is a message.
    Say(String),
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Ok(Self::Say(line.to_string()));
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        match (name, args.as_slice()) {
            ("login", [email, password]) => Ok(Self::Login(Credentials::login(*email, *password))),
            ("register", [username, email, password]) => {
                Ok(Self::Register(Credentials::register(*username, *email, *password)))
            }
            ("logout", []) => Ok(Self::Logout),
            ("servers", []) => Ok(Self::Servers),
            ("server", [id]) => parse_id(id).map(|id| Self::Server(ServerId(id))),
            ("channel", [id]) => parse_id(id).map(|id| Self::Channel(ChannelId(id))),
            ("contacts", []) => Ok(Self::Contacts),
            ("help", []) => Ok(Self::Help),
            ("quit", []) => Ok(Self::Quit),
            ("login", _) => Err("usage: /login <email> <password>".into()),
            ("register", _) => Err("usage: /register <username> <email> <password>".into()),
            _ => Err(format!("unknown command: /{}", rest)),
        }
    }
}

fn parse_id(raw: &str) -> Result<i64, String> {
    raw.parse().map_err(|_| format!("not an id: {}", raw))
}

pub const HELP: &str = "\
/login <email> <password>
/register <username> <email> <password>
/logout
/servers             list servers and channels
/server <id>         open a server
/channel <id>        open a channel of the current server
/contacts            show the contact roster
/quit
anything else is sent to the current channel";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_auth_commands() {
        assert_eq!(
            Command::parse("/login a@b.com x"),
            Ok(Command::Login(Credentials::login("a@b.com", "x")))
        );
        assert_eq!(
            Command::parse("/register astronaut a@b.com x"),
            Ok(Command::Register(Credentials::register("astronaut", "a@b.com", "x")))
        );
        assert!(Command::parse("/login a@b.com").is_err());
    }

    #[test]
    fn parses_navigation() {
        assert_eq!(Command::parse("/server 5"), Ok(Command::Server(ServerId(5))));
        assert_eq!(Command::parse("  /channel 9 "), Ok(Command::Channel(ChannelId(9))));
        assert_eq!(Command::parse("/contacts"), Ok(Command::Contacts));
        assert!(Command::parse("/channel general").is_err());
        assert!(Command::parse("/dance").is_err());
    }

    #[test]
    fn plain_text_is_sent_verbatim() {
        assert_eq!(Command::parse("hello there "), Ok(Command::Say("hello there ".into())));
        assert_eq!(Command::parse("   "), Ok(Command::Say("   ".into())));
    }
}
