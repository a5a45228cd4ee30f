use anyhow::{Context, Result};
use rusqlite::Connection;

use parley_types::User;

use crate::Database;

/// Fixed key of the persisted session entry.
pub const SESSION_KEY: &str = "discord_user";

impl Database {
    // -- Raw entries --

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_conn(|conn| query_value(conn, key))
    }

    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
                (key, value),
            )?;
            Ok(())
        })
    }

    /// Returns true if an entry was removed.
    pub fn remove(&self, key: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
            Ok(removed > 0)
        })
    }

    // -- Session --

    pub fn load_session(&self) -> Result<Option<User>> {
        let Some(raw) = self.get(SESSION_KEY)? else {
            return Ok(None);
        };

        let user = serde_json::from_str(&raw).context("persisted session is not a valid user")?;
        Ok(Some(user))
    }

    pub fn save_session(&self, user: &User) -> Result<()> {
        let raw = serde_json::to_string(user)?;
        self.put(SESSION_KEY, &raw)
    }

    pub fn clear_session(&self) -> Result<()> {
        self.remove(SESSION_KEY)?;
        Ok(())
    }
}

fn query_value(conn: &Connection, key: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;

    let value = stmt
        .query_row([key], |row| row.get::<_, String>(0))
        .optional()?;

    Ok(value)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use parley_types::UserId;

    use super::*;

    fn user(id: i64) -> User {
        User {
            id: UserId(id),
            username: "a".into(),
            email: "a@b.com".into(),
            avatar_url: None,
            status: Some("online".into()),
        }
    }

    #[test]
    fn session_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.load_session().unwrap().is_none());

        db.save_session(&user(1)).unwrap();
        assert_eq!(db.load_session().unwrap(), Some(user(1)));

        db.clear_session().unwrap();
        assert!(db.load_session().unwrap().is_none());
        assert!(db.get(SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn save_overwrites_previous_session() {
        let db = Database::open_in_memory().unwrap();
        db.save_session(&user(1)).unwrap();
        db.save_session(&user(2)).unwrap();
        assert_eq!(db.load_session().unwrap().map(|u| u.id), Some(UserId(2)));
    }

    #[test]
    fn corrupt_session_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        db.put(SESSION_KEY, "{not json").unwrap();
        assert!(db.load_session().is_err());
    }

    #[test]
    fn remove_reports_whether_entry_existed() {
        let db = Database::open_in_memory().unwrap();
        assert!(!db.remove("missing").unwrap());
        db.put("k", "v").unwrap();
        assert!(db.remove("k").unwrap());
    }

    #[test]
    fn entries_survive_reopen() {
        let dir = std::env::temp_dir().join(format!("parley_store_test_{}", std::process::id()));
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("session.db");
        let _ = std::fs::remove_file(&path);

        {
            let db = Database::open(&path).unwrap();
            db.save_session(&user(7)).unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(db.load_session().unwrap().map(|u| u.id), Some(UserId(7)));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
