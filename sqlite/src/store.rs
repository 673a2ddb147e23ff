//! Subscription store for the `user_channels` table.
//!
//! Typed access to the table the migration tooling was built to service:
//! which users want race results posted to which channels, plus the cached
//! display name and most recent race timestamp per user.

use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Name of the subscription table.
pub const USER_CHANNELS_TABLE: &str = "user_channels";

/// One row of the subscription table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserChannel {
    /// Row id.
    pub id: i64,
    /// Discord user id.
    pub user_id: String,
    /// Channel the user's results are posted to.
    pub channel_id: String,
    /// Start time of the user's most recently reported race.
    pub last_race_time: Option<String>,
    /// Cached display name.
    pub display_name: Option<String>,
}

/// Query interface for the subscription table.
///
/// A user may be subscribed in several channels; each (user, channel) pair
/// appears at most once. All lookups return `None` or an empty vector for
/// unknown users rather than an error.
///
/// # Examples
///
/// ```
/// use rusqlite::Connection;
/// use table_migrate_sqlite::ChannelStore;
///
/// let conn = Connection::open_in_memory().unwrap();
/// let store = ChannelStore::new(&conn);
/// store.init().unwrap();
///
/// store.save_user_channel("u1", "c1", "Alice").unwrap();
/// assert_eq!(store.users_in_channel("c1").unwrap(), vec!["u1".to_string()]);
/// assert_eq!(store.display_name("u1").unwrap().as_deref(), Some("Alice"));
/// ```
pub struct ChannelStore<'a> {
    conn: &'a Connection,
}

impl<'a> ChannelStore<'a> {
    /// Creates a store over an existing connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Creates the subscription table if it does not exist.
    pub fn init(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {USER_CHANNELS_TABLE} (
                id INTEGER PRIMARY KEY,
                user_id TEXT,
                channel_id TEXT,
                last_race_time TEXT,
                display_name TEXT
            )"
        ))?;
        Ok(())
    }

    /// Upserts a subscription for a (user, channel) pair.
    ///
    /// An existing pair keeps its row (and `last_race_time`) but refreshes
    /// the display name. The upsert does not rely on a table constraint,
    /// so it behaves the same before and after constraint migrations.
    pub fn save_user_channel(
        &self,
        user_id: &str,
        channel_id: &str,
        display_name: &str,
    ) -> Result<(), StoreError> {
        let updated = self.conn.execute(
            &format!(
                "UPDATE {USER_CHANNELS_TABLE} SET display_name=?3
                 WHERE user_id=?1 AND channel_id=?2"
            ),
            params![user_id, channel_id, display_name],
        )?;
        if updated == 0 {
            self.conn.execute(
                &format!(
                    "INSERT INTO {USER_CHANNELS_TABLE} (user_id, channel_id, display_name)
                     VALUES (?1, ?2, ?3)"
                ),
                params![user_id, channel_id, display_name],
            )?;
        }
        Ok(())
    }

    /// Removes a subscription. Returns whether a row was deleted.
    pub fn remove_user_from_channel(
        &self,
        user_id: &str,
        channel_id: &str,
    ) -> Result<bool, StoreError> {
        let rows = self.conn.execute(
            &format!("DELETE FROM {USER_CHANNELS_TABLE} WHERE user_id=?1 AND channel_id=?2"),
            params![user_id, channel_id],
        )?;
        Ok(rows > 0)
    }

    /// Records the start time of the user's most recent race across all of
    /// their subscriptions. Returns whether any row was updated.
    pub fn set_last_race_time(
        &self,
        user_id: &str,
        last_race_time: &str,
    ) -> Result<bool, StoreError> {
        let rows = self.conn.execute(
            &format!("UPDATE {USER_CHANNELS_TABLE} SET last_race_time=?1 WHERE user_id=?2"),
            params![last_race_time, user_id],
        )?;
        Ok(rows > 0)
    }

    /// The user's most recent race time, if recorded.
    pub fn last_race_time(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        let value: Option<Option<String>> = self
            .conn
            .query_row(
                &format!(
                    "SELECT last_race_time FROM {USER_CHANNELS_TABLE} WHERE user_id=?1 LIMIT 1"
                ),
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.flatten())
    }

    /// Updates the cached display name across all of the user's
    /// subscriptions. Returns whether any row was updated.
    pub fn set_display_name(&self, user_id: &str, display_name: &str) -> Result<bool, StoreError> {
        let rows = self.conn.execute(
            &format!("UPDATE {USER_CHANNELS_TABLE} SET display_name=?1 WHERE user_id=?2"),
            params![display_name, user_id],
        )?;
        Ok(rows > 0)
    }

    /// The user's cached display name, if any.
    pub fn display_name(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        let value: Option<Option<String>> = self
            .conn
            .query_row(
                &format!(
                    "SELECT display_name FROM {USER_CHANNELS_TABLE} WHERE user_id=?1 LIMIT 1"
                ),
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.flatten())
    }

    /// User ids subscribed in a channel.
    pub fn users_in_channel(&self, channel_id: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT user_id FROM {USER_CHANNELS_TABLE} WHERE channel_id=?1 ORDER BY id"
        ))?;
        let users = stmt
            .query_map(params![channel_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(users)
    }

    /// Distinct channel ids with at least one subscription.
    pub fn channel_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT DISTINCT channel_id FROM {USER_CHANNELS_TABLE} ORDER BY channel_id"
        ))?;
        let channels = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(channels)
    }

    /// All subscription records, ordered by row id.
    pub fn user_channels(&self) -> Result<Vec<UserChannel>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, user_id, channel_id, last_race_time, display_name
             FROM {USER_CHANNELS_TABLE} ORDER BY id"
        ))?;
        let records = stmt
            .query_map([], |row| {
                Ok(UserChannel {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    channel_id: row.get(2)?,
                    last_race_time: row.get(3)?,
                    display_name: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Deletes all subscription records, returning how many were removed.
    pub fn clear(&self) -> Result<usize, StoreError> {
        let rows = self
            .conn
            .execute(&format!("DELETE FROM {USER_CHANNELS_TABLE}"), [])?;
        Ok(rows)
    }
}
