use std::fs;
use std::path::Path;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, error, warn};

use crate::error::Result;
use crate::models::{
    AuthorizedChat, MediaKind, NewMessage, SearchLogEntry, Stats, StoredMessage, User,
};
use crate::schema::{
    admins, authorized_chats, message_identifiers, messages, ratelimits, searches, settings, users,
};
use crate::validation::SUPPORTED_LANGS;

// Type alias for the database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Database manager for handling connections and operations.
///
/// Every public operation is self-contained: it acquires a pooled connection,
/// runs a single statement (or a short fixed sequence), and commits before
/// returning. Callers never span transactions across calls.
pub struct Database {
    pool: DbPool,
}

/// Strip an optional `sqlite:`/`sqlite://` scheme so either form opens the same file.
fn database_path(database_url: &str) -> &str {
    database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url)
}

/// Uniform logging at the store call boundary.
fn traced<T>(operation: &'static str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    debug!(operation, "store call");
    match f() {
        Ok(value) => Ok(value),
        Err(e) => {
            error!(operation, error = %e, "store call failed");
            Err(e)
        }
    }
}

impl Database {
    /// Create a new database connection pool and apply migrations.
    pub fn new(database_url: &str) -> Result<Self> {
        let path = database_path(database_url);

        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Set up connection manager and pool
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().build(manager)?;

        // Run migrations
        let conn = pool.get()?;
        Self::run_migrations(&conn)?;

        Ok(Self { pool })
    }

    /// Run database migrations
    fn run_migrations(conn: &Connection) -> Result<()> {
        conn.execute_batch(include_str!(
            "../migrations/2025-06-20-000000_create_tables/up.sql"
        ))?;
        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> Result<DbConnection> {
        Ok(self.pool.get()?)
    }

    // ---- Admins

    /// Grant admin capability to a user. Idempotent.
    pub fn add_admin(&self, user_id: i64) -> Result<()> {
        traced("add_admin", || {
            let conn = self.get_connection()?;
            conn.execute(
                &format!(
                    "INSERT OR IGNORE INTO {} ({}) VALUES (?)",
                    admins::TABLE,
                    admins::USER_ID
                ),
                params![user_id],
            )?;
            Ok(())
        })
    }

    /// Check admin membership.
    pub fn is_admin(&self, user_id: i64) -> Result<bool> {
        traced("is_admin", || {
            let conn = self.get_connection()?;
            let found: Option<i64> = conn
                .query_row(
                    &format!(
                        "SELECT 1 FROM {} WHERE {} = ?",
                        admins::TABLE,
                        admins::USER_ID
                    ),
                    params![user_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    // ---- Users

    /// Insert or refresh a user row; last write wins, `updated_at` is bumped.
    pub fn upsert_user(
        &self,
        user_id: i64,
        first_name: &str,
        last_name: &str,
        username: &str,
        lang: Option<&str>,
    ) -> Result<()> {
        traced("upsert_user", || {
            let conn = self.get_connection()?;
            conn.execute(
                &format!(
                    "INSERT INTO {table} ({id}, {first}, {last}, {name}, {lang})
                     VALUES (?, ?, ?, ?, ?)
                     ON CONFLICT({id}) DO UPDATE SET
                       {first} = excluded.{first},
                       {last} = excluded.{last},
                       {name} = excluded.{name},
                       {updated} = CURRENT_TIMESTAMP",
                    table = users::TABLE,
                    id = users::USER_ID,
                    first = users::FIRST_NAME,
                    last = users::LAST_NAME,
                    name = users::USERNAME,
                    lang = users::LANG,
                    updated = users::UPDATED_AT,
                ),
                params![user_id, first_name, last_name, username, lang],
            )?;
            Ok(())
        })
    }

    /// Set a user's language preference.
    pub fn set_user_lang(&self, user_id: i64, lang: &str) -> Result<()> {
        traced("set_user_lang", || {
            let conn = self.get_connection()?;
            conn.execute(
                &format!(
                    "INSERT INTO {table} ({id}, {lang}) VALUES (?, ?)
                     ON CONFLICT({id}) DO UPDATE SET
                       {lang} = excluded.{lang},
                       {updated} = CURRENT_TIMESTAMP",
                    table = users::TABLE,
                    id = users::USER_ID,
                    lang = users::LANG,
                    updated = users::UPDATED_AT,
                ),
                params![user_id, lang],
            )?;
            Ok(())
        })
    }

    /// Look up a user row.
    pub fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        traced("get_user", || {
            let conn = self.get_connection()?;
            let user = conn
                .query_row(
                    &format!(
                        "SELECT * FROM {} WHERE {} = ?",
                        users::TABLE,
                        users::USER_ID
                    ),
                    params![user_id],
                    Self::map_db_user,
                )
                .optional()?;
            Ok(user)
        })
    }

    /// Stored language preference, if it is one of the supported codes.
    pub fn get_user_lang(&self, user_id: i64) -> Result<Option<String>> {
        traced("get_user_lang", || {
            let conn = self.get_connection()?;
            let lang: Option<Option<String>> = conn
                .query_row(
                    &format!(
                        "SELECT {} FROM {} WHERE {} = ?",
                        users::LANG,
                        users::TABLE,
                        users::USER_ID
                    ),
                    params![user_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(lang
                .flatten()
                .filter(|l| SUPPORTED_LANGS.contains(&l.as_str())))
        })
    }

    // ---- Authorized chats

    /// Record a chat as authorized; full replace by chat id (replace wins).
    pub fn add_authorized_chat(
        &self,
        chat_id: i64,
        title: &str,
        female_id: &str,
        added_by: i64,
    ) -> Result<()> {
        traced("add_authorized_chat", || {
            let conn = self.get_connection()?;
            conn.execute(
                &format!(
                    "INSERT OR REPLACE INTO {} ({}, {}, {}, {}) VALUES (?, ?, ?, ?)",
                    authorized_chats::TABLE,
                    authorized_chats::CHAT_ID,
                    authorized_chats::TITLE,
                    authorized_chats::FEMALE_ID,
                    authorized_chats::ADDED_BY,
                ),
                params![chat_id, title, female_id, added_by],
            )?;
            Ok(())
        })
    }

    /// Look up a chat's authorization record.
    pub fn get_authorized_chat(&self, chat_id: i64) -> Result<Option<AuthorizedChat>> {
        traced("get_authorized_chat", || {
            let conn = self.get_connection()?;
            let chat = conn
                .query_row(
                    &format!(
                        "SELECT * FROM {} WHERE {} = ?",
                        authorized_chats::TABLE,
                        authorized_chats::CHAT_ID
                    ),
                    params![chat_id],
                    Self::map_db_authorized_chat,
                )
                .optional()?;
            Ok(chat)
        })
    }

    /// All authorized chats, most recently added first.
    pub fn list_authorized_chats(&self) -> Result<Vec<AuthorizedChat>> {
        traced("list_authorized_chats", || {
            let conn = self.get_connection()?;
            let mut stmt = conn.prepare(&format!(
                "SELECT * FROM {} ORDER BY {} DESC",
                authorized_chats::TABLE,
                authorized_chats::ADDED_AT
            ))?;
            let chat_iter = stmt.query_map([], Self::map_db_authorized_chat)?;

            let mut results = Vec::new();
            for chat in chat_iter {
                results.push(chat?);
            }
            Ok(results)
        })
    }

    /// Authorized chats whose bound identifier equals `female_id`.
    pub fn find_chats_by_female_id(&self, female_id: &str) -> Result<Vec<AuthorizedChat>> {
        traced("find_chats_by_female_id", || {
            let conn = self.get_connection()?;
            let mut stmt = conn.prepare(&format!(
                "SELECT * FROM {} WHERE {} = ? ORDER BY {} DESC",
                authorized_chats::TABLE,
                authorized_chats::FEMALE_ID,
                authorized_chats::ADDED_AT
            ))?;
            let chat_iter = stmt.query_map(params![female_id], Self::map_db_authorized_chat)?;

            let mut results = Vec::new();
            for chat in chat_iter {
                results.push(chat?);
            }
            Ok(results)
        })
    }

    /// Drop a chat's authorization record. Returns true if a row was removed.
    pub fn remove_authorized_chat(&self, chat_id: i64) -> Result<bool> {
        traced("remove_authorized_chat", || {
            let conn = self.get_connection()?;
            let removed = conn.execute(
                &format!(
                    "DELETE FROM {} WHERE {} = ?",
                    authorized_chats::TABLE,
                    authorized_chats::CHAT_ID
                ),
                params![chat_id],
            )?;
            Ok(removed > 0)
        })
    }

    // ---- KV settings

    /// Set a settings value, overwriting any prior value for the key.
    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        traced("set_setting", || {
            let conn = self.get_connection()?;
            conn.execute(
                &format!(
                    "INSERT INTO {table} ({key}, {value}) VALUES (?, ?)
                     ON CONFLICT({key}) DO UPDATE SET {value} = excluded.{value}",
                    table = settings::TABLE,
                    key = settings::KEY,
                    value = settings::VALUE,
                ),
                params![key, value],
            )?;
            Ok(())
        })
    }

    /// Read a settings value.
    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        traced("get_setting", || {
            let conn = self.get_connection()?;
            let value = conn
                .query_row(
                    &format!(
                        "SELECT {} FROM {} WHERE {} = ?",
                        settings::VALUE,
                        settings::TABLE,
                        settings::KEY
                    ),
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value)
        })
    }

    /// Delete a settings key. A missing key is not an error.
    pub fn delete_setting(&self, key: &str) -> Result<()> {
        traced("delete_setting", || {
            let conn = self.get_connection()?;
            conn.execute(
                &format!("DELETE FROM {} WHERE {} = ?", settings::TABLE, settings::KEY),
                params![key],
            )?;
            Ok(())
        })
    }

    // ---- Messages / identifier links

    /// Insert a message row, ignoring duplicates of `(chat_id, message_id)`.
    ///
    /// Always returns the surrogate id, whether the row was newly inserted or
    /// already present, so callers can proceed to link identifiers either way.
    pub fn save_message(&self, new_message: &NewMessage) -> Result<i64> {
        traced("save_message", || {
            let conn = self.get_connection()?;
            conn.execute(
                &format!(
                    "INSERT OR IGNORE INTO {} ({}, {}, {}, {}, {}, {}, {}, {}, {}, {})
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    messages::TABLE,
                    messages::CHAT_ID,
                    messages::MESSAGE_ID,
                    messages::SENDER_ID,
                    messages::SENDER_USERNAME,
                    messages::SENDER_FIRST_NAME,
                    messages::DATE,
                    messages::TEXT,
                    messages::MEDIA_TYPE,
                    messages::FILE_ID,
                    messages::IS_FORWARD,
                ),
                params![
                    new_message.chat_id,
                    new_message.message_id,
                    new_message.sender_id,
                    new_message.sender_username,
                    new_message.sender_first_name,
                    new_message.date,
                    new_message.text,
                    new_message.media_type.as_str(),
                    new_message.file_id,
                    new_message.is_forward,
                ],
            )?;

            let id: i64 = conn.query_row(
                &format!(
                    "SELECT {} FROM {} WHERE {} = ? AND {} = ?",
                    messages::ID,
                    messages::TABLE,
                    messages::CHAT_ID,
                    messages::MESSAGE_ID
                ),
                params![new_message.chat_id, new_message.message_id],
                |row| row.get(0),
            )?;
            Ok(id)
        })
    }

    /// Surrogate id for a platform message, if it was ever ingested.
    pub fn message_surrogate_id(&self, chat_id: i64, message_id: i64) -> Result<Option<i64>> {
        traced("message_surrogate_id", || {
            let conn = self.get_connection()?;
            let id = conn
                .query_row(
                    &format!(
                        "SELECT {} FROM {} WHERE {} = ? AND {} = ?",
                        messages::ID,
                        messages::TABLE,
                        messages::CHAT_ID,
                        messages::MESSAGE_ID
                    ),
                    params![chat_id, message_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(id)
        })
    }

    /// Replace a message's text in place. Media attributes are left untouched.
    pub fn update_message_text(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()> {
        traced("update_message_text", || {
            let conn = self.get_connection()?;
            conn.execute(
                &format!(
                    "UPDATE {} SET {} = ? WHERE {} = ? AND {} = ?",
                    messages::TABLE,
                    messages::TEXT,
                    messages::CHAT_ID,
                    messages::MESSAGE_ID
                ),
                params![text, chat_id, message_id],
            )?;
            Ok(())
        })
    }

    /// Link identifiers to a stored message, one row per pair.
    ///
    /// A failure on one pair is logged and skipped; the remaining pairs are
    /// still written. Returns the number of successfully executed inserts
    /// (duplicate pairs count as success and change nothing).
    pub fn link_identifiers<'a, I>(&self, message_id_ref: i64, identifiers: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        traced("link_identifiers", || {
            let conn = self.get_connection()?;
            let sql = format!(
                "INSERT OR IGNORE INTO {} ({}, {}) VALUES (?, ?)",
                message_identifiers::TABLE,
                message_identifiers::MESSAGE_ID_REF,
                message_identifiers::IDENTIFIER,
            );

            let mut linked = 0;
            for identifier in identifiers {
                match conn.execute(&sql, params![message_id_ref, identifier]) {
                    Ok(_) => linked += 1,
                    Err(e) => {
                        warn!(
                            message_id_ref,
                            identifier,
                            error = %e,
                            "failed to link identifier, skipping"
                        );
                    }
                }
            }
            Ok(linked)
        })
    }

    /// Remove all identifier links for a stored message.
    pub fn unlink_all_identifiers(&self, message_id_ref: i64) -> Result<usize> {
        traced("unlink_all_identifiers", || {
            let conn = self.get_connection()?;
            let removed = conn.execute(
                &format!(
                    "DELETE FROM {} WHERE {} = ?",
                    message_identifiers::TABLE,
                    message_identifiers::MESSAGE_ID_REF
                ),
                params![message_id_ref],
            )?;
            Ok(removed)
        })
    }

    // ---- Search / stats

    /// One page of messages linked to `identifier`, most recent first.
    ///
    /// Ties on `date` break by surrogate id descending so pagination is
    /// deterministic for a given identifier.
    pub fn search_by_identifier(
        &self,
        identifier: &str,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<StoredMessage>> {
        traced("search_by_identifier", || {
            let conn = self.get_connection()?;
            let mut stmt = conn.prepare(&Self::search_sql(" LIMIT ? OFFSET ?"))?;
            let message_iter = stmt.query_map(
                params![identifier, limit, offset],
                Self::map_db_message,
            )?;

            let mut results = Vec::new();
            for message in message_iter {
                results.push(message?);
            }
            Ok(results)
        })
    }

    /// The full unpaged row set for `identifier`, same ordering as search.
    pub fn export_by_identifier(&self, identifier: &str) -> Result<Vec<StoredMessage>> {
        traced("export_by_identifier", || {
            let conn = self.get_connection()?;
            let mut stmt = conn.prepare(&Self::search_sql(""))?;
            let message_iter = stmt.query_map(params![identifier], Self::map_db_message)?;

            let mut results = Vec::new();
            for message in message_iter {
                results.push(message?);
            }
            Ok(results)
        })
    }

    /// Number of messages linked to `identifier`.
    pub fn count_by_identifier(&self, identifier: &str) -> Result<u64> {
        traced("count_by_identifier", || {
            let conn = self.get_connection()?;
            let count: i64 = conn.query_row(
                &format!(
                    "SELECT COUNT(*) FROM {msgs} m
                     JOIN {links} mm ON mm.{link_ref} = m.{id}
                     WHERE mm.{ident} = ?",
                    msgs = messages::TABLE,
                    links = message_identifiers::TABLE,
                    link_ref = message_identifiers::MESSAGE_ID_REF,
                    id = messages::ID,
                    ident = message_identifiers::IDENTIFIER,
                ),
                params![identifier],
                |row| row.get(0),
            )?;
            Ok(u64::try_from(count).unwrap_or_default())
        })
    }

    /// Aggregate counters: distinct identifiers, messages, authorized chats.
    pub fn count_stats(&self) -> Result<Stats> {
        traced("count_stats", || {
            let conn = self.get_connection()?;
            let distinct_identifiers: i64 = conn.query_row(
                &format!(
                    "SELECT COUNT(DISTINCT {}) FROM {}",
                    message_identifiers::IDENTIFIER,
                    message_identifiers::TABLE
                ),
                [],
                |row| row.get(0),
            )?;
            let total_messages: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM {}", messages::TABLE),
                [],
                |row| row.get(0),
            )?;
            let authorized: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM {}", authorized_chats::TABLE),
                [],
                |row| row.get(0),
            )?;
            Ok(Stats {
                distinct_identifiers: u64::try_from(distinct_identifiers).unwrap_or_default(),
                total_messages: u64::try_from(total_messages).unwrap_or_default(),
                authorized_chats: u64::try_from(authorized).unwrap_or_default(),
            })
        })
    }

    // ---- Search log / rate limit

    /// Append one row to the search log.
    pub fn log_search(&self, user_id: i64, query_type: &str, query_value: &str) -> Result<()> {
        traced("log_search", || {
            let conn = self.get_connection()?;
            conn.execute(
                &format!(
                    "INSERT INTO {} ({}, {}, {}) VALUES (?, ?, ?)",
                    searches::TABLE,
                    searches::USER_ID,
                    searches::QUERY_TYPE,
                    searches::QUERY_VALUE,
                ),
                params![user_id, query_type, query_value],
            )?;
            Ok(())
        })
    }

    /// A user's most recent logged searches, newest first.
    pub fn get_user_searches(&self, user_id: i64, limit: u64) -> Result<Vec<SearchLogEntry>> {
        traced("get_user_searches", || {
            let conn = self.get_connection()?;
            let mut stmt = conn.prepare(&format!(
                "SELECT * FROM {} WHERE {} = ? ORDER BY {} DESC, {} DESC LIMIT ?",
                searches::TABLE,
                searches::USER_ID,
                searches::CREATED_AT,
                searches::ID,
            ))?;
            let entry_iter = stmt.query_map(params![user_id, limit], Self::map_db_search_log)?;

            let mut results = Vec::new();
            for entry in entry_iter {
                results.push(entry?);
            }
            Ok(results)
        })
    }

    /// Per-user minimum-interval gate.
    ///
    /// The first call for a user always succeeds and records `now`. Later
    /// calls succeed only once `min_interval` seconds have passed; a rejected
    /// call leaves the stored timestamp unchanged so bursts cannot push the
    /// window forward.
    pub fn rate_limit_allowed(&self, user_id: i64, now: i64, min_interval: i64) -> Result<bool> {
        traced("rate_limit_allowed", || {
            let conn = self.get_connection()?;
            let last: Option<i64> = conn
                .query_row(
                    &format!(
                        "SELECT {} FROM {} WHERE {} = ?",
                        ratelimits::LAST_ACTION_TS,
                        ratelimits::TABLE,
                        ratelimits::USER_ID
                    ),
                    params![user_id],
                    |row| row.get(0),
                )
                .optional()?;

            match last {
                None => {
                    conn.execute(
                        &format!(
                            "INSERT OR REPLACE INTO {} ({}, {}) VALUES (?, ?)",
                            ratelimits::TABLE,
                            ratelimits::USER_ID,
                            ratelimits::LAST_ACTION_TS
                        ),
                        params![user_id, now],
                    )?;
                    Ok(true)
                }
                Some(last) if now - last < min_interval => Ok(false),
                Some(_) => {
                    conn.execute(
                        &format!(
                            "UPDATE {} SET {} = ? WHERE {} = ?",
                            ratelimits::TABLE,
                            ratelimits::LAST_ACTION_TS,
                            ratelimits::USER_ID
                        ),
                        params![now, user_id],
                    )?;
                    Ok(true)
                }
            }
        })
    }

    // ---- Row mappers

    /// Search/export join with ordering; `suffix` appends LIMIT/OFFSET.
    fn search_sql(suffix: &str) -> String {
        format!(
            "SELECT m.* FROM {msgs} m
             JOIN {links} mm ON mm.{link_ref} = m.{id}
             WHERE mm.{ident} = ?
             ORDER BY m.{date} DESC, m.{id} DESC{suffix}",
            msgs = messages::TABLE,
            links = message_identifiers::TABLE,
            link_ref = message_identifiers::MESSAGE_ID_REF,
            id = messages::ID,
            ident = message_identifiers::IDENTIFIER,
            date = messages::DATE,
            suffix = suffix,
        )
    }

    /// Map a database row to a StoredMessage
    fn map_db_message(row: &Row) -> rusqlite::Result<StoredMessage> {
        let media: String = row.get(messages::MEDIA_TYPE)?;
        Ok(StoredMessage {
            id: row.get(messages::ID)?,
            chat_id: row.get(messages::CHAT_ID)?,
            message_id: row.get(messages::MESSAGE_ID)?,
            sender_id: row.get(messages::SENDER_ID)?,
            sender_username: row.get(messages::SENDER_USERNAME)?,
            sender_first_name: row.get(messages::SENDER_FIRST_NAME)?,
            date: row.get(messages::DATE)?,
            text: row.get(messages::TEXT)?,
            media_type: MediaKind::from_str_or_text(&media),
            file_id: row.get(messages::FILE_ID)?,
            is_forward: row.get(messages::IS_FORWARD)?,
        })
    }

    /// Map a database row to an AuthorizedChat
    fn map_db_authorized_chat(row: &Row) -> rusqlite::Result<AuthorizedChat> {
        Ok(AuthorizedChat {
            chat_id: row.get(authorized_chats::CHAT_ID)?,
            title: row.get(authorized_chats::TITLE)?,
            female_id: row.get(authorized_chats::FEMALE_ID)?,
            added_by: row.get(authorized_chats::ADDED_BY)?,
            added_at: row.get(authorized_chats::ADDED_AT)?,
        })
    }

    /// Map a database row to a User
    fn map_db_user(row: &Row) -> rusqlite::Result<User> {
        Ok(User {
            user_id: row.get(users::USER_ID)?,
            first_name: row.get(users::FIRST_NAME)?,
            last_name: row.get(users::LAST_NAME)?,
            username: row.get(users::USERNAME)?,
            lang: row.get(users::LANG)?,
            updated_at: row.get(users::UPDATED_AT)?,
        })
    }

    /// Map a database row to a SearchLogEntry
    fn map_db_search_log(row: &Row) -> rusqlite::Result<SearchLogEntry> {
        Ok(SearchLogEntry {
            id: row.get(searches::ID)?,
            user_id: row.get(searches::USER_ID)?,
            query_type: row.get(searches::QUERY_TYPE)?,
            query_value: row.get(searches::QUERY_VALUE)?,
            created_at: row.get(searches::CREATED_AT)?,
        })
    }
}
