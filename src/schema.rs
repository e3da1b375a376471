//! Database schema definitions
//!
//! This module provides constants for table and column names used with rusqlite.
//! The DDL itself lives in `migrations/` and is applied by [`crate::db::Database`].

/// Admins table schema
pub mod admins {
    /// Table name
    pub const TABLE: &str = "admins";
    /// User id column (primary key)
    pub const USER_ID: &str = "user_id";
}

/// Users table schema
pub mod users {
    /// Table name
    pub const TABLE: &str = "users";
    /// User id column (primary key)
    pub const USER_ID: &str = "user_id";
    /// First name column
    pub const FIRST_NAME: &str = "first_name";
    /// Last name column
    pub const LAST_NAME: &str = "last_name";
    /// Username column
    pub const USERNAME: &str = "username";
    /// Language preference column
    pub const LANG: &str = "lang";
    /// Last update timestamp column
    pub const UPDATED_AT: &str = "updated_at";
}

/// Authorized chats table schema
pub mod authorized_chats {
    /// Table name
    pub const TABLE: &str = "authorized_chats";
    /// Chat id column (primary key)
    pub const CHAT_ID: &str = "chat_id";
    /// Chat title column
    pub const TITLE: &str = "title";
    /// Identifier derived from the chat title at authorization time
    pub const FEMALE_ID: &str = "female_id";
    /// User who authorized the chat
    pub const ADDED_BY: &str = "added_by";
    /// Authorization timestamp column
    pub const ADDED_AT: &str = "added_at";
}

/// Settings key/value table schema
pub mod settings {
    /// Table name
    pub const TABLE: &str = "settings";
    /// Key column (primary key)
    pub const KEY: &str = "key";
    /// Value column
    pub const VALUE: &str = "value";
}

/// Messages table schema
pub mod messages {
    /// Table name
    pub const TABLE: &str = "messages";
    /// Surrogate primary key column
    pub const ID: &str = "id";
    /// Chat id column
    pub const CHAT_ID: &str = "chat_id";
    /// Platform message id column
    pub const MESSAGE_ID: &str = "message_id";
    /// Sender user id column
    pub const SENDER_ID: &str = "sender_id";
    /// Sender username column
    pub const SENDER_USERNAME: &str = "sender_username";
    /// Sender first name column
    pub const SENDER_FIRST_NAME: &str = "sender_first_name";
    /// Message timestamp column (unix seconds)
    pub const DATE: &str = "date";
    /// Message text content column
    pub const TEXT: &str = "text";
    /// Media classification column
    pub const MEDIA_TYPE: &str = "media_type";
    /// Platform media reference column
    pub const FILE_ID: &str = "file_id";
    /// Forwarded-message flag column
    pub const IS_FORWARD: &str = "is_forward";
}

/// Message identifier links table schema
pub mod message_identifiers {
    /// Table name
    pub const TABLE: &str = "message_identifiers";
    /// Foreign key to messages surrogate id
    pub const MESSAGE_ID_REF: &str = "message_id_ref";
    /// Linked 10-digit identifier column
    pub const IDENTIFIER: &str = "identifier";
}

/// Search log table schema
pub mod searches {
    /// Table name
    pub const TABLE: &str = "searches";
    /// Primary key column
    pub const ID: &str = "id";
    /// Searching user id column
    pub const USER_ID: &str = "user_id";
    /// Query type column
    pub const QUERY_TYPE: &str = "query_type";
    /// Query value column
    pub const QUERY_VALUE: &str = "query_value";
    /// Log timestamp column
    pub const CREATED_AT: &str = "created_at";
}

/// Rate limit state table schema
pub mod ratelimits {
    /// Table name
    pub const TABLE: &str = "ratelimits";
    /// User id column (primary key)
    pub const USER_ID: &str = "user_id";
    /// Last allowed action timestamp column (unix seconds)
    pub const LAST_ACTION_TS: &str = "last_action_ts";
}
