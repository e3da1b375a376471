//! Keyed per-user session state with explicit expiry.
//!
//! Holds transient pending actions ("this operator owes us an export
//! identifier") between two front-end interactions. Entries are scoped to one
//! user, expire after a configured TTL, and are consumed with take-semantics,
//! so no state leaks across requests or users.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::PendingAction;

#[derive(Serialize, Deserialize)]
struct SessionEntry {
    user_id: i64,
    action: PendingAction,
    created_at: DateTime<Utc>,
}

/// Durable per-user pending-action store.
pub struct SessionStore {
    db: sled::Db,
    ttl_secs: i64,
}

impl SessionStore {
    /// Open (or create) the session store at `dir` with the given TTL.
    pub fn open(dir: impl Into<PathBuf>, ttl_secs: i64) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let db = sled::open(&dir)?;
        Ok(Self { db, ttl_secs })
    }

    fn make_key(user_id: i64) -> Vec<u8> {
        format!("session:{user_id}").into_bytes()
    }

    /// Begin a pending action for a user, replacing any existing one.
    pub fn begin(&self, user_id: i64, action: PendingAction) -> Result<()> {
        let entry = SessionEntry {
            user_id,
            action,
            created_at: Utc::now(),
        };
        let data = bincode::serialize(&entry)?;
        self.db.insert(Self::make_key(user_id), data)?;
        self.db.flush()?;
        Ok(())
    }

    /// The user's pending action, if present and not expired.
    ///
    /// An expired entry is removed and reported as absent.
    pub fn peek(&self, user_id: i64) -> Result<Option<PendingAction>> {
        let key = Self::make_key(user_id);
        let Some(data) = self.db.get(&key)? else {
            return Ok(None);
        };
        let entry: SessionEntry = bincode::deserialize(&data)?;
        let age = Utc::now()
            .signed_duration_since(entry.created_at)
            .num_seconds();
        if age >= self.ttl_secs {
            self.db.remove(&key)?;
            self.db.flush()?;
            return Ok(None);
        }
        Ok(Some(entry.action))
    }

    /// Return and clear the user's pending action in one step.
    pub fn take(&self, user_id: i64) -> Result<Option<PendingAction>> {
        let action = self.peek(user_id)?;
        if action.is_some() {
            self.clear(user_id)?;
        }
        Ok(action)
    }

    /// Drop the user's pending action, if any.
    pub fn clear(&self, user_id: i64) -> Result<()> {
        self.db.remove(Self::make_key(user_id))?;
        self.db.flush()?;
        Ok(())
    }
}
