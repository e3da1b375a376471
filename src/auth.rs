//! Chat authorization handshake.
//!
//! A chat becomes visible to ingestion only after an admin proves both
//! bot-admin and chat-admin standing using a short-lived shared secret: the
//! admin requests a secret privately, then presents it from inside the target
//! chat. The claim succeeds only when the token matches, the claimant holds
//! administrator or owner standing in that chat, and the chat title yields a
//! 10-digit binding identifier.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::{info, warn};

use crate::db::Database;
use crate::error::{AuthFailure, IdHistoryError, Result};
use crate::extractor;
use crate::metrics::MetricsCollector;
use crate::models::ChatStanding;

/// Length of an issued authorization secret.
pub const SECRET_LEN: usize = 8;

/// Secret alphabet: uppercase alphanumerics minus the visually ambiguous
/// `O`/`0` and `I`/`1`.
pub const SECRET_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Membership query against the messaging platform.
///
/// Implemented by the transport collaborator; the handshake treats the call as
/// a cancellable, timeout-bound request and rejects the authorization attempt
/// on failure rather than retrying.
#[async_trait]
pub trait ChatMembership: Send + Sync {
    /// The user's current standing in the given chat.
    async fn standing(&self, chat_id: i64, user_id: i64) -> Result<ChatStanding>;
}

/// Generate one authorization secret from the fixed alphabet.
#[must_use]
pub fn generate_secret() -> String {
    let mut rng = rand::thread_rng();
    (0..SECRET_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..SECRET_ALPHABET.len());
            char::from(SECRET_ALPHABET[idx])
        })
        .collect()
}

/// Runs the issuance/claim/revocation protocol against the store.
pub struct ChatAuthorizer {
    db: Arc<Database>,
    superadmin_id: i64,
    membership_timeout: Duration,
    metrics: MetricsCollector,
}

impl ChatAuthorizer {
    /// Create an authorizer bound to the store and the configured superadmin.
    #[must_use]
    pub fn new(db: Arc<Database>, superadmin_id: i64, membership_timeout: Duration) -> Self {
        Self {
            db,
            superadmin_id,
            membership_timeout,
            metrics: MetricsCollector::default(),
        }
    }

    /// Settings key holding the pending secret for a user.
    fn secret_key(user_id: i64) -> String {
        format!("auth_secret:{user_id}")
    }

    /// Superadmin identity or granted admin membership.
    fn is_privileged(&self, user_id: i64) -> Result<bool> {
        if user_id == self.superadmin_id {
            return Ok(true);
        }
        self.db.is_admin(user_id)
    }

    /// Issue a fresh secret for `user_id`, replacing any earlier one.
    ///
    /// The secret stays valid until consumed by a successful claim or
    /// overwritten by a later issuance; there is no time-based expiry.
    pub fn issue_secret(&self, user_id: i64) -> Result<String> {
        if !self.is_privileged(user_id)? {
            warn!(user_id, "secret requested without admin rights");
            self.metrics.record_auth("admins_only");
            return Err(AuthFailure::AdminsOnly.into());
        }
        let secret = generate_secret();
        self.db.set_setting(&Self::secret_key(user_id), &secret)?;
        info!(user_id, "issued chat authorization secret");
        self.metrics.record_auth("secret_issued");
        Ok(secret)
    }

    /// Verify a claim posted from inside the target chat.
    ///
    /// Checks run in a fixed order and the first failure wins: admin standing,
    /// token presence, token match, chat-admin standing (platform query,
    /// timeout-bound), identifier in the chat title. A token mismatch does
    /// not consume the stored secret, so the admin may retry with the right
    /// one. On success the chat record is written (replace wins), the secret
    /// is deleted, and the derived identifier is returned.
    pub async fn claim(
        &self,
        user_id: i64,
        chat_id: i64,
        chat_title: &str,
        token: Option<&str>,
        membership: &dyn ChatMembership,
    ) -> Result<String> {
        match self
            .claim_inner(user_id, chat_id, chat_title, token, membership)
            .await
        {
            Ok(female_id) => {
                self.metrics.record_auth("authorized");
                Ok(female_id)
            }
            Err(e) => {
                if let IdHistoryError::Auth(failure) = &e {
                    warn!(user_id, chat_id, failure = %failure, "authorization rejected");
                    self.metrics.record_auth(failure.kind());
                }
                Err(e)
            }
        }
    }

    async fn claim_inner(
        &self,
        user_id: i64,
        chat_id: i64,
        chat_title: &str,
        token: Option<&str>,
        membership: &dyn ChatMembership,
    ) -> Result<String> {
        if !self.is_privileged(user_id)? {
            return Err(AuthFailure::AdminsOnly.into());
        }

        let token = match token {
            Some(t) if !t.trim().is_empty() => t.trim(),
            _ => return Err(AuthFailure::MissingToken.into()),
        };

        let expected = self.db.get_setting(&Self::secret_key(user_id))?;
        if expected.as_deref() != Some(token) {
            // The secret survives a mismatch; only a successful claim consumes it.
            return Err(AuthFailure::BadOrExpiredToken.into());
        }

        let standing = self.query_standing(chat_id, user_id, membership).await?;
        if !standing.is_chat_admin() {
            return Err(AuthFailure::NotChatAdmin.into());
        }

        let Some(female_id) = extractor::first_identifier(chat_title) else {
            return Err(AuthFailure::NoIdentifierInTitle.into());
        };

        self.db
            .add_authorized_chat(chat_id, chat_title, &female_id, user_id)?;
        self.db.delete_setting(&Self::secret_key(user_id))?;
        info!(chat_id, user_id, %female_id, "chat authorized");
        Ok(female_id)
    }

    /// Timeout-bound platform query; any failure rejects the attempt.
    async fn query_standing(
        &self,
        chat_id: i64,
        user_id: i64,
        membership: &dyn ChatMembership,
    ) -> Result<ChatStanding> {
        match tokio::time::timeout(self.membership_timeout, membership.standing(chat_id, user_id))
            .await
        {
            Ok(Ok(standing)) => Ok(standing),
            Ok(Err(e)) => Err(AuthFailure::Membership(e.to_string()).into()),
            Err(_) => Err(AuthFailure::Membership("membership query timed out".into()).into()),
        }
    }

    /// Unconditionally delete a chat's authorization. Superadmin only.
    ///
    /// Returns true when a record was actually removed.
    pub fn revoke(&self, chat_id: i64, caller_id: i64) -> Result<bool> {
        if caller_id != self.superadmin_id {
            warn!(caller_id, chat_id, "revocation attempted without superadmin rights");
            self.metrics.record_auth("superadmin_only");
            return Err(AuthFailure::SuperadminOnly.into());
        }
        let removed = self.db.remove_authorized_chat(chat_id)?;
        info!(chat_id, removed, "chat authorization revoked");
        self.metrics.record_auth("revoked");
        Ok(removed)
    }
}
