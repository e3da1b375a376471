//! Error types for the id-history library.
//!
//! This module provides custom error types using `thiserror` for better error handling
//! and more specific error messages throughout the application.

use thiserror::Error;

/// Errors that can occur in the id-history application.
#[derive(Error, Debug)]
pub enum IdHistoryError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Connection pool errors
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Caller lacks the required role
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Requested entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or out-of-range input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Chat authorization handshake rejection
    #[error("Authorization failed: {0}")]
    Auth(#[from] AuthFailure),

    /// Search request rejected by the rate limiter
    #[error("Rate limited: retry after {0} seconds")]
    RateLimited(i64),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Binary serialization errors
    #[error("Binary serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Session store errors
    #[error("Session store error: {0}")]
    Session(String),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

/// Rejection kinds produced by the chat authorization handshake.
///
/// Each variant maps to one check in the claim sequence so callers can surface
/// a specific corrective message.
#[derive(Error, Debug)]
pub enum AuthFailure {
    /// Claimant is neither a bot admin nor the superadmin
    #[error("only admins can authorize chats")]
    AdminsOnly,

    /// No token was supplied with the claim
    #[error("an authorization token is required")]
    MissingToken,

    /// Supplied token does not match the stored secret (secret is kept)
    #[error("token is invalid or expired")]
    BadOrExpiredToken,

    /// Claimant is not an administrator or owner of the target chat
    #[error("chat administrator standing is required")]
    NotChatAdmin,

    /// Chat title carries no extractable 10-digit identifier
    #[error("no 10-digit identifier in the chat title")]
    NoIdentifierInTitle,

    /// Membership query to the messaging platform failed or timed out
    #[error("membership check failed: {0}")]
    Membership(String),

    /// Only the superadmin may revoke an authorization
    #[error("only the superadmin can revoke a chat authorization")]
    SuperadminOnly,
}

impl AuthFailure {
    /// Stable label for logs and metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AdminsOnly => "admins_only",
            Self::MissingToken => "missing_token",
            Self::BadOrExpiredToken => "bad_or_expired_token",
            Self::NotChatAdmin => "not_chat_admin",
            Self::NoIdentifierInTitle => "no_identifier_in_title",
            Self::Membership(_) => "membership",
            Self::SuperadminOnly => "superadmin_only",
        }
    }
}

/// Convenience type alias for Result with IdHistoryError
pub type Result<T> = std::result::Result<T, IdHistoryError>;

impl From<anyhow::Error> for IdHistoryError {
    fn from(err: anyhow::Error) -> Self {
        IdHistoryError::Other(err.to_string())
    }
}

impl From<sled::Error> for IdHistoryError {
    fn from(err: sled::Error) -> Self {
        IdHistoryError::Session(err.to_string())
    }
}
