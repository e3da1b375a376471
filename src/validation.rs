//! Input validation and sanitization.
//!
//! Front-end collaborators run these checks before handing values to the
//! core; each failure carries a specific corrective message and the caller
//! may retry immediately.

use crate::auth::{SECRET_ALPHABET, SECRET_LEN};
use crate::error::{IdHistoryError, Result};
use crate::extractor::IDENTIFIER_LEN;

/// Language codes a stored user preference may take.
pub const SUPPORTED_LANGS: &[&str] = &["ru", "uk"];

fn invalid(message: impl Into<String>) -> IdHistoryError {
    IdHistoryError::Validation(message.into())
}

/// Validation utilities for input sanitization and edge case handling
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate a search/export identifier: exactly ten ASCII digits.
    pub fn validate_identifier(identifier: &str) -> Result<()> {
        if identifier.len() != IDENTIFIER_LEN
            || !identifier.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid(format!(
                "Identifier must be exactly {IDENTIFIER_LEN} digits"
            )));
        }
        Ok(())
    }

    /// Validate an authorization token's shape before comparing it.
    pub fn validate_secret_token(token: &str) -> Result<()> {
        if token.len() != SECRET_LEN {
            return Err(invalid(format!(
                "Authorization token must be {SECRET_LEN} characters"
            )));
        }
        if !token.bytes().all(|b| SECRET_ALPHABET.contains(&b)) {
            return Err(invalid(
                "Authorization token contains characters outside the issue alphabet",
            ));
        }
        Ok(())
    }

    /// Validate a chat title before identifier derivation.
    pub fn validate_chat_title(title: &str) -> Result<()> {
        if title.trim().is_empty() {
            return Err(invalid("Chat title cannot be empty"));
        }
        if title.len() > 255 {
            return Err(invalid("Chat title too long (max 255 characters)"));
        }
        if title.contains('\0') {
            return Err(invalid("Chat title contains invalid characters"));
        }
        Ok(())
    }

    /// Validate a stored language preference code.
    pub fn validate_lang(lang: &str) -> Result<()> {
        if !SUPPORTED_LANGS.contains(&lang) {
            return Err(invalid(format!(
                "Unsupported language: {lang}. Must be one of: {SUPPORTED_LANGS:?}"
            )));
        }
        Ok(())
    }

    /// Validate database URL
    pub fn validate_database_url(url: &str) -> Result<()> {
        if url.trim().is_empty() {
            return Err(invalid("Database URL cannot be empty"));
        }
        if url.contains('\0') {
            return Err(invalid("Database URL contains invalid characters"));
        }
        if url.len() > 1000 {
            return Err(invalid("Database URL too long"));
        }
        Ok(())
    }

    /// Sanitize text input
    #[must_use]
    pub fn sanitize_text(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t' || *c == '\r')
            .collect::<String>()
            .trim()
            .to_string()
    }
}
