//! Error types for the MEDCHAT core library.

use thiserror::Error;

/// Top-level error type for all non-LLM MEDCHAT operations.
#[derive(Error, Debug)]
pub enum MedchatError {
    /// The request body or one of its fields is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// No token was supplied on an authenticated route.
    #[error("No token provided")]
    TokenMissing,

    /// The token signature was valid but its expiry has passed.
    #[error("Token expired")]
    TokenExpired,

    /// The token could not be decoded or its signature did not verify.
    #[error("Invalid token")]
    TokenInvalid,

    /// Email/password pair did not match a stored account.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    /// No account row for the given ID.
    #[error("Account not found: {0}")]
    AccountNotFound(crate::UserId),

    /// Password hashing failed.
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MedchatError {
    /// Build a [`MedchatError::Validation`] from any message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether this error belongs to the authentication family (HTTP 401).
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::TokenMissing | Self::TokenExpired | Self::TokenInvalid | Self::InvalidCredentials
        )
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, MedchatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_errors_use_wire_messages() {
        assert_eq!(MedchatError::TokenMissing.to_string(), "No token provided");
        assert_eq!(MedchatError::TokenExpired.to_string(), "Token expired");
        assert_eq!(MedchatError::TokenInvalid.to_string(), "Invalid token");
    }

    #[test]
    fn auth_family() {
        assert!(MedchatError::TokenExpired.is_auth());
        assert!(MedchatError::InvalidCredentials.is_auth());
        assert!(!MedchatError::validation("x").is_auth());
    }
}
