//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid username format.
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] bazaar_core::UsernameError),

    /// Display name missing.
    #[error("name must not be blank")]
    BlankName,

    /// Invalid credentials (wrong password or member not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Member not found.
    #[error("member not found")]
    MemberNotFound,

    /// Username already registered.
    #[error("username already taken")]
    UsernameTaken,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Access token missing, malformed, expired or signed by someone else.
    #[error("invalid access token")]
    InvalidToken,

    /// Signing an access token failed.
    #[error("token signing failed: {0}")]
    TokenSigning(#[source] jsonwebtoken::errors::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
