//! Error types shared across the crate.
//!
//! Two kinds of failures exist in this subsystem: [`ValidationError`], which
//! carries a user-facing message and is surfaced directly to the caller, and
//! [`StoreError`], which wraps infrastructure failures from the record store.
//! Best-effort side effects (mailing list, invite archival) never surface as
//! errors at all; they are logged where they happen.

use thiserror::Error;

/// Umbrella error for fallible core operations.
#[derive(Debug, Error)]
pub enum ArkiveError {
    /// A policy or input failure with a displayable message.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A record-store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ArkiveError>;

/// Record-store infrastructure failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis command failed: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// User-facing validation failures.
///
/// Every variant renders to a message suitable for display; callers surface
/// these directly rather than translating them.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("User {0} already exists! Please choose a different username")]
    DuplicateUser(String),

    #[error("The name {0} is not a valid username. Please choose a different username")]
    InvalidName(String),

    #[error(
        "There is already an account for {0}. If you have trouble logging in, you may reset the password"
    )]
    DuplicateEmail(String),

    #[error("Passwords do not match!")]
    PasswordMismatch,

    #[error(
        "Passwords must match and be at least 8 characters long with lowercase, uppercase, and either digits or symbols"
    )]
    WeakPassword,

    #[error("{0} is not a valid email address")]
    InvalidEmail(String),

    #[error("Sorry, that is not a valid invite code. Please try again or request another invite")]
    InvalidInvite,

    #[error("Incorrect current password")]
    IncorrectPassword,

    /// A credential-store rejection re-wrapped with its displayable message.
    #[error("{0}")]
    Auth(String),
}
