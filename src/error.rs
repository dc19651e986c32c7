//! Error types for the digital-declutter library.
//!
//! Every fallible operation returns [`Result`], whose error carries an explicit
//! [`ErrorKind`]. Authentication failures additionally carry a structured
//! [`AuthError`] so callers can branch on the failure code without parsing text.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur in the digital-declutter application.
#[derive(Error, Debug)]
pub enum DeclutterError {
    /// Classified authentication failure
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The gateway answered but refused the request
    #[error("Gateway rejected request ({status}): {message}")]
    Rejected {
        /// HTTP-like status code reported by the gateway
        status: u16,
        /// Message reported by the gateway
        message: String,
    },

    /// Transport-level failure talking to the gateway
    #[error("Gateway transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A record expected to exist was not found for the current owner
    #[error("Record not found: {0}")]
    NotFound(Uuid),

    /// An operation that needs a signed-in identity ran without one
    #[error("No authenticated identity")]
    NotAuthenticated,

    /// Input rejected before reaching the gateway
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Invalid or missing configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

/// Coarse classification of a [`DeclutterError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Sign-in, sign-up or sign-out failure
    Auth,
    /// Reading or writing records through the gateway failed
    DataAccess,
    /// The addressed record does not exist
    NotFound,
    /// No identity is signed in
    NotAuthenticated,
    /// Input did not pass validation
    Validation,
    /// Startup configuration is missing or malformed
    Config,
    /// Local file system failure
    Io,
}

impl DeclutterError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(_) => ErrorKind::Auth,
            Self::Rejected { .. } | Self::Transport(_) | Self::Serialization(_) | Self::Other(_) => {
                ErrorKind::DataAccess
            }
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::NotAuthenticated => ErrorKind::NotAuthenticated,
            Self::Validation(_) => ErrorKind::Validation,
            Self::InvalidConfig(_) => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

/// Structured authentication failure codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// Wrong email or password
    InvalidCredentials,
    /// The account exists but its email address was never confirmed
    EmailNotConfirmed,
    /// The gateway refused to create the account
    SignUpFailed,
    /// Anything that was not a classified gateway rejection
    Unexpected,
}

impl AuthErrorKind {
    /// Stable string code for this failure.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::EmailNotConfirmed => "email_not_confirmed",
            Self::SignUpFailed => "signup_failed",
            Self::Unexpected => "unexpected_error",
        }
    }
}

/// An authentication failure with its code and a human-readable message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} ({message})", .kind.code())]
pub struct AuthError {
    /// Failure code
    pub kind: AuthErrorKind,
    /// Message shown to the user
    pub message: String,
}

impl AuthError {
    /// Build an error from a kind and message.
    pub fn new(kind: AuthErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Stable string code, e.g. `email_not_confirmed`.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }
}

/// Convenience type alias for Result with DeclutterError
pub type Result<T> = std::result::Result<T, DeclutterError>;

impl From<anyhow::Error> for DeclutterError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<config::ConfigError> for DeclutterError {
    fn from(err: config::ConfigError) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}
