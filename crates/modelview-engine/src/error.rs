//! Error types for the presentation pipeline

use thiserror::Error;

use crate::resource::ResourceLocator;
use crate::session::SessionToken;

/// Message surfaced when the server gives no usable reason.
pub const GENERIC_ERROR: &str = "Unknown error occurred";

/// Result type for user-triggered actions
pub type ActionResult<T> = Result<T, ActionError>;

/// Transfer or parse failure of a model resource.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("failed to fetch {locator}: {reason}")]
    Fetch { locator: String, reason: String },

    #[error("failed to parse model: {0}")]
    Parse(String),

    #[error("no asset mapping for {0}")]
    Unresolved(String),
}

/// Request never reached the server or its reply was never received.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Failure of a user-triggered action (upload, customize, catalog refresh).
///
/// `Display` is the user-facing message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    /// Malformed user input, caught before any network call.
    #[error("{0}")]
    Validation(String),

    /// Non-success reply, or a reply carrying an `error` field.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// Success status but the body is not what the endpoint promises.
    #[error("{}", GENERIC_ERROR)]
    MalformedResponse { status: u16, detail: String },

    #[error("Request failed: {0}")]
    Transport(#[from] TransportError),
}

impl ActionError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ActionError::Validation(_))
    }
}

/// Terminal failure of one load session.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadFailure {
    pub token: SessionToken,
    pub resource: ResourceLocator,
    pub error: LoadError,
    /// A newer session had already started when this one failed.
    pub superseded: bool,
}

/// Anything reported to the user through a `StatusSink`.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    Load(LoadFailure),
    Action(ActionError),
}

impl Failure {
    pub fn message(&self) -> String {
        match self {
            Failure::Load(f) => f.error.to_string(),
            Failure::Action(e) => e.to_string(),
        }
    }
}

/// Errors reading viewer configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
