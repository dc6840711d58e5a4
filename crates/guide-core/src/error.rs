#![forbid(unsafe_code)]

//! Errors surfaced at attach time and by registry mutation.
//!
//! Navigation never fails: out-of-range moves, unknown step names and absent
//! elements are documented no-ops rather than errors.

/// Guide error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuideError {
    /// An option has the wrong shape or value.
    InvalidOption {
        field: &'static str,
        reason: String,
    },
    /// The option payload is not valid JSON.
    InvalidJson(String),
    /// A step with this name is already registered.
    DuplicateStep(String),
    /// A step's content element could not be resolved.
    MissingContent(String),
    /// The controller has been disposed.
    Disposed,
}

impl GuideError {
    /// Shorthand for [`GuideError::InvalidOption`].
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            field,
            reason: reason.into(),
        }
    }
}

impl core::fmt::Display for GuideError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidOption { field, reason } => write!(f, "invalid option `{field}`: {reason}"),
            Self::InvalidJson(msg) => write!(f, "invalid options json: {msg}"),
            Self::DuplicateStep(name) => write!(f, "duplicate step name: {name}"),
            Self::MissingContent(name) => write!(f, "step `{name}` has no content element"),
            Self::Disposed => f.write_str("guide already disposed"),
        }
    }
}

impl std::error::Error for GuideError {}

impl From<serde_json::Error> for GuideError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidJson(err.to_string())
    }
}
