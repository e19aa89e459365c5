use std::fmt;

use crate::collection::CollectionError;
use crate::transport::TransportError;
use crate::xml::XmlError;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    BadValue,
    NotFound,
    ConfigParseError,
    PreconditionFailed,
    TransportFailed,
    MalformedResponse,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::BadValue => "E1001",
            Self::NotFound => "E1002",
            Self::ConfigParseError => "E1003",
            Self::PreconditionFailed => "E2001",
            Self::TransportFailed => "E2002",
            Self::MalformedResponse => "E3001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::BadValue => "Invalid input value",
            Self::NotFound => "Resource not found",
            Self::ConfigParseError => "Config file parse error",
            Self::PreconditionFailed => "Resource changed since it was read",
            Self::TransportFailed => "Request to the server failed",
            Self::MalformedResponse => "Unexpected response document",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::BadValue => Some("Check the arguments (emails need an '@', ids must be integers)."),
            Self::NotFound => None,
            Self::ConfigParseError => Some("Fix syntax in rtc/config.toml and retry."),
            Self::PreconditionFailed => {
                Some("Another client updated the work item; rerun the command.")
            }
            Self::TransportFailed => Some("Check the server URL, credentials and connectivity."),
            Self::MalformedResponse => {
                Some("The server returned a document this client does not understand.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Every failure the work-item layer can surface to its caller.
#[derive(Debug, thiserror::Error)]
pub enum RtcError {
    /// Caller input rejected before any request was made.
    #[error("bad value: {0}")]
    BadValue(String),

    /// A named lookup exhausted its search without a match.
    #[error("not found: {0}")]
    NotFound(String),

    /// Non-2xx response or I/O failure from the transport, unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Xml(#[from] XmlError),

    #[error(transparent)]
    Collection(#[from] CollectionError),

    /// The server answered, but not with the document shape we expected.
    #[error("malformed response from {url}: {reason}")]
    Malformed { url: String, reason: String },
}

impl RtcError {
    pub(crate) fn malformed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::BadValue(_) => ErrorCode::BadValue,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Transport(err) => err.code(),
            Self::Xml(_) | Self::Collection(_) | Self::Malformed { .. } => {
                ErrorCode::MalformedResponse
            }
        }
    }

    /// Optional remediation hint for operators and agents.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

pub type Result<T, E = RtcError> = std::result::Result<T, E>;
