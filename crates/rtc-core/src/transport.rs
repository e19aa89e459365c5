//! Request/response primitive the work-item layer talks through.
//!
//! The core never opens sockets. Everything it needs from the network goes
//! through a [`Transport`]: one blocking request in, one response out, with
//! any non-2xx status surfaced as [`TransportError::Status`]. The CLI crate
//! supplies a `ureq` implementation; tests supply in-memory fakes.

use std::fmt;

use indexmap::IndexMap;

use crate::error::ErrorCode;

/// Media type used for every RDF/XML read and write.
pub const OSLC_CR_RDF: &str = "application/rdf+xml";

/// Value of the `OSLC-Core-Version` header attached to writes.
pub const OSLC_CORE_VERSION: &str = "2.0";

pub const HEADER_ACCEPT: &str = "Accept";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_OSLC_CORE_VERSION: &str = "OSLC-Core-Version";
pub const HEADER_IF_MATCH: &str = "If-Match";
pub const HEADER_ETAG: &str = "ETag";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
}

impl Method {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Header map with case-insensitive lookup and insertion order preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: IndexMap<String, String>,
}

impl Headers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`, replacing any existing entry regardless of case.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if let Some(existing) = self.key_of(&name) {
            self.entries.shift_remove(&existing);
        }
        self.entries.insert(name, value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn key_of(&self, name: &str) -> Option<String> {
        self.entries
            .keys()
            .find(|key| key.eq_ignore_ascii_case(name))
            .cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.set(name, value);
        }
        headers
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
}

impl Request {
    #[must_use]
    pub fn get(url: impl Into<String>, headers: Headers) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers,
            body: None,
        }
    }

    #[must_use]
    pub fn put(url: impl Into<String>, headers: Headers, body: Vec<u8>) -> Self {
        Self {
            method: Method::Put,
            url: url.into(),
            headers,
            body: Some(body),
        }
    }

    #[must_use]
    pub fn post(url: impl Into<String>, headers: Headers, body: Vec<u8>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers,
            body: Some(body),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl Response {
    /// The entity tag of this representation, if the server sent one.
    #[must_use]
    pub fn etag(&self) -> Option<&str> {
        self.headers.get(HEADER_ETAG)
    }
}

/// Failure reported by a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The server answered with a non-2xx status.
    #[error("{status} response from {url}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// The request never produced a response (DNS, TLS, socket, timeout).
    #[error("request to {url} failed: {reason}")]
    Io { url: String, reason: String },
}

impl TransportError {
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Io { .. } => None,
        }
    }

    /// The conditional write lost a race: the ETag no longer matches.
    #[must_use]
    pub const fn is_precondition_failed(&self) -> bool {
        matches!(self.status(), Some(412))
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.status(), Some(404))
    }

    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        if self.is_precondition_failed() {
            ErrorCode::PreconditionFailed
        } else {
            ErrorCode::TransportFailed
        }
    }
}

/// Abstraction over the wire.
///
/// Implementations perform one blocking request and must map every non-2xx
/// status to [`TransportError::Status`]. Timeouts, TLS, and authentication
/// belong to the implementation.
pub trait Transport {
    /// # Errors
    ///
    /// Returns [`TransportError::Status`] for a non-2xx answer and
    /// [`TransportError::Io`] when no answer was received.
    fn send(&self, request: Request) -> Result<Response, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: Request) -> Result<Response, TransportError> {
        (**self).send(request)
    }
}
