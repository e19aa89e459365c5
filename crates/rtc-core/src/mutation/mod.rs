//! Conditional read-modify-write against a single work item.
//!
//! Every mutation follows the same cycle:
//!
//! 1. FETCH the representation and capture its ETag ([`fetch`]).
//! 2. Reshape and mutate a private copy of the document.
//! 3. If anything changed, write it back with `If-Match: <etag>`
//!    ([`conditional_headers`]).
//!
//! There is no retry and no merge. A write that loses the race with another
//! client fails with a 412 from the transport, which surfaces to the caller
//! unchanged; calling again starts from a fresh FETCH.

pub mod comment;
pub mod subscribers;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::model::Member;
use crate::transport::{
    HEADER_ACCEPT, HEADER_CONTENT_TYPE, HEADER_IF_MATCH, HEADER_OSLC_CORE_VERSION, Headers,
    OSLC_CORE_VERSION, OSLC_CR_RDF, Request, Transport,
};
use crate::xml::{self, Map};

/// A fetched representation and the precondition token that came with it.
///
/// Owned by a single mutation call and dropped when it returns.
#[derive(Debug)]
pub(crate) struct Snapshot {
    pub document: Map,
    pub etag: Option<String>,
}

/// Result of a subscriber mutation.
///
/// No-ops are successes: a member that was already in the requested state
/// lands in `unchanged`, and when nothing changed `written` is `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MutationOutcome {
    pub changed: Vec<Member>,
    pub unchanged: Vec<Member>,
    pub written: bool,
}

impl MutationOutcome {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.changed.is_empty()
    }
}

/// Copy `base` and add the RDF/XML content negotiation headers.
pub(crate) fn rdf_headers(base: &Headers) -> Headers {
    let mut headers = base.clone();
    headers.set(HEADER_CONTENT_TYPE, OSLC_CR_RDF);
    headers.set(HEADER_ACCEPT, OSLC_CR_RDF);
    headers.set(HEADER_OSLC_CORE_VERSION, OSLC_CORE_VERSION);
    headers
}

/// Attach the captured ETag, verbatim, as the write precondition.
pub(crate) fn conditional_headers(headers: &Headers, etag: Option<&str>, url: &str) -> Headers {
    let mut headers = headers.clone();
    match etag {
        Some(etag) => headers.set(HEADER_IF_MATCH, etag),
        None => warn!(url, "no ETag on fetched representation; writing unconditionally"),
    }
    headers
}

pub(crate) fn fetch<T: Transport + ?Sized>(
    transport: &T,
    url: &str,
    headers: &Headers,
) -> Result<Snapshot> {
    debug!(url, "fetching representation");
    let response = transport.send(Request::get(url, headers.clone()))?;
    let etag = response.etag().map(str::to_string);
    let document = xml::parse(&response.body)?;
    debug!(url, etag = etag.as_deref().unwrap_or("-"), "fetched representation");
    Ok(Snapshot { document, etag })
}
