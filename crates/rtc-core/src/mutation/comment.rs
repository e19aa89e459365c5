//! Append a comment to a work item.
//!
//! Comments are numbered by the server. The id of the new comment is the
//! collection's `totalCount` as observed by the FETCH that precedes the
//! POST; the POST carries that FETCH's ETag, so a comment added by someone
//! else in between makes the POST fail instead of reusing an id.

use tracing::{debug, info};

use super::{Snapshot, conditional_headers, fetch, rdf_headers};
use crate::error::{Result, RtcError};
use crate::model::{Comment, CommentId};
use crate::rdf::{
    COMMENT_TYPE, DESCRIPTION, NS_DCTERMS, NS_OSLC, NS_OSLC_CM, NS_OSLC_CMX, NS_RDF, NS_RTC_CM,
    NS_RTC_EXT, RDF_ROOT, take_description,
};
use crate::service::{Service, total_count};
use crate::transport::Request;
use crate::xml::{self, Map, Value, map_of};

/// URL of a work item's comment collection.
#[must_use]
pub fn comments_url(workitem_url: &str) -> String {
    format!("{workitem_url}/rtc_cm:comments")
}

/// The `rdf:Description` body of a new comment.
fn comment_description(comment_url: &str, message: &str) -> Map {
    map_of([
        ("@rdf:about", Value::from(comment_url)),
        (
            "rdf:type",
            Value::Map(map_of([("@rdf:resource", COMMENT_TYPE)])),
        ),
        (
            "dcterms:description",
            Value::Map(map_of([
                ("@rdf:parseType", "Literal"),
                (xml::TEXT_KEY, message),
            ])),
        ),
    ])
}

/// Minimal RDF document creating the comment at `comment_url`.
///
/// The message is carried as character data, so the XML writer escapes any
/// markup in it and the document structure cannot be altered by its content.
#[must_use]
pub fn comment_payload(comment_url: &str, message: &str) -> Map {
    let root = map_of([
        ("@xmlns:rdf", Value::from(NS_RDF)),
        ("@xmlns:rtc_ext", Value::from(NS_RTC_EXT)),
        ("@xmlns:rtc_cm", Value::from(NS_RTC_CM)),
        ("@xmlns:oslc_cm", Value::from(NS_OSLC_CM)),
        ("@xmlns:dcterms", Value::from(NS_DCTERMS)),
        ("@xmlns:oslc_cmx", Value::from(NS_OSLC_CMX)),
        ("@xmlns:oslc", Value::from(NS_OSLC)),
        (
            DESCRIPTION,
            Value::Map(comment_description(comment_url, message)),
        ),
    ]);
    map_of([(RDF_ROOT, Value::Map(root))])
}

/// Append `message` to the work item's comments.
///
/// # Errors
///
/// Returns an error if the collection cannot be fetched or has no usable
/// `totalCount`, or the POST is rejected. A concurrent change between the
/// FETCH and the POST surfaces as a precondition failure.
pub fn add_comment<S: Service + ?Sized>(
    service: &S,
    workitem_url: &str,
    message: &str,
) -> Result<Comment> {
    let collection_url = comments_url(workitem_url);
    let base = service.default_headers();
    let Snapshot { document, etag } = fetch(service, &collection_url, &base)?;

    let total = total_count(&document, &collection_url)?;
    let id = i64::try_from(total)
        .map(CommentId::new)
        .map_err(|_| RtcError::malformed(&collection_url, format!("totalCount {total} overflows")))?;
    let comment_url = format!("{collection_url}/{id}");
    debug!(workitem = workitem_url, %id, "derived comment position");

    let body = xml::serialize(&comment_payload(&comment_url, message))?;
    let headers = conditional_headers(&rdf_headers(&base), etag.as_deref(), &collection_url);
    let response = service.send(Request::post(
        format!("{collection_url}/oslc:comment"),
        headers,
        body,
    ))?;
    info!(workitem = workitem_url, %id, "successfully added comment");

    let raw = if response.body.iter().all(u8::is_ascii_whitespace) {
        debug!(url = %comment_url, "empty create response; using submitted description");
        comment_description(&comment_url, message)
    } else {
        take_description(xml::parse(&response.body)?)
            .ok_or_else(|| RtcError::malformed(&comment_url, "missing rdf:Description"))?
    };
    Ok(Comment::from_raw(id, comment_url, raw))
}
