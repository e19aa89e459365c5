use std::fmt;

use serde::Serialize;

use super::{ref_field, text_field};
use crate::error::{Result, RtcError};
use crate::xml::{Map, Value};

/// Position of a comment in a work item's comment sequence (zero-based).
///
/// Negative values are representable: the server decides whether they
/// exist, and a missing comment surfaces as not-found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CommentId(i64);

impl CommentId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn invalid_comment_id() -> RtcError {
    RtcError::BadValue("Please input valid comment id".to_string())
}

/// Anything a caller may pass as a comment id.
///
/// Integers and integer-valued strings are accepted; non-numeric strings
/// and booleans are rejected with [`RtcError::BadValue`].
pub trait IntoCommentId {
    /// # Errors
    ///
    /// Returns [`RtcError::BadValue`] if the value is not an integer id.
    fn into_comment_id(self) -> Result<CommentId>;
}

impl IntoCommentId for CommentId {
    fn into_comment_id(self) -> Result<CommentId> {
        Ok(self)
    }
}

impl IntoCommentId for i64 {
    fn into_comment_id(self) -> Result<CommentId> {
        Ok(CommentId(self))
    }
}

impl IntoCommentId for i32 {
    fn into_comment_id(self) -> Result<CommentId> {
        Ok(CommentId(i64::from(self)))
    }
}

impl IntoCommentId for u32 {
    fn into_comment_id(self) -> Result<CommentId> {
        Ok(CommentId(i64::from(self)))
    }
}

impl IntoCommentId for usize {
    fn into_comment_id(self) -> Result<CommentId> {
        i64::try_from(self)
            .map(CommentId)
            .map_err(|_| invalid_comment_id())
    }
}

impl IntoCommentId for bool {
    fn into_comment_id(self) -> Result<CommentId> {
        Err(invalid_comment_id())
    }
}

impl IntoCommentId for &str {
    fn into_comment_id(self) -> Result<CommentId> {
        self.trim()
            .parse::<i64>()
            .map(CommentId)
            .map_err(|_| invalid_comment_id())
    }
}

impl IntoCommentId for String {
    fn into_comment_id(self) -> Result<CommentId> {
        self.as_str().into_comment_id()
    }
}

impl IntoCommentId for &String {
    fn into_comment_id(self) -> Result<CommentId> {
        self.as_str().into_comment_id()
    }
}

/// A comment on a work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip)]
    pub raw: Map,
}

impl Comment {
    /// Bind a comment description mapping to its URL.
    #[must_use]
    pub fn from_raw(id: CommentId, url: impl Into<String>, raw: Map) -> Self {
        Self {
            id,
            url: url.into(),
            description: raw.get("dcterms:description").and_then(Value::plain_text),
            creator: ref_field(&raw, "dcterms:creator").map(str::to_string),
            created: text_field(&raw, "dcterms:created"),
            raw,
        }
    }

    /// Build a comment from a collection page entry, taking the id from the
    /// last path segment of its URL.
    #[must_use]
    pub fn from_entry(raw: Map) -> Option<Self> {
        let url = super::resource_url(&raw)?.to_string();
        let id = url
            .rsplit('/')
            .next()
            .and_then(|segment| segment.parse::<i64>().ok())?;
        Some(Self::from_raw(CommentId(id), url, raw))
    }
}
