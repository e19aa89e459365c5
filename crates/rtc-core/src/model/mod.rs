pub mod comment;
pub mod member;
pub mod workflow;

pub use comment::{Comment, CommentId, IntoCommentId};
pub use member::{Member, validate_email};
pub use workflow::{Action, State};

use crate::xml::{Map, Value, attr};

/// The URL a resource mapping describes (`rdf:about`) or points at
/// (`rdf:resource`).
pub(crate) fn resource_url(raw: &Map) -> Option<&str> {
    attr(raw, "rdf:about").or_else(|| attr(raw, "rdf:resource"))
}

/// Text of the child element `key`, if present and textual.
pub(crate) fn text_field(raw: &Map, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_text).map(str::to_string)
}

/// The `rdf:resource` reference held by child element `key`.
pub(crate) fn ref_field<'a>(raw: &'a Map, key: &str) -> Option<&'a str> {
    raw.get(key)
        .and_then(Value::as_map)
        .and_then(|child| attr(child, "rdf:resource"))
}
