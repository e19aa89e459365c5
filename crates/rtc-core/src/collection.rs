//! Collection normalizer for RDF collection-valued properties.
//!
//! On the wire a collection property has three shapes:
//!
//! | members | wire shape                      |
//! |---------|---------------------------------|
//! | 0       | property absent                 |
//! | 1       | a bare mapping                  |
//! | 2+      | a list of mappings              |
//!
//! [`normalize`] and [`denormalize`] are the only functions that look at those
//! shapes. Everything above them works on a plain `Vec` of member mappings,
//! and everything below them (the XML codec) never sees a logical collection.

use crate::xml::{Map, Value};

/// Attribute holding a member's reference URL.
pub const RESOURCE_ATTR: &str = "@rdf:resource";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectionError {
    #[error("collection property holds text instead of member references: {0:?}")]
    TextValue(String),

    #[error("collection list entry {index} is not a member mapping")]
    NonMapMember { index: usize },
}

/// Read a raw collection property into an ordered member sequence.
///
/// `None` (property absent) and an empty element both mean no members.
///
/// # Errors
///
/// Returns an error if the property is plain text or a list entry is not
/// a member mapping.
pub fn normalize(raw: Option<&Value>) -> Result<Vec<Map>, CollectionError> {
    match raw {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Map(member)) => Ok(vec![member.clone()]),
        Some(Value::List(items)) => items
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Map(member) => Ok(member.clone()),
                _ => Err(CollectionError::NonMapMember { index }),
            })
            .collect(),
        Some(Value::Text(text) | Value::Literal(text)) => {
            Err(CollectionError::TextValue(text.clone()))
        }
    }
}

/// Turn a member sequence back into its wire shape.
///
/// Returns `None` for an empty sequence: the property must be removed, not
/// written as an empty list. A single member comes back as a bare mapping.
#[must_use]
pub fn denormalize(mut members: Vec<Map>) -> Option<Value> {
    match members.len() {
        0 => None,
        1 => members.pop().map(Value::Map),
        _ => Some(Value::List(members.into_iter().map(Value::Map).collect())),
    }
}

/// Write `members` into `parent[key]`, deleting the key when empty.
///
/// Replacing an existing key keeps its position in the mapping.
pub fn store(parent: &mut Map, key: &str, members: Vec<Map>) {
    match denormalize(members) {
        Some(value) => {
            if let Some(slot) = parent.get_mut(key) {
                *slot = value;
            } else {
                parent.insert(key.to_string(), value);
            }
        }
        None => {
            parent.shift_remove(key);
        }
    }
}

/// Build the wire mapping for a member referencing `url`.
#[must_use]
pub fn member_ref(url: &str) -> Map {
    let mut member = Map::new();
    member.insert(RESOURCE_ATTR.to_string(), Value::Text(url.to_string()));
    member
}

/// The reference URL of a member mapping, if it has one.
#[must_use]
pub fn member_url(member: &Map) -> Option<&str> {
    member.get(RESOURCE_ATTR).and_then(Value::as_text)
}

/// Index of the member whose reference equals `url` exactly.
///
/// Comparison is byte-for-byte: no case folding, no trailing-slash or
/// percent-encoding normalization.
#[must_use]
pub fn position_of(members: &[Map], url: &str) -> Option<usize> {
    members
        .iter()
        .position(|member| member_url(member) == Some(url))
}
