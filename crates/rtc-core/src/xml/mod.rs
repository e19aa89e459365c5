//! Structural RDF/XML codec.
//!
//! Documents are held as nested, insertion-ordered mappings using the
//! conventions the OSLC wire format is usually consumed with:
//!
//! - attributes are keys prefixed with `@` (`@rdf:resource`);
//! - character data next to attributes or children lives under `#text`;
//! - an element with only text is a [`Value::Text`];
//! - an element with neither attributes, children nor text is [`Value::Null`];
//! - a repeated child element becomes a [`Value::List`] under one key;
//! - the content of an `rdf:parseType="Literal"` element is kept verbatim as
//!   a [`Value::Literal`] under `#text`, inline markup included.
//!
//! Text content is kept as written. Only whitespace-only runs between
//! elements are dropped.
//!
//! The last rule is why collections are ambiguous on the wire: one child is a
//! bare mapping, two children are a list. See [`crate::collection`] for the
//! code that hides that from mutation logic.

mod parse;
mod write;

use indexmap::IndexMap;
use std::borrow::Cow;

pub use parse::parse;
pub use write::serialize;

/// Ordered element/attribute mapping. Key order is preserved on output.
pub type Map = IndexMap<String, Value>;

pub const TEXT_KEY: &str = "#text";

/// Attribute marking an element whose content is an XML literal.
pub const LITERAL_ATTR: &str = "@rdf:parseType";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Text(String),
    /// Escaped inner XML of a literal element, exactly as it appeared.
    Literal(String),
    Map(Map),
    List(Vec<Value>),
}

impl Value {
    #[must_use]
    pub const fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut Map> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Character data of a text element, or the `#text` of a mapping.
    ///
    /// A literal is returned as raw markup; use [`Value::plain_text`] to read
    /// it the way a person wrote it.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) | Self::Literal(text) => Some(text),
            Self::Map(map) => map.get(TEXT_KEY).and_then(Self::as_text),
            Self::Null | Self::List(_) => None,
        }
    }

    /// Like [`Value::as_text`], but entity references in a literal are
    /// decoded. Inline elements stay in the result as written.
    #[must_use]
    pub fn plain_text(&self) -> Option<String> {
        match self {
            Self::Literal(raw) => Some(
                quick_xml::escape::unescape(raw).map_or_else(|_| raw.clone(), Cow::into_owned),
            ),
            Self::Map(map) => map.get(TEXT_KEY).and_then(Self::plain_text),
            other => other.as_text().map(str::to_string),
        }
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Self::Map(map)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Follow `path` through nested mappings.
#[must_use]
pub fn get_path<'a>(map: &'a Map, path: &[&str]) -> Option<&'a Value> {
    let (last, parents) = path.split_last()?;
    let mut current = map;
    for key in parents {
        current = current.get(*key)?.as_map()?;
    }
    current.get(*last)
}

/// Mutable variant of [`get_path`] that stops at a mapping.
pub fn get_map_mut<'a>(map: &'a mut Map, path: &[&str]) -> Option<&'a mut Map> {
    let mut current = map;
    for key in path {
        current = current.get_mut(*key)?.as_map_mut()?;
    }
    Some(current)
}

/// Value of attribute `name` (without the `@`) on `map`.
#[must_use]
pub fn attr<'a>(map: &'a Map, name: &str) -> Option<&'a str> {
    map.get(&format!("@{name}")).and_then(Value::as_text)
}

/// Build a mapping from `(key, value)` pairs, keeping their order.
#[must_use]
pub fn map_of<K, V, I>(entries: I) -> Map
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Failure to read or write a document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum XmlError {
    #[error("document is not valid UTF-8: {0}")]
    Encoding(String),

    #[error("XML syntax error at byte {position}: {reason}")]
    Syntax { position: u64, reason: String },

    #[error("unclosed element <{0}>")]
    Unclosed(String),

    #[error("attribute {0} must hold a text value")]
    AttributeShape(String),

    #[error("element <{0}> holds a nested list, which has no XML form")]
    NestedList(String),

    #[error("failed to write XML: {0}")]
    Write(String),
}
