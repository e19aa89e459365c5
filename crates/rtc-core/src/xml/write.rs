use std::fmt::Display;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::{Map, TEXT_KEY, Value, XmlError};

fn write_err(err: impl Display) -> XmlError {
    XmlError::Write(err.to_string())
}

/// Serialize a mapping produced by [`super::parse`] (or built by hand) back
/// to an XML document.
///
/// Text and attribute values are escaped, so arbitrary strings can be
/// embedded without changing the document structure. A [`Value::Literal`]
/// is already markup and is written verbatim. Mappings with only attributes
/// are written as self-closing elements.
///
/// # Errors
///
/// Returns an error if an attribute holds a mapping or list, a list is
/// nested directly in a list, or the writer fails.
pub fn serialize(document: &Map) -> Result<Vec<u8>, XmlError> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(write_err)?;
    for (name, value) in document {
        write_element(&mut writer, name, value)?;
    }
    Ok(writer.into_inner())
}

fn write_element(writer: &mut Writer<Vec<u8>>, name: &str, value: &Value) -> Result<(), XmlError> {
    match value {
        Value::Null => {
            writer
                .write_event(Event::Start(BytesStart::new(name)))
                .map_err(write_err)?;
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(write_err)?;
        }
        Value::Text(_) | Value::Literal(_) => {
            writer
                .write_event(Event::Start(BytesStart::new(name)))
                .map_err(write_err)?;
            write_text(writer, value)?;
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(write_err)?;
        }
        Value::List(items) => {
            for item in items {
                if matches!(item, Value::List(_)) {
                    return Err(XmlError::NestedList(name.to_string()));
                }
                write_element(writer, name, item)?;
            }
        }
        Value::Map(map) => write_mapping(writer, name, map)?,
    }
    Ok(())
}

fn write_mapping(writer: &mut Writer<Vec<u8>>, name: &str, map: &Map) -> Result<(), XmlError> {
    let mut start = BytesStart::new(name);
    let mut has_content = false;
    for (key, value) in map {
        if let Some(attribute) = key.strip_prefix('@') {
            let text = match value {
                Value::Text(text) => text.as_str(),
                Value::Null => "",
                Value::Literal(_) | Value::Map(_) | Value::List(_) => {
                    return Err(XmlError::AttributeShape(key.clone()));
                }
            };
            start.push_attribute((attribute, text));
        } else {
            has_content = true;
        }
    }

    if !has_content {
        return writer.write_event(Event::Empty(start)).map_err(write_err);
    }

    writer.write_event(Event::Start(start)).map_err(write_err)?;
    if let Some(text) = map.get(TEXT_KEY) {
        write_text(writer, text)?;
    }
    for (key, value) in map {
        if key.starts_with('@') || key == TEXT_KEY {
            continue;
        }
        write_element(writer, key, value)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(write_err)
}

fn write_text(writer: &mut Writer<Vec<u8>>, value: &Value) -> Result<(), XmlError> {
    let text = match value {
        Value::Literal(raw) => BytesText::from_escaped(raw.as_str()),
        other => match other.as_text() {
            Some(text) => BytesText::new(text),
            None => return Ok(()),
        },
    };
    writer.write_event(Event::Text(text)).map_err(write_err)
}
