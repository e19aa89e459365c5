use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::{LITERAL_ATTR, Map, TEXT_KEY, Value, XmlError};

/// An element that has been opened but not yet closed.
struct Frame {
    name: String,
    map: Map,
    text: String,
}

impl Frame {
    fn document() -> Self {
        Self {
            name: String::new(),
            map: Map::new(),
            text: String::new(),
        }
    }

    fn open(start: &BytesStart<'_>) -> Result<Self, XmlError> {
        let name = utf8(start.name().as_ref())?.to_string();
        let mut map = Map::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|err| XmlError::Syntax {
                position: 0,
                reason: err.to_string(),
            })?;
            let key = utf8(attribute.key.as_ref())?;
            let value = attribute.unescape_value().map_err(|err| XmlError::Syntax {
                position: 0,
                reason: err.to_string(),
            })?;
            map.insert(format!("@{key}"), Value::Text(value.into_owned()));
        }
        Ok(Self {
            name,
            map,
            text: String::new(),
        })
    }

    fn is_literal(&self) -> bool {
        self.map.get(LITERAL_ATTR).and_then(Value::as_text) == Some("Literal")
    }

    fn finish(self) -> (String, Value) {
        let Self {
            name,
            mut map,
            text,
        } = self;
        let value = if map.is_empty() {
            if text.is_empty() {
                Value::Null
            } else {
                Value::Text(text)
            }
        } else {
            if !text.is_empty() {
                map.insert(TEXT_KEY.to_string(), Value::Text(text));
            }
            Value::Map(map)
        };
        (name, value)
    }
}

fn utf8(bytes: &[u8]) -> Result<&str, XmlError> {
    std::str::from_utf8(bytes).map_err(|err| XmlError::Encoding(err.to_string()))
}

/// Insert a closed child, turning a repeated name into a list.
fn attach(parent: &mut Map, name: String, value: Value) {
    match parent.get_mut(&name) {
        None => {
            parent.insert(name, value);
        }
        Some(Value::List(items)) => items.push(value),
        Some(existing) => {
            let first = std::mem::replace(existing, Value::Null);
            *existing = Value::List(vec![first, value]);
        }
    }
}

/// Parse an XML document into a nested mapping keyed by the root element.
///
/// Whitespace-only text between elements is dropped; any other text is kept
/// as written, surrounding whitespace included. Comments, processing
/// instructions and the XML declaration are ignored.
///
/// # Errors
///
/// Returns an error if the input is not UTF-8, is not well-formed, or
/// leaves an element unclosed.
pub fn parse(input: &[u8]) -> Result<Map, XmlError> {
    let source = utf8(input)?;
    let mut reader = Reader::from_str(source);

    let mut stack = vec![Frame::document()];
    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(err) => {
                return Err(XmlError::Syntax {
                    position: reader.buffer_position() as u64,
                    reason: err.to_string(),
                });
            }
        };

        match event {
            Event::Start(start) => {
                let mut frame = Frame::open(&start)?;
                if !frame.is_literal() {
                    stack.push(frame);
                    continue;
                }
                let raw = reader
                    .read_text(start.to_end().name())
                    .map_err(|err| XmlError::Syntax {
                        position: reader.buffer_position() as u64,
                        reason: err.to_string(),
                    })?;
                if !raw.is_empty() {
                    frame
                        .map
                        .insert(TEXT_KEY.to_string(), Value::Literal(raw.into_owned()));
                }
                let (name, value) = frame.finish();
                if let Some(parent) = stack.last_mut() {
                    attach(&mut parent.map, name, value);
                }
            }
            Event::Empty(start) => {
                let (name, value) = Frame::open(&start)?.finish();
                if let Some(parent) = stack.last_mut() {
                    attach(&mut parent.map, name, value);
                }
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|err| XmlError::Syntax {
                    position: reader.buffer_position() as u64,
                    reason: err.to_string(),
                })?;
                if text.trim().is_empty() {
                    continue;
                }
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                let data = data.into_inner();
                let text = utf8(&data)?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(text);
                }
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(XmlError::Syntax {
                        position: reader.buffer_position() as u64,
                        reason: "closing tag without an open element".to_string(),
                    });
                }
                if let Some(frame) = stack.pop() {
                    let (name, value) = frame.finish();
                    if let Some(parent) = stack.last_mut() {
                        attach(&mut parent.map, name, value);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match stack.pop() {
        Some(document) if stack.is_empty() => Ok(document.map),
        Some(open) => Err(XmlError::Unclosed(open.name)),
        None => Ok(Map::new()),
    }
}
