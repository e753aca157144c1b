use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::borrow::Cow;
use thiserror::Error;

/// Key under which an element's text is stored when it also has
/// attributes or child elements.
pub const CONTENT_KEY: &str = "_content";

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("malformed XML: {0}")]
    Malformed(#[from] quick_xml::Error),

    #[error("malformed XML attribute: {0}")]
    Attribute(#[from] AttrError),

    #[error("document has no root element")]
    NoRoot,

    #[error("text outside of the root element")]
    NotXml,
}

/// A decoded XML value.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlValue {
    Text(String),
    Element(XmlHash),
    List(Vec<XmlValue>),
}

impl XmlValue {
    /// Text of a value: the string itself, or the `_content` of an element.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            XmlValue::Text(text) => Some(text),
            XmlValue::Element(hash) => hash.get(CONTENT_KEY).and_then(XmlValue::as_text),
            XmlValue::List(_) => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            XmlValue::Text(text) => text.trim().is_empty(),
            XmlValue::Element(hash) => hash.is_empty(),
            XmlValue::List(items) => items.is_empty(),
        }
    }

    /// Flattens nested lists into a single list of non-list values.
    pub fn flatten(self) -> Vec<XmlValue> {
        match self {
            XmlValue::List(items) => items.into_iter().flat_map(XmlValue::flatten).collect(),
            other => vec![other],
        }
    }
}

/// Ordered key-value view of an XML element.
///
/// Attributes and child elements both become keys, in document order.
/// A key seen twice turns into an [`XmlValue::List`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlHash {
    entries: Vec<(String, XmlValue)>,
}

impl XmlHash {
    /// Parses `xml` and returns the hash of its root element. The root's
    /// own name is dropped.
    pub fn parse(xml: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Frame> = Vec::new();
        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(Frame::open(&start)?),
                Event::Empty(start) => {
                    let frame = Frame::open(&start)?;
                    match stack.last_mut() {
                        Some(parent) => parent.hash.insert(frame.name.clone(), frame.finish()),
                        None => return Ok(frame.hash),
                    }
                }
                Event::Text(text) => {
                    let text = text.unescape()?;
                    match stack.last_mut() {
                        Some(frame) => frame.text.push_str(&text),
                        None if text.trim().is_empty() => {}
                        None => return Err(XmlError::NotXml),
                    }
                }
                Event::CData(data) => match stack.last_mut() {
                    Some(frame) => frame.text.push_str(&String::from_utf8_lossy(&data)),
                    None => return Err(XmlError::NotXml),
                },
                Event::End(_) => {
                    let Some(frame) = stack.pop() else {
                        return Err(XmlError::NoRoot);
                    };
                    match stack.last_mut() {
                        Some(parent) => parent.hash.insert(frame.name.clone(), frame.finish()),
                        None => return Ok(frame.into_root()),
                    }
                }
                Event::Eof => return Err(XmlError::NoRoot),
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&XmlValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    /// Shorthand for the text of `key`, if present and textual.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(XmlValue::as_text)
    }

    pub fn remove(&mut self, key: &str) -> Option<XmlValue> {
        let index = self.entries.iter().position(|(name, _)| name == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: XmlValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(name, _)| *name == key) {
            Some((_, XmlValue::List(items))) => items.push(value),
            Some((_, existing)) => {
                let first = std::mem::replace(existing, XmlValue::List(Vec::new()));
                *existing = XmlValue::List(vec![first, value]);
            }
            None => self.entries.push((key, value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &XmlValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

struct Frame {
    name: String,
    hash: XmlHash,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self, XmlError> {
        let mut hash = XmlHash::default();
        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value: Cow<'_, str> = attribute.unescape_value()?;
            hash.insert(key, XmlValue::Text(value.into_owned()));
        }

        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            hash,
            text: String::new(),
        })
    }

    fn finish(self) -> XmlValue {
        if self.hash.is_empty() {
            return XmlValue::Text(self.text);
        }
        XmlValue::Element(self.into_root())
    }

    fn into_root(mut self) -> XmlHash {
        if !self.text.is_empty() {
            self.hash.insert(CONTENT_KEY, XmlValue::Text(self.text));
        }
        self.hash
    }
}
