//! JSON envelope → XML document.

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::convert::{is_name_char, is_name_start_char, ATTRIBUTES_KEY, TEXT_KEY};
use crate::envelope::Header;

/// Encoding failure. The message is what callers get to see; the cause is
/// kept for logs.
#[derive(Debug, Error)]
#[error("Failed to convert JSON to XML (or) Missing Middle Ware Header")]
pub struct ConversionError {
    #[source]
    cause: ConversionFault,
}

impl ConversionError {
    pub fn cause(&self) -> &ConversionFault {
        &self.cause
    }
}

impl From<ConversionFault> for ConversionError {
    fn from(cause: ConversionFault) -> Self {
        Self { cause }
    }
}

/// Why an envelope could not be encoded.
#[derive(Debug, Error)]
pub enum ConversionFault {
    #[error("envelope has {0} top-level field(s), expected a header and a payload")]
    MissingFields(usize),

    #[error("'{0}' is not a valid XML name")]
    InvalidName(String),

    #[error("attributes of <{0}> must be an object of scalars")]
    InvalidAttributes(String),

    #[error("XML write failed: {0}")]
    Write(#[from] std::io::Error),
}

/// Serialized payload, named after its root tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    root_tag: String,
    text: String,
}

impl XmlDocument {
    pub fn root_tag(&self) -> &str {
        &self.root_tag
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl std::fmt::Display for XmlDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Result of encoding one request envelope.
#[derive(Debug, Clone)]
pub struct EncodedRequest {
    /// Header split off the envelope, to be reattached to the response.
    pub header: Header,
    pub document: XmlDocument,
}

/// Encode a request envelope.
///
/// The first field is the header; the second field's name becomes the root
/// tag and its value the document body. Fields after the second are ignored.
pub fn encode(envelope: &Map<String, Value>) -> Result<EncodedRequest, ConversionError> {
    encode_envelope(envelope).map_err(|cause| {
        tracing::error!(error = %cause, "JSON to XML conversion failed");
        ConversionError::from(cause)
    })
}

fn encode_envelope(envelope: &Map<String, Value>) -> Result<EncodedRequest, ConversionFault> {
    let mut fields = envelope.iter();
    let (header_key, header_value) = fields.next().ok_or(ConversionFault::MissingFields(0))?;
    let (root_tag, payload) = fields.next().ok_or(ConversionFault::MissingFields(1))?;

    tracing::debug!(root_tag = %root_tag, "Root tag");

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
    write_element(&mut writer, root_tag, payload)?;

    let raw = String::from_utf8(writer.into_inner())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let text = expand_empty_elements(&raw);

    tracing::debug!(xml = %text, "Converted JSON to XML");

    Ok(EncodedRequest {
        header: Header::new(header_key.clone(), header_value.clone()),
        document: XmlDocument {
            root_tag: root_tag.clone(),
            text,
        },
    })
}

fn write_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &Value,
) -> Result<(), ConversionFault> {
    check_name(name)?;
    match value {
        // Sequences repeat the element; nested sequences flatten.
        Value::Array(items) => {
            for item in items {
                write_element(writer, name, item)?;
            }
        }
        Value::Object(fields) => write_object(writer, name, fields)?,
        scalar => write_leaf(writer, BytesStart::new(name), &scalar_text(scalar))?,
    }
    Ok(())
}

fn write_object<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    fields: &Map<String, Value>,
) -> Result<(), ConversionFault> {
    let mut start = BytesStart::new(name);
    let mut text = String::new();
    let mut children = Vec::with_capacity(fields.len());

    for (key, value) in fields {
        match key.as_str() {
            ATTRIBUTES_KEY => {
                let attributes = value
                    .as_object()
                    .ok_or_else(|| ConversionFault::InvalidAttributes(name.to_string()))?;
                for (attr, attr_value) in attributes {
                    check_name(attr)?;
                    if attr_value.is_object() || attr_value.is_array() {
                        return Err(ConversionFault::InvalidAttributes(name.to_string()));
                    }
                    start.push_attribute((attr.as_str(), scalar_text(attr_value).as_str()));
                }
            }
            TEXT_KEY => text = scalar_text(value),
            _ => children.push((key, value)),
        }
    }

    if children.is_empty() {
        return write_leaf(writer, start, &text);
    }

    writer.write_event(Event::Start(start))?;
    if !text.is_empty() {
        writer.write_event(Event::Text(BytesText::new(&text)))?;
    }
    for (key, value) in children {
        write_element(writer, key, value)?;
    }
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn write_leaf<W: Write>(
    writer: &mut Writer<W>,
    start: BytesStart<'_>,
    text: &str,
) -> Result<(), ConversionFault> {
    if text.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    let end = start.to_end().into_owned();
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(end))?;
    Ok(())
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn check_name(name: &str) -> Result<(), ConversionFault> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(is_name_start_char) && chars.all(is_name_char);
    if valid {
        Ok(())
    } else {
        Err(ConversionFault::InvalidName(name.to_string()))
    }
}

/// Rewrite every self-closing element `<a .../>` as `<a ...></a>`.
///
/// Declarations, processing instructions and comments are left alone.
pub fn expand_empty_elements(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len() + 32);
    let mut rest = xml;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let tag = &rest[open..];
        let Some(close) = tag.find('>') else {
            out.push_str(tag);
            return out;
        };

        let element = &tag[..=close];
        let inner = &element[1..];
        let name_len = inner.find(|c: char| !is_name_char(c)).unwrap_or(inner.len());
        let starts_with_name = inner.chars().next().is_some_and(is_name_start_char);

        if starts_with_name && name_len > 0 && element.ends_with("/>") {
            out.push_str(&element[..element.len() - 2]);
            out.push_str("></");
            out.push_str(&inner[..name_len]);
            out.push('>');
        } else {
            out.push_str(element);
        }
        rest = &tag[close + 1..];
    }

    out.push_str(rest);
    out
}
