//! XML document → JSON payload.

use std::borrow::Cow;

use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::convert::{ATTRIBUTES_DECODED_KEY, TEXT_DECODED_KEY};

/// Decoding failure. Only the generic message leaves the gateway.
#[derive(Debug, Error)]
#[error("Failed to parse XML response")]
pub struct ParseError {
    #[source]
    cause: ParseFault,
}

impl ParseError {
    pub fn cause(&self) -> &ParseFault {
        &self.cause
    }
}

impl From<ParseFault> for ParseError {
    fn from(cause: ParseFault) -> Self {
        Self { cause }
    }
}

/// Why a response body could not be parsed.
#[derive(Debug, Error)]
pub enum ParseFault {
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),

    #[error("invalid attribute: {0}")]
    Attribute(String),

    #[error("invalid encoding: {0}")]
    Encoding(String),

    #[error("unknown entity reference '&{0};'")]
    Entity(String),

    #[error("document has no root element")]
    NoRoot,

    #[error("document has more than one root element")]
    MultipleRoots,

    #[error("text outside of the root element")]
    TextOutsideRoot,

    #[error("element <{0}> is never closed")]
    Unclosed(String),
}

/// Parse a response document into `{ <root tag>: <value> }`.
///
/// A lone child element is a plain value; repeated siblings become a list.
/// Every scalar comes back as a string.
pub fn decode(xml: &str) -> Result<Map<String, Value>, ParseError> {
    match parse_document(xml) {
        Ok(result) => {
            let json = Value::Object(result.clone());
            tracing::debug!(result = %json, "Parsed XML to JSON");
            Ok(result)
        }
        Err(cause) => {
            tracing::error!(error = %cause, "Failed to parse XML to JSON");
            Err(cause.into())
        }
    }
}

#[derive(Debug)]
struct Node {
    name: String,
    attributes: Map<String, Value>,
    text: String,
    children: Map<String, Value>,
}

impl Node {
    fn open(start: &BytesStart<'_>) -> Result<Self, ParseFault> {
        let name = utf8(start.name().as_ref())?.to_string();
        let mut attributes = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| ParseFault::Attribute(e.to_string()))?;
            let key = utf8(attr.key.as_ref())?.to_string();
            let raw = utf8(&attr.value)?;
            let value = unescape(raw).map_err(|e| ParseFault::Attribute(e.to_string()))?;
            attributes.insert(key, Value::String(value.into_owned()));
        }
        Ok(Self {
            name,
            attributes,
            text: String::new(),
            children: Map::new(),
        })
    }

    fn add_child(&mut self, name: String, value: Value) {
        match self.children.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.children.insert(name, value);
            }
        }
    }

    fn finish(self) -> (String, Value) {
        let has_text = !self.text.trim().is_empty();
        if self.attributes.is_empty() && self.children.is_empty() {
            let text = if has_text { self.text } else { String::new() };
            return (self.name, Value::String(text));
        }

        let mut object = Map::with_capacity(self.children.len() + 2);
        if !self.attributes.is_empty() {
            object.insert(ATTRIBUTES_DECODED_KEY.to_string(), Value::Object(self.attributes));
        }
        object.extend(self.children);
        if has_text {
            object.insert(TEXT_DECODED_KEY.to_string(), Value::String(self.text));
        }
        (self.name, Value::Object(object))
    }
}

#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Node>,
    root: Option<(String, Value)>,
}

impl TreeBuilder {
    fn open(&mut self, node: Node) -> Result<(), ParseFault> {
        if self.stack.is_empty() && self.root.is_some() {
            return Err(ParseFault::MultipleRoots);
        }
        self.stack.push(node);
        Ok(())
    }

    fn close(&mut self) -> Result<(), ParseFault> {
        let node = self.stack.pop().ok_or(ParseFault::NoRoot)?;
        let (name, value) = node.finish();
        match self.stack.last_mut() {
            Some(parent) => parent.add_child(name, value),
            None => self.root = Some((name, value)),
        }
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), ParseFault> {
        match self.stack.last_mut() {
            Some(node) => node.text.push_str(text),
            None if text.trim().is_empty() => {}
            None => return Err(ParseFault::TextOutsideRoot),
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Map<String, Value>, ParseFault> {
        if let Some(node) = self.stack.pop() {
            return Err(ParseFault::Unclosed(node.name));
        }
        let (name, value) = self.root.ok_or(ParseFault::NoRoot)?;
        let mut result = Map::with_capacity(1);
        result.insert(name, value);
        Ok(result)
    }
}

fn parse_document(xml: &str) -> Result<Map<String, Value>, ParseFault> {
    let mut reader = Reader::from_str(xml);
    let mut tree = TreeBuilder::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => tree.open(Node::open(&e)?)?,
            Event::Empty(e) => {
                tree.open(Node::open(&e)?)?;
                tree.close()?;
            }
            Event::End(_) => tree.close()?,
            Event::Text(e) => {
                let text = e.decode().map_err(|err| ParseFault::Encoding(err.to_string()))?;
                tree.text(&text)?;
            }
            Event::CData(e) => {
                let text = e.decode().map_err(|err| ParseFault::Encoding(err.to_string()))?;
                tree.text(&text)?;
            }
            Event::GeneralRef(e) => {
                let name = e.decode().map_err(|err| ParseFault::Encoding(err.to_string()))?;
                let resolved: Cow<'_, str> = match e.resolve_char_ref() {
                    Ok(Some(ch)) => Cow::Owned(ch.to_string()),
                    Ok(None) => resolve_predefined_entity(&name)
                        .map(Cow::Borrowed)
                        .ok_or_else(|| ParseFault::Entity(name.to_string()))?,
                    Err(err) => return Err(ParseFault::Entity(format!("{}: {}", name, err))),
                };
                tree.text(&resolved)?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype.
            _ => {}
        }
    }

    tree.finish()
}

fn utf8(bytes: &[u8]) -> Result<&str, ParseFault> {
    std::str::from_utf8(bytes).map_err(|e| ParseFault::Encoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decoded(xml: &str) -> Value {
        Value::Object(decode(xml).unwrap())
    }

    #[test]
    fn decodes_simple_response() {
        assert_eq!(
            decoded("<GetUser><name>Alice</name></GetUser>"),
            json!({"GetUser": {"name": "Alice"}})
        );
    }

    #[test]
    fn repeated_siblings_become_a_list() {
        assert_eq!(
            decoded(
                "<?xml version=\"1.0\"?>\n<Users>\n  <user>a</user>\n  <user>b</user>\n  \
                 <user>c</user>\n  <total>3</total>\n</Users>"
            ),
            json!({"Users": {"user": ["a", "b", "c"], "total": "3"}})
        );
    }

    #[test]
    fn lone_element_stays_scalar() {
        assert_eq!(
            decoded("<Users><user>a</user></Users>"),
            json!({"Users": {"user": "a"}})
        );
    }

    #[test]
    fn empty_elements_decode_to_empty_strings() {
        assert_eq!(
            decoded("<R><a></a><b/><c>   </c></R>"),
            json!({"R": {"a": "", "b": "", "c": ""}})
        );
        assert_eq!(decoded("<R/>"), json!({"R": ""}));
    }

    #[test]
    fn attributes_and_mixed_text() {
        assert_eq!(
            decoded("<R><amount currency=\"EUR\">10.50</amount><flag on=\"1\"/></R>"),
            json!({"R": {
                "amount": {"$": {"currency": "EUR"}, "_": "10.50"},
                "flag": {"$": {"on": "1"}}
            }})
        );
    }

    #[test]
    fn resolves_references_and_cdata() {
        assert_eq!(
            decoded("<R><t>a &amp; b &#65;&#x42;</t><c><![CDATA[<raw>]]></c><q a=\"x&lt;y\"/></R>"),
            json!({"R": {"t": "a & b AB", "c": "<raw>", "q": {"$": {"a": "x<y"}}}})
        );
    }

    #[test]
    fn ignores_comments_and_processing_instructions() {
        assert_eq!(
            decoded("<?xml version=\"1.0\"?><!-- note --><R><?pi x?><a>1</a></R>"),
            json!({"R": {"a": "1"}})
        );
    }

    #[test]
    fn keeps_soap_prefixes_in_names() {
        assert_eq!(
            decoded("<soap:Envelope><soap:Body><r>ok</r></soap:Body></soap:Envelope>"),
            json!({"soap:Envelope": {"soap:Body": {"r": "ok"}}})
        );
    }

    #[test]
    fn malformed_documents_fail() {
        for xml in [
            "<R><a></R>",
            "<R>",
            "",
            "plain text",
            "<R></R><S></S>",
            "<R>&bogus;</R>",
        ] {
            let err = decode(xml).unwrap_err();
            assert_eq!(err.to_string(), "Failed to parse XML response", "{xml}");
        }
    }

    #[test]
    fn missing_root_is_reported() {
        assert!(matches!(decode("<!-- only -->").unwrap_err().cause(), ParseFault::NoRoot));
        assert!(matches!(
            decode("<R></R><S/>").unwrap_err().cause(),
            ParseFault::MultipleRoots
        ));
    }
}
