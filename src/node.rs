//! The generic XML element tree that sits between quick-xml and the typed
//! TMX model.
//!
//! A [`Node`] is the only shape the typed model ever parses from or
//! serializes into: tag name, ordered attribute list, own text, tail text
//! (the text that follows the element's closing tag inside its parent), and
//! ordered children. All byte-level XML concerns (escaping, encodings,
//! well-formedness) stay on this side of the boundary.

use std::io::{BufRead, Write};

use quick_xml::{
    Reader, Writer,
    events::{BytesEnd, BytesStart, BytesText, Event},
};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One element of a generic XML tree.
///
/// `text` is the text between the start tag and the first child; each
/// child's `tail` is the text between that child's end tag and the next
/// sibling (or the parent's end tag). Attribute order is preserved as
/// encountered, and re-emitted in the same order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Node {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub tail: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Node {
    /// Creates an empty element with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Node {
            tag: tag.into(),
            ..Node::default()
        }
    }

    /// Returns the value of the first attribute with the given name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Sets an attribute, replacing an existing one of the same name while
    /// keeping its position, or appending otherwise.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Appends text at the current end of the element's content: onto the
    /// last child's tail if children exist, onto the element's own text
    /// otherwise. Adjacent fragments are concatenated, never split into
    /// separate logical positions.
    pub fn append_text(&mut self, text: &str) {
        let slot = match self.children.last_mut() {
            Some(child) => &mut child.tail,
            None => &mut self.text,
        };
        match slot {
            Some(existing) => existing.push_str(text),
            None => *slot = Some(text.to_string()),
        }
    }

    /// Reads one XML document from a reader and returns its root element.
    ///
    /// Text is kept exactly as written (no trimming): segment whitespace is
    /// significant in TMX. Comments, processing instructions, and the XML
    /// declaration are dropped; text outside the root element is ignored.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut xml_reader = Reader::from_reader(reader);

        let mut buf = Vec::new();
        let mut stack: Vec<Node> = Vec::new();
        let mut root: Option<Node> = None;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    stack.push(node_from_start(e)?);
                }
                Ok(Event::Empty(ref e)) => {
                    let node = node_from_start(e)?;
                    attach(&mut stack, &mut root, node)?;
                }
                Ok(Event::End(_)) => {
                    let node = stack.pop().ok_or_else(|| {
                        Error::MalformedDocument("end tag without matching start tag".to_string())
                    })?;
                    attach(&mut stack, &mut root, node)?;
                }
                Ok(Event::Text(ref e)) => {
                    if let Some(open) = stack.last_mut() {
                        let text = e.unescape().map_err(Error::XmlParse)?;
                        open.append_text(&text);
                    }
                }
                Ok(Event::CData(ref e)) => {
                    if let Some(open) = stack.last_mut() {
                        open.append_text(&String::from_utf8_lossy(e.as_ref()));
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(Error::XmlParse(e)),
            }
            buf.clear();
        }

        root.ok_or_else(|| Error::MalformedDocument("document has no root element".to_string()))
    }

    /// Parses a string slice holding one XML document.
    pub fn from_xml(xml: &str) -> Result<Self, Error> {
        Self::from_reader(std::io::Cursor::new(xml))
    }

    /// Writes this element (and its subtree) to a writer, without an XML
    /// declaration. The element's own tail is not written; tails belong to
    /// the enclosing parent.
    pub fn to_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        let mut xml_writer = Writer::new(&mut writer);
        self.write_into(&mut xml_writer)
    }

    /// Renders this element (and its subtree) as an XML string.
    pub fn to_xml_string(&self) -> Result<String, Error> {
        let mut buf = Vec::new();
        self.to_writer(&mut buf)?;
        String::from_utf8(buf).map_err(|e| Error::MalformedDocument(e.to_string()))
    }

    pub(crate) fn write_into<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        let mut start = BytesStart::new(self.tag.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.text.is_none() && self.children.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        if let Some(text) = &self.text {
            writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        for child in &self.children {
            child.write_into(writer)?;
            if let Some(tail) = &child.tail {
                writer.write_event(Event::Text(BytesText::new(tail)))?;
            }
        }
        writer.write_event(Event::End(BytesEnd::new(self.tag.as_str())))?;
        Ok(())
    }
}

/// Checks that a generic node carries the tag an entity expects before the
/// entity reads anything else off it.
pub(crate) fn expect_tag(expected: &'static str, node: &Node) -> Result<(), Error> {
    if node.tag == expected {
        Ok(())
    } else {
        Err(Error::TagMismatch {
            expected,
            found: node.tag.clone(),
        })
    }
}

fn node_from_start(e: &BytesStart) -> Result<Node, Error> {
    let mut node = Node::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    for attr in e.attributes().with_checks(false) {
        let attr = attr.map_err(|e| Error::MalformedDocument(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        node.attributes.push((key, value));
    }
    Ok(node)
}

fn attach(stack: &mut Vec<Node>, root: &mut Option<Node>, node: Node) -> Result<(), Error> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(node);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(node);
            Ok(())
        }
        None => Err(Error::MalformedDocument(
            "document has more than one root element".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_element() {
        let node = Node::from_xml(r#"<prop type="domain">finance</prop>"#).unwrap();
        assert_eq!(node.tag, "prop");
        assert_eq!(node.attribute("type"), Some("domain"));
        assert_eq!(node.text.as_deref(), Some("finance"));
        assert!(node.children.is_empty());
    }

    #[test]
    fn test_parse_preserves_attribute_order() {
        let node = Node::from_xml(r#"<header creationtool="X" segtype="sentence" srclang="en"/>"#)
            .unwrap();
        let keys: Vec<&str> = node.attributes.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["creationtool", "segtype", "srclang"]);
    }

    #[test]
    fn test_parse_text_and_tail_interleaving() {
        let node = Node::from_xml(r#"<seg>Hello <bpt i="1">[b]</bpt>world<ept i="1">[/b]</ept></seg>"#)
            .unwrap();
        assert_eq!(node.text.as_deref(), Some("Hello "));
        assert_eq!(node.children.len(), 2);
        assert_eq!(node.children[0].tag, "bpt");
        assert_eq!(node.children[0].text.as_deref(), Some("[b]"));
        assert_eq!(node.children[0].tail.as_deref(), Some("world"));
        assert_eq!(node.children[1].tag, "ept");
        assert_eq!(node.children[1].tail, None);
    }

    #[test]
    fn test_parse_whitespace_kept_verbatim() {
        let node = Node::from_xml("<seg>  two  spaces  </seg>").unwrap();
        assert_eq!(node.text.as_deref(), Some("  two  spaces  "));
    }

    #[test]
    fn test_parse_unescapes_entities() {
        let node = Node::from_xml("<seg>a &lt; b &amp; c</seg>").unwrap();
        assert_eq!(node.text.as_deref(), Some("a < b & c"));
    }

    #[test]
    fn test_serialize_escapes_entities() {
        let mut node = Node::new("seg");
        node.text = Some("a < b & c".to_string());
        let xml = node.to_xml_string().unwrap();
        assert_eq!(xml, "<seg>a &lt; b &amp; c</seg>");
    }

    #[test]
    fn test_serialize_empty_element() {
        let mut node = Node::new("map");
        node.set_attribute("unicode", "#xF8FF");
        assert_eq!(node.to_xml_string().unwrap(), r##"<map unicode="#xF8FF"/>"##);
    }

    #[test]
    fn test_append_text_concatenates() {
        let mut node = Node::new("seg");
        node.append_text("Hello ");
        node.append_text("world");
        assert_eq!(node.text.as_deref(), Some("Hello world"));

        node.children.push(Node::new("ph"));
        node.append_text("tail one ");
        node.append_text("tail two");
        assert_eq!(node.children[0].tail.as_deref(), Some("tail one tail two"));
    }

    #[test]
    fn test_set_attribute_replaces_in_place() {
        let mut node = Node::new("tuv");
        node.set_attribute("xml:lang", "en");
        node.set_attribute("datatype", "plaintext");
        node.set_attribute("xml:lang", "fr");
        assert_eq!(node.attribute("xml:lang"), Some("fr"));
        assert_eq!(node.attributes[0].0, "xml:lang");
    }

    #[test]
    fn test_round_trip_is_byte_identical() {
        let xml = r#"<seg>Hello <bpt i="1">[b]</bpt>world<ept i="1">[/b]</ept></seg>"#;
        let node = Node::from_xml(xml).unwrap();
        assert_eq!(node.to_xml_string().unwrap(), xml);
    }

    #[test]
    fn test_declaration_and_comments_are_dropped() {
        let xml = "<?xml version=\"1.0\"?><!-- note --><tmx version=\"1.4\"/>";
        let node = Node::from_xml(xml).unwrap();
        assert_eq!(node.tag, "tmx");
        assert_eq!(node.attribute("version"), Some("1.4"));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let result = Node::from_xml("   ");
        assert!(matches!(result, Err(Error::MalformedDocument(_))));
    }

    #[test]
    fn test_multiple_roots_are_an_error() {
        let result = Node::from_xml("<tu/><tu/>");
        assert!(matches!(result, Err(Error::MalformedDocument(_))));
    }
}
