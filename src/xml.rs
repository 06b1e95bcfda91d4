//! Owned XML element tree.
//!
//! Schema decoding needs to look at a node more than once (speculative
//! dispatch, exactly-one-child checks), so documents are first read into a
//! small tree with `quick-xml` and written back from it.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::BufRead;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, UrdfError};

/// An XML element with its attributes, child elements and text content.
///
/// Attribute order is preserved. Comments, processing instructions and
/// insignificant whitespace are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct XmlNode {
    /// Element tag.
    pub name: String,
    /// Attributes as `(key, value)` pairs in document order.
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order.
    pub children: Vec<XmlNode>,
    /// Concatenated text content, if any.
    pub text: Option<String>,
}

impl XmlNode {
    /// Create an empty element.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add an attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Add a child element.
    #[must_use]
    pub fn with_child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    /// Set the text content.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Get an attribute value by key.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value with the same key.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Iterate over child elements with the given tag.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Get the first child element with the given tag.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Text content, if any.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

/// Parse an XML document into its root element.
///
/// # Errors
///
/// Returns an error if the XML is malformed, has no root element, or has
/// more than one.
pub fn parse_document(xml: &str) -> Result<XmlNode> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        let node = match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let node = element_from_start(e)?;
                Some(parse_children(&mut reader, node)?)
            }
            Ok(Event::Empty(ref e)) => Some(element_from_start(e)?),
            Ok(Event::Eof) => break,
            Ok(_) => None,
            Err(e) => return Err(UrdfError::XmlParse(e.to_string())),
        };

        if let Some(node) = node {
            if let Some(first) = &root {
                return Err(UrdfError::XmlParse(format!(
                    "multiple root elements: <{}> and <{}>",
                    first.name, node.name
                )));
            }
            root = Some(node);
        }
        buf.clear();
    }

    root.ok_or_else(|| UrdfError::XmlParse("document has no root element".into()))
}

/// Read the content of an element whose start tag has already been consumed.
fn parse_children<R: BufRead>(reader: &mut Reader<R>, mut node: XmlNode) -> Result<XmlNode> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let child = element_from_start(e)?;
                node.children.push(parse_children(reader, child)?);
            }
            Ok(Event::Empty(ref e)) => {
                node.children.push(element_from_start(e)?);
            }
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| UrdfError::XmlParse(err.to_string()))?;
                append_text(&mut node, &text);
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                append_text(&mut node, &text);
            }
            // Nested ends are consumed by the recursive call, so this one is ours.
            Ok(Event::End(_)) => break,
            Ok(Event::Eof) => {
                return Err(UrdfError::XmlParse(format!(
                    "unexpected EOF in <{}>",
                    node.name
                )));
            }
            Ok(_) => {}
            Err(e) => return Err(UrdfError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    Ok(node)
}

fn append_text(node: &mut XmlNode, text: &str) {
    if text.is_empty() {
        return;
    }
    match &mut node.text {
        Some(existing) => existing.push_str(text),
        None => node.text = Some(text.to_string()),
    }
}

/// Build a childless node from a start tag.
fn element_from_start(e: &BytesStart) -> Result<XmlNode> {
    let mut node = XmlNode::new(String::from_utf8_lossy(e.name().as_ref()));
    for attr in e.attributes() {
        let attr = attr.map_err(|err| UrdfError::XmlParse(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| UrdfError::XmlParse(err.to_string()))?
            .into_owned();
        node.attributes.push((key, value));
    }
    Ok(node)
}

/// Write an element tree as an indented XML document with a declaration.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_document(root: &XmlNode) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| UrdfError::XmlParse(format!("failed to write XML declaration: {e}")))?;
    write_node(&mut writer, root)?;

    String::from_utf8(writer.into_inner())
        .map_err(|e| UrdfError::XmlParse(format!("writer produced invalid UTF-8: {e}")))
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> Result<()> {
    let mut start = BytesStart::new(node.name.as_str());
    for (key, value) in &node.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    // Same trimming as parse_document.
    let text = node.text.as_deref().map(str::trim).filter(|t| !t.is_empty());

    if node.children.is_empty() && text.is_none() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|e| UrdfError::XmlParse(format!("failed to write <{}>: {e}", node.name)));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| UrdfError::XmlParse(format!("failed to write <{}>: {e}", node.name)))?;

    if let Some(text) = text {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(|e| UrdfError::XmlParse(format!("failed to write text: {e}")))?;
    }
    for child in &node.children {
        write_node(writer, child)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(node.name.as_str())))
        .map_err(|e| UrdfError::XmlParse(format!("failed to close <{}>: {e}", node.name)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_elements() {
        let xml = r#"
            <?xml version="1.0"?>
            <!-- comment -->
            <robot name="r">
                <link name="a"/>
                <transmission name="t">
                    <type>transmission_interface/SimpleTransmission</type>
                </transmission>
            </robot>
        "#;

        let root = parse_document(xml).expect("should parse");
        assert_eq!(root.name, "robot");
        assert_eq!(root.attribute("name"), Some("r"));
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].attribute("name"), Some("a"));

        let ty = root.children[1].child("type").expect("type element");
        assert_eq!(ty.text(), Some("transmission_interface/SimpleTransmission"));
    }

    #[test]
    fn test_attribute_entities_are_unescaped() {
        let root = parse_document(r#"<a label="x &amp; y"/>"#).expect("should parse");
        assert_eq!(root.attribute("label"), Some("x & y"));
    }

    #[test]
    fn test_rejects_multiple_roots() {
        let result = parse_document("<a/><b/>");
        assert!(matches!(result, Err(UrdfError::XmlParse(_))));
    }

    #[test]
    fn test_rejects_empty_document() {
        assert!(parse_document("   ").is_err());
    }

    #[test]
    fn test_rejects_mismatched_tags() {
        assert!(parse_document("<a><b></a>").is_err());
    }

    #[test]
    fn test_write_then_read_tree() {
        let tree = XmlNode::new("robot")
            .with_attribute("name", "r")
            .with_child(XmlNode::new("link").with_attribute("name", "base"))
            .with_child(XmlNode::new("note").with_text("a < b"));

        let xml = write_document(&tree).expect("should write");
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("a &lt; b"));

        let back = parse_document(&xml).expect("should parse");
        assert_eq!(back, tree);
    }

    #[test]
    fn test_text_is_trimmed_both_ways() {
        let padded = XmlNode::new("type").with_text("  spaced  ");
        let xml = write_document(&padded).expect("should write");
        assert!(xml.contains("<type>spaced</type>"));
        assert_eq!(
            parse_document(&xml).expect("should parse").text(),
            Some("spaced")
        );

        let blank = XmlNode::new("note").with_text("   ");
        let xml = write_document(&blank).expect("should write");
        assert!(xml.contains("<note/>"));
        assert_eq!(parse_document(&xml).expect("should parse").text(), None);
    }

    #[test]
    fn test_set_attribute_replaces() {
        let mut node = XmlNode::new("origin").with_attribute("xyz", "0 0 0");
        node.set_attribute("xyz", "1 2 3");
        assert_eq!(node.attributes.len(), 1);
        assert_eq!(node.attribute("xyz"), Some("1 2 3"));
    }
}
