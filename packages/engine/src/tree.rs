//! Markup tree: elements, comments and their XML form
//!
//! Elements are shared handles (`Rc<RefCell<..>>`). The context stack, the
//! factory that created an element and the element's parent all point at the
//! same node, so attaching a child through any of them is visible to all.
//! Comments are plain values since they never contain children.
//!
//! Events are written with `quick-xml`'s [`Writer`]; indentation is added
//! here so that it can be skipped inside mixed content.

use std::borrow::Cow;
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::Writer;

use crate::config::{self, validate_name};
use crate::error::{BuildError, Result};

/// A node in the markup tree.
#[derive(Debug, Clone)]
pub enum Node {
    /// An element with attributes, text and children
    Element(Element),
    /// A comment
    Comment(Comment),
}

impl Node {
    /// Return the element if this node is one.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Comment(_) => None,
        }
    }

    /// Return the comment if this node is one.
    pub fn as_comment(&self) -> Option<&Comment> {
        match self {
            Node::Element(_) => None,
            Node::Comment(comment) => Some(comment),
        }
    }

    /// Serialize this node and its subtree without indentation.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        write_node(&mut writer, self, 0, false)?;
        Ok(String::from_utf8(writer.into_inner())?)
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<&Element> for Node {
    fn from(element: &Element) -> Self {
        Node::Element(element.clone())
    }
}

impl From<Comment> for Node {
    fn from(comment: Comment) -> Self {
        Node::Comment(comment)
    }
}

/// An XML comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comment {
    text: String,
}

impl Comment {
    /// Create a comment with the given text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The comment text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Default)]
struct ElementData {
    tag: String,
    /// Insertion-ordered; a repeated name replaces the value in place
    attributes: Vec<(String, String)>,
    /// Prefix (`None` for the default namespace) to URI
    namespaces: Vec<(Option<String>, String)>,
    text: Option<String>,
    children: Vec<Node>,
}

/// Shared handle to an element.
///
/// Cloning the handle does not copy the element; use [`Element::ptr_eq`] to
/// check whether two handles point at the same node.
#[derive(Debug, Clone)]
pub struct Element(Rc<RefCell<ElementData>>);

impl Element {
    /// Create a parentless element without attributes, text or children.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(Rc::new(RefCell::new(ElementData {
            tag: tag.into(),
            ..ElementData::default()
        })))
    }

    /// The tag name.
    pub fn tag(&self) -> String {
        self.0.borrow().tag.clone()
    }

    /// The text content, if any.
    pub fn text(&self) -> Option<String> {
        self.0.borrow().text.clone()
    }

    /// Look up an attribute value.
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.0
            .borrow()
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }

    /// All attributes in document order.
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.0.borrow().attributes.clone()
    }

    /// Namespace declarations in document order.
    pub fn namespaces(&self) -> Vec<(Option<String>, String)> {
        self.0.borrow().namespaces.clone()
    }

    /// Child nodes in insertion order.
    pub fn children(&self) -> Vec<Node> {
        self.0.borrow().children.clone()
    }

    /// Number of direct children.
    pub fn child_count(&self) -> usize {
        self.0.borrow().children.len()
    }

    /// Whether both handles point at the same element.
    pub fn ptr_eq(&self, other: &Element) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Whether `other` is this element or one of its descendants.
    pub fn contains(&self, other: &Element) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        self.0
            .borrow()
            .children
            .iter()
            .filter_map(Node::as_element)
            .any(|child| child.contains(other))
    }

    /// Append a node as the last child.
    ///
    /// # Errors
    /// `CyclicAppend` if the node is this element or one of its ancestors.
    pub fn append(&self, node: impl Into<Node>) -> Result<()> {
        let node = node.into();
        if let Node::Element(child) = &node {
            if child.contains(self) {
                return Err(BuildError::CyclicAppend(child.tag()));
            }
        }
        self.push_child(node);
        Ok(())
    }

    /// Serialize this element and its subtree without indentation.
    pub fn to_xml(&self) -> Result<String> {
        write_tree(self, false)
    }

    /// Serialize this element and its subtree with indentation.
    pub fn to_pretty_xml(&self) -> Result<String> {
        write_tree(self, true)
    }

    pub(crate) fn push_child(&self, node: Node) {
        self.0.borrow_mut().children.push(node);
    }

    pub(crate) fn set_text(&self, text: String) {
        self.0.borrow_mut().text = Some(text);
    }

    /// `xmlns` and `xmlns:*` names become namespace declarations.
    pub(crate) fn set_attribute(&self, name: String, value: String) {
        if name == "xmlns" {
            return self.declare_namespace(None, value);
        }
        if let Some(prefix) = name.strip_prefix("xmlns:") {
            return self.declare_namespace(Some(prefix.to_string()), value);
        }

        let mut data = self.0.borrow_mut();
        match data.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => data.attributes.push((name, value)),
        }
    }

    pub(crate) fn declare_namespace(&self, prefix: Option<String>, uri: String) {
        let mut data = self.0.borrow_mut();
        match data.namespaces.iter_mut().find(|(key, _)| *key == prefix) {
            Some(slot) => slot.1 = uri,
            None => data.namespaces.push((prefix, uri)),
        }
    }
}

/// Serialize an element subtree, optionally indented.
///
/// Indentation is only added inside elements without text, so pretty output
/// never changes mixed content.
pub(crate) fn write_tree(root: &Element, pretty: bool) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    write_element(&mut writer, root, 0, pretty)?;
    Ok(String::from_utf8(writer.into_inner())?)
}

fn write_node<W: Write>(
    writer: &mut Writer<W>,
    node: &Node,
    depth: usize,
    pretty: bool,
) -> Result<()> {
    match node {
        Node::Element(element) => write_element(writer, element, depth, pretty),
        Node::Comment(comment) => write_comment(writer, comment),
    }
}

fn write_element<W: Write>(
    writer: &mut Writer<W>,
    element: &Element,
    depth: usize,
    pretty: bool,
) -> Result<()> {
    if depth > config::MAX_SCOPE_DEPTH {
        return Err(BuildError::ScopeDepthExceeded {
            max: config::MAX_SCOPE_DEPTH,
        });
    }

    let data = element.0.borrow();
    validate_name(&data.tag)?;

    let mut start = BytesStart::new(data.tag.as_str());
    for (prefix, uri) in &data.namespaces {
        let name = match prefix {
            Some(prefix) => {
                validate_prefix(prefix)?;
                format!("xmlns:{prefix}")
            }
            None => "xmlns".to_string(),
        };
        start.push_attribute(escaped_attribute(&name, uri));
    }
    for (name, value) in &data.attributes {
        validate_name(name)?;
        start.push_attribute(escaped_attribute(name, value));
    }

    if data.text.is_none() && data.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if let Some(text) = &data.text {
        writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(
            text.as_str(),
        ))))?;
    }
    // Whitespace is significant next to text
    let indent = pretty && data.text.is_none();
    for child in &data.children {
        if indent {
            write_indent(writer, depth + 1)?;
        }
        write_node(writer, child, depth + 1, indent)?;
    }
    if indent {
        write_indent(writer, depth)?;
    }
    writer.write_event(Event::End(BytesEnd::new(data.tag.as_str())))?;
    Ok(())
}

fn write_indent<W: Write>(writer: &mut Writer<W>, level: usize) -> Result<()> {
    let indent = format!("\n{}", " ".repeat(level * config::PRETTY_INDENT_WIDTH));
    writer.write_event(Event::Text(BytesText::from_escaped(indent)))?;
    Ok(())
}

/// Build an attribute whose value survives attribute-value normalization.
///
/// Besides markup characters, tabs and line breaks are written as character
/// references since a parser would otherwise turn them into spaces.
fn escaped_attribute<'a>(name: &'a str, value: &str) -> Attribute<'a> {
    let mut escaped = String::with_capacity(value.len());
    for ch in escape(value).chars() {
        match ch {
            '\n' => escaped.push_str("&#10;"),
            '\t' => escaped.push_str("&#9;"),
            '\r' => escaped.push_str("&#13;"),
            ch => escaped.push(ch),
        }
    }
    Attribute {
        key: QName(name.as_bytes()),
        value: Cow::Owned(escaped.into_bytes()),
    }
}

fn write_comment<W: Write>(writer: &mut Writer<W>, comment: &Comment) -> Result<()> {
    // XML forbids "--" inside a comment and a trailing "-" before "-->"
    if comment.text.contains("--") || comment.text.ends_with('-') {
        return Err(BuildError::InvalidComment(comment.text.clone()));
    }
    writer.write_event(Event::Comment(BytesText::from_escaped(
        comment.text.as_str(),
    )))?;
    Ok(())
}

fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.contains(':') {
        return Err(BuildError::InvalidName(prefix.to_string()));
    }
    validate_name(prefix)
}
