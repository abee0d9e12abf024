//! Element and comment factories
//!
//! A factory binds a tag name to a [`ContextStack`]. Every call to `build`
//! creates a new node, attaches it to whatever scope is currently open and
//! remembers it as the factory's current node. The factory can then be
//! entered as a scope so that nodes built inside attach to that node.
//!
//! ```ignore
//! let mut ul = ElementFactory::new("ul", context.clone());
//! let mut li = ElementFactory::new("li", context.clone());
//!
//! ul.build(ElementArgs::new().attr("class", "menu")).scope(|_| {
//!     li.build("first");
//!     li.build("second");
//!     Ok(())
//! })?;
//! ```

use std::fmt::Display;

use crate::config::COMMENT_IDENTIFIER;
use crate::context::{ContextStack, ScopeGuard};
use crate::error::{BuildError, Result};
use crate::tree::{Comment, Element, Node};

/// Inputs for one element invocation.
///
/// Attribute values are stringified when they are added. The attribute
/// mapping is applied first and extra named attributes after it, so on a
/// repeated name the extra attribute wins (keeping the position of the first
/// occurrence). `None` values are left out. Attributes named `xmlns` or
/// `xmlns:*` are applied as namespace declarations after [`Self::namespace`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementArgs {
    text: Option<String>,
    attributes: Vec<(String, Option<String>)>,
    extra: Vec<(String, Option<String>)>,
    namespaces: Vec<(Option<String>, String)>,
}

impl ElementArgs {
    /// Create empty arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the text content. Empty text is treated as no text.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set or clear the text content.
    pub fn text_opt(mut self, text: Option<impl Into<String>>) -> Self {
        self.text = text.map(Into::into);
        self
    }

    /// Add entries from an attribute mapping.
    pub fn attributes<I, K, V>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Display,
    {
        self.attributes.extend(
            attributes
                .into_iter()
                .map(|(name, value)| (name.into(), Some(value.to_string()))),
        );
        self
    }

    /// Add a named attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.extra.push((name.into(), Some(value.to_string())));
        self
    }

    /// Add a named attribute that is left out when `value` is `None`.
    pub fn attr_opt<V: Display>(mut self, name: impl Into<String>, value: Option<V>) -> Self {
        self.extra
            .push((name.into(), value.map(|value| value.to_string())));
        self
    }

    /// Declare a namespace; `None` declares the default namespace.
    pub fn namespace(mut self, prefix: Option<&str>, uri: impl Into<String>) -> Self {
        self.namespaces
            .push((prefix.map(str::to_string), uri.into()));
        self
    }

    /// Declare several namespaces.
    pub fn namespaces<I, P, U>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = (Option<P>, U)>,
        P: Into<String>,
        U: Into<String>,
    {
        self.namespaces.extend(
            namespaces
                .into_iter()
                .map(|(prefix, uri)| (prefix.map(Into::into), uri.into())),
        );
        self
    }

    /// Whether anything besides text was supplied.
    pub fn has_markup(&self) -> bool {
        !self.attributes.is_empty() || !self.extra.is_empty() || !self.namespaces.is_empty()
    }

    fn into_element(self, tag: &str) -> Element {
        let element = Element::new(tag);
        for (prefix, uri) in self.namespaces {
            element.declare_namespace(prefix, uri);
        }
        for (name, value) in self.attributes.into_iter().chain(self.extra) {
            if let Some(value) = value {
                element.set_attribute(name, value);
            }
        }
        if let Some(text) = self.text.filter(|text| !text.is_empty()) {
            element.set_text(text);
        }
        element
    }
}

impl From<&str> for ElementArgs {
    fn from(text: &str) -> Self {
        ElementArgs::new().text(text)
    }
}

impl From<String> for ElementArgs {
    fn from(text: String) -> Self {
        ElementArgs::new().text(text)
    }
}

/// Something that can be entered as a scope.
pub trait Scoped {
    /// Push the current node and return a guard that pops it.
    fn enter(&self) -> Result<ScopeGuard>;

    /// Run `body` with the current node as the open scope.
    ///
    /// The scope is closed on every exit path, including errors from `body`.
    fn scope<R, F>(&self, body: F) -> Result<R>
    where
        F: FnOnce(&Element) -> Result<R>,
    {
        let guard = self.enter()?;
        let value = body(guard.element())?;
        guard.exit()?;
        Ok(value)
    }
}

/// Tag-bound constructor for elements.
#[derive(Debug, Clone)]
pub struct ElementFactory {
    tag: String,
    context: ContextStack,
    current: Option<Element>,
}

impl ElementFactory {
    /// Bind `tag` to `context`.
    pub fn new(tag: impl Into<String>, context: ContextStack) -> Self {
        Self {
            tag: tag.into(),
            context,
            current: None,
        }
    }

    /// The bound tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The stack this factory attaches into.
    pub fn context(&self) -> &ContextStack {
        &self.context
    }

    /// Create a new element and attach it to the open scope.
    ///
    /// The element becomes the factory's current node; the returned
    /// reference can be entered with [`Scoped::enter`] or [`Scoped::scope`].
    pub fn build(&mut self, args: impl Into<ElementArgs>) -> &mut Self {
        let element = args.into().into_element(&self.tag);
        self.context.add(&Node::from(&element));
        self.current = Some(element);
        self
    }

    /// Create an element with no text or attributes.
    pub fn build_empty(&mut self) -> &mut Self {
        self.build(ElementArgs::new())
    }

    /// The element built by the last invocation.
    pub fn element(&self) -> Option<&Element> {
        self.current.as_ref()
    }

    /// Attach an already-built node under the current node.
    ///
    /// This is how a tree built against one stack is grafted into another.
    pub fn append(&self, node: impl Into<Node>) -> Result<()> {
        self.current()?.append(node)
    }

    fn current(&self) -> Result<&Element> {
        self.current
            .as_ref()
            .ok_or_else(|| BuildError::NoCurrentNode(self.tag.clone()))
    }
}

impl Scoped for ElementFactory {
    fn enter(&self) -> Result<ScopeGuard> {
        let element = self.current()?.clone();
        self.context.enter(element)
    }
}

/// Constructor for comments. Cannot be entered as a scope.
#[derive(Debug, Clone)]
pub struct CommentFactory {
    context: ContextStack,
    current: Option<Comment>,
}

impl CommentFactory {
    /// Bind to `context`.
    pub fn new(context: ContextStack) -> Self {
        Self {
            context,
            current: None,
        }
    }

    /// Create a comment (empty when `text` is `None`) and attach it.
    pub fn build(&mut self, text: Option<&str>) -> &mut Self {
        let comment = Comment::new(text.unwrap_or_default());
        self.context.add(&Node::from(comment.clone()));
        self.current = Some(comment);
        self
    }

    /// Create a comment with the given text.
    pub fn text(&mut self, text: &str) -> &mut Self {
        self.build(Some(text))
    }

    /// The comment built by the last invocation.
    pub fn comment(&self) -> Option<&Comment> {
        self.current.as_ref()
    }

    fn unsupported(&self, operation: &str) -> BuildError {
        BuildError::UnsupportedOperation {
            tag: COMMENT_IDENTIFIER.to_string(),
            operation: operation.to_string(),
        }
    }
}

impl Scoped for CommentFactory {
    fn enter(&self) -> Result<ScopeGuard> {
        Err(self.unsupported("enter"))
    }
}

/// A resolved factory.
#[derive(Debug, Clone)]
pub enum Factory {
    /// Builds elements of one tag
    Element(ElementFactory),
    /// Builds comments
    Comment(CommentFactory),
}

impl Factory {
    /// Build a node from `args`.
    ///
    /// # Errors
    /// `UnsupportedOperation` when attributes or namespaces are passed to a
    /// comment factory.
    pub fn build(&mut self, args: impl Into<ElementArgs>) -> Result<&mut Self> {
        match self {
            Factory::Element(factory) => {
                factory.build(args);
            }
            Factory::Comment(factory) => {
                let args = args.into();
                if args.has_markup() {
                    return Err(factory.unsupported("set attributes on"));
                }
                factory.build(args.text.as_deref());
            }
        }
        Ok(self)
    }

    /// The tag this factory builds (`Comment` for comments).
    pub fn tag(&self) -> &str {
        match self {
            Factory::Element(factory) => factory.tag(),
            Factory::Comment(_) => COMMENT_IDENTIFIER,
        }
    }

    /// Whether this is a comment factory.
    pub fn is_comment(&self) -> bool {
        matches!(self, Factory::Comment(_))
    }

    /// The node built by the last invocation.
    pub fn node(&self) -> Option<Node> {
        match self {
            Factory::Element(factory) => factory.element().map(Node::from),
            Factory::Comment(factory) => factory.comment().cloned().map(Node::from),
        }
    }

    /// Attach an already-built node under the current element.
    pub fn append(&self, node: impl Into<Node>) -> Result<()> {
        match self {
            Factory::Element(factory) => factory.append(node),
            Factory::Comment(factory) => Err(factory.unsupported("append to")),
        }
    }

    /// Unwrap an element factory.
    pub fn into_element(self) -> Result<ElementFactory> {
        match self {
            Factory::Element(factory) => Ok(factory),
            Factory::Comment(factory) => Err(factory.unsupported("build elements with")),
        }
    }

    /// Unwrap a comment factory.
    pub fn into_comment(self) -> Result<CommentFactory> {
        match self {
            Factory::Comment(factory) => Ok(factory),
            Factory::Element(factory) => Err(BuildError::UnsupportedOperation {
                tag: factory.tag,
                operation: "build comments with".to_string(),
            }),
        }
    }
}

impl Scoped for Factory {
    fn enter(&self) -> Result<ScopeGuard> {
        match self {
            Factory::Element(factory) => factory.enter(),
            Factory::Comment(factory) => factory.enter(),
        }
    }
}
