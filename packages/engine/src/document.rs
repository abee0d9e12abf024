//! Document compiler: build sessions and serialization
//!
//! A build session runs construction logic against a fresh [`Namespace`],
//! checks that the logic left the context stack as it found it and captures
//! the node bound as `root`. The resulting [`BuiltDocument`] owns the tree and
//! serializes it with an optional XML declaration and doctype.

use std::collections::HashMap;

use crate::config::{self, DEFAULT_ENCODING, ROOT_BINDING, XML_VERSION};
use crate::context::ContextStack;
use crate::error::{BuildError, Result};
use crate::resolver::{Namespace, ResolutionPolicy};
use crate::tree::{self, Element, Node};

/// Options for turning a tree into text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Body of a `<!DOCTYPE ..>` line, written verbatim
    pub doctype: Option<String>,
    /// Encoding named in the declaration; output is always a Rust string
    pub encoding: String,
    /// Whether to write the `<?xml ..?>` declaration line
    pub declaration: bool,
    /// Whether to indent the body
    pub pretty: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            doctype: None,
            encoding: DEFAULT_ENCODING.to_string(),
            declaration: false,
            pretty: false,
        }
    }
}

impl SerializeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn doctype(mut self, doctype: impl Into<String>) -> Self {
        self.doctype = Some(doctype.into());
        self
    }

    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn declaration(mut self, declaration: bool) -> Self {
        self.declaration = declaration;
        self
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

/// Serialize an element subtree.
///
/// Parts are written in the order declaration, doctype, body and joined with
/// newlines. Parts that are switched off leave no blank line behind.
///
/// # Errors
/// `InvalidEncoding` when a declaration is requested with a malformed
/// encoding label, plus any naming or writer error from the tree.
///
/// # Example
/// ```ignore
/// let text = serialize(&root, &SerializeOptions::new().doctype("html").declaration(true))?;
/// assert_eq!(
///     text,
///     "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE html>\n<html><body/></html>"
/// );
/// ```
pub fn serialize(root: &Element, options: &SerializeOptions) -> Result<String> {
    let mut parts = Vec::with_capacity(3);
    if options.declaration {
        config::validate_encoding(&options.encoding)?;
        parts.push(format!(
            "<?xml version=\"{XML_VERSION}\" encoding=\"{}\"?>",
            options.encoding
        ));
    }
    if let Some(doctype) = &options.doctype {
        parts.push(format!("<!DOCTYPE {doctype}>"));
    }
    parts.push(tree::write_tree(root, options.pretty)?);

    let output = parts.join("\n");
    Ok(output.trim_start_matches(['\n', '\r']).to_string())
}

/// Configures and runs a build session.
#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder {
    policy: ResolutionPolicy,
    context: Option<ContextStack>,
}

impl DocumentBuilder {
    /// Open-world builder on the shared stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict resolution to the given identifiers.
    pub fn allow(mut self, identifiers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.policy = self.policy.with_allow(identifiers);
        self
    }

    /// Block the given identifiers.
    pub fn deny(mut self, identifiers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.policy = self.policy.with_deny(identifiers);
        self
    }

    /// Replace the resolution policy.
    pub fn policy(mut self, policy: ResolutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build against `context` instead of the shared stack.
    ///
    /// A stack with open scopes is allowed: nodes created at the top level
    /// of the session then attach to the caller's open scope.
    pub fn context(mut self, context: ContextStack) -> Self {
        self.context = Some(context);
        self
    }

    /// Run `compose` and capture the node it binds as `root`.
    ///
    /// # Errors
    /// Any error returned by `compose`; `UnbalancedScope` if the stack depth
    /// changed; `MissingRoot` if `root` is unbound or bound to a comment.
    /// Open scopes left behind are discarded before returning.
    pub fn build<F>(self, compose: F) -> Result<BuiltDocument>
    where
        F: FnOnce(&mut Namespace) -> Result<()>,
    {
        let context = self.context.unwrap_or_else(ContextStack::shared);
        let start = context.depth();
        let mut namespace = Namespace::new(context.clone(), self.policy);

        let outcome = compose(&mut namespace);

        let depth = context.depth();
        if depth != start {
            let dropped = context.truncate(start);
            tracing::warn!(start, depth, dropped, "Build left the context stack unbalanced");
        }
        outcome?;
        if depth != start {
            return Err(BuildError::UnbalancedScope {
                open: depth.abs_diff(start),
            });
        }

        let bindings = namespace.into_bindings();
        let root = match bindings.get(ROOT_BINDING) {
            Some(Node::Element(root)) => root.clone(),
            Some(Node::Comment(_)) | None => return Err(BuildError::MissingRoot),
        };

        tracing::debug!(
            root = %root.tag(),
            bindings = bindings.len(),
            "Document built"
        );
        Ok(BuiltDocument { root, bindings })
    }
}

/// The outcome of a build session.
#[derive(Debug, Clone)]
pub struct BuiltDocument {
    root: Element,
    bindings: HashMap<String, Node>,
}

impl BuiltDocument {
    /// The outermost element.
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// A named node bound during construction.
    pub fn binding(&self, name: &str) -> Option<&Node> {
        self.bindings.get(name)
    }

    /// Take ownership of the root element.
    pub fn into_root(self) -> Element {
        self.root
    }

    /// Serialize the root element.
    pub fn serialize(&self, options: &SerializeOptions) -> Result<String> {
        serialize(&self.root, options)
    }
}

/// A document type with fixed construction logic.
///
/// ```ignore
/// struct Page;
///
/// impl Document for Page {
///     fn compose(ns: &mut Namespace) -> Result<()> {
///         let mut html = ns.element("html")?;
///         let root = html.build_empty().scope(|root| {
///             ns.element("body")?.build_empty();
///             Ok(root.clone())
///         })?;
///         ns.bind_root(root);
///         Ok(())
///     }
/// }
///
/// let text = Page::render(&SerializeOptions::new().doctype("html"))?;
/// ```
pub trait Document {
    /// Construction logic; must bind `root`.
    fn compose(ns: &mut Namespace) -> Result<()>;

    /// Resolution policy for this document.
    fn policy() -> ResolutionPolicy {
        ResolutionPolicy::default()
    }

    /// Build on a fresh stack.
    fn build() -> Result<BuiltDocument> {
        DocumentBuilder::new()
            .policy(Self::policy())
            .context(ContextStack::new())
            .build(Self::compose)
    }

    /// Build and serialize in one step.
    fn render(options: &SerializeOptions) -> Result<String> {
        Self::build()?.serialize(options)
    }
}
