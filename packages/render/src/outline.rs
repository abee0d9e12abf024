//! Document outlines and their rendering.
//!
//! An outline describes a document as nested nodes in YAML or JSON:
//!
//! ```yaml
//! tag: html
//! attributes: { lang: en }
//! children:
//!   - comment: " generated "
//!   - tag: p
//!     text: Hello
//! ```
//!
//! Rendering walks the outline with the engine's builder API: every tag is
//! resolved through the active policy and children are built inside the
//! parent's scope.

use std::fmt;
use std::io::Read;
use std::marker::PhantomData;
use std::path::Path;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use xmlscope_engine::{
    ContextStack, DocumentBuilder, Element, ElementArgs, Namespace, ResolutionPolicy, Scoped,
    SerializeOptions,
};

use crate::error::{RenderError, Result};

/// Path that reads the outline from stdin.
pub const STDIN_PATH: &str = "-";

/// Mapping that keeps its entries in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Entries<V>(pub Vec<(String, V)>);

impl<V> Default for Entries<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<V> Entries<V> {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> + '_ {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Entries<V> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = Entries<V>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a mapping")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, V>()? {
                    entries.push(entry);
                }
                Ok(Entries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

/// Scalar text or attribute value.
///
/// Floats keep a fractional part when written (`1.0` stays `1.0`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(value) => write!(f, "{value}"),
            Scalar::Integer(value) => write!(f, "{value}"),
            Scalar::Unsigned(value) => write!(f, "{value}"),
            // Debug is the shortest round-trip form and keeps ".0"
            Scalar::Float(value) => write!(f, "{value:?}"),
            Scalar::Text(value) => f.write_str(value),
        }
    }
}

/// One node of an outline.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OutlineNode {
    Comment(CommentOutline),
    Element(ElementOutline),
}

/// `{ comment: text }`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommentOutline {
    pub comment: String,
}

/// `{ tag, text?, attributes?, namespaces?, children? }`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementOutline {
    pub tag: String,

    #[serde(default)]
    pub text: Option<Scalar>,

    /// Attribute values; `null` leaves the attribute out
    #[serde(default)]
    pub attributes: Entries<Option<Scalar>>,

    /// Prefix to URI; the empty prefix is the default namespace
    #[serde(default)]
    pub namespaces: Entries<String>,

    #[serde(default)]
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    /// Number of nodes in this subtree.
    pub fn node_count(&self) -> usize {
        match self {
            OutlineNode::Comment(_) => 1,
            OutlineNode::Element(element) => {
                1 + element
                    .children
                    .iter()
                    .map(OutlineNode::node_count)
                    .sum::<usize>()
            }
        }
    }

    /// Build this subtree into the open scope of `ns`.
    ///
    /// Returns the element that was built, or `None` for a comment.
    pub fn build(&self, ns: &Namespace) -> xmlscope_engine::Result<Option<Element>> {
        match self {
            OutlineNode::Comment(outline) => {
                ns.comment()?.text(&outline.comment);
                Ok(None)
            }
            OutlineNode::Element(outline) => outline.build(ns).map(Some),
        }
    }
}

impl ElementOutline {
    fn args(&self) -> ElementArgs {
        ElementArgs::new()
            .text_opt(self.text.as_ref().map(ToString::to_string))
            .attributes(
                self.attributes
                    .iter()
                    .filter_map(|(name, value)| value.as_ref().map(|value| (name, value))),
            )
            .namespaces(
                self.namespaces
                    .iter()
                    .map(|(prefix, uri)| ((!prefix.is_empty()).then_some(prefix), uri)),
            )
    }

    fn build(&self, ns: &Namespace) -> xmlscope_engine::Result<Element> {
        let mut factory = ns.element(&self.tag)?;
        factory.build(self.args());
        if !self.children.is_empty() {
            factory.scope(|_| {
                for child in &self.children {
                    child.build(ns)?;
                }
                Ok(())
            })?;
        }
        factory
            .element()
            .cloned()
            .ok_or_else(|| xmlscope_engine::BuildError::NoCurrentNode(self.tag.clone()))
    }
}

/// Outline file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineFormat {
    Yaml,
    Json,
}

impl OutlineFormat {
    /// Detect the format from a file extension. Stdin is read as YAML.
    pub fn from_path(path: &Path) -> Result<Self> {
        if path.as_os_str() == STDIN_PATH {
            return Ok(OutlineFormat::Yaml);
        }
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Ok(OutlineFormat::Yaml),
            Some("json") => Ok(OutlineFormat::Json),
            other => Err(RenderError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    /// Parse outline text in this format.
    pub fn parse(self, content: &str) -> Result<OutlineNode> {
        match self {
            OutlineFormat::Yaml => Ok(serde_yaml_ng::from_str(content)?),
            OutlineFormat::Json => Ok(serde_json::from_str(content)?),
        }
    }
}

/// Read and parse an outline from a file, or from stdin for `-`.
pub fn load(path: &Path) -> Result<OutlineNode> {
    let format = OutlineFormat::from_path(path)?;
    let content = if path.as_os_str() == STDIN_PATH {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        content
    } else {
        std::fs::read_to_string(path)?
    };

    let outline = format.parse(&content)?;
    tracing::debug!(
        path = %path.display(),
        nodes = outline.node_count(),
        "Loaded outline"
    );
    Ok(outline)
}

/// Render an outline to text.
///
/// The top node is bound as the document root, so an outline whose top
/// node is a comment fails with `MissingRoot`.
pub fn render(
    outline: &OutlineNode,
    policy: ResolutionPolicy,
    options: &SerializeOptions,
) -> Result<String> {
    let document = DocumentBuilder::new()
        .policy(policy)
        .context(ContextStack::new())
        .build(|ns| {
            if let Some(root) = outline.build(ns)? {
                ns.bind_root(root);
            }
            Ok(())
        })?;
    Ok(document.serialize(options)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use xmlscope_engine::BuildError;

    const PAGE: &str = r#"
tag: html
attributes:
  lang: en
children:
  - comment: " generated "
  - tag: body
    children:
      - tag: p
        text: Hello
        attributes:
          class: intro
          data-count: 5
          hidden: false
          title: null
"#;

    fn render_default(outline: &OutlineNode) -> Result<String> {
        render(outline, ResolutionPolicy::open(), &SerializeOptions::default())
    }

    #[test]
    fn test_render_yaml_page() {
        let outline = OutlineFormat::Yaml.parse(PAGE).unwrap();
        assert_eq!(outline.node_count(), 4);
        assert_eq!(
            render_default(&outline).unwrap(),
            "<html lang=\"en\"><!-- generated --><body>\
             <p class=\"intro\" data-count=\"5\" hidden=\"false\">Hello</p>\
             </body></html>"
        );
    }

    #[test]
    fn test_attribute_order_follows_json_source() {
        let outline = OutlineFormat::Json
            .parse(r#"{"tag": "a", "attributes": {"z": 1, "href": "/", "a": 2.5}}"#)
            .unwrap();
        assert_eq!(
            render_default(&outline).unwrap(),
            "<a z=\"1\" href=\"/\" a=\"2.5\"/>"
        );
    }

    #[test]
    fn test_numeric_text_is_stringified() {
        let outline = OutlineFormat::Yaml.parse("tag: count\ntext: 42").unwrap();
        assert_eq!(render_default(&outline).unwrap(), "<count>42</count>");
    }

    #[test]
    fn test_namespaces() {
        let outline = OutlineFormat::Yaml
            .parse(
                r##"
tag: svg
namespaces:
  "": http://www.w3.org/2000/svg
  xlink: http://www.w3.org/1999/xlink
children:
  - tag: use
    attributes:
      xlink:href: "#icon"
"##,
            )
            .unwrap();

        let text = render_default(&outline).unwrap();
        assert_eq!(
            text,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" \
             xmlns:xlink=\"http://www.w3.org/1999/xlink\">\
             <use xlink:href=\"#icon\"/></svg>"
        );
        assert!(roxmltree::Document::parse(&text).is_ok());
    }

    #[test]
    fn test_policy_is_applied() {
        let outline = OutlineFormat::Yaml.parse(PAGE).unwrap();

        let result = render(
            &outline,
            ResolutionPolicy::allow_only(["html", "body"]),
            &SerializeOptions::default(),
        );
        assert!(matches!(
            result,
            Err(RenderError::Build(BuildError::UnresolvedName(name))) if name == "p"
        ));

        let result = render(
            &outline,
            ResolutionPolicy::denying(["body"]),
            &SerializeOptions::default(),
        );
        assert!(matches!(
            result,
            Err(RenderError::Build(BuildError::BlockedName(_)))
        ));
    }

    #[test]
    fn test_comment_root_is_rejected() {
        let outline = OutlineFormat::Yaml.parse("comment: alone").unwrap();
        assert!(matches!(
            render_default(&outline),
            Err(RenderError::Build(BuildError::MissingRoot))
        ));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(OutlineFormat::Yaml.parse("tag: p\ntxt: typo").is_err());
        assert!(OutlineFormat::Yaml.parse("attributes: {a: 1}").is_err());
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            OutlineFormat::from_path(Path::new("page.yml")).unwrap(),
            OutlineFormat::Yaml
        );
        assert_eq!(
            OutlineFormat::from_path(Path::new("page.json")).unwrap(),
            OutlineFormat::Json
        );
        assert_eq!(
            OutlineFormat::from_path(Path::new("-")).unwrap(),
            OutlineFormat::Yaml
        );
        assert!(matches!(
            OutlineFormat::from_path(Path::new("page.toml")),
            Err(RenderError::UnsupportedFormat(ext)) if ext == "toml"
        ));
    }

    #[test]
    fn test_scalar_display() {
        assert_eq!(Scalar::Bool(true).to_string(), "true");
        assert_eq!(Scalar::Integer(-3).to_string(), "-3");
        assert_eq!(Scalar::Text("x".to_string()).to_string(), "x");
        assert_eq!(Scalar::Float(0.1).to_string(), "0.1");
    }

    #[test]
    fn test_numbers_keep_their_written_form() {
        let outline = OutlineFormat::Yaml
            .parse("tag: n\ntext: 1.0\nattributes:\n  max: 18446744073709551615\n  min: -9223372036854775808")
            .unwrap();
        assert_eq!(
            render_default(&outline).unwrap(),
            "<n max=\"18446744073709551615\" min=\"-9223372036854775808\">1.0</n>"
        );

        let outline = OutlineFormat::Json
            .parse(r#"{"tag": "n", "attributes": {"ratio": 2.0, "big": 18446744073709551615}}"#)
            .unwrap();
        assert_eq!(
            render_default(&outline).unwrap(),
            "<n ratio=\"2.0\" big=\"18446744073709551615\"/>"
        );
    }
}
