//! xmlscope engine
//!
//! Declarative construction of XML documents from nested scopes.
//! This library provides functionality for:
//! - Resolving tag names to element factories under an allow/deny policy
//! - Attaching new nodes to whichever scope is currently open
//! - Serializing the result with optional declaration, doctype and indentation
//!
//! # Example
//!
//! ```ignore
//! use xmlscope_engine::{DocumentBuilder, ElementArgs, Scoped, SerializeOptions};
//!
//! let document = DocumentBuilder::new().build(|ns| {
//!     let mut html = ns.element("html")?;
//!     let mut p = ns.element("p")?;
//!     let mut comment = ns.comment()?;
//!
//!     let root = html.build(ElementArgs::new().attr("lang", "en")).scope(|root| {
//!         comment.text(" generated ");
//!         p.build("Hello");
//!         Ok(root.clone())
//!     })?;
//!     ns.bind_root(root);
//!     Ok(())
//! })?;
//!
//! let text = document.serialize(&SerializeOptions::new().doctype("html"))?;
//! ```

pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod factory;
pub mod resolver;
pub mod tree;

// Re-export commonly used items
pub use context::{ContextStack, ScopeGuard};
pub use document::{serialize, BuiltDocument, Document, DocumentBuilder, SerializeOptions};
pub use error::{BuildError, Result};
pub use factory::{CommentFactory, ElementArgs, ElementFactory, Factory, Scoped};
pub use resolver::{Namespace, ResolutionPolicy};
pub use tree::{Comment, Element, Node};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "0.1.0");
    }

    #[test]
    fn test_reexports() {
        // Verify re-exports work
        let _policy = ResolutionPolicy::open();
        let _options = SerializeOptions::default();
        let _err = BuildError::EmptyScope;
        let _node = Node::from(Comment::new("x"));
    }
}
