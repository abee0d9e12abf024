//! Error types for the xmlscope engine

use thiserror::Error;

/// Main error type for building and serializing documents
#[derive(Error, Debug)]
pub enum BuildError {
    /// Identifier uses the reserved prefix and can never become a factory
    #[error("Reserved name: '{0}' starts with the reserved prefix")]
    ReservedName(String),

    /// Identifier is on the deny-list of an open-world policy
    #[error("Blocked name: '{0}' is on the deny-list")]
    BlockedName(String),

    /// Identifier is missing from the allow-list of a closed-world policy
    #[error("Unresolved name: '{0}' is not on the allow-list")]
    UnresolvedName(String),

    /// Tag, attribute or namespace prefix is not a valid XML name
    #[error("Invalid XML name: '{0}'")]
    InvalidName(String),

    /// Comment text that cannot be written as an XML comment
    #[error("Invalid comment text: {0:?}")]
    InvalidComment(String),

    /// Encoding label is not a valid XML encoding name
    #[error("Invalid encoding name: '{0}'")]
    InvalidEncoding(String),

    /// A scope was exited while the context stack was empty
    #[error("Cannot exit scope: context stack is empty")]
    EmptyScope,

    /// A build finished with scopes still open (or closed too many)
    #[error("Unbalanced scopes: {open} scope(s) differ from the starting depth")]
    UnbalancedScope { open: usize },

    /// Nesting went past the configured maximum depth
    #[error("Maximum scope depth exceeded ({max} levels)")]
    ScopeDepthExceeded { max: usize },

    /// Operation that the factory kind does not support
    #[error("Unsupported operation: cannot {operation} <{tag}>")]
    UnsupportedOperation { tag: String, operation: String },

    /// Enter or append was requested before the factory built a node
    #[error("Factory for <{0}> has not built a node yet")]
    NoCurrentNode(String),

    /// Appending would make an element its own descendant
    #[error("Cannot append <{0}>: it would become its own descendant")]
    CyclicAppend(String),

    /// Construction finished without a usable `root` binding
    #[error("Document must bind an element as root")]
    MissingRoot,

    /// XML writer error
    #[error("XML write error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// IO error from the underlying writer
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Writer produced bytes that are not UTF-8
    #[error("Output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, BuildError>;
