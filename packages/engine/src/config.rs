//! Configuration constants and validation for the xmlscope engine
//!
//! Centralized values used while resolving identifiers, building scopes and
//! writing documents:
//! - Naming rules (reserved prefix, the `root` binding, the comment identifier)
//! - Serialization defaults (XML version, encoding, indentation)
//! - Resource limits (scope nesting depth)
//!
//! Runtime behaviour is configured through [`crate::SerializeOptions`] and
//! [`crate::ResolutionPolicy`]; the values here are their defaults and limits.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{BuildError, Result};

/// XML version written in the declaration line.
pub const XML_VERSION: &str = "1.0";

/// Encoding used when none is given.
pub const DEFAULT_ENCODING: &str = "utf-8";

/// Identifiers starting with this prefix never resolve to a factory.
pub const RESERVED_PREFIX: &str = "__";

/// Name of the binding that holds the outermost node of a document.
pub const ROOT_BINDING: &str = "root";

/// Identifier pre-registered for the comment factory.
pub const COMMENT_IDENTIFIER: &str = "Comment";

/// Spaces per nesting level in pretty output.
pub const PRETTY_INDENT_WIDTH: usize = 2;

/// Maximum number of simultaneously open scopes.
///
/// Serialization recurses once per level, so unbounded nesting would be
/// able to overflow the stack. 512 levels is far beyond any hand-written
/// document.
pub const MAX_SCOPE_DEPTH: usize = 512;

/// XML Name production (ASCII punctuation, Unicode letters and digits),
/// with at most one namespace prefix.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{L}_][\p{L}\p{N}._\-]*(?::[\p{L}_][\p{L}\p{N}._\-]*)?$").expect("valid regex")
});

/// XML EncName production.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ENCODING_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9._\-]*$").expect("valid regex"));

/// Check whether an identifier uses the reserved prefix.
///
/// # Examples
/// ```
/// use xmlscope_engine::config::is_reserved;
///
/// assert!(is_reserved("__init__"));
/// assert!(!is_reserved("_private"));
/// ```
pub fn is_reserved(identifier: &str) -> bool {
    identifier.starts_with(RESERVED_PREFIX)
}

/// Validate a tag or attribute name.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(BuildError::InvalidName)` if invalid
///
/// # Examples
/// ```
/// use xmlscope_engine::config::validate_name;
///
/// assert!(validate_name("div").is_ok());
/// assert!(validate_name("svg:rect").is_ok());
/// assert!(validate_name("1div").is_err());
/// ```
pub fn validate_name(name: &str) -> Result<()> {
    if NAME_PATTERN.is_match(name) {
        Ok(())
    } else {
        Err(BuildError::InvalidName(name.to_string()))
    }
}

/// Validate an encoding label for the XML declaration.
///
/// Only the label's shape is checked; no transcoding happens.
///
/// # Examples
/// ```
/// use xmlscope_engine::config::validate_encoding;
///
/// assert!(validate_encoding("utf-8").is_ok());
/// assert!(validate_encoding("ISO-8859-1").is_ok());
/// assert!(validate_encoding("utf 8").is_err());
/// ```
pub fn validate_encoding(encoding: &str) -> Result<()> {
    if ENCODING_PATTERN.is_match(encoding) {
        Ok(())
    } else {
        Err(BuildError::InvalidEncoding(encoding.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name_valid() {
        assert!(validate_name("html").is_ok());
        assert!(validate_name("my-tag").is_ok());
        assert!(validate_name("_x.y").is_ok());
        assert!(validate_name("xlink:href").is_ok());
        assert!(validate_name("überschrift").is_ok());
    }

    #[test]
    fn test_validate_name_invalid() {
        assert!(validate_name("").is_err());
        assert!(validate_name("1abc").is_err());
        assert!(validate_name("a b").is_err());
        assert!(validate_name("a:b:c").is_err());
        assert!(validate_name("<script>").is_err());
        assert!(validate_name("-x").is_err());
    }

    #[test]
    fn test_validate_encoding() {
        assert!(validate_encoding("utf-8").is_ok());
        assert!(validate_encoding("UTF-16").is_ok());
        assert!(validate_encoding("").is_err());
        assert!(validate_encoding("8bit").is_err());
        assert!(validate_encoding("utf-8\"?>").is_err());
    }

    #[test]
    fn test_is_reserved() {
        assert!(is_reserved("__class__"));
        assert!(is_reserved("__"));
        assert!(!is_reserved("_"));
        assert!(!is_reserved("div__"));
    }

    #[test]
    fn test_constants_are_reasonable() {
        assert_eq!(DEFAULT_ENCODING, "utf-8");
        assert!(MAX_SCOPE_DEPTH >= 64, "Should allow deep documents");
        assert!(MAX_SCOPE_DEPTH <= 4096, "Should limit extreme nesting");
        assert!(PRETTY_INDENT_WIDTH > 0);
    }
}
