//! xmlscope render - Render document outlines to XML.
//!
//! This crate turns YAML or JSON outlines into XML documents using the
//! `xmlscope-engine` builder, and provides the `xmlscope` command-line tool.
//!
//! # Example
//!
//! ```
//! use xmlscope_engine::{ResolutionPolicy, SerializeOptions};
//! use xmlscope_render::outline::{render, OutlineFormat};
//!
//! let outline = OutlineFormat::Yaml.parse("tag: p\ntext: Hello").unwrap();
//! let text = render(&outline, ResolutionPolicy::open(), &SerializeOptions::default()).unwrap();
//! assert_eq!(text, "<p>Hello</p>");
//! ```
//!
//! # Architecture
//!
//! - [`outline`]: Outline types, loading and rendering
//! - [`error`]: Error types and Result alias
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod error;
pub mod outline;

// Re-export commonly used items
pub use error::{RenderError, Result};
pub use outline::{load, render, OutlineFormat, OutlineNode};
