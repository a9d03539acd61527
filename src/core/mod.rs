//! XMP Core module
//!
//! This module contains the core functionality for XMP metadata processing:
//! the XML element tree, the RDF grammar parser, the node tree and its
//! index, and the serializer.

pub mod error;
pub mod metadata;
pub mod namespace;
pub mod node;
pub mod parser;
pub mod serializer;
pub mod xml;

pub use error::{XmpError, XmpResult};
pub use metadata::{build_index, Index, XmpTag};
pub use namespace::{ns, Atom, NamespaceRegistry};
pub use node::{Node, NodeKind, NodeTree};
pub use parser::{ParserOptions, PropertyElementKind, XmpParser};
pub use serializer::XmpSerializer;
pub use xml::Document;
