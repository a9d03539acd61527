//! # xmptree
//!
//! Parser, node tree and renderer for XMP metadata packets.
//!
//! An XMP packet is an RDF/XML fragment embedded in a media file. This crate
//! takes the packet as a string (already extracted from its container),
//! parses it into a tree of [`Node`]s following the RDF/XML grammar that XMP
//! producers use, indexes the tree for lookups by namespace and name, and
//! renders a tree back to RDF/XML.
//!
//! ```
//! use xmptree::{ns, XmpTag};
//!
//! let packet = r#"<x:xmpmeta xmlns:x="adobe:ns:meta/">
//!   <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
//!            xmlns:dc="http://purl.org/dc/elements/1.1/">
//!     <rdf:Description rdf:about="">
//!       <dc:subject><rdf:Bag><rdf:li>sky</rdf:li></rdf:Bag></dc:subject>
//!     </rdf:Description>
//!   </rdf:RDF>
//! </x:xmpmeta>"#;
//!
//! let tag: XmpTag = packet.parse().unwrap();
//! assert_eq!(tag.keywords(), vec!["sky"]);
//! assert!(tag.find(ns::DC, "subject").is_some());
//!
//! let rendered = tag.render().unwrap();
//! assert!(rendered.contains("<rdf:li>sky</rdf:li>"));
//! ```
//!
//! No logger is installed by the library; it emits through the `log` facade.

pub mod core;

pub use crate::core::{
    build_index, ns, Atom, Document, Index, NamespaceRegistry, Node, NodeKind, NodeTree,
    ParserOptions, PropertyElementKind, XmpError, XmpParser, XmpResult, XmpSerializer, XmpTag,
};
