//! Error types for XMP operations
//!
//! Every grammar violation found while turning an XMP packet into a node tree
//! has its own variant. All of them are fatal to the call that raised them.

use thiserror::Error;

/// Error types for XMP operations
#[derive(Debug, Error)]
pub enum XmpError {
    /// The input is not well-formed XML (or nests deeper than allowed)
    #[error("Malformed XML: {0}")]
    MalformedXml(String),

    /// Neither `x:xmpmeta` nor `x:xapmeta` wraps an `rdf:RDF` element
    #[error("Corrupt XMP: no `x:xmpmeta/rdf:RDF` element found")]
    MissingRdfRoot,

    /// A direct child of `rdf:RDF` is not `rdf:Description`
    #[error("Unexpected top-level element `{element}` (only `rdf:Description` is allowed)")]
    UnexpectedTopLevelElement { element: String },

    /// Two descriptions disagree on `rdf:about`
    #[error("Inconsistent `rdf:about` values: `{first}` and `{second}`")]
    InconsistentAbout { first: String, second: String },

    /// A node element is not `rdf:Seq`, `rdf:Alt`, `rdf:Bag` or `rdf:Description`
    #[error("Unknown collection type `{element}`")]
    UnknownCollectionType { element: String },

    /// `xml:lang` found on a node element
    #[error("`xml:lang` is not allowed on node element `{element}`")]
    DisallowedQualifierHere { element: String },

    /// `rdf:parseType` other than `Resource`
    #[error("`rdf:parseType=\"{parse_type}\"` on `{element}` is not allowed in XMP")]
    UnsupportedParseType { element: String, parse_type: String },

    /// Attribute not permitted on a resource property element
    #[error("Attribute `{attribute}` is not allowed on resource property element `{element}`")]
    InvalidPropertyAttribute { element: String, attribute: String },

    /// Text where only element children are permitted
    #[error("Text content is not allowed in `{element}`")]
    TextNotAllowedHere { element: String },

    /// Resource property element without a node element child
    #[error("Resource property element `{element}` has no node element")]
    MissingRequiredChildren { element: String },

    /// Resource property element with more than one node element child
    #[error("Resource property element `{element}` has more than one node element")]
    MultipleNodeElements { element: String },

    /// An empty property element carries content
    #[error("Empty property element `{element}` must not have content")]
    ContentNotAllowedInEmptyElement { element: String },

    /// Bad parameter provided to a function
    #[error("Bad parameter: {0}")]
    BadParam(String),

    /// Operation not supported
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for XMP operations
pub type XmpResult<T> = Result<T, XmpError>;
