//! XMP Metadata
//!
//! This module provides [`XmpTag`], a parsed packet together with the lookup
//! index built from it, and the typed accessors for well-known properties.

use crate::core::error::{XmpError, XmpResult};
use crate::core::namespace::ns;
use crate::core::node::{Node, NodeKind, NodeTree};
use crate::core::parser::XmpParser;
use crate::core::serializer::XmpSerializer;
use std::str::FromStr;

pub mod index;

pub use index::{build_index, Index};

/// A parsed XMP packet
///
/// The index is a snapshot of the tree taken at construction. The tree is
/// read-only while it is held by the tag; to edit it, take it out with
/// [`XmpTag::into_tree`] and build a new tag with [`XmpTag::from_tree`].
#[derive(Debug, Clone, PartialEq)]
pub struct XmpTag {
    tree: NodeTree,
    index: Index,
}

impl XmpTag {
    /// Parse XMP metadata from a string
    ///
    /// The string should contain a complete XMP Packet (with or without
    /// the `<?xpacket>` wrapper).
    pub fn parse(s: &str) -> XmpResult<Self> {
        Self::parse_with(&mut XmpParser::new(), s)
    }

    /// Parse with a configured parser
    pub fn parse_with(parser: &mut XmpParser, s: &str) -> XmpResult<Self> {
        let tree = parser.parse(s)?;
        Ok(Self::from_tree(tree))
    }

    /// Wrap an existing tree and index it
    pub fn from_tree(tree: NodeTree) -> Self {
        let index = build_index(&tree);
        Self { tree, index }
    }

    /// The root of the node tree
    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    /// Give up the index and return the tree
    pub fn into_tree(self) -> NodeTree {
        self.tree
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    /// The `rdf:about` value of the packet (empty when absent)
    pub fn about(&self) -> &str {
        &self.tree.name
    }

    /// Find a property by namespace URI and local name
    ///
    /// Returns `None` on any miss. When the name occurs more than once in
    /// the packet, the last occurrence is returned.
    pub fn find(&self, namespace: &str, name: &str) -> Option<&Node> {
        self.index.resolve(&self.tree, namespace, name)
    }

    /// Value of a simple property
    pub fn value(&self, namespace: &str, name: &str) -> Option<&str> {
        self.find(namespace, name)?.value.as_deref()
    }

    /// Item values of an array property, in document order
    pub fn values(&self, namespace: &str, name: &str) -> Vec<String> {
        self.find(namespace, name)
            .map(Node::item_values)
            .unwrap_or_default()
    }

    /// Default text of a language alternative
    ///
    /// The `x-default` item, else the first item. A simple node yields its
    /// own value.
    pub fn localized_text(&self, namespace: &str, name: &str) -> Option<&str> {
        let node = self.find(namespace, name)?;
        if node.kind != NodeKind::Alt && node.is_leaf() {
            return node.value.as_deref();
        }
        node.children
            .iter()
            .find(|item| item.lang() == Some("x-default"))
            .or_else(|| node.children.first())
            .and_then(|item| item.value.as_deref())
    }

    /// Keywords (`dc:subject`)
    pub fn keywords(&self) -> Vec<String> {
        self.values(ns::DC, "subject")
    }

    /// Creators (`dc:creator`)
    pub fn creators(&self) -> Vec<String> {
        self.values(ns::DC, "creator")
    }

    /// Title (`dc:title`)
    pub fn title(&self) -> Option<&str> {
        self.localized_text(ns::DC, "title")
    }

    /// Description (`dc:description`)
    pub fn description(&self) -> Option<&str> {
        self.localized_text(ns::DC, "description")
    }

    /// Copyright notice (`dc:rights`)
    pub fn rights(&self) -> Option<&str> {
        self.localized_text(ns::DC, "rights")
    }

    /// Camera manufacturer (`tiff:Make`)
    pub fn camera_make(&self) -> Option<&str> {
        self.value(ns::TIFF, "Make")
    }

    /// Camera model (`tiff:Model`)
    pub fn camera_model(&self) -> Option<&str> {
        self.value(ns::TIFF, "Model")
    }

    /// Lens description (`aux:Lens`)
    pub fn lens_model(&self) -> Option<&str> {
        self.value(ns::EXIF_AUX, "Lens")
    }

    /// Tool that created the asset (`xmp:CreatorTool`)
    pub fn creator_tool(&self) -> Option<&str> {
        self.value(ns::XMP, "CreatorTool")
    }

    pub fn create_date(&self) -> Option<&str> {
        self.value(ns::XMP, "CreateDate")
    }

    pub fn modify_date(&self) -> Option<&str> {
        self.value(ns::XMP, "ModifyDate")
    }

    /// User rating (`xmp:Rating`), as written in the packet
    pub fn rating(&self) -> Option<&str> {
        self.value(ns::XMP, "Rating")
    }

    /// Capture time (`exif:DateTimeOriginal`)
    pub fn date_time_original(&self) -> Option<&str> {
        self.value(ns::EXIF, "DateTimeOriginal")
    }

    /// Remove all properties
    ///
    /// Not supported: always returns [`XmpError::NotSupported`].
    pub fn clear(&mut self) -> XmpResult<()> {
        Err(XmpError::NotSupported(
            "clearing an XMP tag is not implemented".to_string(),
        ))
    }

    /// Serialize to RDF/XML string
    pub fn render(&self) -> XmpResult<String> {
        XmpSerializer::new().render(&self.tree)
    }

    /// Serialize to XMP Packet format
    pub fn render_packet(&self) -> XmpResult<String> {
        XmpSerializer::new().render_packet(&self.tree)
    }
}

impl FromStr for XmpTag {
    type Err = XmpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
