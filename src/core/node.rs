//! XMP node types
//!
//! Every property of a packet, whether a plain value, a structure or an
//! array, is a [`Node`]. A node's [`NodeKind`] says how its children are to be
//! read:
//! - `Simple`: a leaf carrying a value
//! - `Struct`: named fields (`rdf:Description` / `rdf:parseType="Resource"`)
//! - `Seq` / `Alt` / `Bag`: ordered, alternative and unordered arrays

use crate::core::namespace::{ns, Atom};

/// Kind of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum NodeKind {
    /// A simple value (until a nested node element says otherwise)
    #[default]
    Simple,
    /// A structure containing named fields
    Struct,
    /// Ordered array (rdf:Seq)
    Seq,
    /// Alternative array (rdf:Alt)
    Alt,
    /// Unordered array (rdf:Bag)
    Bag,
}

impl NodeKind {
    /// Local name of the RDF node element for this kind
    pub fn rdf_type(&self) -> &'static str {
        match self {
            NodeKind::Simple | NodeKind::Struct => "Description",
            NodeKind::Seq => "Seq",
            NodeKind::Alt => "Alt",
            NodeKind::Bag => "Bag",
        }
    }

    /// Check if this is one of the array kinds
    pub fn is_array(&self) -> bool {
        matches!(self, NodeKind::Seq | NodeKind::Alt | NodeKind::Bag)
    }
}

/// A node in the XMP data model
///
/// A node exclusively owns its qualifiers and children. `qualifiers` hold
/// annotations such as `xml:lang`; they are nodes themselves but are never
/// indexed and never count as children.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Node {
    /// Namespace URI
    pub namespace: Atom,
    /// Local name
    pub name: String,
    /// Kind of the node
    pub kind: NodeKind,
    /// Value of a simple or literal leaf
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub value: Option<String>,
    /// Qualifiers attached to this node
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Vec::is_empty"))]
    pub qualifiers: Vec<Node>,
    /// Children in document order
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Vec::is_empty"))]
    pub children: Vec<Node>,
}

/// The root of a parsed packet
///
/// Always `Struct`, named after the packet's `rdf:about` value.
pub type NodeTree = Node;

impl Node {
    /// Create a new simple node without a value
    pub fn new(namespace: Atom, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
            kind: NodeKind::Simple,
            value: None,
            qualifiers: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create a new simple node with a value
    pub fn simple(namespace: Atom, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut node = Self::new(namespace, name);
        node.value = Some(value.into());
        node
    }

    /// Create a new node of the given kind
    pub fn with_kind(namespace: Atom, name: impl Into<String>, kind: NodeKind) -> Self {
        let mut node = Self::new(namespace, name);
        node.kind = kind;
        node
    }

    /// Check namespace and local name
    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.namespace == namespace && self.name == name
    }

    /// Append a child
    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Attach a qualifier
    pub fn add_qualifier(&mut self, qualifier: Node) {
        self.qualifiers.push(qualifier);
    }

    /// Get a qualifier by name
    pub fn qualifier(&self, namespace: &str, name: &str) -> Option<&Node> {
        self.qualifiers.iter().find(|q| q.is(namespace, name))
    }

    /// Remove all qualifiers with this name
    pub fn remove_qualifier(&mut self, namespace: &str, name: &str) -> bool {
        let initial_len = self.qualifiers.len();
        self.qualifiers.retain(|q| !q.is(namespace, name));
        self.qualifiers.len() < initial_len
    }

    /// Get the first child with this name
    pub fn child(&self, namespace: &str, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.is(namespace, name))
    }

    /// Value of the `xml:lang` qualifier
    pub fn lang(&self) -> Option<&str> {
        self.qualifier(ns::XML, "lang")
            .and_then(|q| q.value.as_deref())
    }

    /// A node without children (qualifiers do not count)
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Values of the children, in document order
    ///
    /// Children without a value are skipped.
    pub fn item_values(&self) -> Vec<String> {
        self.children
            .iter()
            .filter_map(|child| child.value.clone())
            .collect()
    }
}
