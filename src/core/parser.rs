//! XMP RDF/XML parser
//!
//! This module turns the element tree of an XMP packet into a [`NodeTree`].
//! The grammar is a set of mutually recursive productions over
//! [`Element`]s: the `rdf:RDF` top level, node elements and property
//! elements. Property elements are classified by
//! [`XmpParser::classify_property_element`] before being parsed.
//!
//! The first grammar violation aborts the parse; no partial tree is returned.

use crate::core::error::{XmpError, XmpResult};
use crate::core::namespace::{ns, Atom, NamespaceRegistry};
use crate::core::node::{Node, NodeKind, NodeTree};
use crate::core::xml::{Attribute, Document, Element, XmlNode, DEFAULT_MAX_DEPTH};

/// Parser configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Accept a document whose root element is `rdf:RDF` (no `x:xmpmeta`)
    pub allow_bare_rdf: bool,
    /// Maximum element nesting depth
    pub max_depth: usize,
}

impl ParserOptions {
    /// Create the default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether a bare `rdf:RDF` root is accepted
    pub fn allow_bare_rdf(mut self, allow: bool) -> Self {
        self.allow_bare_rdf = allow;
        self
    }

    /// Set the maximum element nesting depth
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            allow_bare_rdf: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Grammar form of a property element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyElementKind {
    /// Contains a node element (`rdf:Seq`, `rdf:Description`, ...)
    Resource,
    /// Text content
    Literal,
    /// `rdf:parseType="Resource"`, an inline structure
    ParseTypeResource,
    /// No content; the value (if any) lives in attributes
    Empty,
}

/// Namespace atoms the grammar compares against
#[derive(Debug, Clone)]
struct Vocabulary {
    rdf: Atom,
    xml: Atom,
    xmlns: Atom,
    meta: Atom,
    empty: Atom,
}

impl Vocabulary {
    fn new(registry: &mut NamespaceRegistry) -> Self {
        Self {
            rdf: registry.intern(ns::RDF),
            xml: registry.intern(ns::XML),
            xmlns: registry.intern(ns::XMLNS),
            meta: registry.intern(ns::ADOBE_META),
            empty: registry.intern(""),
        }
    }
}

fn violation(err: XmpError) -> XmpError {
    log::warn!("Rejecting XMP packet: {err}");
    err
}

fn is_content_text(node: &XmlNode) -> bool {
    matches!(node, XmlNode::Text(text) if !text.trim().is_empty())
}

/// Parser for XMP Packets
pub struct XmpParser {
    registry: NamespaceRegistry,
    options: ParserOptions,
    vocab: Vocabulary,
}

impl XmpParser {
    /// Create a new XMP parser with default options
    pub fn new() -> Self {
        Self::with_options(ParserOptions::default())
    }

    /// Create a new XMP parser with the given options
    pub fn with_options(options: ParserOptions) -> Self {
        let mut registry = NamespaceRegistry::new();
        let vocab = Vocabulary::new(&mut registry);
        Self {
            registry,
            options,
            vocab,
        }
    }

    /// Create a new XMP parser interning into an existing registry
    pub fn with_registry(mut registry: NamespaceRegistry, options: ParserOptions) -> Self {
        let vocab = Vocabulary::new(&mut registry);
        Self {
            registry,
            options,
            vocab,
        }
    }

    /// The registry namespaces are interned into
    pub fn registry(&self) -> &NamespaceRegistry {
        &self.registry
    }

    /// Take the registry back out of the parser
    pub fn into_registry(self) -> NamespaceRegistry {
        self.registry
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parse an XMP packet
    ///
    /// The input may still carry its `<?xpacket?>` wrapper.
    pub fn parse(&mut self, xml: &str) -> XmpResult<NodeTree> {
        let document =
            Document::parse_with_max_depth(xml, &mut self.registry, self.options.max_depth)?;
        self.parse_document(&document)
    }

    /// Parse an already built element tree
    pub fn parse_document(&self, document: &Document) -> XmpResult<NodeTree> {
        let rdf = self.locate_rdf(&document.root)?;
        self.parse_rdf(rdf)
    }

    fn locate_rdf<'a>(&self, root: &'a Element) -> XmpResult<&'a Element> {
        let v = &self.vocab;
        if root.is(&v.meta, "xmpmeta") || root.is(&v.meta, "xapmeta") {
            let rdf = root.child_elements().find(|e| e.is(&v.rdf, "RDF"));
            if let Some(rdf) = rdf {
                log::debug!("Found `rdf:RDF` inside `{}`.", root.qualified_name());
                return Ok(rdf);
            }
        } else if self.options.allow_bare_rdf && root.is(&v.rdf, "RDF") {
            log::debug!("Accepting bare `rdf:RDF` root.");
            return Ok(root);
        }
        Err(violation(XmpError::MissingRdfRoot))
    }

    /// Parse the children of `rdf:RDF` into the root node
    fn parse_rdf(&self, rdf: &Element) -> XmpResult<NodeTree> {
        let v = &self.vocab;
        let mut about: Option<&str> = None;
        let mut descriptions = Vec::new();

        for child in &rdf.children {
            match child {
                XmlNode::Element(e) => {
                    if !e.is(&v.rdf, "Description") {
                        return Err(violation(XmpError::UnexpectedTopLevelElement {
                            element: e.qualified_name(),
                        }));
                    }
                    if let Some(attr) = e.attribute(&v.rdf, "about") {
                        let value = attr.value.as_str();
                        match about {
                            _ if value.is_empty() => {}
                            Some(first) if first != value => {
                                return Err(violation(XmpError::InconsistentAbout {
                                    first: first.to_string(),
                                    second: value.to_string(),
                                }));
                            }
                            Some(_) => {}
                            None => about = Some(value),
                        }
                    }
                    descriptions.push(e);
                }
                text if is_content_text(text) => {
                    return Err(violation(XmpError::TextNotAllowedHere {
                        element: rdf.qualified_name(),
                    }));
                }
                _ => {}
            }
        }

        log::debug!(
            "Parsing {} top-level description(s), about = {:?}.",
            descriptions.len(),
            about
        );
        let mut root = Node::with_kind(
            v.empty.clone(),
            about.unwrap_or_default(),
            NodeKind::Struct,
        );
        for description in descriptions {
            self.parse_node_attributes(description, &mut root)?;
            self.parse_property_elements(description, &mut root)?;
        }
        Ok(root)
    }

    /// Parse a node element into `node`, setting its kind first
    fn parse_node_element(&self, element: &Element, node: &mut Node) -> XmpResult<()> {
        let v = &self.vocab;
        node.kind = if element.is(&v.rdf, "Seq") {
            NodeKind::Seq
        } else if element.is(&v.rdf, "Alt") {
            NodeKind::Alt
        } else if element.is(&v.rdf, "Bag") {
            NodeKind::Bag
        } else if element.is(&v.rdf, "Description") {
            NodeKind::Struct
        } else {
            return Err(violation(XmpError::UnknownCollectionType {
                element: element.qualified_name(),
            }));
        };
        log::trace!(
            "Node element `{}` gives `{}` kind {:?}.",
            element.qualified_name(),
            node.name,
            node.kind
        );

        self.parse_node_attributes(element, node)?;
        self.parse_property_elements(element, node)
    }

    /// Attributes of a node element become simple children
    fn parse_node_attributes(&self, element: &Element, node: &mut Node) -> XmpResult<()> {
        let v = &self.vocab;
        for attr in &element.attributes {
            if self.is_declaration(attr)
                || attr.is(&v.rdf, "about")
                || attr.is(&v.rdf, "ID")
                || attr.is(&v.rdf, "nodeID")
            {
                continue;
            }
            if self.is_lang(attr) {
                return Err(violation(XmpError::DisallowedQualifierHere {
                    element: element.qualified_name(),
                }));
            }
            node.add_child(attribute_node(attr));
        }
        Ok(())
    }

    fn parse_property_elements(&self, element: &Element, node: &mut Node) -> XmpResult<()> {
        for child in &element.children {
            match child {
                XmlNode::Element(e) => self.parse_property_element(e, node)?,
                text if is_content_text(text) => {
                    return Err(violation(XmpError::TextNotAllowedHere {
                        element: element.qualified_name(),
                    }));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn parse_property_element(&self, element: &Element, parent: &mut Node) -> XmpResult<()> {
        let kind = self.classify_property_element(element)?;
        log::trace!(
            "Property element `{}` classified as {:?}.",
            element.qualified_name(),
            kind
        );

        let node = match kind {
            PropertyElementKind::Resource => self.parse_resource_property(element)?,
            PropertyElementKind::Literal => self.parse_literal_property(element),
            PropertyElementKind::ParseTypeResource => {
                self.parse_type_resource_property(element)?
            }
            PropertyElementKind::Empty => self.parse_empty_property(element)?,
        };
        parent.add_child(node);
        Ok(())
    }

    /// Decide which grammar form a property element takes
    ///
    /// Four or more attributes always mean the empty form. Without any
    /// attribute besides `xml:lang` and `rdf:ID`, the content shape decides.
    /// Otherwise the first attribute (in document order) that is not
    /// `xml:lang` or `rdf:ID` decides.
    pub fn classify_property_element(&self, element: &Element) -> XmpResult<PropertyElementKind> {
        let v = &self.vocab;
        let mut count = 0;
        let mut has_other = false;
        for attr in &element.attributes {
            if self.is_declaration(attr) {
                continue;
            }
            count += 1;
            if !self.is_lang(attr) && !attr.is(&v.rdf, "ID") {
                has_other = true;
            }
        }

        if count > 3 {
            return Ok(PropertyElementKind::Empty);
        }

        if !has_other {
            let mut has_text = false;
            for child in &element.children {
                match child {
                    XmlNode::Element(_) => return Ok(PropertyElementKind::Resource),
                    XmlNode::Text(_) => has_text = true,
                    XmlNode::Comment(_) => {}
                }
            }
            return Ok(if has_text {
                PropertyElementKind::Literal
            } else {
                PropertyElementKind::Empty
            });
        }

        for attr in &element.attributes {
            if self.is_declaration(attr) || self.is_lang(attr) || attr.is(&v.rdf, "ID") {
                continue;
            }
            if attr.is(&v.rdf, "datatype") {
                return Ok(PropertyElementKind::Literal);
            }
            if !attr.is(&v.rdf, "parseType") {
                return Ok(PropertyElementKind::Empty);
            }
            if attr.value == "Resource" {
                return Ok(PropertyElementKind::ParseTypeResource);
            }
            return Err(violation(XmpError::UnsupportedParseType {
                element: element.qualified_name(),
                parse_type: attr.value.clone(),
            }));
        }

        Ok(PropertyElementKind::Empty)
    }

    fn parse_resource_property(&self, element: &Element) -> XmpResult<Node> {
        let v = &self.vocab;
        let mut node = Node::new(element.namespace.clone(), element.local_name.clone());
        for attr in &element.attributes {
            if self.is_declaration(attr) || attr.is(&v.rdf, "ID") {
                continue;
            }
            if self.is_lang(attr) {
                node.add_qualifier(attribute_node(attr));
                continue;
            }
            return Err(violation(XmpError::InvalidPropertyAttribute {
                element: element.qualified_name(),
                attribute: attr.qualified_name(),
            }));
        }

        let mut found_node_element = false;
        for child in &element.children {
            match child {
                XmlNode::Element(_) if found_node_element => {
                    return Err(violation(XmpError::MultipleNodeElements {
                        element: element.qualified_name(),
                    }));
                }
                XmlNode::Element(e) => {
                    self.parse_node_element(e, &mut node)?;
                    found_node_element = true;
                }
                text if is_content_text(text) => {
                    return Err(violation(XmpError::TextNotAllowedHere {
                        element: element.qualified_name(),
                    }));
                }
                _ => {}
            }
        }
        if !found_node_element {
            return Err(violation(XmpError::MissingRequiredChildren {
                element: element.qualified_name(),
            }));
        }
        Ok(node)
    }

    fn parse_literal_property(&self, element: &Element) -> Node {
        let ignored = element.child_elements().count();
        if ignored > 0 {
            log::warn!(
                "Ignoring {} element child(ren) of literal property `{}`.",
                ignored,
                element.qualified_name()
            );
        }
        let mut node = Node::simple(
            element.namespace.clone(),
            element.local_name.clone(),
            element.text(),
        );
        for attr in &element.attributes {
            if !self.is_declaration(attr) {
                node.add_qualifier(attribute_node(attr));
            }
        }
        node
    }

    fn parse_type_resource_property(&self, element: &Element) -> XmpResult<Node> {
        let mut node = Node::with_kind(
            element.namespace.clone(),
            element.local_name.clone(),
            NodeKind::Struct,
        );
        let v = &self.vocab;
        if let Some(lang) = element.attribute(&v.xml, "lang") {
            node.add_qualifier(attribute_node(lang));
        }
        let ignored = element
            .attributes
            .iter()
            .filter(|attr| {
                !self.is_declaration(attr)
                    && !self.is_lang(attr)
                    && !attr.is(&v.rdf, "parseType")
                    && !attr.is(&v.rdf, "ID")
            })
            .count();
        if ignored > 0 {
            log::warn!(
                "Ignoring {} attribute(s) of `rdf:parseType=\"Resource\"` element `{}`.",
                ignored,
                element.qualified_name()
            );
        }
        self.parse_property_elements(element, &mut node)?;
        Ok(node)
    }

    fn parse_empty_property(&self, element: &Element) -> XmpResult<Node> {
        let v = &self.vocab;
        let has_content = element
            .children
            .iter()
            .any(|child| matches!(child, XmlNode::Element(_)) || is_content_text(child));
        if has_content {
            return Err(violation(XmpError::ContentNotAllowedInEmptyElement {
                element: element.qualified_name(),
            }));
        }

        let chosen = element
            .attribute(&v.rdf, "value")
            .or_else(|| element.attribute(&v.rdf, "resource"));

        if let Some(chosen) = chosen {
            let mut node = Node::simple(
                element.namespace.clone(),
                element.local_name.clone(),
                chosen.value.clone(),
            );
            for attr in &element.attributes {
                if self.is_declaration(attr) || std::ptr::eq(attr, chosen) {
                    continue;
                }
                node.add_qualifier(attribute_node(attr));
            }
            return Ok(node);
        }

        let mut node = Node::with_kind(
            element.namespace.clone(),
            element.local_name.clone(),
            NodeKind::Struct,
        );
        for attr in &element.attributes {
            if self.is_declaration(attr) || attr.is(&v.rdf, "ID") || attr.is(&v.rdf, "nodeID") {
                continue;
            }
            // `xml:lang` is kept both as a qualifier and as a field
            if self.is_lang(attr) {
                node.add_qualifier(attribute_node(attr));
            }
            node.add_child(attribute_node(attr));
        }
        Ok(node)
    }

    fn is_declaration(&self, attr: &Attribute) -> bool {
        attr.namespace == self.vocab.xmlns
    }

    fn is_lang(&self, attr: &Attribute) -> bool {
        attr.is(&self.vocab.xml, "lang")
    }
}

impl Default for XmpParser {
    fn default() -> Self {
        Self::new()
    }
}

fn attribute_node(attr: &Attribute) -> Node {
    Node::simple(
        attr.namespace.clone(),
        attr.local_name.clone(),
        attr.value.clone(),
    )
}
