//! Generic XML element tree
//!
//! A small namespace-resolved DOM built from `quick-xml` events. It has no
//! RDF knowledge: it records elements, attributes, text and comments in
//! document order and leaves all interpretation to the RDF parser.
//!
//! Text is kept verbatim (no trimming), since whitespace-only text is part of
//! the content shape the RDF grammar inspects.

use crate::core::error::{XmpError, XmpResult};
use crate::core::namespace::{ns, Atom, NamespaceRegistry};
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{QName, ResolveResult};
use quick_xml::NsReader;

/// Default bound on element nesting
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// A namespace-resolved attribute
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Namespace URI (empty for unprefixed attributes)
    pub namespace: Atom,
    /// Prefix as written in the document
    pub prefix: Option<String>,
    /// Local name
    pub local_name: String,
    /// Unescaped value
    pub value: String,
}

impl Attribute {
    /// Check namespace and local name
    pub fn is(&self, namespace: &Atom, local_name: &str) -> bool {
        self.namespace == *namespace && self.local_name == local_name
    }

    /// Name as written in the document, or `{uri}local` when unprefixed
    pub fn qualified_name(&self) -> String {
        qualified(&self.namespace, self.prefix.as_deref(), &self.local_name)
    }
}

/// A child of an element
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(Element),
    Text(String),
    Comment(String),
}

impl XmlNode {
    /// Whitespace-only text or a comment
    pub fn is_ignorable(&self) -> bool {
        match self {
            XmlNode::Element(_) => false,
            XmlNode::Text(text) => text.trim().is_empty(),
            XmlNode::Comment(_) => true,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            XmlNode::Element(element) => Some(element),
            _ => None,
        }
    }
}

/// A namespace-resolved element
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Namespace URI (empty when unqualified and no default namespace applies)
    pub namespace: Atom,
    /// Prefix as written in the document
    pub prefix: Option<String>,
    /// Local name
    pub local_name: String,
    /// Attributes in document order, namespace declarations included
    pub attributes: Vec<Attribute>,
    /// Children in document order
    pub children: Vec<XmlNode>,
}

impl Element {
    /// Check namespace and local name
    pub fn is(&self, namespace: &Atom, local_name: &str) -> bool {
        self.namespace == *namespace && self.local_name == local_name
    }

    /// Name as written in the document, or `{uri}local` when unprefixed
    pub fn qualified_name(&self) -> String {
        qualified(&self.namespace, self.prefix.as_deref(), &self.local_name)
    }

    /// Find an attribute by namespace and local name
    pub fn attribute(&self, namespace: &Atom, local_name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|attr| attr.is(namespace, local_name))
    }

    /// Iterate over child elements
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    /// Concatenated text children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                XmlNode::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

fn qualified(namespace: &Atom, prefix: Option<&str>, local_name: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}:{}", prefix, local_name),
        None if namespace.is_empty() => local_name.to_string(),
        None => format!("{{{}}}{}", namespace, local_name),
    }
}

/// A parsed XML document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root: Element,
}

impl Document {
    /// Parse a document, interning namespaces into `registry`
    pub fn parse(xml: &str, registry: &mut NamespaceRegistry) -> XmpResult<Self> {
        Self::parse_with_max_depth(xml, registry, DEFAULT_MAX_DEPTH)
    }

    /// Parse a document, failing if elements nest deeper than `max_depth`
    pub fn parse_with_max_depth(
        xml: &str,
        registry: &mut NamespaceRegistry,
        max_depth: usize,
    ) -> XmpResult<Self> {
        let mut builder = TreeBuilder::new(registry);
        let mut reader = NsReader::from_str(xml);

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    builder.check_depth(max_depth)?;
                    let element = builder.start_element(&reader, &e)?;
                    builder.stack.push(element);
                }
                Ok(Event::Empty(e)) => {
                    builder.check_depth(max_depth)?;
                    let element = builder.start_element(&reader, &e)?;
                    builder.attach(XmlNode::Element(element))?;
                }
                Ok(Event::End(_)) => {
                    let element = builder.stack.pop().ok_or_else(|| {
                        XmpError::MalformedXml("unexpected closing tag".to_string())
                    })?;
                    builder.attach(XmlNode::Element(element))?;
                }
                Ok(Event::Text(e)) => {
                    let raw_text = String::from_utf8_lossy(e.as_ref());
                    let text = unescape(&raw_text)
                        .map_err(|err| XmpError::MalformedXml(err.to_string()))?;
                    builder.text(&text);
                }
                Ok(Event::CData(e)) => {
                    builder.text(&String::from_utf8_lossy(e.as_ref()));
                }
                Ok(Event::GeneralRef(e)) => {
                    // entity and character references arrive as their own events
                    let resolved = match e
                        .resolve_char_ref()
                        .map_err(|err| XmpError::MalformedXml(err.to_string()))?
                    {
                        Some(ch) => ch.to_string(),
                        None => {
                            let name = String::from_utf8_lossy(e.as_ref()).to_string();
                            resolve_predefined_entity(&name)
                                .ok_or_else(|| {
                                    XmpError::MalformedXml(format!(
                                        "unknown entity reference `&{};`",
                                        name
                                    ))
                                })?
                                .to_string()
                        }
                    };
                    builder.text(&resolved);
                }
                Ok(Event::Comment(e)) => {
                    builder.comment(String::from_utf8_lossy(e.as_ref()).to_string());
                }
                Ok(Event::Eof) => break,
                // declarations, processing instructions (`<?xpacket?>`) and doctypes
                Ok(_) => {}
                Err(e) => {
                    return Err(XmpError::MalformedXml(format!(
                        "XML parsing error at position {}: {}",
                        reader.error_position(),
                        e
                    )));
                }
            }
        }

        builder.finish()
    }
}

struct TreeBuilder<'r> {
    registry: &'r mut NamespaceRegistry,
    stack: Vec<Element>,
    root: Option<Element>,
    xml: Atom,
    xmlns: Atom,
}

impl<'r> TreeBuilder<'r> {
    fn new(registry: &'r mut NamespaceRegistry) -> Self {
        let xml = registry.intern(ns::XML);
        let xmlns = registry.intern(ns::XMLNS);
        Self {
            registry,
            stack: Vec::new(),
            root: None,
            xml,
            xmlns,
        }
    }

    fn check_depth(&self, max_depth: usize) -> XmpResult<()> {
        if self.stack.len() >= max_depth {
            return Err(XmpError::MalformedXml(format!(
                "elements nest deeper than {} levels",
                max_depth
            )));
        }
        Ok(())
    }

    fn start_element(
        &mut self,
        reader: &NsReader<&[u8]>,
        e: &BytesStart<'_>,
    ) -> XmpResult<Element> {
        let (resolved, local) = reader.resolve_element(e.name());
        let namespace = self.namespace_of(resolved, e.name())?;
        let local_name = String::from_utf8_lossy(local.as_ref()).to_string();
        let prefix = e
            .name()
            .prefix()
            .map(|p| String::from_utf8_lossy(p.as_ref()).to_string());

        let mut attributes = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| XmpError::MalformedXml(err.to_string()))?;
            let raw_value = String::from_utf8_lossy(attr.value.as_ref());
            let value = unescape(&raw_value)
                .map_err(|err| XmpError::MalformedXml(err.to_string()))?
                .to_string();

            let key = attr.key.as_ref();
            let attr_prefix = attr
                .key
                .prefix()
                .map(|p| String::from_utf8_lossy(p.as_ref()).to_string());
            let attr_local = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_string();

            let attr_namespace = if key == b"xmlns" || key.starts_with(b"xmlns:") {
                self.xmlns.clone()
            } else if attr_prefix.as_deref() == Some(ns::XML_PREFIX) {
                self.xml.clone()
            } else {
                let (resolved, _) = reader.resolve_attribute(attr.key);
                self.namespace_of(resolved, attr.key)?
            };

            attributes.push(Attribute {
                namespace: attr_namespace,
                prefix: attr_prefix,
                local_name: attr_local,
                value,
            });
        }

        Ok(Element {
            namespace,
            prefix,
            local_name,
            attributes,
            children: Vec::new(),
        })
    }

    fn namespace_of(&mut self, resolved: ResolveResult<'_>, name: QName<'_>) -> XmpResult<Atom> {
        match resolved {
            ResolveResult::Bound(namespace) => Ok(self
                .registry
                .intern(&String::from_utf8_lossy(namespace.as_ref()))),
            ResolveResult::Unbound => Ok(self.registry.intern("")),
            ResolveResult::Unknown(prefix) => Err(XmpError::MalformedXml(format!(
                "undeclared namespace prefix `{}` on `{}`",
                String::from_utf8_lossy(&prefix),
                String::from_utf8_lossy(name.as_ref())
            ))),
        }
    }

    fn attach(&mut self, node: XmlNode) -> XmpResult<()> {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(node);
            return Ok(());
        }
        match node {
            XmlNode::Element(element) => {
                if self.root.is_some() {
                    return Err(XmpError::MalformedXml(
                        "document has more than one root element".to_string(),
                    ));
                }
                self.root = Some(element);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn text(&mut self, text: &str) {
        let Some(parent) = self.stack.last_mut() else {
            return;
        };
        // references split text into several events; join them back up
        if let Some(XmlNode::Text(previous)) = parent.children.last_mut() {
            previous.push_str(text);
        } else {
            parent.children.push(XmlNode::Text(text.to_string()));
        }
    }

    fn comment(&mut self, comment: String) {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(XmlNode::Comment(comment));
        }
    }

    fn finish(self) -> XmpResult<Document> {
        if let Some(open) = self.stack.last() {
            return Err(XmpError::MalformedXml(format!(
                "unclosed element `{}`",
                open.qualified_name()
            )));
        }
        self.root
            .map(|root| Document { root })
            .ok_or_else(|| XmpError::MalformedXml("document has no root element".to_string()))
    }
}
