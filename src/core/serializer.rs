//! XMP XML/RDF serializer
//!
//! Renders a [`NodeTree`] back to RDF/XML. Output is always wrapped in
//! `x:xmpmeta` / `rdf:RDF` / `rdf:Description`, every namespace in use is
//! declared once on `rdf:RDF`, and each node is written in a form the parser
//! reads back to the same value, kind and qualifiers.

use crate::core::error::{XmpError, XmpResult};
use crate::core::namespace::{ns, NamespaceRegistry};
use crate::core::node::{Node, NodeKind, NodeTree};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::collections::HashSet;

const XMP_TOOLKIT: &str = concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"));

/// Serializer for XMP Packets
pub struct XmpSerializer {
    registry: NamespaceRegistry,
    indent: usize,
}

impl XmpSerializer {
    /// Create a new XMP serializer
    pub fn new() -> Self {
        Self::with_registry(NamespaceRegistry::new())
    }

    /// Create a serializer that takes prefixes from `registry`
    pub fn with_registry(registry: NamespaceRegistry) -> Self {
        Self {
            registry,
            indent: 2,
        }
    }

    /// Set the indentation width (0 writes everything on one line)
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// The registry prefixes are taken from
    ///
    /// Holds any anonymous prefixes allocated by earlier renders.
    pub fn registry(&self) -> &NamespaceRegistry {
        &self.registry
    }

    /// Serialize a node tree to RDF/XML
    pub fn render(&mut self, root: &NodeTree) -> XmpResult<String> {
        let mut used = Vec::new();
        for child in &root.children {
            self.collect_namespaces(child, &mut used);
        }

        let mut writer = if self.indent == 0 {
            Writer::new(Vec::new())
        } else {
            Writer::new_with_indent(Vec::new(), b' ', self.indent)
        };

        let meta_prefix = self.prefix(ns::ADOBE_META);
        let rdf_prefix = self.prefix(ns::RDF);
        let xmpmeta = format!("{}:xmpmeta", meta_prefix);
        let rdf_root = format!("{}:RDF", rdf_prefix);
        let description = format!("{}:Description", rdf_prefix);

        let mut meta_start = BytesStart::new(xmpmeta.as_str());
        meta_start.push_attribute((format!("xmlns:{}", meta_prefix).as_str(), ns::ADOBE_META));
        meta_start.push_attribute((format!("{}:xmptk", meta_prefix).as_str(), XMP_TOOLKIT));
        writer.write_event(Event::Start(meta_start))?;

        let mut rdf_start = BytesStart::new(rdf_root.as_str());
        rdf_start.push_attribute((format!("xmlns:{}", rdf_prefix).as_str(), ns::RDF));
        for (uri, prefix) in &used {
            rdf_start.push_attribute((format!("xmlns:{}", prefix).as_str(), uri.as_str()));
        }
        writer.write_event(Event::Start(rdf_start))?;

        let mut desc_start = BytesStart::new(description.as_str());
        desc_start.push_attribute((format!("{}:about", rdf_prefix).as_str(), root.name.as_str()));
        if root.children.is_empty() {
            writer.write_event(Event::Empty(desc_start))?;
        } else {
            writer.write_event(Event::Start(desc_start))?;
            for child in &root.children {
                self.write_node(&mut writer, child)?;
            }
            writer.write_event(Event::End(BytesEnd::new(description.as_str())))?;
        }

        writer.write_event(Event::End(BytesEnd::new(rdf_root.as_str())))?;
        writer.write_event(Event::End(BytesEnd::new(xmpmeta.as_str())))?;

        let result = writer.into_inner();
        String::from_utf8(result)
            .map_err(|e| XmpError::SerializationError(format!("UTF-8 encoding error: {}", e)))
    }

    /// Serialize to XMP Packet format
    pub fn render_packet(&mut self, root: &NodeTree) -> XmpResult<String> {
        let rdf_content = self.render(root)?;

        let packet = format!(
            r#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?>
{}
<?xpacket end="w"?>"#,
            rdf_content
        );

        Ok(packet)
    }

    /// Record every namespace below `node` that needs a declaration on `rdf:RDF`
    fn collect_namespaces(&mut self, node: &Node, used: &mut Vec<(String, String)>) {
        let uri = node.namespace.as_str();
        let implicit = uri.is_empty() || uri == ns::XML || uri == ns::RDF || uri == ns::ADOBE_META;
        if !implicit && !used.iter().any(|(seen, _)| seen == uri) {
            let prefix = self.prefix(uri);
            used.push((uri.to_string(), prefix));
        }
        for qualifier in &node.qualifiers {
            self.collect_namespaces(qualifier, used);
        }
        for child in &node.children {
            self.collect_namespaces(child, used);
        }
    }

    fn prefix(&mut self, uri: &str) -> String {
        if uri == ns::XML {
            return ns::XML_PREFIX.to_string();
        }
        self.registry.prefix_for(uri)
    }

    /// `prefix:name`, or the bare name for the empty namespace
    fn qualified_name(&mut self, node: &Node) -> String {
        if node.namespace.is_empty() {
            return node.name.clone();
        }
        format!("{}:{}", self.prefix(&node.namespace), node.name)
    }

    /// Write a node as a property element
    fn write_node(&mut self, writer: &mut Writer<Vec<u8>>, node: &Node) -> XmpResult<()> {
        let name = self.qualified_name(node);

        if node.children.is_empty() && node.kind == NodeKind::Simple {
            return self.write_leaf(writer, node, name);
        }

        let mut start = BytesStart::new(name.as_str());
        self.push_lang(node, &mut start);
        let container = format!("{}:{}", self.prefix(ns::RDF), node.kind.rdf_type());

        writer.write_event(Event::Start(start))?;
        if node.children.is_empty() {
            writer.write_event(Event::Empty(BytesStart::new(container.as_str())))?;
        } else {
            writer.write_event(Event::Start(BytesStart::new(container.as_str())))?;
            for child in &node.children {
                self.write_node(writer, child)?;
            }
            writer.write_event(Event::End(BytesEnd::new(container.as_str())))?;
        }
        writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
        Ok(())
    }

    fn write_leaf(
        &mut self,
        writer: &mut Writer<Vec<u8>>,
        node: &Node,
        name: String,
    ) -> XmpResult<()> {
        let mut start = BytesStart::new(name.as_str());
        let literal_qualifiers = node.qualifiers.len() <= 3
            && node
                .qualifiers
                .iter()
                .all(|q| q.is(ns::XML, "lang") || q.is(ns::RDF, "datatype"));

        match node.value.as_deref() {
            Some(value) if literal_qualifiers && !value.is_empty() => {
                self.push_qualifiers(node, &mut start);
                writer.write_event(Event::Start(start))?;
                writer.write_event(Event::Text(BytesText::new(value)))?;
                writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
            }
            Some(value) => {
                // the empty form: `rdf:value` must come before anything decisive
                start.push_attribute((format!("{}:value", self.prefix(ns::RDF)).as_str(), value));
                self.push_qualifiers(node, &mut start);
                writer.write_event(Event::Empty(start))?;
            }
            None => {
                self.push_qualifiers(node, &mut start);
                writer.write_event(Event::Empty(start))?;
            }
        }
        Ok(())
    }

    /// Qualifiers as attributes, first occurrence of each name only
    fn push_qualifiers(&mut self, node: &Node, start: &mut BytesStart<'_>) {
        let mut seen = HashSet::new();
        for qualifier in &node.qualifiers {
            if qualifier.is(ns::RDF, "value") {
                log::warn!(
                    "Dropping `rdf:value` qualifier of `{}`; it collides with the value form.",
                    node.name
                );
                continue;
            }
            if !seen.insert((qualifier.namespace.as_str(), qualifier.name.as_str())) {
                continue;
            }
            let name = self.qualified_name(qualifier);
            start.push_attribute((name.as_str(), qualifier.value.as_deref().unwrap_or("")));
        }
    }

    /// Only `xml:lang` survives on a property element holding a node element
    fn push_lang(&self, node: &Node, start: &mut BytesStart<'_>) {
        if let Some(lang) = node.lang() {
            start.push_attribute(("xml:lang", lang));
        }
        let dropped = node
            .qualifiers
            .iter()
            .filter(|q| !q.is(ns::XML, "lang"))
            .count();
        if dropped > 0 {
            log::warn!(
                "Dropping {} qualifier(s) of `{}` that cannot be rendered next to its children.",
                dropped,
                node.name
            );
        }
    }
}

impl Default for XmpSerializer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::namespace::Atom;
    use crate::core::parser::XmpParser;

    const EX: &str = "http://example.com/ns/";

    fn root() -> Node {
        Node::with_kind(Atom::default(), "uuid:root", NodeKind::Struct)
    }

    #[test]
    fn test_render_empty_tree() {
        let xml = XmpSerializer::new().render(&root()).unwrap();
        assert!(xml.starts_with("<x:xmpmeta"));
        assert!(xml.contains(r#"rdf:about="uuid:root""#));
        assert!(xml.contains(&format!(r#"x:xmptk="{}""#, XMP_TOOLKIT)));

        let tree = XmpParser::new().parse(&xml).unwrap();
        assert_eq!(tree.name, "uuid:root");
        assert!(tree.children.is_empty());
    }

    #[test]
    fn test_render_packet() {
        let mut tree = root();
        tree.add_child(Node::simple(Atom::new(ns::XMP), "CreatorTool", "TestApp"));
        let packet = XmpSerializer::new().render_packet(&tree).unwrap();
        assert!(packet.starts_with("<?xpacket begin="));
        assert!(packet.ends_with(r#"<?xpacket end="w"?>"#));
        assert!(packet.contains("<xmp:CreatorTool>TestApp</xmp:CreatorTool>"));
        assert!(packet.contains(&format!(r#"xmlns:xmp="{}""#, ns::XMP)));
    }

    #[test]
    fn test_unknown_namespace_gets_anonymous_prefix() {
        let mut tree = root();
        tree.add_child(Node::simple(Atom::new(EX), "thing", "1"));
        tree.add_child(Node::simple(Atom::new(EX), "other", "2"));

        let mut serializer = XmpSerializer::new();
        let xml = serializer.render(&tree).unwrap();
        assert_eq!(xml.matches(&format!(r#"xmlns:ns1="{}""#, EX)).count(), 1);
        assert!(xml.contains("<ns1:thing>1</ns1:thing>"));
        assert_eq!(serializer.registry().get_prefix(EX), Some("ns1"));
    }

    #[test]
    fn test_custom_registry_prefix() {
        let mut registry = NamespaceRegistry::new();
        registry.register(EX, "ex").unwrap();
        let mut tree = root();
        tree.add_child(Node::simple(Atom::new(EX), "thing", "1"));

        let xml = XmpSerializer::with_registry(registry).render(&tree).unwrap();
        assert!(xml.contains("<ex:thing>1</ex:thing>"));
    }

    #[test]
    fn test_empty_value_uses_rdf_value() {
        let mut tree = root();
        let mut node = Node::simple(Atom::new(ns::DC), "rights", "");
        node.add_qualifier(Node::simple(Atom::new(ns::XML), "lang", "en"));
        tree.add_child(node);

        let xml = XmpSerializer::new().with_indent(0).render(&tree).unwrap();
        assert!(xml.contains(r#"<dc:rights rdf:value="" xml:lang="en"/>"#));

        let reparsed = XmpParser::new().parse(&xml).unwrap();
        let rights = &reparsed.children[0];
        assert_eq!(rights.kind, NodeKind::Simple);
        assert_eq!(rights.value.as_deref(), Some(""));
        assert_eq!(rights.lang(), Some("en"));
    }

    #[test]
    fn test_other_qualifiers_use_empty_form() {
        let mut tree = root();
        let mut node = Node::simple(Atom::new(EX), "p", "42");
        node.add_qualifier(Node::simple(Atom::new(EX), "unit", "mm"));
        node.add_qualifier(Node::simple(Atom::new(EX), "unit", "cm"));
        tree.add_child(node);

        let xml = XmpSerializer::new().with_indent(0).render(&tree).unwrap();
        assert!(xml.contains(r#"<ns1:p rdf:value="42" ns1:unit="mm"/>"#));

        let reparsed = XmpParser::new().parse(&xml).unwrap();
        let p = &reparsed.children[0];
        assert_eq!(p.value.as_deref(), Some("42"));
        assert_eq!(
            p.qualifier(EX, "unit").and_then(|q| q.value.as_deref()),
            Some("mm")
        );
    }

    #[test]
    fn test_value_qualifier_yields_to_node_value() {
        let mut tree = root();
        let mut node = Node::simple(Atom::new(EX), "p", "text");
        node.add_qualifier(Node::simple(Atom::new(ns::RDF), "datatype", "t"));
        node.add_qualifier(Node::simple(Atom::new(ns::RDF), "value", "v"));
        tree.add_child(node);

        let xml = XmpSerializer::new().with_indent(0).render(&tree).unwrap();
        assert!(xml.contains(r#"<ns1:p rdf:value="text" rdf:datatype="t"/>"#));

        let reparsed = XmpParser::new().parse(&xml).unwrap();
        let p = &reparsed.children[0];
        assert_eq!(p.value.as_deref(), Some("text"));
        assert_eq!(
            p.qualifiers,
            vec![Node::simple(Atom::new(ns::RDF), "datatype", "t")]
        );
    }

    #[test]
    fn test_childless_array_and_struct() {
        let mut tree = root();
        tree.add_child(Node::with_kind(Atom::new(ns::DC), "subject", NodeKind::Bag));
        tree.add_child(Node::with_kind(Atom::new(EX), "empty", NodeKind::Struct));

        let xml = XmpSerializer::new().with_indent(0).render(&tree).unwrap();
        assert!(xml.contains("<dc:subject><rdf:Bag/></dc:subject>"));
        assert!(xml.contains("<ns1:empty><rdf:Description/></ns1:empty>"));

        let reparsed = XmpParser::new().parse(&xml).unwrap();
        assert_eq!(reparsed.children[0].kind, NodeKind::Bag);
        assert_eq!(reparsed.children[1].kind, NodeKind::Struct);
    }

    #[test]
    fn test_simple_with_children_uses_description() {
        let mut tree = root();
        let mut node = Node::new(Atom::new(EX), "holder");
        node.add_child(Node::simple(Atom::new(EX), "field", "v"));
        tree.add_child(node);

        let xml = XmpSerializer::new().with_indent(0).render(&tree).unwrap();
        assert!(xml.contains(
            "<ns1:holder><rdf:Description><ns1:field>v</ns1:field></rdf:Description></ns1:holder>"
        ));
    }

    #[test]
    fn test_escapes_text_and_attributes() {
        let mut tree = root();
        tree.name = "a\"b".to_string();
        tree.add_child(Node::simple(Atom::new(ns::DC), "format", "<&>"));

        let xml = XmpSerializer::new().render(&tree).unwrap();
        let reparsed = XmpParser::new().parse(&xml).unwrap();
        assert_eq!(reparsed.name, "a\"b");
        assert_eq!(reparsed.children[0].value.as_deref(), Some("<&>"));
    }
}
