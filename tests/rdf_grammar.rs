//! Tests for the RDF/XML grammar: root location, top-level rules, node
//! elements and every property element form.

use xmptree::{ns, Atom, Node, NodeKind, XmpError, XmpParser};

const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
const EX: &str = "http://example.com/ns/";

fn init_logger() {
    _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::max())
        .format_file(true)
        .format_line_number(true)
        .try_init();
}

fn packet(body: &str) -> String {
    format!(
        r#"<x:xmpmeta xmlns:x="adobe:ns:meta/">
  <rdf:RDF xmlns:rdf="{RDF_NS}"
           xmlns:dc="http://purl.org/dc/elements/1.1/"
           xmlns:xmp="http://ns.adobe.com/xap/1.0/"
           xmlns:ex="{EX}">
    {body}
  </rdf:RDF>
</x:xmpmeta>"#
    )
}

fn parse(body: &str) -> Result<Node, XmpError> {
    init_logger();
    XmpParser::new().parse(&packet(body))
}

fn lang(value: &str) -> Node {
    Node::simple(Atom::new(ns::XML), "lang", value)
}

mod root_location {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn xmpmeta() {
        let tree = parse(r#"<rdf:Description rdf:about=""/>"#).unwrap();
        assert_eq!(tree.kind, NodeKind::Struct);
        assert!(tree.children.is_empty());
    }

    #[test]
    fn legacy_xapmeta() {
        init_logger();
        let xml = format!(
            r#"<x:xapmeta xmlns:x="adobe:ns:meta/"><rdf:RDF xmlns:rdf="{RDF_NS}"><rdf:Description/></rdf:RDF></x:xapmeta>"#
        );
        assert!(XmpParser::new().parse(&xml).is_ok());
    }

    #[test]
    fn xpacket_wrapper_is_tolerated() {
        init_logger();
        let xml = format!(
            "<?xpacket begin=\"\u{feff}\" id=\"W5M0MpCehiHzreSzNTczkc9d\"?>\n{}\n<?xpacket end=\"w\"?>",
            packet("<rdf:Description/>")
        );
        assert!(XmpParser::new().parse(&xml).is_ok());
    }

    #[test]
    fn missing_rdf() {
        init_logger();
        let err = XmpParser::new()
            .parse(r#"<x:xmpmeta xmlns:x="adobe:ns:meta/"/>"#)
            .unwrap_err();
        assert!(matches!(err, XmpError::MissingRdfRoot));
    }

    #[test]
    fn wrong_root_element() {
        init_logger();
        let err = XmpParser::new()
            .parse(r#"<x:other xmlns:x="adobe:ns:meta/"><rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"/></x:other>"#)
            .unwrap_err();
        assert!(matches!(err, XmpError::MissingRdfRoot));
    }

    #[test]
    fn malformed_xml() {
        init_logger();
        let err = XmpParser::new().parse("<x:xmpmeta").unwrap_err();
        assert!(matches!(err, XmpError::MalformedXml(_)));

        let err = XmpParser::new().parse("<a><b></a>").unwrap_err();
        assert!(matches!(err, XmpError::MalformedXml(_)));
    }

    #[test]
    fn undeclared_prefix() {
        init_logger();
        let err = XmpParser::new()
            .parse(r#"<x:xmpmeta><rdf:RDF/></x:xmpmeta>"#)
            .unwrap_err();
        assert!(matches!(err, XmpError::MalformedXml(_)));
    }
}

mod top_level {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn only_descriptions_allowed() {
        let err = parse(r#"<rdf:Bag/>"#).unwrap_err();
        match err {
            XmpError::UnexpectedTopLevelElement { element } => assert_eq!(element, "rdf:Bag"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn comments_are_skipped() {
        let tree = parse(r#"<!-- hello --><rdf:Description dc:format="a"/>"#).unwrap();
        assert_eq!(tree.children.len(), 1);
    }

    #[test]
    fn descriptions_merge_into_root() {
        let tree = parse(
            r#"<rdf:Description rdf:about="uuid:1" dc:format="image/png"/>
               <rdf:Description rdf:about=""><xmp:Rating>3</xmp:Rating></rdf:Description>
               <rdf:Description xmp:Label="Red"/>"#,
        )
        .unwrap();
        assert_eq!(tree.name, "uuid:1");
        let names: Vec<_> = tree.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["format", "Rating", "Label"]);
    }

    #[test]
    fn consistent_about_is_accepted() {
        let tree = parse(
            r#"<rdf:Description rdf:about="uuid:1"/><rdf:Description rdf:about="uuid:1"/>"#,
        )
        .unwrap();
        assert_eq!(tree.name, "uuid:1");
    }

    #[test]
    fn inconsistent_about() {
        let err = parse(
            r#"<rdf:Description rdf:about="uuid:a"/><rdf:Description rdf:about="uuid:b"/>"#,
        )
        .unwrap_err();
        match err {
            XmpError::InconsistentAbout { first, second } => {
                assert_eq!(first, "uuid:a");
                assert_eq!(second, "uuid:b");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_about_never_conflicts() {
        let tree = parse(
            r#"<rdf:Description rdf:about=""/><rdf:Description rdf:about="uuid:b"/><rdf:Description rdf:about=""/>"#,
        )
        .unwrap();
        assert_eq!(tree.name, "uuid:b");
    }
}

mod node_elements {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn container_kinds() {
        let tree = parse(
            r#"<rdf:Description>
                 <ex:seq><rdf:Seq/></ex:seq>
                 <ex:alt><rdf:Alt/></ex:alt>
                 <ex:bag><rdf:Bag/></ex:bag>
                 <ex:desc><rdf:Description/></ex:desc>
               </rdf:Description>"#,
        )
        .unwrap();
        let kinds: Vec<_> = tree.children.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Seq, NodeKind::Alt, NodeKind::Bag, NodeKind::Struct]
        );
    }

    #[test]
    fn unknown_collection_type() {
        let err = parse(r#"<rdf:Description><ex:p><rdf:Foo/></ex:p></rdf:Description>"#)
            .unwrap_err();
        match err {
            XmpError::UnknownCollectionType { element } => assert_eq!(element, "rdf:Foo"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn nested_description_attributes() {
        let tree = parse(
            r#"<rdf:Description>
                 <ex:p><rdf:Description rdf:about="x" rdf:nodeID="n1" ex:a="1" ex:b="2"/></ex:p>
               </rdf:Description>"#,
        )
        .unwrap();
        let p = &tree.children[0];
        assert_eq!(p.kind, NodeKind::Struct);
        assert_eq!(
            p.children,
            vec![
                Node::simple(Atom::new(EX), "a", "1"),
                Node::simple(Atom::new(EX), "b", "2"),
            ]
        );
    }

    #[test]
    fn lang_on_node_element() {
        let err = parse(
            r#"<rdf:Description><ex:p><rdf:Bag xml:lang="en"/></ex:p></rdf:Description>"#,
        )
        .unwrap_err();
        match err {
            XmpError::DisallowedQualifierHere { element } => assert_eq!(element, "rdf:Bag"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn text_in_node_element() {
        let err = parse(
            r#"<rdf:Description><ex:p><rdf:Seq>loose</rdf:Seq></ex:p></rdf:Description>"#,
        )
        .unwrap_err();
        match err {
            XmpError::TextNotAllowedHere { element } => assert_eq!(element, "rdf:Seq"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

mod property_elements {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn literal_creator() {
        let tree = parse(r#"<rdf:Description><dc:creator>Jane</dc:creator></rdf:Description>"#)
            .unwrap();
        assert_eq!(tree.kind, NodeKind::Struct);
        assert_eq!(
            tree.children,
            vec![Node::simple(Atom::new(ns::DC), "creator", "Jane")]
        );
    }

    #[test]
    fn literal_with_datatype() {
        let tree = parse(
            r#"<rdf:Description><xmp:Rating rdf:datatype="http://www.w3.org/2001/XMLSchema#int">5</xmp:Rating></rdf:Description>"#,
        )
        .unwrap();
        let rating = &tree.children[0];
        assert_eq!(rating.kind, NodeKind::Simple);
        assert_eq!(rating.value.as_deref(), Some("5"));
        assert_eq!(
            rating
                .qualifier(ns::RDF, "datatype")
                .and_then(|q| q.value.as_deref()),
            Some("http://www.w3.org/2001/XMLSchema#int")
        );
    }

    #[test]
    fn literal_with_lang_and_entities() {
        let tree = parse(
            r#"<rdf:Description><dc:rights xml:lang="en">&#169; Tom &amp; Jerry</dc:rights></rdf:Description>"#,
        )
        .unwrap();
        let rights = &tree.children[0];
        assert_eq!(rights.value.as_deref(), Some("© Tom & Jerry"));
        assert_eq!(rights.qualifiers, vec![lang("en")]);
    }

    #[test]
    fn bag_of_keywords() {
        let tree = parse(
            r#"<rdf:Description>
                 <dc:subject>
                   <rdf:Bag>
                     <rdf:li>a</rdf:li>
                     <!-- skipped -->
                     <rdf:li>b</rdf:li>
                   </rdf:Bag>
                 </dc:subject>
               </rdf:Description>"#,
        )
        .unwrap();
        let subject = &tree.children[0];
        assert_eq!(subject.kind, NodeKind::Bag);
        assert_eq!(subject.item_values(), vec!["a", "b"]);
        assert!(subject.children.iter().all(|li| li.is(ns::RDF, "li")));
    }

    #[test]
    fn resource_keeps_lang() {
        let tree = parse(
            r#"<rdf:Description><ex:p xml:lang="fr"><rdf:Seq/></ex:p></rdf:Description>"#,
        )
        .unwrap();
        let p = &tree.children[0];
        assert_eq!(p.kind, NodeKind::Seq);
        assert_eq!(p.qualifiers, vec![lang("fr")]);
    }

    #[test]
    fn resource_holds_one_node_element() {
        let err = parse(
            r#"<rdf:Description>
                 <ex:p>
                   <rdf:Bag><rdf:li>a</rdf:li></rdf:Bag>
                   <rdf:Seq><rdf:li>b</rdf:li></rdf:Seq>
                 </ex:p>
               </rdf:Description>"#,
        )
        .unwrap_err();
        match err {
            XmpError::MultipleNodeElements { element } => assert_eq!(element, "ex:p"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_type_resource() {
        let tree = parse(
            r#"<rdf:Description>
                 <ex:flash rdf:parseType="Resource">
                   <ex:fired>False</ex:fired>
                   <ex:mode>2</ex:mode>
                 </ex:flash>
               </rdf:Description>"#,
        )
        .unwrap();
        let flash = &tree.children[0];
        assert_eq!(flash.kind, NodeKind::Struct);
        assert_eq!(flash.item_values(), vec!["False", "2"]);
    }

    #[test]
    fn unsupported_parse_types() {
        for parse_type in ["Literal", "Collection", "Other"] {
            let err = parse(&format!(
                r#"<rdf:Description><ex:p rdf:parseType="{parse_type}"/></rdf:Description>"#
            ))
            .unwrap_err();
            match err {
                XmpError::UnsupportedParseType {
                    element,
                    parse_type: found,
                } => {
                    assert_eq!(element, "ex:p");
                    assert_eq!(found, parse_type);
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn four_attributes_force_empty_form() {
        // the element child would make this a resource if it were inspected
        let err = parse(
            r#"<rdf:Description><ex:p xml:lang="en" rdf:ID="i" ex:a="1" ex:b="2"><rdf:Seq/></ex:p></rdf:Description>"#,
        )
        .unwrap_err();
        match err {
            XmpError::ContentNotAllowedInEmptyElement { element } => assert_eq!(element, "ex:p"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_with_resource() {
        let tree = parse(
            r#"<rdf:Description><ex:link rdf:resource="http://example.com/a" ex:note="n"/></rdf:Description>"#,
        )
        .unwrap();
        let link = &tree.children[0];
        assert_eq!(link.kind, NodeKind::Simple);
        assert_eq!(link.value.as_deref(), Some("http://example.com/a"));
        assert_eq!(link.qualifiers, vec![Node::simple(Atom::new(EX), "note", "n")]);
    }

    #[test]
    fn empty_value_takes_precedence_over_resource() {
        let tree = parse(
            r#"<rdf:Description><ex:p rdf:resource="r" rdf:value="v"/></rdf:Description>"#,
        )
        .unwrap();
        let p = &tree.children[0];
        assert_eq!(p.value.as_deref(), Some("v"));
        assert_eq!(
            p.qualifiers,
            vec![Node::simple(Atom::new(ns::RDF), "resource", "r")]
        );
    }

    #[test]
    fn empty_struct_fallback() {
        let tree = parse(
            r#"<rdf:Description><ex:contact ex:city="Seattle" rdf:ID="c1" ex:country="US"/></rdf:Description>"#,
        )
        .unwrap();
        let contact = &tree.children[0];
        assert_eq!(contact.kind, NodeKind::Struct);
        assert_eq!(contact.value, None);
        assert_eq!(
            contact.children,
            vec![
                Node::simple(Atom::new(EX), "city", "Seattle"),
                Node::simple(Atom::new(EX), "country", "US"),
            ]
        );
    }

    #[test]
    fn empty_struct_fallback_duplicates_lang() {
        let tree = parse(
            r#"<rdf:Description><ex:p xml:lang="en" ex:a="1"/></rdf:Description>"#,
        )
        .unwrap();
        let p = &tree.children[0];
        assert_eq!(p.kind, NodeKind::Struct);
        assert_eq!(p.qualifiers, vec![lang("en")]);
        assert_eq!(
            p.children,
            vec![lang("en"), Node::simple(Atom::new(EX), "a", "1")]
        );
    }

    #[test]
    fn empty_element_without_attributes() {
        let tree = parse(r#"<rdf:Description><ex:p/><ex:q></ex:q></rdf:Description>"#).unwrap();
        for node in &tree.children {
            assert_eq!(node.kind, NodeKind::Struct);
            assert!(node.children.is_empty());
        }
    }

    #[test]
    fn empty_form_rejects_text() {
        let err = parse(r#"<rdf:Description><ex:p ex:a="1">x</ex:p></rdf:Description>"#)
            .unwrap_err();
        assert!(matches!(
            err,
            XmpError::ContentNotAllowedInEmptyElement { .. }
        ));
    }

    #[test]
    fn unprefixed_element_is_named_by_uri() {
        let err = parse(
            r#"<rdf:Description><p xmlns="http://example.com/default/" rdf:parseType="Other"/></rdf:Description>"#,
        )
        .unwrap_err();
        match err {
            XmpError::UnsupportedParseType { element, .. } => {
                assert_eq!(element, "{http://example.com/default/}p")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

mod classification {
    use super::*;
    use pretty_assertions::assert_eq;
    use xmptree::{Document, NamespaceRegistry, PropertyElementKind};

    fn classify(attrs: &str, body: &str) -> Result<PropertyElementKind, XmpError> {
        init_logger();
        let xml = format!(
            r#"<ex:p xmlns:ex="{EX}" xmlns:rdf="{RDF_NS}" {attrs}>{body}</ex:p>"#
        );
        let mut registry = NamespaceRegistry::new();
        let document = Document::parse(&xml, &mut registry).unwrap();
        XmpParser::new().classify_property_element(&document.root)
    }

    #[test]
    fn by_content_shape() {
        assert_eq!(classify("", "").unwrap(), PropertyElementKind::Empty);
        assert_eq!(classify("", "text").unwrap(), PropertyElementKind::Literal);
        assert_eq!(classify("", "  ").unwrap(), PropertyElementKind::Literal);
        assert_eq!(
            classify("", "<rdf:Seq/>").unwrap(),
            PropertyElementKind::Resource
        );
        assert_eq!(
            classify(r#"rdf:ID="x" xml:lang="en""#, "<?pi data?>").unwrap(),
            PropertyElementKind::Empty
        );
    }

    #[test]
    fn by_first_decisive_attribute() {
        assert_eq!(
            classify(r#"rdf:datatype="t""#, "5").unwrap(),
            PropertyElementKind::Literal
        );
        assert_eq!(
            classify(r#"xml:lang="en" rdf:parseType="Resource""#, "").unwrap(),
            PropertyElementKind::ParseTypeResource
        );
        assert_eq!(
            classify(r#"ex:a="1" rdf:parseType="Resource""#, "").unwrap(),
            PropertyElementKind::Empty
        );
        assert_eq!(
            classify(r#"ex:a="1" rdf:parseType="Collection""#, "").unwrap(),
            PropertyElementKind::Empty
        );
    }

    #[test]
    fn declarations_do_not_count() {
        assert_eq!(
            classify(
                r#"xmlns:a="urn:a" xmlns:b="urn:b" xmlns:c="urn:c" rdf:datatype="t""#,
                "5"
            )
            .unwrap(),
            PropertyElementKind::Literal
        );
    }

    #[test]
    fn more_than_three_attributes() {
        assert_eq!(
            classify(r#"rdf:datatype="t" ex:a="1" ex:b="2" ex:c="3""#, "<rdf:Seq/>").unwrap(),
            PropertyElementKind::Empty
        );
    }
}
