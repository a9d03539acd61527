//! Namespace management for XMP
//!
//! This module handles namespace interning and prefix lookup. Namespace URIs
//! are interned into [`Atom`]s so the RDF parser can compare them by
//! identity, and every URI maps to the prefix used when rendering.

use crate::core::error::{XmpError, XmpResult};
use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Built-in XMP namespaces
pub mod ns {
    /// Adobe meta namespace (`x:xmpmeta`)
    pub const ADOBE_META: &str = "adobe:ns:meta/";
    /// XMP Basic namespace
    pub const XMP: &str = "http://ns.adobe.com/xap/1.0/";
    /// Dublin Core namespace
    pub const DC: &str = "http://purl.org/dc/elements/1.1/";
    /// EXIF namespace
    pub const EXIF: &str = "http://ns.adobe.com/exif/1.0/";
    /// EXIF Aux namespace
    pub const EXIF_AUX: &str = "http://ns.adobe.com/exif/1.0/aux/";
    /// EXIF 2.3 (CIPA) namespace
    pub const EXIF_EX: &str = "http://cipa.jp/exif/1.0/";
    /// IPTC Core namespace
    pub const IPTC_CORE: &str = "http://iptc.org/std/Iptc4xmpCore/1.0/xmlns/";
    /// IPTC Extension namespace
    pub const IPTC_EXT: &str = "http://iptc.org/std/Iptc4xmpExt/2008-02-29/";
    /// Photoshop namespace
    pub const PHOTOSHOP: &str = "http://ns.adobe.com/photoshop/1.0/";
    /// Camera Raw namespace
    pub const CAMERA_RAW: &str = "http://ns.adobe.com/camera-raw-settings/1.0/";
    /// XMP Rights namespace
    pub const XMP_RIGHTS: &str = "http://ns.adobe.com/xap/1.0/rights/";
    /// XMP Media Management namespace
    pub const XMP_MM: &str = "http://ns.adobe.com/xap/1.0/mm/";
    /// XMP Basic Job Ticket namespace
    pub const XMP_BJ: &str = "http://ns.adobe.com/xap/1.0/bj/";
    /// TIFF namespace
    pub const TIFF: &str = "http://ns.adobe.com/tiff/1.0/";
    /// PDF namespace
    pub const PDF: &str = "http://ns.adobe.com/pdf/1.3/";
    /// XMP Dynamic Media namespace
    pub const XMP_DM: &str = "http://ns.adobe.com/xmp/1.0/DynamicMedia/";
    /// XMP Graphics namespace
    pub const XMP_GRAPHICS: &str = "http://ns.adobe.com/xap/1.0/g/";
    /// XMP Image namespace
    pub const XMP_IMAGE: &str = "http://ns.adobe.com/xap/1.0/g/img/";
    /// RDF namespace
    pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    /// XML namespace (for xml:lang, etc.)
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    /// Namespace of `xmlns` declaration attributes
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";

    /// Adobe meta prefix
    pub const ADOBE_META_PREFIX: &str = "x";
    /// XMP namespace prefix
    pub const XMP_PREFIX: &str = "xmp";
    /// Dublin Core prefix
    pub const DC_PREFIX: &str = "dc";
    /// EXIF prefix
    pub const EXIF_PREFIX: &str = "exif";
    /// EXIF Aux prefix
    pub const EXIF_AUX_PREFIX: &str = "aux";
    /// EXIF 2.3 prefix
    pub const EXIF_EX_PREFIX: &str = "exifEX";
    /// IPTC Core prefix
    pub const IPTC_CORE_PREFIX: &str = "Iptc4xmpCore";
    /// IPTC Extension prefix
    pub const IPTC_EXT_PREFIX: &str = "Iptc4xmpExt";
    /// Photoshop prefix
    pub const PHOTOSHOP_PREFIX: &str = "photoshop";
    /// Camera Raw prefix
    pub const CAMERA_RAW_PREFIX: &str = "crs";
    /// XMP Rights prefix
    pub const XMP_RIGHTS_PREFIX: &str = "xmpRights";
    /// XMP Media Management prefix
    pub const XMP_MM_PREFIX: &str = "xmpMM";
    /// XMP Basic Job Ticket prefix
    pub const XMP_BJ_PREFIX: &str = "xmpBJ";
    /// TIFF prefix
    pub const TIFF_PREFIX: &str = "tiff";
    /// PDF prefix
    pub const PDF_PREFIX: &str = "pdf";
    /// XMP Dynamic Media prefix
    pub const XMP_DM_PREFIX: &str = "xmpDM";
    /// XMP Graphics prefix
    pub const XMP_GRAPHICS_PREFIX: &str = "xmpG";
    /// XMP Image prefix
    pub const XMP_IMAGE_PREFIX: &str = "xmpGImg";
    /// RDF prefix
    pub const RDF_PREFIX: &str = "rdf";
    /// XML prefix
    pub const XML_PREFIX: &str = "xml";
    /// XMLNS prefix
    pub const XMLNS_PREFIX: &str = "xmlns";
}

const BUILTIN_NAMESPACES: &[(&str, &str)] = &[
    (ns::ADOBE_META, ns::ADOBE_META_PREFIX),
    (ns::XMP, ns::XMP_PREFIX),
    (ns::DC, ns::DC_PREFIX),
    (ns::EXIF, ns::EXIF_PREFIX),
    (ns::EXIF_AUX, ns::EXIF_AUX_PREFIX),
    (ns::EXIF_EX, ns::EXIF_EX_PREFIX),
    (ns::IPTC_CORE, ns::IPTC_CORE_PREFIX),
    (ns::IPTC_EXT, ns::IPTC_EXT_PREFIX),
    (ns::PHOTOSHOP, ns::PHOTOSHOP_PREFIX),
    (ns::CAMERA_RAW, ns::CAMERA_RAW_PREFIX),
    (ns::XMP_RIGHTS, ns::XMP_RIGHTS_PREFIX),
    (ns::XMP_MM, ns::XMP_MM_PREFIX),
    (ns::XMP_BJ, ns::XMP_BJ_PREFIX),
    (ns::TIFF, ns::TIFF_PREFIX),
    (ns::PDF, ns::PDF_PREFIX),
    (ns::XMP_DM, ns::XMP_DM_PREFIX),
    (ns::XMP_GRAPHICS, ns::XMP_GRAPHICS_PREFIX),
    (ns::XMP_IMAGE, ns::XMP_IMAGE_PREFIX),
    (ns::RDF, ns::RDF_PREFIX),
    (ns::XML, ns::XML_PREFIX),
    (ns::XMLNS, ns::XMLNS_PREFIX),
];

/// An interned namespace URI.
///
/// Atoms handed out by the same [`NamespaceRegistry`] share one allocation per
/// URI, so equality is a pointer comparison in the common case. Atoms from
/// different registries still compare by content.
#[derive(Clone)]
pub struct Atom(Arc<str>);

impl Atom {
    /// Create an atom outside of any registry
    pub fn new(uri: &str) -> Self {
        Atom(Arc::from(uri))
    }

    /// The URI text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

impl Eq for Atom {}

impl PartialEq<str> for Atom {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Atom {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

// must hash exactly like `str` so maps keyed by `Atom` can be queried with `&str`
impl Hash for Atom {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl Borrow<str> for Atom {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Deref for Atom {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Atom {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// the empty namespace
impl Default for Atom {
    fn default() -> Self {
        Atom::new("")
    }
}

impl From<&str> for Atom {
    fn from(uri: &str) -> Self {
        Atom::new(uri)
    }
}

#[cfg(feature = "serde")]
impl serde::ser::Serialize for Atom {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

/// Name table and prefix map for namespace URIs
///
/// A registry is an ordinary value owned by a parser or serializer. Unknown
/// namespaces met while rendering get an anonymous `ns<N>` prefix, allocated
/// once per URI for the lifetime of the registry.
#[derive(Debug, Clone)]
pub struct NamespaceRegistry {
    atoms: HashSet<Atom>,
    uri_to_prefix: HashMap<Atom, String>,
    prefix_to_uri: HashMap<String, Atom>,
    next_anonymous: usize,
}

impl NamespaceRegistry {
    /// Create a new registry with the built-in namespaces registered
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for (uri, prefix) in BUILTIN_NAMESPACES {
            registry.bind(uri, prefix);
        }
        registry
    }

    /// Create a registry with no namespaces at all
    pub fn empty() -> Self {
        Self {
            atoms: HashSet::new(),
            uri_to_prefix: HashMap::new(),
            prefix_to_uri: HashMap::new(),
            next_anonymous: 1,
        }
    }

    /// Intern a namespace URI
    ///
    /// Repeated calls with the same URI return atoms sharing one allocation.
    pub fn intern(&mut self, uri: &str) -> Atom {
        if let Some(atom) = self.atoms.get(uri) {
            return atom.clone();
        }
        let atom = Atom::new(uri);
        self.atoms.insert(atom.clone());
        atom
    }

    /// Register a namespace URI with a prefix
    ///
    /// # Returns
    ///
    /// Returns an error if the prefix is already registered to a different
    /// URI, or if either argument is empty. A URI that already has a prefix
    /// keeps it as its preferred prefix.
    pub fn register(&mut self, uri: &str, prefix: &str) -> XmpResult<()> {
        if uri.is_empty() {
            return Err(XmpError::BadParam("URI cannot be empty".to_string()));
        }
        if prefix.is_empty() {
            return Err(XmpError::BadParam("Prefix cannot be empty".to_string()));
        }

        if let Some(existing_uri) = self.prefix_to_uri.get(prefix) {
            if existing_uri.as_str() != uri {
                return Err(XmpError::BadParam(format!(
                    "Prefix '{}' is already registered to '{}'",
                    prefix, existing_uri
                )));
            }
            return Ok(());
        }

        self.bind(uri, prefix);
        Ok(())
    }

    /// Return the prefix for a namespace URI, allocating `ns<N>` if unseen
    pub fn prefix_for(&mut self, uri: &str) -> String {
        if let Some(prefix) = self.uri_to_prefix.get(uri) {
            return prefix.clone();
        }

        let prefix = loop {
            let candidate = format!("ns{}", self.next_anonymous);
            self.next_anonymous += 1;
            if !self.prefix_to_uri.contains_key(&candidate) {
                break candidate;
            }
        };
        log::debug!("Allocated anonymous prefix `{prefix}` for namespace `{uri}`.");
        self.bind(uri, &prefix);
        prefix
    }

    /// Get the prefix for a namespace URI
    pub fn get_prefix(&self, uri: &str) -> Option<&str> {
        self.uri_to_prefix.get(uri).map(|s| s.as_str())
    }

    /// Get the URI for a namespace prefix
    pub fn get_uri(&self, prefix: &str) -> Option<&Atom> {
        self.prefix_to_uri.get(prefix)
    }

    /// Check if a namespace URI has a prefix
    pub fn has_uri(&self, uri: &str) -> bool {
        self.uri_to_prefix.contains_key(uri)
    }

    /// Check if a namespace prefix is registered
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.prefix_to_uri.contains_key(prefix)
    }

    /// Get all registered namespaces as (uri, prefix) tuples, sorted by prefix
    pub fn namespaces(&self) -> Vec<(String, String)> {
        let mut all: Vec<_> = self
            .uri_to_prefix
            .iter()
            .map(|(uri, prefix)| (uri.to_string(), prefix.clone()))
            .collect();
        all.sort_by(|a, b| a.1.cmp(&b.1));
        all
    }

    fn bind(&mut self, uri: &str, prefix: &str) {
        let atom = self.intern(uri);
        self.uri_to_prefix
            .entry(atom.clone())
            .or_insert_with(|| prefix.to_string());
        self.prefix_to_uri.insert(prefix.to_string(), atom);
    }
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
