//! Namespace / name lookup table over a node tree
//!
//! Entries are stored as child-index paths from the root and resolved
//! against the tree on lookup, so the index can live next to the tree it
//! describes.

use crate::core::namespace::{ns, Atom};
use crate::core::node::Node;
use std::collections::HashMap;

/// Lookup table from namespace URI and local name to a node path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    entries: HashMap<Atom, HashMap<String, Vec<usize>>>,
}

impl Index {
    /// Path (child indices from the root) of the indexed node
    pub fn get(&self, namespace: &str, name: &str) -> Option<&[usize]> {
        self.entries
            .get(namespace)
            .and_then(|names| names.get(name))
            .map(Vec::as_slice)
    }

    /// Look up a node in the tree this index was built from
    pub fn resolve<'a>(&self, root: &'a Node, namespace: &str, name: &str) -> Option<&'a Node> {
        let path = self.get(namespace, name)?;
        resolve_path(root, path)
    }

    /// Number of indexed names
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Namespaces with at least one indexed name
    pub fn namespaces(&self) -> impl Iterator<Item = &Atom> {
        self.entries.keys()
    }
}

/// Follow a child-index path from `root`
pub fn resolve_path<'a>(root: &'a Node, path: &[usize]) -> Option<&'a Node> {
    path.iter()
        .try_fold(root, |node, &index| node.children.get(index))
}

/// Index every node below `root`
///
/// One pre-order traversal in document order. The root and `rdf:li` items
/// are not indexed themselves, but their descendants are. Qualifiers are
/// never visited. When a name occurs more than once, the last occurrence
/// wins.
pub fn build_index(root: &Node) -> Index {
    let mut index = Index::default();
    let mut stack: Vec<(Vec<usize>, &Node)> = root
        .children
        .iter()
        .enumerate()
        .rev()
        .map(|(i, child)| (vec![i], child))
        .collect();

    while let Some((path, node)) = stack.pop() {
        for (i, child) in node.children.iter().enumerate().rev() {
            let mut child_path = path.clone();
            child_path.push(i);
            stack.push((child_path, child));
        }

        if node.is(ns::RDF, "li") {
            continue;
        }
        index
            .entries
            .entry(node.namespace.clone())
            .or_default()
            .insert(node.name.clone(), path);
    }

    log::debug!("Indexed {} XMP properties.", index.len());
    index
}
