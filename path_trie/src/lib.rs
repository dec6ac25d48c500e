//! A trie keyed by ordered sequences of path segments.
//!
//! This is the data structure backing the [index catalog][index_catalog]:
//! entries are addressed by a `[store, shard, column]` triple, but the trie
//! itself is agnostic to what a "segment" or a "value" is.
//!
//! [index_catalog]: https://docs.rs/index_catalog
#![warn(missing_docs, missing_debug_implementations)]

use std::collections::BTreeMap;

#[derive(Debug)]
struct Node<K, V> {
    children: BTreeMap<K, Node<K, V>>,
    value: Option<V>,
}

impl<K: Ord, V> Default for Node<K, V> {
    fn default() -> Self {
        Self {
            children: BTreeMap::new(),
            value: None,
        }
    }
}

/// A trie keyed by `Vec<K>` path segments, storing at most one `V` per path.
#[derive(Debug)]
pub struct Trie<K, V> {
    root: Node<K, V>,
}

impl<K: Ord + Clone, V> Default for Trie<K, V> {
    fn default() -> Self {
        Self {
            root: Node::default(),
        }
    }
}

impl<K: Ord + Clone, V> Trie<K, V> {
    /// Create an empty trie.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` at `path`, overwriting any value already stored there.
    /// Idempotent: inserting the same `(path, value)` pair twice leaves the
    /// trie in the same state as inserting it once.
    pub fn insert(&mut self, path: &[K], value: V) {
        let mut node = &mut self.root;
        for key in path {
            node = node.children.entry(key.clone()).or_default();
        }
        node.value = Some(value);
    }

    /// Exact lookup: returns the value stored at `path`, if any.
    pub fn search(&self, path: &[K]) -> Option<&V> {
        let mut node = &self.root;
        for key in path {
            node = node.children.get(key)?;
        }
        node.value.as_ref()
    }

    /// Exact lookup returning a mutable reference.
    pub fn search_mut(&mut self, path: &[K]) -> Option<&mut V> {
        let mut node = &mut self.root;
        for key in path {
            node = node.children.get_mut(key)?;
        }
        node.value.as_mut()
    }

    /// In-order depth-first enumeration of every path that has a stored
    /// value. For every enumerated path `p`, `search(p)` returns the value
    /// most recently inserted at `p`.
    pub fn keys(&self) -> Vec<Vec<K>> {
        let mut out = Vec::new();
        Self::traverse(&self.root, &mut Vec::new(), &mut out);
        out
    }

    fn traverse(node: &Node<K, V>, path: &mut Vec<K>, out: &mut Vec<Vec<K>>) {
        if node.value.is_some() {
            out.push(path.clone());
        }
        for (key, child) in &node.children {
            path.push(key.clone());
            Self::traverse(child, path, out);
            path.pop();
        }
    }
}
