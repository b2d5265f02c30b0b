//! An ordered trie mapping key sequences to values.
//!
//! Dispatch points store their candidates keyed by parameter type tuple.
//! Looking up the candidates applicable to a call walks the trie one
//! argument at a time and drops a whole subtree as soon as one position
//! rejects the argument, which keeps resolution cheap once a dispatch point
//! has accumulated many overloads.
//!
//! Invariants:
//! - a child node exists only while its subtree holds at least one value
//! - `len()` equals the number of stored values
//!
//! Children keep insertion order, so every traversal is deterministic.

use std::fmt;
use std::hash::Hash;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use thiserror::Error;

/// Trie lookup errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrieError {
    #[error("key not found")]
    KeyNotFound,
}

type Children<K, V> = IndexMap<K, Node<K, V>, FxBuildHasher>;

#[derive(Clone)]
struct Node<K, V> {
    value: Option<V>,
    children: Children<K, V>,
}

impl<K, V> Default for Node<K, V> {
    fn default() -> Self {
        Self {
            value: None,
            children: IndexMap::default(),
        }
    }
}

impl<K, V> Node<K, V> {
    fn is_empty(&self) -> bool {
        self.value.is_none() && self.children.is_empty()
    }
}

impl<K: Hash + Eq, V: PartialEq> PartialEq for Node<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.children == other.children
    }
}

impl<K: Hash + Eq, V: Eq> Eq for Node<K, V> {}

/// Ordered map from key sequences to values.
#[derive(Clone)]
pub struct Trie<K, V> {
    root: Node<K, V>,
    len: usize,
}

impl<K, V> Default for Trie<K, V> {
    fn default() -> Self {
        Self {
            root: Node::default(),
            len: 0,
        }
    }
}

impl<K: Hash + Eq, V> Trie<K, V> {
    /// Create an empty trie.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.root = Node::default();
        self.len = 0;
    }

    /// Store `value` under `key`, returning the value it replaces.
    pub fn insert(&mut self, key: impl IntoIterator<Item = K>, value: V) -> Option<V> {
        let old = self.node_entry(key).value.replace(value);
        if old.is_none() {
            self.len += 1;
        }
        old
    }

    /// The value under `key`, inserting `f()` first when absent.
    pub fn get_or_insert_with(&mut self, key: impl IntoIterator<Item = K>, f: impl FnOnce() -> V) -> &mut V {
        let mut node = &mut self.root;
        for k in key {
            node = node.children.entry(k).or_default();
        }
        if node.value.is_none() {
            self.len += 1;
        }
        node.value.get_or_insert_with(f)
    }

    /// The value under `key`.
    pub fn get(&self, key: &[K]) -> Option<&V> {
        self.node(key)?.value.as_ref()
    }

    /// The value under `key`, mutably.
    pub fn get_mut(&mut self, key: &[K]) -> Option<&mut V> {
        let mut node = &mut self.root;
        for k in key {
            node = node.children.get_mut(k)?;
        }
        node.value.as_mut()
    }

    /// The value under `key`, or [`TrieError::KeyNotFound`].
    pub fn try_get(&self, key: &[K]) -> Result<&V, TrieError> {
        self.get(key).ok_or(TrieError::KeyNotFound)
    }

    /// The value under `key`, or `default`.
    pub fn get_or<'a>(&'a self, key: &[K], default: &'a V) -> &'a V {
        self.get(key).unwrap_or(default)
    }

    pub fn contains_key(&self, key: &[K]) -> bool {
        self.get(key).is_some()
    }

    /// Remove the value under `key`.
    ///
    /// Every ancestor left without a value and without children is removed
    /// as well, up to the first one still holding something.
    pub fn remove(&mut self, key: &[K]) -> Option<V> {
        let removed = remove_at(&mut self.root, key);
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Remove the value under `key`, or fail with [`TrieError::KeyNotFound`].
    pub fn try_remove(&mut self, key: &[K]) -> Result<V, TrieError> {
        self.remove(key).ok_or(TrieError::KeyNotFound)
    }

    /// Remove and return one entry: the first one in depth-first order.
    pub fn pop_arbitrary(&mut self) -> Option<(Vec<K>, V)>
    where
        K: Clone,
    {
        let mut path = Vec::new();
        let value = pop_first(&mut self.root, &mut path)?;
        self.len -= 1;
        Some((path, value))
    }

    /// Depth-first traversal yielding raw key lists.
    pub fn raw_iter(&self) -> RawIter<'_, K, V> {
        RawIter {
            stack: vec![(0, None, &self.root)],
            path: Vec::new(),
        }
    }

    /// Depth-first traversal yielding owned key sequences.
    pub fn iter(&self) -> impl Iterator<Item = (Vec<K>, &V)> + '_
    where
        K: Clone,
    {
        self.raw_iter()
            .map(|(path, v)| (path.into_iter().cloned().collect(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = Vec<K>> + '_
    where
        K: Clone,
    {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.raw_iter().map(|(_, v)| v)
    }

    /// Depth-first traversal of keys materialized through `joiner`.
    pub fn keys_joined<'a, J, F>(&'a self, mut joiner: F) -> impl Iterator<Item = J> + 'a
    where
        F: FnMut(&[&K]) -> J + 'a,
    {
        self.raw_iter().map(move |(path, _)| joiner(&path))
    }

    /// Visit values along every path whose keys `accept` lets through.
    ///
    /// `accept(depth, key)` decides whether to descend into the child under
    /// `key` at `depth`; a rejected child's subtree is never visited.
    /// `visit(depth, value)` sees every value reached, at depths up to and
    /// including `max_depth`.
    pub fn walk_pruned<'t, A, F>(&'t self, max_depth: usize, mut accept: A, mut visit: F)
    where
        A: FnMut(usize, &K) -> bool,
        F: FnMut(usize, &'t V),
    {
        walk(&self.root, 0, max_depth, &mut accept, &mut visit);
    }

    fn node(&self, key: &[K]) -> Option<&Node<K, V>> {
        let mut node = &self.root;
        for k in key {
            node = node.children.get(k)?;
        }
        Some(node)
    }

    fn node_entry(&mut self, key: impl IntoIterator<Item = K>) -> &mut Node<K, V> {
        let mut node = &mut self.root;
        for k in key {
            node = node.children.entry(k).or_default();
        }
        node
    }
}

fn remove_at<K: Hash + Eq, V>(node: &mut Node<K, V>, key: &[K]) -> Option<V> {
    let Some((head, rest)) = key.split_first() else {
        return node.value.take();
    };
    let child = node.children.get_mut(head)?;
    let removed = remove_at(child, rest);
    let prune = removed.is_some() && child.is_empty();
    if prune {
        node.children.shift_remove(head);
    }
    removed
}

fn pop_first<K: Hash + Eq + Clone, V>(node: &mut Node<K, V>, path: &mut Vec<K>) -> Option<V> {
    if let Some(value) = node.value.take() {
        return Some(value);
    }
    let (key, child) = node.children.get_index_mut(0)?;
    path.push(key.clone());
    let value = pop_first(child, path);
    if child.is_empty() {
        node.children.shift_remove_index(0);
    }
    value
}

fn walk<'t, K, V>(
    node: &'t Node<K, V>,
    depth: usize,
    max_depth: usize,
    accept: &mut dyn FnMut(usize, &K) -> bool,
    visit: &mut dyn FnMut(usize, &'t V),
) {
    if let Some(value) = &node.value {
        visit(depth, value);
    }
    if depth == max_depth {
        return;
    }
    for (key, child) in &node.children {
        if accept(depth, key) {
            walk(child, depth + 1, max_depth, accept, visit);
        }
    }
}

/// Depth-first iterator over `(raw key list, value)` pairs.
pub struct RawIter<'a, K, V> {
    stack: Vec<(usize, Option<&'a K>, &'a Node<K, V>)>,
    path: Vec<&'a K>,
}

impl<'a, K, V> Iterator for RawIter<'a, K, V> {
    type Item = (Vec<&'a K>, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((depth, key, node)) = self.stack.pop() {
            self.path.truncate(depth);
            if let Some(key) = key {
                self.path.push(key);
            }
            let child_depth = self.path.len();
            for (k, child) in node.children.iter().rev() {
                self.stack.push((child_depth, Some(k), child));
            }
            if let Some(value) = &node.value {
                return Some((self.path.clone(), value));
            }
        }
        None
    }
}

impl<K: Hash + Eq, V: PartialEq> PartialEq for Trie<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.root == other.root
    }
}

impl<K: Hash + Eq, V: Eq> Eq for Trie<K, V> {}

impl<K: Hash + Eq + fmt::Debug, V: fmt::Debug> fmt::Debug for Trie<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.raw_iter()).finish()
    }
}

impl<K: Hash + Eq, V> FromIterator<(Vec<K>, V)> for Trie<K, V> {
    fn from_iter<I: IntoIterator<Item = (Vec<K>, V)>>(iter: I) -> Self {
        let mut trie = Trie::new();
        trie.extend(iter);
        trie
    }
}

impl<K: Hash + Eq, V> Extend<(Vec<K>, V)> for Trie<K, V> {
    fn extend<I: IntoIterator<Item = (Vec<K>, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}
