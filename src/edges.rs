//! Stable integer indices for the edges of the supertree. The index of an
//! edge is the position of its length among the unknowns of the
//! least-squares problem.

use std::collections::HashMap;

use crate::tree::{Edge, Tree, TreeError};

/// Bijection between the edges of one tree and `0..len()`, built once from a
/// postorder edge traversal.
#[derive(Debug, Clone)]
pub struct EdgeIndex {
    index: HashMap<Edge, usize>,
    edges: Vec<Edge>,
}

impl EdgeIndex {
    /// Indexes every edge of the tree, from the leaves towards the root.
    /// ```
    /// use stbl::edges::EdgeIndex;
    /// use stbl::tree::Tree;
    ///
    /// // R=0 X=1 A=2 B=3 C=4
    /// let tree = Tree::from_newick("((A,B)X,C)R;").unwrap();
    /// let edges = EdgeIndex::new(&tree).unwrap();
    ///
    /// assert_eq!(edges.len(), 4);
    /// assert_eq!(edges.index_of(&(1, 2)), Some(0));
    /// assert_eq!(edges.index_of(&(0, 1)), Some(2));
    /// assert_eq!(edges.edge(3), Some((0, 4)));
    /// ```
    pub fn new(tree: &Tree) -> Result<Self, TreeError> {
        let edges = tree.postorder_edges()?;
        let index = edges
            .iter()
            .enumerate()
            .map(|(idx, edge)| (*edge, idx))
            .collect();

        Ok(Self { index, edges })
    }

    /// Index of the `(parent, child)` edge
    pub fn index_of(&self, edge: &Edge) -> Option<usize> {
        self.index.get(edge).copied()
    }

    /// Edge with the given index
    pub fn edge(&self, idx: usize) -> Option<Edge> {
        self.edges.get(idx).copied()
    }

    /// Number of indexed edges
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether the tree had no edges
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Iterates over `(index, edge)` in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, Edge)> + '_ {
        self.edges.iter().copied().enumerate()
    }
}
