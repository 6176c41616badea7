//! Enumerate leaf pairs at their lowest common ancestor and record the
//! source tree distances of each pair.
//!
//! Internal nodes are visited in postorder. At each internal node the direct
//! children are split into leaves and internal nodes, and every leaf pair
//! whose lowest common ancestor is the current node is reported exactly once.
//! See [`PairKind`] for the three ways this happens.

use crate::couplet::CoupletStore;
use crate::errors::FitError;
use crate::taxa::{taxon_of, TaxonId, TaxonSet};
use crate::tree::{NodeId, Tree, TreeError};

/// How the two leaves of a pair hang below their lowest common ancestor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairKind {
    /// Both leaves are direct children of the ancestor
    Sibling,
    /// One leaf is a direct child, the other is below an internal child
    AncestorAdjacent,
    /// The leaves are below two different internal children
    CrossSubtree,
}

/// A leaf pair and its lowest common ancestor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafPair {
    /// First leaf of the pair
    pub first: NodeId,
    /// Second leaf of the pair
    pub second: NodeId,
    /// Lowest common ancestor of the two leaves
    pub ancestor: NodeId,
    /// How the leaves relate to the ancestor
    pub kind: PairKind,
}

/// Calls `visit` once for every pair of leaves of the tree, at their lowest
/// common ancestor. Pairs are reported node by node in postorder; within a
/// node sibling pairs come first, then ancestor-adjacent pairs, then
/// cross-subtree pairs.
/// ```
/// use stbl::extract::{for_each_leaf_pair, PairKind};
/// use stbl::tree::Tree;
///
/// let tree = Tree::from_newick("(A,B,(C,D));").unwrap();
/// let mut kinds = vec![];
/// for_each_leaf_pair(&tree, |pair| {
///     kinds.push(pair.kind);
///     Ok::<_, stbl::tree::TreeError>(())
/// }).unwrap();
///
/// // (C,D) first, then (A,B), then A and B with C and D
/// assert_eq!(kinds.len(), 6);
/// assert_eq!(kinds[0], PairKind::Sibling);
/// assert_eq!(kinds[1], PairKind::Sibling);
/// assert!(kinds[2..].iter().all(|k| *k == PairKind::AncestorAdjacent));
/// ```
pub fn for_each_leaf_pair<F, E>(tree: &Tree, mut visit: F) -> Result<(), E>
where
    F: FnMut(LeafPair) -> Result<(), E>,
    E: From<TreeError>,
{
    for ancestor in tree.postorder_internal()? {
        let (leaf_children, internal_children): (Vec<NodeId>, Vec<NodeId>) = tree
            .get(&ancestor)?
            .children
            .iter()
            .partition(|child| tree.get(child).map_or(false, |node| node.is_tip()));

        let subtree_leaves: Vec<Vec<NodeId>> = internal_children
            .iter()
            .map(|child| tree.get_subtree_leaves(child))
            .collect::<Result<_, _>>()?;

        let mut report = |first: NodeId, second: NodeId, kind: PairKind| {
            visit(LeafPair {
                first,
                second,
                ancestor,
                kind,
            })
        };

        for (i, first) in leaf_children.iter().enumerate() {
            for second in leaf_children[i + 1..].iter() {
                report(*first, *second, PairKind::Sibling)?;
            }
        }

        for leaf in leaf_children.iter() {
            for below in subtree_leaves.iter().flatten() {
                report(*leaf, *below, PairKind::AncestorAdjacent)?;
            }
        }

        for (i, left) in subtree_leaves.iter().enumerate() {
            for right in subtree_leaves[i + 1..].iter() {
                for first in left.iter() {
                    for second in right.iter() {
                        report(*first, *second, PairKind::CrossSubtree)?;
                    }
                }
            }
        }
    }

    Ok(())
}

/// Records every leaf pair of source tree number `tree_idx` in the store,
/// with the sum of both leaves' distances to their lowest common ancestor.
/// Leaf labels must already be part of `taxa`. Returns the number of pairs
/// recorded.
pub fn derive_couplet_relations(
    tree: &Tree,
    tree_idx: usize,
    taxa: &TaxonSet,
    store: &mut CoupletStore,
) -> Result<usize, FitError> {
    let malformed = |source: TreeError| FitError::MalformedTree {
        tree: tree_idx,
        source,
    };

    let mapping = crate::taxa::leaf_taxa(tree, taxa).map_err(malformed)?;
    let root_distances = tree.root_distances().map_err(malformed)?;

    let taxon = |leaf: NodeId| -> Result<TaxonId, FitError> {
        taxon_of(&mapping, leaf).ok_or(FitError::MalformedTree {
            tree: tree_idx,
            source: TreeError::UnnamedLeaves,
        })
    };

    let mut n_pairs = 0;
    for_each_leaf_pair(tree, |pair| {
        let base = root_distances[pair.ancestor];
        let distance =
            (root_distances[pair.first] - base) + (root_distances[pair.second] - base);
        store.record_support(taxon(pair.first)?, taxon(pair.second)?, tree_idx, distance);
        n_pairs += 1;
        Ok::<_, FitError>(())
    })?;

    log::debug!(
        "Source tree {tree_idx}: {} leaves, {n_pairs} couplets",
        tree.n_leaves()
    );

    Ok(n_pairs)
}
