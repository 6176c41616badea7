//! Couplet relations: what the source trees say about each pair of taxa.
//!
//! A couplet is an unordered pair of taxa. Its [`CoupletRelation`] records
//! which source trees contain both taxa, the distance between them in each
//! of those trees, and (once the supertree is indexed) the supertree edges on
//! the path between them.

use std::collections::{BTreeSet, HashMap};

use accurate::sum::Sum2;
use accurate::traits::*;
use thiserror::Error;

use crate::taxa::TaxonId;
use crate::tree::EdgeLength;

/// Errors that can occur when averaging couplet distances.
#[derive(Error, Debug)]
pub enum CoupletError {
    /// No source tree supports the couplet
    #[error("Couplet ({0}, {1}) is not supported by any source tree")]
    NoSupport(TaxonId, TaxonId),
    /// Every source tree supporting the couplet has a weight of zero
    #[error("Source trees supporting couplet ({0}, {1}) have a total weight of zero")]
    ZeroTotalWeight(TaxonId, TaxonId),
    /// A supporting tree has no weight
    #[error("No weight for source tree {tree} ({n_weights} weights available)")]
    MissingWeight {
        /// Index of the source tree
        tree: usize,
        /// Number of tree weights
        n_weights: usize,
    },
}

/// Per-couplet record aggregated over the source trees.
#[derive(Debug, Clone)]
pub struct CoupletRelation {
    taxa: (TaxonId, TaxonId),
    supporting_trees: Vec<usize>,
    distances: Vec<EdgeLength>,
    supertree_edges: BTreeSet<usize>,
}

impl CoupletRelation {
    fn new(first: TaxonId, second: TaxonId) -> Self {
        Self {
            taxa: (first, second),
            supporting_trees: vec![],
            distances: vec![],
            supertree_edges: BTreeSet::new(),
        }
    }

    /// The two taxa, in the orientation they were first seen
    pub fn taxa(&self) -> (TaxonId, TaxonId) {
        self.taxa
    }

    /// Notes that source tree `tree` contains the couplet at distance `distance`
    pub fn record_support(&mut self, tree: usize, distance: EdgeLength) {
        self.supporting_trees.push(tree);
        self.distances.push(distance);
    }

    /// Number of source trees supporting the couplet
    pub fn support(&self) -> usize {
        self.supporting_trees.len()
    }

    /// Indices of the supporting source trees, in processing order
    pub fn supporting_trees(&self) -> &[usize] {
        &self.supporting_trees
    }

    /// Couplet distance in each supporting tree, parallel to [`Self::supporting_trees`]
    pub fn distances(&self) -> &[EdgeLength] {
        &self.distances
    }

    /// Adds a supertree edge index to the couplet's path
    pub fn add_supertree_edge(&mut self, edge: usize) {
        self.supertree_edges.insert(edge);
    }

    /// Forgets the supertree path of the couplet
    pub fn clear_supertree_edges(&mut self) {
        self.supertree_edges.clear();
    }

    /// Supertree edge indices on the path between the two taxa
    pub fn supertree_edges(&self) -> &BTreeSet<usize> {
        &self.supertree_edges
    }

    /// Weighted average of the couplet distances, each supporting tree
    /// weighted by `weights[tree]`.
    /// ```
    /// use stbl::couplet::CoupletStore;
    ///
    /// let mut store = CoupletStore::new();
    /// let couplet = store.get_or_create(0, 1);
    /// couplet.record_support(0, 2.0);
    /// couplet.record_support(1, 4.0);
    ///
    /// let avg = store.get(0, 1).unwrap().average_distance(&[0.75, 0.25]).unwrap();
    /// assert!((avg - 2.5).abs() < 1e-12);
    /// ```
    pub fn average_distance(&self, weights: &[f64]) -> Result<f64, CoupletError> {
        if self.supporting_trees.is_empty() {
            return Err(CoupletError::NoSupport(self.taxa.0, self.taxa.1));
        }

        let tree_weights: Vec<f64> = self
            .supporting_trees
            .iter()
            .map(|tree| {
                weights.get(*tree).copied().ok_or(CoupletError::MissingWeight {
                    tree: *tree,
                    n_weights: weights.len(),
                })
            })
            .collect::<Result<_, _>>()?;

        let denominator: f64 = tree_weights.iter().cloned().sum_with_accumulator::<Sum2<_>>();
        if denominator <= 0.0 {
            return Err(CoupletError::ZeroTotalWeight(self.taxa.0, self.taxa.1));
        }
        let numerator: f64 = self
            .distances
            .iter()
            .zip(tree_weights.iter())
            .map(|(d, w)| d * w)
            .sum_with_accumulator::<Sum2<_>>();

        Ok(numerator / denominator)
    }
}

/// All couplet relations of a run, addressed by unordered taxon pair.
/// Relations are kept in creation order.
#[derive(Debug, Clone, Default)]
pub struct CoupletStore {
    index: HashMap<(TaxonId, TaxonId), usize>,
    relations: Vec<CoupletRelation>,
}

impl CoupletStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Position of the couplet in the store, whichever way round it is given
    pub fn position(&self, a: TaxonId, b: TaxonId) -> Option<usize> {
        self.index
            .get(&(a, b))
            .or_else(|| self.index.get(&(b, a)))
            .copied()
    }

    /// Whether the couplet exists in the store
    pub fn contains(&self, a: TaxonId, b: TaxonId) -> bool {
        self.position(a, b).is_some()
    }

    /// Get a couplet relation regardless of pair order
    pub fn get(&self, a: TaxonId, b: TaxonId) -> Option<&CoupletRelation> {
        self.position(a, b).map(|idx| &self.relations[idx])
    }

    /// Get a mutable couplet relation regardless of pair order
    pub fn get_mut(&mut self, a: TaxonId, b: TaxonId) -> Option<&mut CoupletRelation> {
        self.position(a, b).map(|idx| &mut self.relations[idx])
    }

    /// Get the relation of a couplet, creating it with the `(a, b)`
    /// orientation if it does not exist yet.
    /// ```
    /// use stbl::couplet::CoupletStore;
    ///
    /// let mut store = CoupletStore::new();
    /// store.get_or_create(3, 1);
    /// assert_eq!(store.get_or_create(1, 3).taxa(), (3, 1));
    /// assert_eq!(store.len(), 1);
    /// ```
    pub fn get_or_create(&mut self, a: TaxonId, b: TaxonId) -> &mut CoupletRelation {
        let idx = match self.position(a, b) {
            Some(idx) => idx,
            None => {
                let idx = self.relations.len();
                self.relations.push(CoupletRelation::new(a, b));
                self.index.insert((a, b), idx);
                idx
            }
        };

        &mut self.relations[idx]
    }

    /// Records that source tree `tree` supports the couplet at distance `distance`
    pub fn record_support(&mut self, a: TaxonId, b: TaxonId, tree: usize, distance: EdgeLength) {
        self.get_or_create(a, b).record_support(tree, distance)
    }

    /// Number of couplets in the store
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Iterates over the relations in creation order
    pub fn iter(&self) -> impl Iterator<Item = &CoupletRelation> {
        self.relations.iter()
    }

    /// Mutable iteration over the relations in creation order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut CoupletRelation> {
        self.relations.iter_mut()
    }

    /// Forgets the supertree paths of every couplet, keeping their support
    pub fn clear_supertree_edges(&mut self) {
        self.relations
            .iter_mut()
            .for_each(CoupletRelation::clear_supertree_edges);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unordered_lookup() {
        let mut store = CoupletStore::new();
        store.record_support(0, 1, 0, 2.0);
        store.record_support(1, 0, 1, 3.0);
        store.record_support(2, 0, 1, 5.0);

        assert_eq!(store.len(), 2);
        assert!(store.contains(0, 2));
        assert!(!store.contains(1, 2));

        let couplet = store.get(1, 0).unwrap();
        assert_eq!(couplet.taxa(), (0, 1));
        assert_eq!(couplet.supporting_trees(), &[0, 1]);
        assert_eq!(couplet.distances(), &[2.0, 3.0]);
        assert_eq!(couplet.support(), 2);
    }

    #[test]
    fn average_is_convex_combination() {
        let mut store = CoupletStore::new();
        let distances = [1.5, 7.25, 3.0, 0.5];
        for (tree, d) in distances.iter().enumerate() {
            store.record_support(4, 9, tree, *d);
        }

        for weights in [
            vec![1.0, 1.0, 1.0, 1.0],
            vec![0.1, 0.5, 0.25, 0.125],
            vec![0.0, 0.0, 1.0, 0.0],
            vec![1e-6, 1e3, 1e-3, 10.0],
        ] {
            let avg = store.get(9, 4).unwrap().average_distance(&weights).unwrap();
            assert!(avg >= 0.5 - 1e-12 && avg <= 7.25 + 1e-12, "{avg}");
        }

        let avg = store.get(4, 9).unwrap().average_distance(&[0.0, 0.0, 1.0, 0.0]).unwrap();
        assert!((avg - 3.0).abs() < 1e-12);
    }

    #[test]
    fn average_failures() {
        let mut store = CoupletStore::new();
        store.get_or_create(0, 1);
        assert!(matches!(
            store.get(0, 1).unwrap().average_distance(&[1.0]),
            Err(CoupletError::NoSupport(0, 1))
        ));

        store.record_support(0, 1, 0, 2.0);
        assert!(matches!(
            store.get(0, 1).unwrap().average_distance(&[0.0]),
            Err(CoupletError::ZeroTotalWeight(0, 1))
        ));

        store.record_support(0, 1, 3, 2.0);
        assert!(matches!(
            store.get(0, 1).unwrap().average_distance(&[1.0]),
            Err(CoupletError::MissingWeight { tree: 3, n_weights: 1 })
        ));
    }

    #[test]
    fn supertree_edges_are_deduplicated() {
        let mut store = CoupletStore::new();
        let couplet = store.get_or_create(0, 1);
        for edge in [4, 2, 4, 7, 2] {
            couplet.add_supertree_edge(edge);
        }
        assert_eq!(
            couplet.supertree_edges().iter().copied().collect::<Vec<_>>(),
            vec![2, 4, 7]
        );
    }

    #[test]
    fn clearing_paths_keeps_support() {
        let mut store = CoupletStore::new();
        store.record_support(0, 1, 3, 2.5);
        store.get_or_create(0, 1).add_supertree_edge(4);
        store.get_or_create(1, 2).add_supertree_edge(1);

        store.clear_supertree_edges();

        assert!(store.iter().all(|c| c.supertree_edges().is_empty()));
        let couplet = store.get(1, 0).unwrap();
        assert_eq!(couplet.supporting_trees(), &[3]);
        assert_eq!(couplet.distances(), &[2.5]);
    }
}
