//! Per source tree weights.
//!
//! A source tree is weighted by the inverse of twice the number of its taxa
//! that belong to at least one couplet supported by two source trees or
//! more. Each taxon is counted once, however many such couplets it is part
//! of.

use std::collections::BTreeSet;

use clap::ValueEnum;

use crate::couplet::CoupletStore;
use crate::errors::FitError;
use crate::taxa::TaxonId;

/// What to do with a source tree that has no taxon in a couplet supported by
/// at least two trees
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, ValueEnum)]
pub enum WeightPolicy {
    /// Fail the run
    #[default]
    Strict,
    /// Give the tree a weight of 0 so it does not contribute to any average
    Exclude,
}

/// Weights of all source trees of a run, indexed by source tree
#[derive(Debug, Clone)]
pub struct TreeWeights {
    weights: Vec<f64>,
    support_taxa: Vec<usize>,
}

impl TreeWeights {
    /// Computes the weight of each of the `n_trees` source trees from the
    /// supports recorded in the store.
    /// ```
    /// use stbl::couplet::CoupletStore;
    /// use stbl::weights::{TreeWeights, WeightPolicy};
    ///
    /// let mut store = CoupletStore::new();
    /// store.record_support(0, 1, 0, 2.0);
    /// store.record_support(0, 1, 1, 2.0);
    /// store.record_support(0, 2, 1, 3.0);
    ///
    /// let weights = TreeWeights::compute(2, &store, WeightPolicy::Strict).unwrap();
    /// // Only taxa 0 and 1 are in a couplet supported twice
    /// assert_eq!(weights.support_taxa(), &[2, 2]);
    /// assert_eq!(weights.weights(), &[0.25, 0.25]);
    /// ```
    pub fn compute(
        n_trees: usize,
        store: &CoupletStore,
        policy: WeightPolicy,
    ) -> Result<Self, FitError> {
        let mut qualifying: Vec<BTreeSet<TaxonId>> = vec![BTreeSet::new(); n_trees];
        for couplet in store.iter().filter(|couplet| couplet.support() >= 2) {
            let (a, b) = couplet.taxa();
            for tree in couplet.supporting_trees() {
                if let Some(taxa) = qualifying.get_mut(*tree) {
                    taxa.insert(a);
                    taxa.insert(b);
                }
            }
        }

        let support_taxa: Vec<usize> = qualifying.iter().map(BTreeSet::len).collect();
        let mut weights = Vec::with_capacity(n_trees);
        for (tree, n_taxa) in support_taxa.iter().enumerate() {
            let count = 2 * n_taxa;
            if count > 0 {
                weights.push(1.0 / count as f64);
                continue;
            }
            match policy {
                WeightPolicy::Strict => return Err(FitError::ZeroWeight { tree }),
                WeightPolicy::Exclude => {
                    log::warn!(
                        "Source tree {tree} shares no supported couplet with other trees, it is excluded from the averages"
                    );
                    weights.push(0.0);
                }
            }
        }

        Ok(Self {
            weights,
            support_taxa,
        })
    }

    /// Weight of every source tree
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Number of taxa of every source tree that made it count
    pub fn support_taxa(&self) -> &[usize] {
        &self.support_taxa
    }

    /// Weight of a single source tree
    pub fn get(&self, tree: usize) -> Option<f64> {
        self.weights.get(tree).copied()
    }

    /// Number of source trees
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether there are no source trees
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::derive_couplet_relations;
    use crate::taxa::TaxonSet;
    use crate::tree::Tree;

    fn store_from(sources: &[&str]) -> CoupletStore {
        let mut taxa = TaxonSet::new();
        let mut store = CoupletStore::new();
        for (idx, newick) in sources.iter().enumerate() {
            let tree = Tree::from_newick(newick).unwrap();
            for label in tree.leaf_labels().unwrap() {
                taxa.insert(&label);
            }
            derive_couplet_relations(&tree, idx, &taxa, &mut store).unwrap();
        }
        store
    }

    #[test]
    fn taxa_counted_once() {
        // Every couplet is supported by both trees
        let store = store_from(&["((A:1,B:1):1,(C:1,D:1):1);", "((A:1,C:1):1,(B:1,D:1):1);"]);
        let weights = TreeWeights::compute(2, &store, WeightPolicy::Strict).unwrap();

        assert_eq!(weights.support_taxa(), &[4, 4]);
        assert_eq!(weights.weights(), &[0.125, 0.125]);
    }

    #[test]
    fn partial_overlap() {
        let store = store_from(&[
            "((A:1,B:1):1,(C:1,D:1):1);",
            "((A:1,C:1):1,(B:1,D:1):1);",
            "((E:1,F:1):1,A:1,B:1);",
        ]);
        let weights = TreeWeights::compute(3, &store, WeightPolicy::Strict).unwrap();

        // The third tree only shares the (A,B) couplet
        assert_eq!(weights.support_taxa(), &[4, 4, 2]);
        assert_eq!(weights.weights(), &[0.125, 0.125, 0.25]);
        assert!(weights.weights().iter().all(|w| w.is_finite()));
    }

    #[test]
    fn zero_weight_is_an_error() {
        let store = store_from(&["((A:1,B:1):1,C:1);", "(D:1,E:1);"]);
        assert!(matches!(
            TreeWeights::compute(2, &store, WeightPolicy::Strict),
            Err(FitError::ZeroWeight { tree: 0 })
        ));
    }

    #[test]
    fn zero_weight_excluded() {
        let store = store_from(&[
            "((A:1,B:1):1,C:1);",
            "((A:2,B:2):1,C:2);",
            "(D:1,E:1);",
        ]);
        let weights = TreeWeights::compute(3, &store, WeightPolicy::Exclude).unwrap();
        assert_eq!(weights.get(2), Some(0.0));
        assert_eq!(weights.get(0), Some(1.0 / 6.0));
        assert_eq!(weights.len(), 3);
    }
}
