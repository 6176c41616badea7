//! The taxon universe of a run: every leaf label seen in the source trees,
//! interned to a dense integer id.

use std::collections::HashMap;

use crate::tree::{NodeId, Tree, TreeError};

/// Identifier of a taxon within a [`TaxonSet`]
pub type TaxonId = usize;

/// De-duplicated set of taxon labels, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct TaxonSet {
    labels: Vec<String>,
    index: HashMap<String, TaxonId>,
}

impl TaxonSet {
    /// Create an empty taxon set
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a label to the set if it is new and returns its id.
    /// ```
    /// use stbl::taxa::TaxonSet;
    ///
    /// let mut taxa = TaxonSet::new();
    /// assert_eq!(taxa.insert("A"), 0);
    /// assert_eq!(taxa.insert("B"), 1);
    /// assert_eq!(taxa.insert("A"), 0);
    /// assert_eq!(taxa.len(), 2);
    /// ```
    pub fn insert(&mut self, label: &str) -> TaxonId {
        if let Some(id) = self.index.get(label) {
            return *id;
        }
        let id = self.labels.len();
        self.labels.push(label.to_string());
        self.index.insert(label.to_string(), id);

        id
    }

    /// Id of a label, if it is part of the set
    pub fn get(&self, label: &str) -> Option<TaxonId> {
        self.index.get(label).copied()
    }

    /// Label of a taxon id
    pub fn label(&self, id: TaxonId) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    /// Number of taxa in the set
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in first-seen order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// Maps the leaves of a tree to taxon ids, indexed by [`NodeId`]. Internal
/// nodes and leaves whose label is not in `taxa` map to `None`.
/// Fails if a leaf is unnamed or if a label is used twice.
pub fn leaf_taxa(tree: &Tree, taxa: &TaxonSet) -> Result<Vec<Option<TaxonId>>, TreeError> {
    // validates leaf labels
    tree.leaf_labels()?;

    let mut mapping = vec![None; tree.size()];
    for leaf in tree.get_leaves() {
        let node = tree.get(&leaf)?;
        mapping[leaf] = node.name.as_deref().and_then(|name| taxa.get(name));
    }

    Ok(mapping)
}

/// Looks up the taxon of a leaf in a mapping built by [`leaf_taxa`].
pub(crate) fn taxon_of(mapping: &[Option<TaxonId>], leaf: NodeId) -> Option<TaxonId> {
    mapping.get(leaf).copied().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_only_known_leaves() {
        let mut taxa = TaxonSet::new();
        taxa.insert("A");
        taxa.insert("C");

        let tree = Tree::from_newick("((A,B)X,C)R;").unwrap();
        let mapping = leaf_taxa(&tree, &taxa).unwrap();

        let a = tree.get_by_name("A").unwrap().id;
        let b = tree.get_by_name("B").unwrap().id;
        let c = tree.get_by_name("C").unwrap().id;
        let x = tree.get_by_name("X").unwrap().id;
        assert_eq!(taxon_of(&mapping, a), Some(0));
        assert_eq!(taxon_of(&mapping, b), None);
        assert_eq!(taxon_of(&mapping, c), Some(1));
        assert_eq!(taxon_of(&mapping, x), None);
        assert_eq!(taxon_of(&mapping, 99), None);
    }

    #[test]
    fn rejects_duplicate_leaves() {
        let taxa = TaxonSet::new();
        let tree = Tree::from_newick("((A,B),A);").unwrap();
        assert!(matches!(
            leaf_taxa(&tree, &taxa),
            Err(TreeError::DuplicateLeafNames(_))
        ));
    }
}
