//! Find the supertree edges lying between the two taxa of each couplet.

use crate::couplet::CoupletStore;
use crate::edges::EdgeIndex;
use crate::errors::FitError;
use crate::extract::for_each_leaf_pair;
use crate::taxa::{leaf_taxa, taxon_of, TaxonSet};
use crate::tree::{Edge, NodeId, Tree, TreeError};

/// Walks the supertree leaf pairs with the same classification used on the
/// source trees and, for every pair present in the store, adds the indices of
/// the edges between each leaf and their common ancestor to the couplet.
/// Pairs of the supertree that no source tree supports are skipped.
///
/// Every couplet must end up with at least one edge, otherwise one of its
/// taxa is missing from the supertree and [`FitError::UnsupportedCouplet`] is
/// returned. Returns the number of couplets that received a path.
/// Paths recorded by an earlier call are discarded first.
pub fn map_supertree_paths(
    supertree: &Tree,
    edges: &EdgeIndex,
    taxa: &TaxonSet,
    store: &mut CoupletStore,
) -> Result<usize, FitError> {
    let mapping = leaf_taxa(supertree, taxa).map_err(FitError::MalformedSupertree)?;
    store.clear_supertree_edges();

    let edge_index = |edge: Edge| -> Result<usize, FitError> {
        edges
            .index_of(&edge)
            .ok_or(FitError::MalformedSupertree(TreeError::NodeNotFound(edge.1)))
    };
    let path = |leaf: NodeId, ancestor: NodeId| -> Result<Vec<usize>, FitError> {
        supertree
            .path_to_ancestor(&leaf, &ancestor)
            .map_err(FitError::MalformedSupertree)?
            .into_iter()
            .map(edge_index)
            .collect()
    };

    let mut n_mapped = 0;
    for_each_leaf_pair(supertree, |pair| {
        let (Some(first), Some(second)) = (
            taxon_of(&mapping, pair.first),
            taxon_of(&mapping, pair.second),
        ) else {
            return Ok(());
        };
        if !store.contains(first, second) {
            return Ok(());
        }

        let mut path_edges = path(pair.first, pair.ancestor)?;
        path_edges.extend(path(pair.second, pair.ancestor)?);

        if let Some(couplet) = store.get_mut(first, second) {
            for edge in path_edges {
                couplet.add_supertree_edge(edge);
            }
            n_mapped += 1;
        }
        Ok::<_, FitError>(())
    })
    .map_err(|err| match err {
        FitError::Tree(source) => FitError::MalformedSupertree(source),
        other => other,
    })?;

    ensure_paths(store, taxa)?;

    log::debug!("Mapped supertree paths for {n_mapped} couplets");

    Ok(n_mapped)
}

/// Fails on the first couplet that did not receive any supertree edge.
fn ensure_paths(store: &CoupletStore, taxa: &TaxonSet) -> Result<(), FitError> {
    match store.iter().find(|couplet| couplet.supertree_edges().is_empty()) {
        None => Ok(()),
        Some(couplet) => {
            let (a, b) = couplet.taxa();
            let label = |id| taxa.label(id).unwrap_or("?").to_string();
            log::error!(
                "Couplet ({}, {}) of the source trees has no path in the supertree",
                label(a),
                label(b)
            );
            Err(FitError::UnsupportedCouplet(label(a), label(b)))
        }
    }
}
