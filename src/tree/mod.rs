//! Build, read and write phylogenetic trees.
//!
//! This module defines the two structs used to represent both source trees
//! and the supertree:
//!  - The [`Node`] struct that represents a node of a phylogenetic tree.
//!  - The [`Tree`] struct that holds a collection of [`Node`] objects.
//!
//! Trees are read from Newick strings ([`Tree::from_newick`],
//! [`Tree::forest_from_newick`]) or from the `TREES` block of a Nexus file
//! ([`nexus::parse_nexus`]).

pub mod nexus;
mod node;
mod tree_impl;

pub use self::node::Node;
pub use self::tree_impl::{NewickParseError, Tree, TreeError};

/// A type that represents Identifiers of [`Node`] objects
/// within phylogenetic [`Tree`] object.
pub type NodeId = usize;

/// A type that represents branch lengths between [`Node`] objects
/// within phylogenetic [`Tree`] object.
pub type EdgeLength = f64;

/// An edge of a [`Tree`], identified by its `(parent, child)` node ids.
/// Edge identities are only meaningful within the tree they come from.
pub type Edge = (NodeId, NodeId);

/// Newick output format
#[derive(Debug, Copy, Clone)]
pub enum NewickFormat {
    /// Output names, branch lengths and comments
    AllFields,
    /// Only output topology
    Topology,
    /// Output names and branch lengths
    NoComments,
    /// Output node names
    OnlyNames,
}
