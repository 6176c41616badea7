#![warn(missing_docs)]

//! Least-squares branch lengths for a fixed supertree topology.
//!
//! Given a collection of source trees with branch lengths, possibly covering
//! different subsets of taxa and disagreeing on their topologies, and the
//! topology of a supertree over all their taxa, this crate computes the
//! supertree branch lengths whose path lengths best match, in the
//! least-squares sense, the distances between taxa observed in the source
//! trees.
//!
//! The pipeline goes through:
//!  1. [`extract`]: every leaf pair of every source tree, at its lowest
//!     common ancestor, stored as a couplet in a [`couplet::CoupletStore`].
//!  2. [`edges`] and [`paths`]: the supertree edges between the two taxa of
//!     every couplet.
//!  3. [`weights`]: one weight per source tree.
//!  4. [`objective`]: one residual term per couplet, targetting its weighted
//!     average distance.
//!  5. [`solver`]: a non-negative solution of the objective, written back on
//!     the supertree by [`fit`].
//!
//! [`run::run`] chains all of this from files, as configured by a
//! [`config::FitConfig`].

pub mod config;
pub mod couplet;
pub mod edges;
pub mod errors;
pub mod extract;
pub mod fit;
pub mod input;
pub mod objective;
pub mod paths;
pub mod report;
pub mod run;
pub mod solver;
pub mod taxa;
pub mod tree;
pub mod weights;

pub use config::FitConfig;
pub use errors::FitError;
pub use fit::{fit_branch_lengths, FitContext, NegativeLengths};
pub use weights::WeightPolicy;
