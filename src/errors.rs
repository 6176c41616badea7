//! Errors that can end a branch length fitting run.

use std::path::PathBuf;

use thiserror::Error;

use crate::couplet::CoupletError;
use crate::input::InputError;
use crate::solver::SolverError;
use crate::tree::TreeError;

/// Errors that can occur during a run. All of them are fatal for the run.
#[derive(Error, Debug)]
pub enum FitError {
    /// A required setting is missing or invalid
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// A tree file could not be parsed
    #[error("Could not read trees from {}", path.display())]
    MalformedInput {
        /// File that failed to parse
        path: PathBuf,
        /// Underlying parse error
        #[source]
        source: InputError,
    },
    /// A source tree cannot be used (unnamed or duplicate leaves, missing branch lengths)
    #[error("Source tree {tree} is malformed")]
    MalformedTree {
        /// Index of the source tree
        tree: usize,
        /// What is wrong with it
        #[source]
        source: TreeError,
    },
    /// The supertree topology cannot be used
    #[error("The supertree is malformed")]
    MalformedSupertree(#[source] TreeError),
    /// No source tree was given
    #[error("No source trees to fit branch lengths from")]
    NoSourceTrees,
    /// A couplet of the source trees has no path in the supertree
    #[error("Couplet ({0}, {1}) has no path in the supertree")]
    UnsupportedCouplet(String, String),
    /// A source tree has no taxon belonging to a couplet supported by two trees or more
    #[error("Source tree {tree} has no taxon in a couplet supported by at least two source trees, its weight is undefined")]
    ZeroWeight {
        /// Index of the source tree
        tree: usize,
    },
    /// A couplet distance could not be averaged
    #[error("Could not average couplet distances")]
    Couplet(#[from] CoupletError),
    /// The solver failed or returned an unusable solution
    #[error("The least-squares solver failed")]
    Solver(#[from] SolverError),
    /// There was a [`TreeError`] while writing the results
    #[error("Tree error")]
    Tree(#[from] TreeError),
    /// There was an error rendering the run report
    #[error("Could not render the run report")]
    Report(#[from] tinytemplate::error::Error),
    /// There was a [`std::io::Error`] when writing outputs
    #[error("Error writing {}", path.display())]
    Io {
        /// File or directory being written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}
