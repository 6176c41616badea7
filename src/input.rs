//! Reading source trees and the supertree topology from files.

use std::path::Path;

use clap::ValueEnum;
use thiserror::Error;

use crate::errors::FitError;
use crate::tree::nexus::{read_nexus, NexusError};
use crate::tree::{NewickParseError, Tree};

/// Supported tree file formats
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, ValueEnum)]
pub enum TreeFormat {
    /// One or more `;`-terminated newick trees
    #[default]
    Newick,
    /// The `TREES` block(s) of a nexus file
    Nexus,
}

/// Parse errors for either tree format
#[derive(Error, Debug)]
pub enum InputError {
    /// Newick parse error
    #[error("Invalid newick")]
    Newick(#[from] NewickParseError),
    /// Nexus parse error
    #[error("Invalid nexus")]
    Nexus(#[from] NexusError),
}

/// Reads every tree of a file
pub fn read_trees(path: &Path, format: TreeFormat) -> Result<Vec<Tree>, FitError> {
    let trees = match format {
        TreeFormat::Newick => Tree::forest_from_file(path).map_err(InputError::from),
        TreeFormat::Nexus => read_nexus(path).map_err(InputError::from),
    };

    trees.map_err(|source| FitError::MalformedInput {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads the first tree of a file. Extra trees are ignored with a warning.
pub fn read_tree(path: &Path, format: TreeFormat) -> Result<Tree, FitError> {
    let mut trees = read_trees(path, format)?;
    if trees.len() > 1 {
        log::warn!(
            "{} contains {} trees, only the first one is used",
            path.display(),
            trees.len()
        );
    }

    Ok(trees.swap_remove(0))
}
