use clap::{Parser, Subcommand};
use std::path::PathBuf;

use stbl::input::TreeFormat;
use stbl::{NegativeLengths, WeightPolicy};

/// Fit branch lengths on a supertree topology from a collection of source trees
#[derive(Parser, Debug)]
pub struct Args {
    #[command(subcommand)]
    /// The command to execute
    pub command: Commands,

    /// Show debug messages
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// The available commands in the `stbl` tool
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fit the branch lengths of a supertree topology
    ///
    /// Outputs are written to a CUSTOM_SUPERTREE_QP directory next to
    /// the topology file unless --output is given.
    #[clap(verbatim_doc_comment)]
    Fit {
        /// File with the source trees
        #[arg(short, long)]
        sources: Option<PathBuf>,

        /// Format of the source tree file
        #[arg(value_enum, long, default_value_t = TreeFormat::Newick)]
        source_format: TreeFormat,

        /// File with the supertree topology
        #[arg(short, long)]
        topology: Option<PathBuf>,

        /// Format of the topology file
        #[arg(value_enum, long, default_value_t = TreeFormat::Newick)]
        topology_format: TreeFormat,

        /// External solver executable, called as `<solver> <input> <output>`
        #[arg(long)]
        solver: Option<PathBuf>,

        /// Seconds after which the external solver is killed
        #[arg(long, default_value_t = 3600)]
        solver_timeout: u64,

        /// Convergence threshold of the built-in solver
        #[arg(long, default_value_t = 1e-9)]
        tolerance: f64,

        /// Maximum number of sweeps of the built-in solver
        #[arg(long, default_value_t = 100_000)]
        max_sweeps: usize,

        /// What to do with source trees sharing no couplet with other trees
        #[arg(value_enum, long, default_value_t = WeightPolicy::Strict)]
        weights: WeightPolicy,

        /// What to do with negative solved lengths
        #[arg(value_enum, long, default_value_t = NegativeLengths::Clamp)]
        negative: NegativeLengths,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the fitted supertree in the terminal
        #[arg(short, long)]
        print: bool,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Generate shell completion scripts for the stbl tool
    Completion {
        /// The shell to generate the completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
