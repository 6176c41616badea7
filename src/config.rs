//! Settings of a branch length fitting run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::FitError;
use crate::fit::NegativeLengths;
use crate::input::TreeFormat;
use crate::solver::{ExternalSolver, NonNegativeLeastSquares, Solver};
use crate::weights::WeightPolicy;

/// Name of the directory created next to the topology file for the outputs
pub const OUTPUT_DIR_NAME: &str = "CUSTOM_SUPERTREE_QP";

/// Default time an external solver may run for
pub const DEFAULT_SOLVER_TIMEOUT: Duration = Duration::from_secs(3600);

/// Which solver minimizes the objective
#[derive(Debug, Clone, PartialEq)]
pub enum SolverKind {
    /// Coordinate descent, in process
    InProcess {
        /// Convergence threshold on coordinate moves
        tolerance: f64,
        /// Maximum number of sweeps
        max_sweeps: usize,
    },
    /// External executable called with the exchange files
    External {
        /// Path of the executable, required
        executable: Option<PathBuf>,
        /// Time after which the executable is killed
        timeout: Duration,
    },
}

impl Default for SolverKind {
    fn default() -> Self {
        let defaults = NonNegativeLeastSquares::default();
        Self::InProcess {
            tolerance: defaults.tolerance,
            max_sweeps: defaults.max_sweeps,
        }
    }
}

/// Everything a run needs to know. Build it with the setters then call
/// [`FitConfig::validate`] before starting.
/// ```
/// use stbl::config::FitConfig;
///
/// let config = FitConfig::new()
///     .source_trees("sources.tre")
///     .topology("data/topology.tre");
/// config.validate().unwrap();
///
/// assert_eq!(
///     config.output_directory(),
///     std::path::Path::new("data/CUSTOM_SUPERTREE_QP")
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct FitConfig {
    /// File with the source trees
    pub source_trees: Option<PathBuf>,
    /// Format of the source tree file
    pub source_format: TreeFormat,
    /// File with the supertree topology
    pub topology: Option<PathBuf>,
    /// Format of the topology file
    pub topology_format: TreeFormat,
    /// Solver settings
    pub solver: SolverKind,
    /// Handling of source trees with an undefined weight
    pub weight_policy: WeightPolicy,
    /// Handling of negative solved lengths
    pub negative_lengths: NegativeLengths,
    /// Output directory, defaults to a directory next to the topology file
    pub output_dir: Option<PathBuf>,
    /// Whether to draw a progress bar while reading source trees
    pub show_progress: bool,
}

impl FitConfig {
    /// Default configuration, without input files
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the source tree file
    pub fn source_trees(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_trees = Some(path.into());
        self
    }

    /// Set the source tree file format
    pub fn source_format(mut self, format: TreeFormat) -> Self {
        self.source_format = format;
        self
    }

    /// Set the topology file
    pub fn topology(mut self, path: impl Into<PathBuf>) -> Self {
        self.topology = Some(path.into());
        self
    }

    /// Set the topology file format
    pub fn topology_format(mut self, format: TreeFormat) -> Self {
        self.topology_format = format;
        self
    }

    /// Set the solver
    pub fn solver(mut self, solver: SolverKind) -> Self {
        self.solver = solver;
        self
    }

    /// Set the weight policy
    pub fn weight_policy(mut self, policy: WeightPolicy) -> Self {
        self.weight_policy = policy;
        self
    }

    /// Set the negative lengths policy
    pub fn negative_lengths(mut self, policy: NegativeLengths) -> Self {
        self.negative_lengths = policy;
        self
    }

    /// Set the output directory
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Show or hide progress bars
    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Checks that every required setting is given, before any file is read.
    pub fn validate(&self) -> Result<(), FitError> {
        if self.source_trees.is_none() {
            return Err(FitError::Configuration(
                "no source tree file given".to_string(),
            ));
        }
        if self.topology.is_none() {
            return Err(FitError::Configuration(
                "no supertree topology file given".to_string(),
            ));
        }
        match &self.solver {
            SolverKind::InProcess { tolerance, .. } => {
                if !tolerance.is_finite() || *tolerance < 0.0 {
                    return Err(FitError::Configuration(format!(
                        "invalid solver tolerance {tolerance}"
                    )));
                }
            }
            SolverKind::External { executable, .. } => {
                if executable.is_none() {
                    return Err(FitError::Configuration(
                        "the external solver needs an executable path".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Directory receiving the outputs of the run
    pub fn output_directory(&self) -> PathBuf {
        if let Some(dir) = &self.output_dir {
            return dir.clone();
        }
        self.topology
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or_else(|| Path::new(""))
            .join(OUTPUT_DIR_NAME)
    }

    /// Builds the configured solver. Exchange files of an external solver go
    /// to the output directory.
    pub fn make_solver(&self) -> Result<Box<dyn Solver>, FitError> {
        match &self.solver {
            SolverKind::InProcess {
                tolerance,
                max_sweeps,
            } => Ok(Box::new(NonNegativeLeastSquares::new(*tolerance, *max_sweeps))),
            SolverKind::External {
                executable,
                timeout,
            } => {
                let executable = executable.clone().ok_or_else(|| {
                    FitError::Configuration(
                        "the external solver needs an executable path".to_string(),
                    )
                })?;
                Ok(Box::new(ExternalSolver {
                    executable,
                    workdir: self.output_directory(),
                    timeout: *timeout,
                }))
            }
        }
    }

    /// Whether outputs include the solver exchange files
    pub fn uses_external_solver(&self) -> bool {
        matches!(self.solver, SolverKind::External { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_inputs() {
        assert!(matches!(
            FitConfig::new().topology("t.tre").validate(),
            Err(FitError::Configuration(_))
        ));
        assert!(matches!(
            FitConfig::new().source_trees("s.tre").validate(),
            Err(FitError::Configuration(_))
        ));
    }

    #[test]
    fn external_solver_needs_a_path() {
        let config = FitConfig::new()
            .source_trees("s.tre")
            .topology("t.tre")
            .solver(SolverKind::External {
                executable: None,
                timeout: DEFAULT_SOLVER_TIMEOUT,
            });
        assert!(matches!(config.validate(), Err(FitError::Configuration(_))));
        assert!(config.make_solver().is_err());

        let config = config.solver(SolverKind::External {
            executable: Some("/opt/qp".into()),
            timeout: DEFAULT_SOLVER_TIMEOUT,
        });
        config.validate().unwrap();
        assert!(config.uses_external_solver());
    }

    #[test]
    fn invalid_tolerance() {
        let config = FitConfig::new()
            .source_trees("s.tre")
            .topology("t.tre")
            .solver(SolverKind::InProcess {
                tolerance: f64::NAN,
                max_sweeps: 10,
            });
        assert!(matches!(config.validate(), Err(FitError::Configuration(_))));
    }

    #[test]
    fn output_directory() {
        let config = FitConfig::new().topology("t.tre");
        assert_eq!(config.output_directory(), PathBuf::from(OUTPUT_DIR_NAME));

        let config = config.output_dir("/tmp/out");
        assert_eq!(config.output_directory(), PathBuf::from("/tmp/out"));
    }

    #[test]
    fn defaults() {
        let config = FitConfig::new();
        assert_eq!(config.weight_policy, WeightPolicy::Strict);
        assert_eq!(config.negative_lengths, NegativeLengths::Clamp);
        assert_eq!(config.source_format, TreeFormat::Newick);
        assert!(!config.uses_external_solver());
    }
}
