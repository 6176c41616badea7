//! A complete run: read the inputs, fit the branch lengths, write the outputs.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use indicatif::{ProgressBar, ProgressIterator};

use crate::config::{FitConfig, SolverKind};
use crate::errors::FitError;
use crate::fit::{FitContext, FitOutcome};
use crate::input::{read_tree, read_trees};
use crate::report::{ReportInputs, RunReport, Timings, REPORT_FILE};
use crate::tree::{NewickFormat, Tree};

/// Name of the fitted supertree file in the output directory
pub const TREE_FILE: &str = "CUSTOM_SUPERTREE_with_branch_length_newick.tre";

/// Files written by a successful run
#[derive(Debug, Clone)]
pub struct RunOutputs {
    /// The fitted supertree, in newick
    pub tree: PathBuf,
    /// The run report
    pub report: PathBuf,
    /// The fitted supertree itself
    pub supertree: Tree,
}

/// Runs the whole pipeline described by `config`. Nothing is written to the
/// output directory unless the fit succeeds, except the exchange files of an
/// external solver.
pub fn run(config: &FitConfig) -> Result<RunOutputs, FitError> {
    config.validate()?;
    let (Some(source_path), Some(topology_path)) = (&config.source_trees, &config.topology) else {
        return Err(FitError::Configuration("missing input files".to_string()));
    };

    let start = Instant::now();

    log::info!("Reading source trees from {}", source_path.display());
    let sources = read_trees(source_path, config.source_format)?;
    log::info!("Reading supertree topology from {}", topology_path.display());
    let mut supertree = read_tree(topology_path, config.topology_format)?;
    let topology = supertree.to_formatted_newick(NewickFormat::OnlyNames)?;
    let reading = start.elapsed();

    let output_dir = config.output_directory();
    if config.uses_external_solver() {
        create_dir(&output_dir)?;
    }

    let fitting_start = Instant::now();
    let mut context = FitContext::new();
    let progress = if config.show_progress {
        ProgressBar::new(sources.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    for tree in sources.iter().progress_with(progress) {
        context.add_source_tree(tree)?;
    }
    log::info!(
        "Read {} source trees over {} taxa",
        context.n_trees(),
        context.taxa().len()
    );

    let problem = context.build_problem(&supertree, config.weight_policy)?;
    let solver = config.make_solver()?;
    let solution = problem.solve(solver.as_ref())?;
    let objective_value = problem.objective.value(&solution);
    let n_replaced = problem.apply(&mut supertree, &solution, config.negative_lengths)?;
    let outcome = FitOutcome {
        problem,
        solution,
        objective_value,
        n_replaced,
    };
    let fitting = fitting_start.elapsed();
    log::info!("Objective value at the solution: {objective_value}");

    create_dir(&output_dir)?;
    let tree_path = output_dir.join(TREE_FILE);
    supertree.to_file(&tree_path)?;
    log::info!("Fitted supertree written to {}", tree_path.display());

    let fitted = supertree.to_formatted_newick(NewickFormat::NoComments)?;
    let report = RunReport::new(
        ReportInputs {
            source_file: source_path,
            topology_file: topology_path,
            solver: &describe_solver(&config.solver),
            topology: &topology,
            fitted: &fitted,
        },
        &context,
        &outcome,
        Timings::new(reading, fitting, start.elapsed()),
    );
    let report_path = output_dir.join(REPORT_FILE);
    report.write(&report_path)?;

    Ok(RunOutputs {
        tree: tree_path,
        report: report_path,
        supertree,
    })
}

fn create_dir(dir: &Path) -> Result<(), FitError> {
    fs::create_dir_all(dir).map_err(|source| FitError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

fn describe_solver(solver: &SolverKind) -> String {
    match solver {
        SolverKind::InProcess {
            tolerance,
            max_sweeps,
        } => format!("coordinate descent (tolerance {tolerance:e}, at most {max_sweeps} sweeps)"),
        SolverKind::External {
            executable,
            timeout,
        } => format!(
            "{} (timeout {}s)",
            executable
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            timeout.as_secs()
        ),
    }
}
