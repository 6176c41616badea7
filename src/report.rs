//! Human readable description of a run, written next to the fitted tree.

use std::fs;
use std::path::Path;
use std::time::Duration;

use itertools::Itertools;
use serde::Serialize;
use tinytemplate::{format_unescaped, TinyTemplate};

use crate::errors::FitError;
use crate::fit::{FitContext, FitOutcome};

/// Name of the report file in the output directory
pub const REPORT_FILE: &str = "Complete_Output_Description.txt";

static REPORT: &str = "\
Source trees: {source_file}
Supertree topology: {topology_file}
Solver: {solver}

Number of source trees: {n_trees}
Number of taxa: {n_taxa}
Taxa: {taxa}
Number of couplets: {n_couplets}
Number of unknowns (supertree edges): {n_unknowns}

Supertree without branch lengths:
{topology}

Source tree weights:
{{ for tree in trees }}  tree {tree.index}: {tree.n_taxa} taxa, {tree.support_taxa} in shared couplets, weight {tree.weight}
{{ endfor }}
Objective value: {objective_value}
Negative lengths replaced: {n_replaced}

Supertree with branch lengths:
{fitted}

Time reading trees (s): {timings.reading}
Time fitting (s): {timings.fitting}
Total time (s): {timings.total}
";

/// Weight details of one source tree
#[derive(Debug, Clone, Serialize)]
pub struct TreeReport {
    index: usize,
    n_taxa: usize,
    support_taxa: usize,
    weight: f64,
}

/// Durations of the run phases, in seconds
#[derive(Debug, Clone, Default, Serialize)]
pub struct Timings {
    /// Reading the input files
    pub reading: f64,
    /// Building and solving the problem
    pub fitting: f64,
    /// Whole run
    pub total: f64,
}

impl Timings {
    /// Timings from phase durations
    pub fn new(reading: Duration, fitting: Duration, total: Duration) -> Self {
        Self {
            reading: reading.as_secs_f64(),
            fitting: fitting.as_secs_f64(),
            total: total.as_secs_f64(),
        }
    }
}

/// Everything the report shows
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    source_file: String,
    topology_file: String,
    solver: String,
    n_trees: usize,
    n_taxa: usize,
    taxa: String,
    n_couplets: usize,
    n_unknowns: usize,
    topology: String,
    trees: Vec<TreeReport>,
    objective_value: f64,
    n_replaced: usize,
    fitted: String,
    timings: Timings,
}

/// Description of the inputs of a report
#[derive(Debug, Clone, Copy)]
pub struct ReportInputs<'a> {
    /// Source tree file
    pub source_file: &'a Path,
    /// Topology file
    pub topology_file: &'a Path,
    /// Solver description
    pub solver: &'a str,
    /// Newick of the supertree before fitting
    pub topology: &'a str,
    /// Newick of the fitted supertree
    pub fitted: &'a str,
}

impl RunReport {
    /// Gathers the report of a successful run
    pub fn new(
        inputs: ReportInputs,
        context: &FitContext,
        outcome: &FitOutcome,
        timings: Timings,
    ) -> Self {
        let weights = &outcome.problem.weights;
        let trees = context
            .source_taxa()
            .iter()
            .zip(weights.support_taxa())
            .zip(weights.weights())
            .enumerate()
            .map(|(index, ((n_taxa, support_taxa), weight))| TreeReport {
                index,
                n_taxa: *n_taxa,
                support_taxa: *support_taxa,
                weight: *weight,
            })
            .collect();

        Self {
            source_file: inputs.source_file.display().to_string(),
            topology_file: inputs.topology_file.display().to_string(),
            solver: inputs.solver.to_string(),
            n_trees: context.n_trees(),
            n_taxa: context.taxa().len(),
            taxa: context.taxa().labels().iter().join(", "),
            n_couplets: context.couplets().len(),
            n_unknowns: outcome.problem.edges.len(),
            topology: inputs.topology.to_string(),
            trees,
            objective_value: outcome.objective_value,
            n_replaced: outcome.n_replaced,
            fitted: inputs.fitted.to_string(),
            timings,
        }
    }

    /// Renders the report as text
    pub fn render(&self) -> Result<String, FitError> {
        let mut tt = TinyTemplate::new();
        tt.set_default_formatter(&format_unescaped);
        tt.add_template("report", REPORT)?;

        Ok(tt.render("report", self)?)
    }

    /// Renders the report to a file
    pub fn write(&self, path: &Path) -> Result<(), FitError> {
        fs::write(path, self.render()?).map_err(|source| FitError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::{fit_branch_lengths, NegativeLengths};
    use crate::solver::NonNegativeLeastSquares;
    use crate::tree::Tree;
    use crate::weights::WeightPolicy;

    #[test]
    fn renders_run_details() {
        let sources: Vec<Tree> = ["((A:1,B:1):1,(C:1,D:1):1);", "((A:1,C:1):1,(B:1,D:1):1);"]
            .iter()
            .map(|n| Tree::from_newick(n).unwrap())
            .collect();
        let topology = "((A,B),(C,D));";
        let mut supertree = Tree::from_newick(topology).unwrap();

        let mut context = FitContext::new();
        for tree in sources.iter() {
            context.add_source_tree(tree).unwrap();
        }
        let outcome = fit_branch_lengths(
            &sources,
            &mut supertree,
            &NonNegativeLeastSquares::default(),
            WeightPolicy::Strict,
            NegativeLengths::Clamp,
        )
        .unwrap();
        let fitted = supertree.to_newick().unwrap();

        let report = RunReport::new(
            ReportInputs {
                source_file: Path::new("sources.tre"),
                topology_file: Path::new("topology.tre"),
                solver: "coordinate descent",
                topology,
                fitted: &fitted,
            },
            &context,
            &outcome,
            Timings::default(),
        );
        let text = report.render().unwrap();

        assert!(text.contains("Number of source trees: 2"));
        assert!(text.contains("Number of taxa: 4"));
        assert!(text.contains("Taxa: A, B, C, D"));
        assert!(text.contains("Number of couplets: 6"));
        assert!(text.contains("Number of unknowns (supertree edges): 6"));
        assert!(text.contains("tree 0: 4 taxa, 4 in shared couplets, weight 0.125"));
        assert!(text.contains("tree 1: 4 taxa"));
        assert!(text.contains(topology));
        assert!(text.contains(&fitted));
    }
}
