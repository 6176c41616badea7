//! Fitting the branch lengths of a supertree to a collection of source trees.
//!
//! All the state of a run lives in a [`FitContext`]: source trees are added
//! one at a time, then [`FitContext::build_problem`] indexes the supertree,
//! maps the couplets onto it, weights the source trees and assembles the
//! least-squares objective. The resulting [`Problem`] is solved and its
//! solution written back onto the supertree.
//!
//! ```
//! use stbl::fit::{FitContext, NegativeLengths};
//! use stbl::solver::NonNegativeLeastSquares;
//! use stbl::tree::Tree;
//! use stbl::weights::WeightPolicy;
//!
//! let mut context = FitContext::new();
//! for newick in ["((A:1,B:1):1,(C:1,D:1):1);", "((A:1,B:1):2,(C:1,D:1):2);"] {
//!     context.add_source_tree(&Tree::from_newick(newick).unwrap()).unwrap();
//! }
//!
//! let mut supertree = Tree::from_newick("((A,B),(C,D));").unwrap();
//! let problem = context.build_problem(&supertree, WeightPolicy::Strict).unwrap();
//! let solution = problem.solve(&NonNegativeLeastSquares::default()).unwrap();
//! problem.apply(&mut supertree, &solution, NegativeLengths::Clamp).unwrap();
//!
//! let a = supertree.get_by_name("A").unwrap();
//! assert!((a.parent_edge.unwrap() - 1.0).abs() < 1e-6);
//! ```

use clap::ValueEnum;

use crate::couplet::CoupletStore;
use crate::edges::EdgeIndex;
use crate::errors::FitError;
use crate::extract::derive_couplet_relations;
use crate::objective::Objective;
use crate::paths::map_supertree_paths;
use crate::solver::{Solver, SolverError};
use crate::taxa::TaxonSet;
use crate::tree::{EdgeLength, Tree};
use crate::weights::{TreeWeights, WeightPolicy};

/// Length given to edges whose solved length is negative
pub const NEGATIVE_LENGTH_FLOOR: EdgeLength = 1e-5;

/// What to do with negative solved lengths
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, ValueEnum)]
pub enum NegativeLengths {
    /// Replace them with a small positive length
    #[default]
    Clamp,
    /// Write them as they are
    Keep,
}

impl NegativeLengths {
    /// Length to write on the supertree for a solved value
    pub fn apply(&self, value: f64) -> EdgeLength {
        match self {
            Self::Clamp if value < 0.0 => NEGATIVE_LENGTH_FLOOR,
            _ => value,
        }
    }
}

/// Run-scoped state accumulated over the source trees
#[derive(Debug, Default)]
pub struct FitContext {
    taxa: TaxonSet,
    source_taxa: Vec<usize>,
    store: CoupletStore,
}

impl FitContext {
    /// Empty context, with no source tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the couplets of a source tree and returns its index.
    pub fn add_source_tree(&mut self, tree: &Tree) -> Result<usize, FitError> {
        let idx = self.source_taxa.len();
        let labels = tree
            .leaf_labels()
            .map_err(|source| FitError::MalformedTree { tree: idx, source })?;
        for label in labels.iter() {
            self.taxa.insert(label);
        }

        derive_couplet_relations(tree, idx, &self.taxa, &mut self.store)?;
        self.source_taxa.push(labels.len());

        Ok(idx)
    }

    /// Every taxon seen in the source trees
    pub fn taxa(&self) -> &TaxonSet {
        &self.taxa
    }

    /// Couplets recorded so far
    pub fn couplets(&self) -> &CoupletStore {
        &self.store
    }

    /// Number of source trees added
    pub fn n_trees(&self) -> usize {
        self.source_taxa.len()
    }

    /// Number of taxa of every source tree
    pub fn source_taxa(&self) -> &[usize] {
        &self.source_taxa
    }

    /// Builds the least-squares problem for the given supertree topology.
    pub fn build_problem(
        &mut self,
        supertree: &Tree,
        policy: WeightPolicy,
    ) -> Result<Problem, FitError> {
        if self.n_trees() == 0 {
            return Err(FitError::NoSourceTrees);
        }

        let edges = EdgeIndex::new(supertree).map_err(FitError::MalformedSupertree)?;
        map_supertree_paths(supertree, &edges, &self.taxa, &mut self.store)?;
        let weights = TreeWeights::compute(self.n_trees(), &self.store, policy)?;
        let objective = Objective::assemble(&self.store, edges.len(), &weights, &self.taxa)?;

        log::info!(
            "{} taxa, {} couplets, {} unknowns",
            self.taxa.len(),
            self.store.len(),
            edges.len()
        );

        Ok(Problem {
            edges,
            weights,
            objective,
        })
    }
}

/// A least-squares problem ready to be solved
#[derive(Debug, Clone)]
pub struct Problem {
    /// Supertree edge of every unknown
    pub edges: EdgeIndex,
    /// Source tree weights used for the targets
    pub weights: TreeWeights,
    /// The objective itself
    pub objective: Objective,
}

impl Problem {
    /// Solves the objective, checking there is one value per edge
    pub fn solve(&self, solver: &dyn Solver) -> Result<Vec<f64>, FitError> {
        let solution = solver.solve(&self.objective)?;
        if solution.len() != self.edges.len() {
            return Err(SolverError::WrongLength {
                expected: self.edges.len(),
                found: solution.len(),
            }
            .into());
        }

        Ok(solution)
    }

    /// Writes the solved lengths on the supertree edges. Returns the number of
    /// negative values that were replaced.
    pub fn apply(
        &self,
        supertree: &mut Tree,
        solution: &[f64],
        policy: NegativeLengths,
    ) -> Result<usize, FitError> {
        if solution.len() != self.edges.len() {
            return Err(SolverError::WrongLength {
                expected: self.edges.len(),
                found: solution.len(),
            }
            .into());
        }

        let mut n_replaced = 0;
        for (idx, (_, child)) in self.edges.iter() {
            let length = policy.apply(solution[idx]);
            if length != solution[idx] {
                n_replaced += 1;
            }
            supertree.set_parent_edge(&child, length)?;
        }
        if n_replaced > 0 {
            log::warn!("{n_replaced} negative branch lengths were set to {NEGATIVE_LENGTH_FLOOR}");
        }

        Ok(n_replaced)
    }
}

/// Outcome of [`fit_branch_lengths`]
#[derive(Debug, Clone)]
pub struct FitOutcome {
    /// The solved problem
    pub problem: Problem,
    /// Solved value of every unknown
    pub solution: Vec<f64>,
    /// Objective value at the solution
    pub objective_value: f64,
    /// Negative values replaced when writing the lengths
    pub n_replaced: usize,
}

/// Fits the supertree branch lengths to the source trees in one call.
pub fn fit_branch_lengths(
    sources: &[Tree],
    supertree: &mut Tree,
    solver: &dyn Solver,
    weight_policy: WeightPolicy,
    negative_lengths: NegativeLengths,
) -> Result<FitOutcome, FitError> {
    let mut context = FitContext::new();
    for tree in sources {
        context.add_source_tree(tree)?;
    }

    let problem = context.build_problem(supertree, weight_policy)?;
    let solution = problem.solve(solver)?;
    let objective_value = problem.objective.value(&solution);
    let n_replaced = problem.apply(supertree, &solution, negative_lengths)?;

    Ok(FitOutcome {
        problem,
        solution,
        objective_value,
        n_replaced,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::NonNegativeLeastSquares;

    const TREE1: &str = "((A:1,B:1):1,(C:1,D:1):1);";
    const TREE2: &str = "((A:1,C:1):1,(B:1,D:1):1);";

    struct Fixed(Vec<f64>);

    impl Solver for Fixed {
        fn solve(&self, _: &Objective) -> Result<Vec<f64>, SolverError> {
            Ok(self.0.clone())
        }
    }

    fn trees(newicks: &[&str]) -> Vec<Tree> {
        newicks
            .iter()
            .map(|n| Tree::from_newick(n).unwrap())
            .collect()
    }

    fn length(tree: &Tree, name: &str) -> f64 {
        tree.get_by_name(name).unwrap().parent_edge.unwrap()
    }

    #[test]
    fn agreeing_sources_give_zero_residual() {
        let sources = trees(&[TREE1, TREE1]);
        let mut supertree = Tree::from_newick("((A,B)X,(C,D)Y);").unwrap();

        let outcome = fit_branch_lengths(
            &sources,
            &mut supertree,
            &NonNegativeLeastSquares::default(),
            WeightPolicy::Strict,
            NegativeLengths::Clamp,
        )
        .unwrap();

        assert!(outcome.objective_value < 1e-10);
        for leaf in ["A", "B", "C", "D"] {
            assert!((length(&supertree, leaf) - 1.0).abs() < 1e-6);
        }
        // Only the sum of the two edges below the root is determined
        let internal = length(&supertree, "X") + length(&supertree, "Y");
        assert!((internal - 2.0).abs() < 1e-6);
    }

    #[test]
    fn context_reused_for_another_topology() {
        let sources = trees(&[TREE1, TREE2]);
        let context_for = |trees: &[Tree]| {
            let mut context = FitContext::new();
            for tree in trees {
                context.add_source_tree(tree).unwrap();
            }
            context
        };
        let first = Tree::from_newick("((A,B),(C,D));").unwrap();
        let second = Tree::from_newick("((A,C),(B,D));").unwrap();

        let mut reused = context_for(&sources);
        let before = reused.build_problem(&first, WeightPolicy::Strict).unwrap();
        let after = reused.build_problem(&second, WeightPolicy::Strict).unwrap();
        let fresh = context_for(&sources)
            .build_problem(&second, WeightPolicy::Strict)
            .unwrap();

        assert_ne!(before.objective.rows(), fresh.objective.rows());
        assert_eq!(after.objective.rows(), fresh.objective.rows());
        assert_eq!(after.weights.weights(), fresh.weights.weights());
    }

    #[test]
    fn conflicting_sources() {
        let sources = trees(&[TREE1, TREE2]);
        let mut supertree = Tree::from_newick("((A,B)X,(C,D)Y);").unwrap();

        let mut context = FitContext::new();
        for tree in sources.iter() {
            context.add_source_tree(tree).unwrap();
        }
        let problem = context.build_problem(&supertree, WeightPolicy::Strict).unwrap();

        let taxa = context.taxa();
        let couplet = |a: &str, b: &str| {
            context
                .couplets()
                .get(taxa.get(a).unwrap(), taxa.get(b).unwrap())
                .unwrap()
                .average_distance(problem.weights.weights())
                .unwrap()
        };
        assert_eq!(couplet("A", "B"), 3.0);
        assert_eq!(couplet("A", "D"), 4.0);

        let solution = problem.solve(&NonNegativeLeastSquares::default()).unwrap();
        assert!(problem.objective.value(&solution) > 1e-3);
        assert!(solution.iter().all(|x| *x >= 0.0));

        problem
            .apply(&mut supertree, &solution, NegativeLengths::Clamp)
            .unwrap();
        for leaf in ["A", "B", "C", "D"] {
            assert!(length(&supertree, leaf) >= 0.0);
        }
    }

    #[test]
    fn average_is_convex() {
        let sources = trees(&[TREE1, "((A:3,B:0.5):1,(C:2,D:1):1);", TREE2]);
        let mut context = FitContext::new();
        for tree in sources.iter() {
            context.add_source_tree(tree).unwrap();
        }
        let supertree = Tree::from_newick("((A,B),(C,D));").unwrap();
        let problem = context.build_problem(&supertree, WeightPolicy::Strict).unwrap();

        for couplet in context.couplets().iter() {
            let avg = couplet.average_distance(problem.weights.weights()).unwrap();
            let min = couplet.distances().iter().cloned().fold(f64::INFINITY, f64::min);
            let max = couplet.distances().iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            assert!(min - 1e-12 <= avg && avg <= max + 1e-12);
        }
    }

    #[test]
    fn negative_lengths_policy() {
        let sources = trees(&[TREE1, TREE1]);
        let mut supertree = Tree::from_newick("((A,B)X,(C,D)Y);").unwrap();
        let mut context = FitContext::new();
        for tree in sources.iter() {
            context.add_source_tree(tree).unwrap();
        }
        let problem = context.build_problem(&supertree, WeightPolicy::Strict).unwrap();

        let solution = vec![1.0, 1.0, -0.5, 1.0, 1.0, 2.5];
        let replaced = problem
            .apply(&mut supertree, &solution, NegativeLengths::Clamp)
            .unwrap();
        assert_eq!(replaced, 1);
        assert_eq!(length(&supertree, "X"), NEGATIVE_LENGTH_FLOOR);

        let replaced = problem
            .apply(&mut supertree, &solution, NegativeLengths::Keep)
            .unwrap();
        assert_eq!(replaced, 0);
        assert_eq!(length(&supertree, "X"), -0.5);
    }

    #[test]
    fn wrong_solution_length() {
        let sources = trees(&[TREE1, TREE1]);
        let mut supertree = Tree::from_newick("((A,B),(C,D));").unwrap();
        let result = fit_branch_lengths(
            &sources,
            &mut supertree,
            &Fixed(vec![1.0; 3]),
            WeightPolicy::Strict,
            NegativeLengths::Clamp,
        );
        assert!(matches!(
            result,
            Err(FitError::Solver(SolverError::WrongLength {
                expected: 6,
                found: 3
            }))
        ));
        // Nothing was written on the supertree
        assert!(supertree.get_by_name("A").unwrap().parent_edge.is_none());
    }

    #[test]
    fn no_sources() {
        let supertree = Tree::from_newick("((A,B),(C,D));").unwrap();
        assert!(matches!(
            FitContext::new().build_problem(&supertree, WeightPolicy::Strict),
            Err(FitError::NoSourceTrees)
        ));
    }

    #[test]
    fn isolated_tree_weight() {
        let sources = trees(&[TREE1, TREE1, "(E:1,F:1);"]);
        let mut supertree = Tree::from_newick("(((A,B),(C,D)),(E,F));").unwrap();

        assert!(matches!(
            fit_branch_lengths(
                &sources,
                &mut supertree,
                &NonNegativeLeastSquares::default(),
                WeightPolicy::Strict,
                NegativeLengths::Clamp,
            ),
            Err(FitError::ZeroWeight { tree: 2 })
        ));

        // Excluded, the (E,F) couplet has no weight left to average with
        assert!(matches!(
            fit_branch_lengths(
                &sources,
                &mut supertree,
                &NonNegativeLeastSquares::default(),
                WeightPolicy::Exclude,
                NegativeLengths::Clamp,
            ),
            Err(FitError::ZeroWeight { tree: 2 })
        ));
    }

    #[test]
    fn malformed_source_tree() {
        let mut context = FitContext::new();
        context.add_source_tree(&Tree::from_newick(TREE1).unwrap()).unwrap();
        assert!(matches!(
            context.add_source_tree(&Tree::from_newick("((A:1,A:1):1,C:1);").unwrap()),
            Err(FitError::MalformedTree {
                tree: 1,
                source: crate::tree::TreeError::DuplicateLeafNames(_)
            })
        ));
    }
}
