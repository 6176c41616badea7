//! The least-squares objective over the supertree edge lengths.
//!
//! The objective is stored as rows, one per supported couplet: the set of
//! unknowns (edge indices) on the couplet's supertree path and the target
//! distance their sum should approach. The value of the objective for an
//! assignment `x` is `Σ_rows (Σ_{e ∈ row} x[e] - target)²`.
//!
//! Objectives are exchanged with external solvers as plain text: the first
//! line holds the number of unknowns, then each row is written as
//! `k<TAB>idx_1<TAB>...<TAB>idx_k<TAB>target`.

use std::fmt::Write as _;
use std::fs;
use std::num::{ParseFloatError, ParseIntError};
use std::path::Path;

use accurate::sum::Sum2;
use accurate::traits::*;
use thiserror::Error;

use crate::couplet::{CoupletError, CoupletStore};
use crate::errors::FitError;
use crate::taxa::TaxonSet;
use crate::weights::TreeWeights;

/// Errors when reading an objective in the exchange format
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// The first line is missing
    #[error("Missing number of unknowns")]
    MissingHeader,
    /// An integer field could not be parsed
    #[error("Line {line}: invalid integer field")]
    InvalidInteger {
        /// Line number, starting at 1
        line: usize,
        /// Parse error
        #[source]
        source: ParseIntError,
    },
    /// The target of a row could not be parsed
    #[error("Line {line}: invalid target distance")]
    InvalidTarget {
        /// Line number, starting at 1
        line: usize,
        /// Parse error
        #[source]
        source: ParseFloatError,
    },
    /// The number of fields does not match the declared edge count
    #[error("Line {line}: expected {expected} edge indices, found {found}")]
    WrongFieldCount {
        /// Line number, starting at 1
        line: usize,
        /// Declared edge count
        expected: usize,
        /// Edge indices actually present
        found: usize,
    },
    /// A row references an unknown past the declared count
    #[error("Line {line}: edge index {index} is out of range for {n_unknowns} unknowns")]
    IndexOutOfRange {
        /// Line number, starting at 1
        line: usize,
        /// Offending index
        index: usize,
        /// Declared number of unknowns
        n_unknowns: usize,
    },
}

/// One squared residual term of the objective
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Unknowns summed in this term, sorted and without duplicates
    pub edges: Vec<usize>,
    /// Distance the sum should match
    pub target: f64,
}

impl Row {
    /// Sum of the unknowns of the row minus its target
    ///
    /// # Panics
    /// If one of the row's edges is not an index of `x`.
    pub fn residual(&self, x: &[f64]) -> f64 {
        let path: f64 = self
            .edges
            .iter()
            .map(|e| x[*e])
            .sum_with_accumulator::<Sum2<_>>();
        path - self.target
    }
}

/// Least-squares objective over `n_unknowns` edge lengths
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    n_unknowns: usize,
    rows: Vec<Row>,
}

impl Objective {
    /// Builds an objective from rows, checking that every edge index is
    /// smaller than `n_unknowns`.
    pub fn new(n_unknowns: usize, rows: Vec<Row>) -> Result<Self, ExchangeError> {
        for (i, row) in rows.iter().enumerate() {
            if let Some(index) = row.edges.iter().find(|e| **e >= n_unknowns) {
                return Err(ExchangeError::IndexOutOfRange {
                    line: i + 2,
                    index: *index,
                    n_unknowns,
                });
            }
        }

        Ok(Self { n_unknowns, rows })
    }

    /// Builds one row per couplet with at least one supporting tree, in
    /// store order. Each couplet target is its weighted average distance.
    pub fn assemble(
        store: &CoupletStore,
        n_unknowns: usize,
        weights: &TreeWeights,
        taxa: &TaxonSet,
    ) -> Result<Self, FitError> {
        let mut rows = Vec::with_capacity(store.len());
        for couplet in store.iter().filter(|couplet| couplet.support() > 0) {
            let (a, b) = couplet.taxa();
            if couplet.supertree_edges().is_empty() {
                let label = |id| taxa.label(id).unwrap_or("?").to_string();
                return Err(FitError::UnsupportedCouplet(label(a), label(b)));
            }
            let target = match couplet.average_distance(weights.weights()) {
                Ok(target) => target,
                Err(CoupletError::ZeroTotalWeight(..)) => {
                    let tree = couplet.supporting_trees().first().copied().unwrap_or_default();
                    return Err(FitError::ZeroWeight { tree });
                }
                Err(err) => return Err(err.into()),
            };
            rows.push(Row {
                edges: couplet.supertree_edges().iter().copied().collect(),
                target,
            });
        }

        log::debug!("Objective has {} rows over {n_unknowns} unknowns", rows.len());

        Ok(Self { n_unknowns, rows })
    }

    /// Number of unknowns (edge lengths)
    pub fn n_unknowns(&self) -> usize {
        self.n_unknowns
    }

    /// Residual terms of the objective
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    fn check_assignment(&self, x: &[f64]) {
        assert_eq!(
            x.len(),
            self.n_unknowns,
            "assignment has {} values for {} unknowns",
            x.len(),
            self.n_unknowns
        );
    }

    /// Residual of every row for the assignment `x`
    ///
    /// # Panics
    /// If `x` does not hold exactly one value per unknown.
    pub fn residuals(&self, x: &[f64]) -> Vec<f64> {
        self.check_assignment(x);
        self.rows.iter().map(|row| row.residual(x)).collect()
    }

    /// Sum of squared residuals for the assignment `x`
    /// ```
    /// use stbl::objective::{Objective, Row};
    ///
    /// let objective = Objective::new(2, vec![
    ///     Row { edges: vec![0, 1], target: 2.0 },
    ///     Row { edges: vec![1], target: 0.5 },
    /// ]).unwrap();
    ///
    /// assert_eq!(objective.value(&[1.0, 1.0]), 0.25);
    /// assert_eq!(objective.value(&[1.5, 0.5]), 0.0);
    /// ```
    ///
    /// # Panics
    /// If `x` does not hold exactly one value per unknown.
    pub fn value(&self, x: &[f64]) -> f64 {
        self.check_assignment(x);
        self.rows
            .iter()
            .map(|row| row.residual(x).powi(2))
            .sum_with_accumulator::<Sum2<_>>()
    }

    /// Writes the objective in the exchange format
    /// ```
    /// use stbl::objective::{Objective, Row};
    ///
    /// let objective = Objective::new(3, vec![Row { edges: vec![0, 2], target: 1.5 }]).unwrap();
    /// assert_eq!(objective.to_exchange(), "3\n2\t0\t2\t1.5\n");
    /// ```
    pub fn to_exchange(&self) -> String {
        let mut out = format!("{}\n", self.n_unknowns);
        for row in self.rows.iter() {
            let _ = write!(out, "{}", row.edges.len());
            for edge in row.edges.iter() {
                let _ = write!(out, "\t{edge}");
            }
            let _ = writeln!(out, "\t{}", row.target);
        }
        out
    }

    /// Writes the exchange format to a file
    pub fn write_exchange(&self, path: &Path) -> Result<(), FitError> {
        fs::write(path, self.to_exchange()).map_err(|source| FitError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads an objective from the exchange format. Fields may be separated
    /// by any whitespace and blank lines are skipped.
    pub fn from_exchange(text: &str) -> Result<Self, ExchangeError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        let (header_line, header) = lines.next().ok_or(ExchangeError::MissingHeader)?;
        let n_unknowns = parse_int(header, header_line)?;

        let mut rows = vec![];
        for (line, content) in lines {
            let fields: Vec<&str> = content.split_whitespace().collect();
            let expected = parse_int(fields[0], line)?;
            let found = fields.len().saturating_sub(2);
            if fields.len() < 2 || found != expected {
                return Err(ExchangeError::WrongFieldCount {
                    line,
                    expected,
                    found,
                });
            }

            let edges = fields[1..fields.len() - 1]
                .iter()
                .map(|field| parse_int(field, line))
                .collect::<Result<Vec<_>, _>>()?;
            let target = fields[fields.len() - 1]
                .parse()
                .map_err(|source| ExchangeError::InvalidTarget { line, source })?;

            rows.push(Row { edges, target });
        }

        Self::new(n_unknowns, rows)
    }
}

fn parse_int(field: &str, line: usize) -> Result<usize, ExchangeError> {
    field
        .parse()
        .map_err(|source| ExchangeError::InvalidInteger { line, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edges::EdgeIndex;
    use crate::extract::derive_couplet_relations;
    use crate::paths::map_supertree_paths;
    use crate::tree::Tree;
    use crate::weights::WeightPolicy;

    fn objective_for(sources: &[&str], supertree: &str) -> (Objective, usize) {
        let mut taxa = TaxonSet::new();
        let mut store = CoupletStore::new();
        for (idx, newick) in sources.iter().enumerate() {
            let tree = Tree::from_newick(newick).unwrap();
            for label in tree.leaf_labels().unwrap() {
                taxa.insert(&label);
            }
            derive_couplet_relations(&tree, idx, &taxa, &mut store).unwrap();
        }
        let supertree = Tree::from_newick(supertree).unwrap();
        let edges = EdgeIndex::new(&supertree).unwrap();
        map_supertree_paths(&supertree, &edges, &taxa, &mut store).unwrap();
        let weights = TreeWeights::compute(sources.len(), &store, WeightPolicy::Strict).unwrap();

        let objective = Objective::assemble(&store, edges.len(), &weights, &taxa).unwrap();
        (objective, store.len())
    }

    #[test]
    fn exchange_layout() {
        let (objective, n_couplets) = objective_for(
            &["((A:1,B:1):1,(C:1,D:1):1);", "((A:1,C:1):1,(B:1,D:1):1);"],
            "((A,B),(C,D));",
        );
        let text = objective.to_exchange();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 1 + n_couplets);
        assert_eq!(lines[0], "6");
        for line in lines[1..].iter() {
            let fields: Vec<&str> = line.split('\t').collect();
            let k: usize = fields[0].parse().unwrap();
            assert_eq!(fields.len(), k + 2);
        }
    }

    #[test]
    fn targets_are_weighted_averages() {
        let (objective, _) = objective_for(
            &["((A:1,B:1):1,(C:1,D:1):1);", "((A:1,C:1):1,(B:1,D:1):1);"],
            "((A,B),(C,D));",
        );
        let mut targets: Vec<f64> = objective.rows().iter().map(|r| r.target).collect();
        targets.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(targets, vec![3.0, 3.0, 3.0, 3.0, 4.0, 4.0]);
    }

    #[test]
    fn exchange_parse() {
        let (objective, _) = objective_for(
            &["((A:1,B:2):1,(C:1.5,D:1):1);", "((A:0.5,B:2):1,(C:1,D:1):0.25);"],
            "((A,B),(C,D));",
        );
        let parsed = Objective::from_exchange(&objective.to_exchange()).unwrap();
        assert_eq!(parsed, objective);
    }

    #[test]
    fn exchange_errors() {
        assert!(matches!(
            Objective::from_exchange(""),
            Err(ExchangeError::MissingHeader)
        ));
        assert!(matches!(
            Objective::from_exchange("2\n2\t0\t1.0\n"),
            Err(ExchangeError::WrongFieldCount {
                line: 2,
                expected: 2,
                found: 1
            })
        ));
        assert!(matches!(
            Objective::from_exchange("2\n1\t5\t1.0\n"),
            Err(ExchangeError::IndexOutOfRange { index: 5, .. })
        ));
        assert!(matches!(
            Objective::from_exchange("2\n1\t0\tfar\n"),
            Err(ExchangeError::InvalidTarget { line: 2, .. })
        ));
        assert!(matches!(
            Objective::from_exchange("x\n"),
            Err(ExchangeError::InvalidInteger { line: 1, .. })
        ));
    }

    #[test]
    fn value_and_residuals() {
        let objective = Objective::new(
            3,
            vec![
                Row {
                    edges: vec![0, 1],
                    target: 2.0,
                },
                Row {
                    edges: vec![1, 2],
                    target: 3.0,
                },
            ],
        )
        .unwrap();
        let x = [1.0, 1.0, 1.0];
        assert_eq!(objective.residuals(&x), vec![0.0, -1.0]);
        assert_eq!(objective.value(&x), 1.0);
    }

    #[test]
    #[should_panic(expected = "assignment has 2 values for 3 unknowns")]
    fn short_assignment_is_rejected() {
        let objective = Objective::new(
            3,
            vec![Row {
                edges: vec![0, 2],
                target: 1.0,
            }],
        )
        .unwrap();
        objective.value(&[1.0, 1.0]);
    }
}
