//! Solving the least-squares objective for non-negative edge lengths.
//!
//! Two solvers are available behind the [`Solver`] trait:
//!  - [`NonNegativeLeastSquares`] minimizes the objective in process.
//!  - [`ExternalSolver`] hands the objective to an external executable
//!    through the text exchange format and reads back one value per line.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use ndarray::Array1;
use thiserror::Error;

use crate::objective::Objective;

/// Name of the objective file written for external solvers
pub const EXCHANGE_INPUT: &str = "GLS_input.txt";
/// Name of the result file external solvers must write
pub const EXCHANGE_OUTPUT: &str = "GLS_output.txt";

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Errors that can occur while solving
#[derive(Error, Debug)]
pub enum SolverError {
    /// The iterative solver ran out of sweeps
    #[error("No convergence after {sweeps} sweeps (last move {last_move:e})")]
    NotConverged {
        /// Sweeps performed
        sweeps: usize,
        /// Largest coordinate change in the last sweep
        last_move: f64,
    },
    /// The solution does not have one value per unknown
    #[error("Expected {expected} values in the solution, found {found}")]
    WrongLength {
        /// Number of unknowns
        expected: usize,
        /// Number of values returned
        found: usize,
    },
    /// A value of the solution is not a finite number
    #[error("Line {line} of the solution is not a number: '{value}'")]
    NotNumeric {
        /// Line number, starting at 1
        line: usize,
        /// Offending content
        value: String,
    },
    /// The solver executable could not be started
    #[error("Could not run solver {}", executable.display())]
    Spawn {
        /// Solver path
        executable: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
    /// The solver executable exited with a failure status
    #[error("Solver exited with {0}")]
    Failed(ExitStatus),
    /// The solver executable did not finish in time and was killed
    #[error("Solver did not finish within {0:?}")]
    Timeout(Duration),
    /// Reading or writing an exchange file failed
    #[error("Error accessing {}", path.display())]
    Io {
        /// Exchange file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

/// Something that can minimize an [`Objective`]
pub trait Solver {
    /// Returns one value per unknown of the objective
    fn solve(&self, objective: &Objective) -> Result<Vec<f64>, SolverError>;
}

/// In-process solver using projected cyclic coordinate descent.
///
/// Each sweep minimizes the objective exactly along every unknown in turn
/// and clamps the result at zero, so every iterate is feasible. Unknowns
/// that appear in no row stay at zero.
#[derive(Debug, Clone, Copy)]
pub struct NonNegativeLeastSquares {
    /// Convergence threshold on the largest coordinate move of a sweep
    pub tolerance: f64,
    /// Maximum number of sweeps before giving up
    pub max_sweeps: usize,
}

impl Default for NonNegativeLeastSquares {
    fn default() -> Self {
        Self {
            tolerance: 1e-9,
            max_sweeps: 100_000,
        }
    }
}

impl NonNegativeLeastSquares {
    /// Solver with the given tolerance and sweep limit
    pub fn new(tolerance: f64, max_sweeps: usize) -> Self {
        Self {
            tolerance,
            max_sweeps,
        }
    }
}

impl Solver for NonNegativeLeastSquares {
    /// ```
    /// use stbl::objective::{Objective, Row};
    /// use stbl::solver::{NonNegativeLeastSquares, Solver};
    ///
    /// let objective = Objective::new(2, vec![
    ///     Row { edges: vec![0, 1], target: 3.0 },
    ///     Row { edges: vec![0], target: 1.0 },
    /// ]).unwrap();
    /// let x = NonNegativeLeastSquares::default().solve(&objective).unwrap();
    ///
    /// assert!((x[0] - 1.0).abs() < 1e-6);
    /// assert!((x[1] - 2.0).abs() < 1e-6);
    /// ```
    fn solve(&self, objective: &Objective) -> Result<Vec<f64>, SolverError> {
        let n = objective.n_unknowns();
        let rows = objective.rows();

        let mut columns: Vec<Vec<usize>> = vec![vec![]; n];
        for (i, row) in rows.iter().enumerate() {
            for edge in row.edges.iter() {
                columns[*edge].push(i);
            }
        }

        let mut x = Array1::<f64>::zeros(n);
        let mut residuals: Array1<f64> = rows.iter().map(|row| -row.target).collect();

        for sweep in 1..=self.max_sweeps {
            let mut largest_move: f64 = 0.0;
            for (j, column) in columns.iter().enumerate() {
                if column.is_empty() {
                    continue;
                }
                let gradient: f64 = column.iter().map(|i| residuals[*i]).sum();
                let updated = (x[j] - gradient / column.len() as f64).max(0.0);
                let delta = updated - x[j];
                if delta == 0.0 {
                    continue;
                }
                x[j] = updated;
                for i in column.iter() {
                    residuals[*i] += delta;
                }
                largest_move = largest_move.max(delta.abs());
            }

            if largest_move <= self.tolerance {
                log::debug!("Coordinate descent converged after {sweep} sweeps");
                return Ok(x.to_vec());
            }
            if sweep == self.max_sweeps {
                return Err(SolverError::NotConverged {
                    sweeps: sweep,
                    last_move: largest_move,
                });
            }
        }

        // Only reached when no sweep is allowed at all
        Err(SolverError::NotConverged {
            sweeps: 0,
            last_move: f64::INFINITY,
        })
    }
}

/// Runs an external executable as `executable <input> <output>`, where
/// `input` is the objective in the exchange format and `output` must receive
/// one value per unknown, one per line, in edge index order.
#[derive(Debug, Clone)]
pub struct ExternalSolver {
    /// Solver executable
    pub executable: PathBuf,
    /// Directory receiving the exchange files
    pub workdir: PathBuf,
    /// Time after which the solver is killed
    pub timeout: Duration,
}

impl ExternalSolver {
    /// Path of the objective handed to the solver
    pub fn input_path(&self) -> PathBuf {
        self.workdir.join(EXCHANGE_INPUT)
    }

    /// Path where the solver writes its result
    pub fn output_path(&self) -> PathBuf {
        self.workdir.join(EXCHANGE_OUTPUT)
    }

    fn run(&self, input: &Path, output: &Path) -> Result<(), SolverError> {
        let spawn_error = |source| SolverError::Spawn {
            executable: self.executable.clone(),
            source,
        };

        log::info!("Running {}", self.executable.display());
        let mut child = Command::new(&self.executable)
            .arg(input)
            .arg(output)
            .stdin(Stdio::null())
            .spawn()
            .map_err(spawn_error)?;

        let start = Instant::now();
        loop {
            if let Some(status) = child.try_wait().map_err(spawn_error)? {
                if status.success() {
                    return Ok(());
                }
                return Err(SolverError::Failed(status));
            }
            if start.elapsed() >= self.timeout {
                // The child may exit on its own between the check and the kill
                let _ = child.kill();
                let _ = child.wait();
                return Err(SolverError::Timeout(self.timeout));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Solver for ExternalSolver {
    fn solve(&self, objective: &Objective) -> Result<Vec<f64>, SolverError> {
        let input = self.input_path();
        let output = self.output_path();

        fs::write(&input, objective.to_exchange()).map_err(|source| SolverError::Io {
            path: input.clone(),
            source,
        })?;
        // A stale result must not be mistaken for this run's
        if output.exists() {
            fs::remove_file(&output).map_err(|source| SolverError::Io {
                path: output.clone(),
                source,
            })?;
        }

        self.run(&input, &output)?;

        let text = fs::read_to_string(&output).map_err(|source| SolverError::Io {
            path: output.clone(),
            source,
        })?;
        parse_solution(&text, objective.n_unknowns())
    }
}

/// Parses a solution with one number per line, blank lines ignored.
/// ```
/// use stbl::solver::parse_solution;
///
/// assert_eq!(parse_solution("0.5\n1e-3\n\n2\n", 3).unwrap(), vec![0.5, 0.001, 2.0]);
/// assert!(parse_solution("0.5\n", 3).is_err());
/// ```
pub fn parse_solution(text: &str, expected: usize) -> Result<Vec<f64>, SolverError> {
    let values = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .map(|(line, value)| match value.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(SolverError::NotNumeric {
                line,
                value: value.to_string(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if values.len() != expected {
        return Err(SolverError::WrongLength {
            expected,
            found: values.len(),
        });
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::Row;

    fn row(edges: &[usize], target: f64) -> Row {
        Row {
            edges: edges.to_vec(),
            target,
        }
    }

    #[test]
    fn exact_fit() {
        // ((A,B)X,(C,D)Y) edges: A=0 B=1 X=2 C=3 D=4 Y=5
        let objective = Objective::new(
            6,
            vec![
                row(&[0, 1], 2.0),
                row(&[3, 4], 2.0),
                row(&[0, 2, 3, 5], 4.0),
                row(&[0, 2, 4, 5], 4.0),
                row(&[1, 2, 3, 5], 4.0),
                row(&[1, 2, 4, 5], 4.0),
            ],
        )
        .unwrap();
        let x = NonNegativeLeastSquares::default().solve(&objective).unwrap();

        for pendant in [0, 1, 3, 4] {
            assert!((x[pendant] - 1.0).abs() < 1e-6, "{x:?}");
        }
        assert!((x[2] + x[5] - 2.0).abs() < 1e-6, "{x:?}");
        assert!(objective.value(&x) < 1e-10);
    }

    #[test]
    fn conflicting_rows_stay_non_negative() {
        let objective = Objective::new(
            6,
            vec![
                row(&[0, 1], 3.0),
                row(&[3, 4], 3.0),
                row(&[0, 2, 3, 5], 3.0),
                row(&[0, 2, 4, 5], 4.0),
                row(&[1, 2, 3, 5], 4.0),
                row(&[1, 2, 4, 5], 3.0),
            ],
        )
        .unwrap();
        let x = NonNegativeLeastSquares::default().solve(&objective).unwrap();

        assert!(x.iter().all(|v| *v >= 0.0));
        assert!(objective.value(&x) > 1e-3);
    }

    #[test]
    fn clamps_at_zero() {
        let objective = Objective::new(2, vec![row(&[0, 1], 1.0), row(&[1], 3.0)]).unwrap();
        let x = NonNegativeLeastSquares::default().solve(&objective).unwrap();

        assert_eq!(x[0], 0.0);
        assert!((x[1] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn unused_unknowns_stay_zero() {
        let objective = Objective::new(3, vec![row(&[0], 1.0)]).unwrap();
        let x = NonNegativeLeastSquares::default().solve(&objective).unwrap();
        assert_eq!(x.len(), 3);
        assert_eq!(&x[1..], &[0.0, 0.0]);
    }

    #[test]
    fn sweep_limit() {
        let objective = Objective::new(2, vec![row(&[0, 1], 1.0), row(&[0], 0.5)]).unwrap();
        let solver = NonNegativeLeastSquares::new(0.0, 1);
        assert!(matches!(
            solver.solve(&objective),
            Err(SolverError::NotConverged { sweeps: 1, .. })
        ));
    }

    #[test]
    fn malformed_solutions() {
        assert!(matches!(
            parse_solution("1\n2\n", 3),
            Err(SolverError::WrongLength {
                expected: 3,
                found: 2
            })
        ));
        assert!(matches!(
            parse_solution("1\nabc\n", 2),
            Err(SolverError::NotNumeric { line: 2, .. })
        ));
        assert!(matches!(
            parse_solution("1\nNaN\n", 2),
            Err(SolverError::NotNumeric { line: 2, .. })
        ));
    }

    #[test]
    fn missing_executable() {
        let dir = tempfile::tempdir().unwrap();
        let solver = ExternalSolver {
            executable: dir.path().join("no-such-solver"),
            workdir: dir.path().to_path_buf(),
            timeout: Duration::from_secs(5),
        };
        let objective = Objective::new(1, vec![row(&[0], 1.0)]).unwrap();
        assert!(matches!(
            solver.solve(&objective),
            Err(SolverError::Spawn { .. })
        ));
        assert!(solver.input_path().exists());
    }

    #[cfg(unix)]
    fn script(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("solver.sh");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn external_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let solver = ExternalSolver {
            executable: script(
                dir.path(),
                r#"head -n 1 "$1" > /dev/null; printf '0.5\n1.5\n' > "$2""#,
            ),
            workdir: dir.path().to_path_buf(),
            timeout: Duration::from_secs(10),
        };
        let objective = Objective::new(2, vec![row(&[0, 1], 2.0)]).unwrap();

        assert_eq!(solver.solve(&objective).unwrap(), vec![0.5, 1.5]);
        let written = fs::read_to_string(solver.input_path()).unwrap();
        assert_eq!(written, objective.to_exchange());
    }

    #[cfg(unix)]
    #[test]
    fn external_failure_status() {
        let dir = tempfile::tempdir().unwrap();
        let solver = ExternalSolver {
            executable: script(dir.path(), "exit 3"),
            workdir: dir.path().to_path_buf(),
            timeout: Duration::from_secs(10),
        };
        let objective = Objective::new(1, vec![row(&[0], 1.0)]).unwrap();
        assert!(matches!(
            solver.solve(&objective),
            Err(SolverError::Failed(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn external_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let solver = ExternalSolver {
            executable: script(dir.path(), "sleep 5"),
            workdir: dir.path().to_path_buf(),
            timeout: Duration::from_millis(200),
        };
        let objective = Objective::new(1, vec![row(&[0], 1.0)]).unwrap();
        assert!(matches!(
            solver.solve(&objective),
            Err(SolverError::Timeout(_))
        ));
    }
}
