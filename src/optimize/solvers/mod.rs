//! Solver backends used to optimize a [`Problem`](crate::optimize::problem::Problem)
pub mod microlp;

use thiserror::Error;

use crate::configuration::{Solver, CONFIGURATION};
use crate::optimize::problem::{Problem, ProblemSolution};

/// Solve a problem with the solver selected in the global configuration
pub(crate) fn solve(problem: &Problem) -> Result<ProblemSolution, SolverError> {
    let solver = CONFIGURATION.read().unwrap().solver;
    match solver {
        Solver::Microlp => microlp::solve(problem),
    }
}

/// Errors reported by the solver backends
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    /// The constraints cannot be satisfied simultaneously
    #[error("The optimization problem is infeasible")]
    Infeasible,
    /// The objective can be improved without bound
    #[error("The optimization problem is unbounded")]
    Unbounded,
    /// A constraint or objective term references a variable missing from the problem
    #[error("The solver was given a term referencing unknown variable {0}")]
    UnknownVariable(String),
    /// The backend failed for a numerical or internal reason
    #[error("The solver failed: {0}")]
    Numerical(String),
}
