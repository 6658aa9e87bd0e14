//! Bridge between [`Problem`](crate::optimize::problem::Problem) and the
//! microlp simplex solver
use indexmap::IndexMap;
use microlp::{ComparisonOp, LinearExpr, OptimizationDirection, Problem as LpProblem};

use crate::optimize::constraint::{Constraint, ConstraintTerm};
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::{OptimizationStatus, Problem, ProblemSolution};
use crate::optimize::solvers::SolverError;
use crate::optimize::variable::VariableType;

/// Lower a problem into microlp, solve it, and map the solution back
pub(crate) fn solve(problem: &Problem) -> Result<ProblemSolution, SolverError> {
    let direction = match problem.objective().sense() {
        ObjectiveSense::Maximize => OptimizationDirection::Maximize,
        ObjectiveSense::Minimize => OptimizationDirection::Minimize,
    };
    let mut lp = LpProblem::new(direction);

    // microlp takes objective coefficients at variable creation, so gather
    // the per-variable totals first
    let mut coefficients: IndexMap<&str, f64> = IndexMap::new();
    for term in problem.objective().terms() {
        *coefficients.entry(term.variable.as_str()).or_insert(0.0) += term.coefficient;
    }

    let mut lp_variables: IndexMap<&str, microlp::Variable> = IndexMap::new();
    for (id, variable) in problem.variables() {
        let coefficient = coefficients.get(id.as_str()).copied().unwrap_or(0.0);
        let lp_variable = match variable.variable_type {
            VariableType::Continuous => {
                lp.add_var(coefficient, (variable.lower_bound, variable.upper_bound))
            }
            VariableType::Integer | VariableType::Binary => lp.add_integer_var(
                coefficient,
                (variable.lower_bound as i32, variable.upper_bound as i32),
            ),
        };
        lp_variables.insert(id.as_str(), lp_variable);
    }

    for constraint in problem.constraints().values() {
        match constraint {
            Constraint::Equality { terms, equals, .. } => {
                lp.add_constraint(to_expression(terms, &lp_variables)?, ComparisonOp::Eq, *equals);
            }
            Constraint::Inequality {
                terms,
                lower_bound,
                upper_bound,
                ..
            } => {
                if lower_bound.is_finite() {
                    lp.add_constraint(
                        to_expression(terms, &lp_variables)?,
                        ComparisonOp::Ge,
                        *lower_bound,
                    );
                }
                if upper_bound.is_finite() {
                    lp.add_constraint(
                        to_expression(terms, &lp_variables)?,
                        ComparisonOp::Le,
                        *upper_bound,
                    );
                }
            }
        }
    }

    let lp_solution = lp.solve().map_err(|err| match err {
        microlp::Error::Infeasible => SolverError::Infeasible,
        microlp::Error::Unbounded => SolverError::Unbounded,
        other => SolverError::Numerical(other.to_string()),
    })?;

    let mut variable_values = IndexMap::new();
    for (id, lp_variable) in &lp_variables {
        variable_values.insert((*id).to_string(), lp_solution[*lp_variable]);
    }
    Ok(ProblemSolution {
        status: OptimizationStatus::Optimal,
        objective_value: lp_solution.objective(),
        variable_values,
    })
}

/// Collect constraint terms into a microlp linear expression
fn to_expression(
    terms: &[ConstraintTerm],
    lp_variables: &IndexMap<&str, microlp::Variable>,
) -> Result<LinearExpr, SolverError> {
    let mut expression = LinearExpr::empty();
    for term in terms {
        let lp_variable = lp_variables
            .get(term.variable.as_str())
            .ok_or_else(|| SolverError::UnknownVariable(term.variable.clone()))?;
        expression.add(*lp_variable, term.coefficient);
    }
    Ok(expression)
}
