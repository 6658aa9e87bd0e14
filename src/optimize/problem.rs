//! Provides struct representing an optimization problem
use indexmap::IndexMap;
use thiserror::Error;

use crate::optimize::constraint::Constraint;
use crate::optimize::objective::{Objective, ObjectiveSense};
use crate::optimize::problem::ProblemError::{
    NonExistentVariable, NonExistentVariablesInConstraint, NonExistentVariablesInObjective,
};
use crate::optimize::solvers::{self, SolverError};
use crate::optimize::variable::{Variable, VariableBuilder, VariableType};

/// An optimization problem
#[derive(Debug, Clone)]
pub struct Problem {
    /// Objective to optimize
    objective: Objective,
    /// Variables of the optimization problem
    variables: IndexMap<String, Variable>,
    /// Constraints of the optimization problem
    constraints: IndexMap<String, Constraint>,
    /// Current status of the optimization problem
    status: OptimizationStatus,
    /// Type of problem
    problem_type: ProblemType,
}

impl Problem {
    // region Creation Functions
    /// Create a new optimization problem
    pub fn new(objective_sense: ObjectiveSense) -> Self {
        Self {
            objective: Objective::new(objective_sense),
            variables: IndexMap::new(),
            constraints: IndexMap::new(),
            status: OptimizationStatus::Unoptimized,
            problem_type: ProblemType::LinearContinuous,
        }
    }

    /// Create a new maximization problem
    pub fn new_maximization() -> Self {
        Self::new(ObjectiveSense::Maximize)
    }

    /// Create a new minimization problem
    pub fn new_minimization() -> Self {
        Self::new(ObjectiveSense::Minimize)
    }
    // endregion Creation Functions

    // region Objective
    /// Update the objective sense of the problem
    pub fn update_objective_sense(&mut self, sense: ObjectiveSense) {
        self.objective.set_sense(sense);
        self.status = OptimizationStatus::Unoptimized;
    }

    /// Replace the objective of the problem
    pub fn set_objective(&mut self, objective: Objective) -> Result<(), ProblemError> {
        for term in objective.terms() {
            if !self.variables.contains_key(&term.variable) {
                return Err(NonExistentVariablesInObjective);
            }
        }
        self.objective = objective;
        self.status = OptimizationStatus::Unoptimized;
        Ok(())
    }

    /// The current objective of the problem
    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    /// Add a new linear term to the objective using the variable id
    pub fn add_new_linear_objective_term(
        &mut self,
        variable_id: &str,
        coefficient: f64,
    ) -> Result<(), ProblemError> {
        if !self.variables.contains_key(variable_id) {
            return Err(NonExistentVariablesInObjective);
        }
        self.objective.add_linear_term(variable_id, coefficient);
        self.status = OptimizationStatus::Unoptimized;
        Ok(())
    }

    /// Remove all terms from the objective
    pub fn remove_all_objective_terms(&mut self) {
        self.objective.remove_all_terms();
        self.status = OptimizationStatus::Unoptimized;
    }
    // endregion Objective

    // region Adding Variables
    /// Add a variable to the optimization problem
    pub fn add_variable(&mut self, mut variable: Variable) -> Result<(), ProblemError> {
        self.validate_variable(&variable)?;
        // Update the index of the variable to reflect the current variable count
        variable.index = self.variables.len();
        // Update the type of the problem if needed
        match variable.variable_type {
            VariableType::Continuous => {}
            VariableType::Integer | VariableType::Binary => {
                self.problem_type = ProblemType::LinearMixedInteger;
            }
        }
        self.variables.insert(variable.id.clone(), variable);
        self.status = OptimizationStatus::Unoptimized;
        Ok(())
    }

    /// Create a new variable and add it to the optimization problem
    pub fn add_new_variable(
        &mut self,
        id: &str,
        name: Option<&str>,
        variable_type: VariableType,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        let new_var = VariableBuilder::default()
            .id(id)
            .name(name.map(|n| n.to_string()))
            .variable_type(variable_type)
            .lower_bound(lower_bound)
            .upper_bound(upper_bound)
            .build()
            .map_err(|_| ProblemError::IncompleteVariable)?;
        self.add_variable(new_var)
    }
    // endregion Adding Variables

    // region Adding Constraints
    /// Add a constraint to the problem
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<(), ProblemError> {
        self.validate_constraint(&constraint)?;
        self.constraints.insert(constraint.get_id(), constraint);
        self.status = OptimizationStatus::Unoptimized;
        Ok(())
    }

    /// Create a new equality constraint and add it to the problem
    pub fn add_new_equality_constraint(
        &mut self,
        id: &str,
        variables: &[&str],
        coefficients: &[f64],
        equals: f64,
    ) -> Result<(), ProblemError> {
        self.add_constraint(Constraint::new_equality(id, variables, coefficients, equals))
    }

    /// Create a new inequality constraint and add it to the problem
    pub fn add_new_inequality_constraint(
        &mut self,
        id: &str,
        variables: &[&str],
        coefficients: &[f64],
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        self.add_constraint(Constraint::new_inequality(
            id,
            variables,
            coefficients,
            lower_bound,
            upper_bound,
        ))
    }
    // endregion Adding Constraints

    // region Update Variable Bounds
    /// Update the bounds of a variable
    pub fn update_variable_bounds(
        &mut self,
        id: &str,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        if lower_bound > upper_bound {
            return Err(ProblemError::InvalidVariableBounds);
        }
        match self.variables.get_mut(id) {
            Some(var) => {
                var.lower_bound = lower_bound;
                var.upper_bound = upper_bound;
            }
            None => return Err(NonExistentVariable),
        };
        self.status = OptimizationStatus::Unoptimized;
        Ok(())
    }
    // endregion Update Variable Bounds

    // region Remove Variables
    /// Remove a variable from the problem, which also removes its terms from all
    /// constraints and from the objective
    pub fn delete_variable(&mut self, variable_id: &str) -> Result<(), ProblemError> {
        // Start by removing any terms in the objective including this variable
        self.objective.remove_terms_with_variable(variable_id);
        // Now remove any terms from constraints which include the variable
        self.constraints.iter_mut().for_each(|(_, constraint)| {
            constraint.remove_variable(variable_id);
        });
        // Finally the variable can be dropped from the problem
        match self.variables.shift_remove(variable_id) {
            Some(_) => {}
            None => return Err(NonExistentVariable),
        };
        // And fix the indices of the remaining variables
        self.fix_variable_indices();
        if !self.has_integer_variables() {
            self.problem_type = ProblemType::LinearContinuous;
        }
        self.status = OptimizationStatus::Unoptimized;
        Ok(())
    }
    // endregion Remove Variables

    // region Remove Constraints
    /// Remove a constraint (by id) from the problem
    pub fn remove_constraint(&mut self, constraint_id: &str) {
        self.constraints.shift_remove(constraint_id);
        self.status = OptimizationStatus::Unoptimized;
    }
    // endregion Remove Constraints

    // region Accessors
    /// Get a variable by id
    pub fn variable(&self, id: &str) -> Option<&Variable> {
        self.variables.get(id)
    }

    /// The variables of the problem
    pub fn variables(&self) -> &IndexMap<String, Variable> {
        &self.variables
    }

    /// The constraints of the problem
    pub fn constraints(&self) -> &IndexMap<String, Constraint> {
        &self.constraints
    }

    /// The current status of the problem
    pub fn status(&self) -> OptimizationStatus {
        self.status
    }

    /// The type of the problem
    pub fn problem_type(&self) -> ProblemType {
        self.problem_type
    }

    /// Whether the problem contains any integer or binary variables
    pub fn has_integer_variables(&self) -> bool {
        self.variables
            .values()
            .any(|var| var.variable_type != VariableType::Continuous)
    }
    // endregion Accessors

    // region Solving
    /// Solve the problem with the configured solver
    pub fn solve(&mut self) -> Result<ProblemSolution, SolverError> {
        let result = solvers::solve(self);
        self.status = match &result {
            Ok(solution) => solution.status,
            Err(SolverError::Infeasible) => OptimizationStatus::Infeasible,
            Err(SolverError::Unbounded) => OptimizationStatus::Unbounded,
            Err(_) => OptimizationStatus::Unoptimized,
        };
        result
    }
    // endregion Solving

    // region Validation Functions
    /// Check that a variable is valid to add to this problem
    fn validate_variable(&self, variable: &Variable) -> Result<(), ProblemError> {
        if self.variables.contains_key(&variable.id) {
            return Err(ProblemError::VariableIdAlreadyExists);
        };
        if variable.lower_bound > variable.upper_bound {
            return Err(ProblemError::InvalidVariableBounds);
        }
        Ok(())
    }

    /// Check that a constraint is valid to add to this problem
    fn validate_constraint(&self, constraint: &Constraint) -> Result<(), ProblemError> {
        // Check that a constraint with the same id doesn't already exist
        if self.constraints.contains_key(&constraint.get_id()) {
            return Err(ProblemError::ConstraintAlreadyExists);
        }
        // Check that for inequality constraints the bounds make sense
        if let Constraint::Inequality {
            lower_bound,
            upper_bound,
            ..
        } = constraint
        {
            if lower_bound > upper_bound {
                return Err(ProblemError::InvalidConstraintBounds);
            }
        }
        // Check that the variables in this constraint are in the problem
        for term in constraint.get_terms() {
            if !self.variables.contains_key(&term.variable) {
                return Err(NonExistentVariablesInConstraint);
            }
        }
        Ok(())
    }
    // endregion Validation Functions

    // region Fix Problem Functions
    fn fix_variable_indices(&mut self) {
        self.variables
            .values_mut()
            .enumerate()
            .for_each(|(index, var)| {
                var.index = index;
            });
    }
    // endregion Fix Problem Functions
}

/// Struct representing the solution to an optimization problem
#[derive(Debug, Clone)]
pub struct ProblemSolution {
    /// The status the optimization finished with
    pub status: OptimizationStatus,
    /// Optimized value of the objective
    pub objective_value: f64,
    /// Values of the variables at the optimum, keyed by variable id
    pub variable_values: IndexMap<String, f64>,
}

/// Status of an optimization problem
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OptimizationStatus {
    /// Problem has not yet been optimized (or has been edited since)
    Unoptimized,
    /// Problem has been optimized
    Optimal,
    /// Problem can't be optimized because the objective value is not bounded
    Unbounded,
    /// Problem can't be solved because it is infeasible (conflicting constraints)
    Infeasible,
}

/// Types of optimization problems
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProblemType {
    /// Problem with linear objective and constraints, and continuous variables
    LinearContinuous,
    /// Problem with linear objective and constraints, with integer and continuous variables
    LinearMixedInteger,
}

/// Errors associated with the Problem
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    /// Error when trying to add a variable with the same id as an existing variable
    #[error("Tried to add a variable with the same id as an existing variable")]
    VariableIdAlreadyExists,
    /// Error when trying to add a variable with invalid bounds
    #[error("Tried to add a variable with lower_bound > upper_bound")]
    InvalidVariableBounds,
    /// Error when a variable could not be built from its parts
    #[error("Tried to add a variable missing required fields")]
    IncompleteVariable,
    /// Error when trying to add a constraint with the same id as an existing constraint
    #[error("Tried to add a constraint with the same id as an existing constraint")]
    ConstraintAlreadyExists,
    /// Error when trying to add a constraint with invalid bounds
    #[error("Tried to add an inequality constraint with lower_bound > upper_bound")]
    InvalidConstraintBounds,
    /// Error when trying to add a constraint that contains variables not in the problem
    #[error("Tried to add a constraint with variables not in the problem")]
    NonExistentVariablesInConstraint,
    /// Error when trying to add an objective term which includes variables not in the problem
    #[error("Tried adding an objective term with variables not in the problem")]
    NonExistentVariablesInObjective,
    /// Error when trying to perform an update or drop on a variable that doesn't exist
    #[error("Tried to access a variable that doesn't exist")]
    NonExistentVariable,
}
