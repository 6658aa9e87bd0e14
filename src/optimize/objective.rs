//! Provides struct for representing an optimization problem's objective

/// Represents the objective of an optimization problem
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// Terms included in the objective (see [`ObjectiveTerm`])
    terms: Vec<ObjectiveTerm>,
    /// Sense of the objective (maximize, or minimize), see [`ObjectiveSense`]
    sense: ObjectiveSense,
}

impl Objective {
    /// Create a new empty objective, with a given sense
    pub fn new(sense: ObjectiveSense) -> Self {
        Self {
            terms: Vec::new(),
            sense,
        }
    }

    /// Create a new empty maximization objective
    pub fn new_maximize() -> Self {
        Self::new(ObjectiveSense::Maximize)
    }

    /// Create a new empty minimization objective
    pub fn new_minimize() -> Self {
        Self::new(ObjectiveSense::Minimize)
    }

    /// Change the sense of the objective
    pub fn set_sense(&mut self, sense: ObjectiveSense) {
        self.sense = sense;
    }

    /// The sense of the objective
    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    /// The terms of the objective
    pub fn terms(&self) -> &[ObjectiveTerm] {
        &self.terms
    }

    /// Add a new term to the objective
    pub fn add_term(&mut self, term: ObjectiveTerm) {
        self.terms.push(term);
    }

    /// Add a new linear term to the objective
    pub fn add_linear_term(&mut self, variable: &str, coefficient: f64) {
        self.terms.push(ObjectiveTerm::new(variable, coefficient));
    }

    /// Add a series of linear terms to the objective function
    pub fn add_linear_terms(&mut self, variables: &[&str], coefficients: &[f64]) {
        self.terms.extend(
            variables
                .iter()
                .zip(coefficients)
                .map(|(var, coef)| ObjectiveTerm::new(var, *coef)),
        );
    }

    /// Remove all terms which reference a variable
    pub fn remove_terms_with_variable(&mut self, variable_id: &str) {
        self.terms.retain(|term| term.variable != variable_id);
    }

    /// Remove all terms from the objective
    pub fn remove_all_terms(&mut self) {
        self.terms.clear();
    }
}

/// Represents the sense of the objective, whether it should be maximized or minimized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveSense {
    /// The objective should be minimized
    Minimize,
    /// The objective should be maximized
    Maximize,
}

/// A linear term in the objective
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveTerm {
    /// Id of the [`Variable`](crate::optimize::variable::Variable) in the term
    pub variable: String,
    /// Coefficient for the term
    pub coefficient: f64,
}

impl ObjectiveTerm {
    /// Create a new linear objective term
    pub fn new(variable: &str, coefficient: f64) -> Self {
        ObjectiveTerm {
            variable: variable.to_string(),
            coefficient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sense() {
        let max_objective = Objective::new_maximize();
        assert_eq!(max_objective.sense(), ObjectiveSense::Maximize);

        let mut min_objective = Objective::new_minimize();
        assert_eq!(min_objective.sense(), ObjectiveSense::Minimize);
        min_objective.set_sense(ObjectiveSense::Maximize);
        assert_eq!(min_objective.sense(), ObjectiveSense::Maximize);
    }

    #[test]
    fn add_and_remove_terms() {
        let mut objective = Objective::new_maximize();
        objective.add_linear_term("x", 2.0);
        objective.add_linear_terms(&["y", "z"], &[1.0, -1.0]);
        objective.add_term(ObjectiveTerm::new("w", 0.5));
        assert_eq!(objective.terms().len(), 4);

        objective.remove_terms_with_variable("y");
        assert_eq!(objective.terms().len(), 3);
        assert!(objective.terms().iter().all(|term| term.variable != "y"));

        objective.remove_all_terms();
        assert!(objective.terms().is_empty());
    }
}
