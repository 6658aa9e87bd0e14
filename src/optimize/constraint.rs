//! Provides struct for representing a constraint in an optimization problem
use std::fmt::{Display, Formatter};

/// Represents a linear constraint in an optimization problem
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Represents an equality constraint, where the sum of `terms` = `equals`
    Equality {
        /// Used to identify the constraint
        id: String,
        /// Linear terms which are added together, see [`ConstraintTerm`]
        terms: Vec<ConstraintTerm>,
        /// The right hand side of the equality constraint
        equals: f64,
    },
    /// Represents an inequality constraint
    Inequality {
        /// Used to identify the constraint
        id: String,
        /// Linear terms which are added together, see [`ConstraintTerm`]
        terms: Vec<ConstraintTerm>,
        /// The lowest value the sum of the terms can take
        lower_bound: f64,
        /// The highest value the sum of the terms can take
        upper_bound: f64,
    },
}

impl Constraint {
    /// Create a new equality constraint
    ///
    /// # Parameters
    /// - `id`: Identifier for the constraint
    /// - `variables`: A slice of variable ids
    /// - `coefficients`: A slice of coefficients for the variables
    /// - `equals`: The right hand side of the equality
    pub fn new_equality(id: &str, variables: &[&str], coefficients: &[f64], equals: f64) -> Self {
        Constraint::Equality {
            id: id.to_string(),
            terms: Constraint::zip_into_terms(variables, coefficients),
            equals,
        }
    }

    /// Create a new inequality constraint
    ///
    /// # Parameters
    /// - `id`: Identifier for the constraint
    /// - `variables`: A slice of variable ids
    /// - `coefficients`: A slice of coefficients for the variables
    /// - `lower_bound`: The lowest value the constraint can take
    /// - `upper_bound`: The highest value the constraint can take
    pub fn new_inequality(
        id: &str,
        variables: &[&str],
        coefficients: &[f64],
        lower_bound: f64,
        upper_bound: f64,
    ) -> Self {
        Constraint::Inequality {
            id: id.to_string(),
            terms: Constraint::zip_into_terms(variables, coefficients),
            lower_bound,
            upper_bound,
        }
    }

    /// Get the id of the constraint
    pub fn get_id(&self) -> String {
        match self {
            Constraint::Equality { id, .. } => id.clone(),
            Constraint::Inequality { id, .. } => id.clone(),
        }
    }

    /// Get the linear terms of the constraint
    pub fn get_terms(&self) -> &[ConstraintTerm] {
        match self {
            Constraint::Equality { terms, .. } => terms,
            Constraint::Inequality { terms, .. } => terms,
        }
    }

    /// Remove all terms referencing a variable from the constraint
    pub(crate) fn remove_variable(&mut self, variable_id: &str) {
        let terms = match self {
            Constraint::Equality { terms, .. } => terms,
            Constraint::Inequality { terms, .. } => terms,
        };
        terms.retain(|term| term.variable != variable_id);
    }

    /// Take a slice of variable ids, and a slice of coefficients and zip
    /// them together into a vec of ConstraintTerms
    fn zip_into_terms(variables: &[&str], coefficients: &[f64]) -> Vec<ConstraintTerm> {
        variables
            .iter()
            .zip(coefficients)
            .map(|(var, coef)| ConstraintTerm {
                variable: (*var).to_string(),
                coefficient: *coef,
            })
            .collect()
    }

    /// Convert a slice of terms into a String representation
    fn terms_to_string(terms: &[ConstraintTerm]) -> String {
        let rendered: Vec<String> = terms.iter().map(|term| format!("{}", term)).collect();
        rendered.join(" + ")
    }
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Constraint::Equality { terms, equals, .. } => {
                write!(f, "{} = {}", Self::terms_to_string(terms), equals)
            }
            Constraint::Inequality {
                terms,
                lower_bound,
                upper_bound,
                ..
            } => {
                write!(
                    f,
                    "{} <= {} <= {}",
                    lower_bound,
                    Self::terms_to_string(terms),
                    upper_bound
                )
            }
        }
    }
}

/// Represents a single term in a constraint, specifically
/// the multiplication of the `variable` by the `coefficient`
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintTerm {
    /// Id of the [`Variable`](crate::optimize::variable::Variable) in the term
    pub variable: String,
    /// The coefficient for the variable
    pub coefficient: f64,
}

impl Display for ConstraintTerm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}*{}", self.coefficient, self.variable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let constraint = Constraint::new_inequality("c1", &["x", "y"], &[3.0, 2.0], 2., 6.);
        assert_eq!(format!("{}", constraint), "2 <= 3*x + 2*y <= 6");

        let constraint = Constraint::new_equality("c2", &["x", "y"], &[3.0, 2.0], 6.);
        assert_eq!(format!("{}", constraint), "3*x + 2*y = 6");
    }

    #[test]
    fn remove_variable() {
        let mut constraint = Constraint::new_equality("c1", &["x", "y"], &[3.0, 2.0], 6.);
        constraint.remove_variable("x");
        assert_eq!(constraint.get_terms().len(), 1);
        assert_eq!(constraint.get_terms()[0].variable, "y");
    }
}
