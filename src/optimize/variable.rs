//! Module providing representation of optimization problem variables
use std::fmt::{Display, Formatter};

use derive_builder::Builder;

/// A decision variable in an optimization problem
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Variable {
    /// Used to identify the variable (must be unique within a problem)
    #[builder(setter(into))]
    pub id: String,
    /// Human readable variable name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Type of the variable (see [`VariableType`])
    #[builder(default = "VariableType::Continuous")]
    pub variable_type: VariableType,
    /// Lower bound of the variable
    #[builder(default = "f64::NEG_INFINITY")]
    pub lower_bound: f64,
    /// Upper bound of the variable
    #[builder(default = "f64::INFINITY")]
    pub upper_bound: f64,
    /// Position of the variable within the problem
    #[builder(default = "0", setter(skip))]
    pub(crate) index: usize,
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}:{}", name, self.variable_type),
            None => write!(f, "{}:{}", self.id, self.variable_type),
        }
    }
}

/// Represents the type of variable in an optimization problem
#[derive(Debug, PartialEq, Clone, Copy, Hash, Eq)]
pub enum VariableType {
    /// Continuous variable
    Continuous,
    /// Integer variable
    Integer,
    /// Binary variable
    Binary,
}

impl Display for VariableType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            VariableType::Continuous => write!(f, "CONTINUOUS"),
            VariableType::Integer => write!(f, "INTEGER"),
            VariableType::Binary => write!(f, "BINARY"),
        }
    }
}
