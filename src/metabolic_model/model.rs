//! This module provides the Model struct for representing an entire metabolic model
use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use thiserror::Error;

use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::reaction::Reaction;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::{Problem, ProblemError};
use crate::optimize::solvers::SolverError;
use crate::optimize::variable::VariableType;

/// Represents a genome scale metabolic model
#[derive(Clone, Debug)]
pub struct Model {
    /// Map of reaction ids to Reaction objects
    pub reactions: IndexMap<String, Reaction>,
    /// Map of gene ids to Gene objects
    pub genes: IndexMap<String, Gene>,
    /// Map of metabolite ids to Metabolite objects
    pub metabolites: IndexMap<String, Metabolite>,
    /// Map of reaction ids to objective function coefficients
    pub objective: IndexMap<String, f64>,
    /// Direction in which the objective is optimized
    pub objective_sense: ObjectiveSense,
    /// Underlying optimization problem
    pub(crate) problem: Option<Problem>,
    /// Id associated with the Model
    pub id: Option<String>,
}

impl Model {
    pub fn new_empty() -> Self {
        Model {
            reactions: IndexMap::new(),
            genes: IndexMap::new(),
            metabolites: IndexMap::new(),
            objective: IndexMap::new(),
            objective_sense: ObjectiveSense::Maximize,
            problem: None,
            id: None,
        }
    }

    /// Add a reaction to the model
    pub fn add_reaction(&mut self, reaction: Reaction) {
        let id = reaction.id.clone();
        self.reactions.insert(id, reaction);
        self.invalidate_problem();
    }

    /// Add a gene to the model
    pub fn add_gene(&mut self, gene: Gene) {
        let id = gene.id.clone();
        self.genes.insert(id, gene);
    }

    /// Add a metabolite to the model
    pub fn add_metabolite(&mut self, metabolite: Metabolite) {
        let id = metabolite.id.clone();
        self.metabolites.insert(id, metabolite);
        self.invalidate_problem();
    }

    /// Make a single reaction the objective of the model, with coefficient 1
    pub fn set_objective(&mut self, reaction_id: &str) -> Result<(), ModelError> {
        if !self.reactions.contains_key(reaction_id) {
            return Err(ModelError::UnknownReaction(reaction_id.to_string()));
        }
        self.objective.clear();
        self.objective.insert(reaction_id.to_string(), 1.0);
        self.invalidate_problem();
        Ok(())
    }

    /// Update the flux bounds of a reaction
    pub fn set_reaction_bounds(
        &mut self,
        reaction_id: &str,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ModelError> {
        if lower_bound > upper_bound {
            return Err(ModelError::InvalidBounds {
                lower: lower_bound,
                upper: upper_bound,
            });
        }
        let reaction = self
            .reactions
            .get_mut(reaction_id)
            .ok_or_else(|| ModelError::UnknownReaction(reaction_id.to_string()))?;
        reaction.lower_bound = lower_bound;
        reaction.upper_bound = upper_bound;
        self.invalidate_problem();
        Ok(())
    }

    /// Remove reactions (by id) from the model
    ///
    /// With `remove_orphans`, metabolites and genes no longer referenced by
    /// any remaining reaction are removed as well.
    pub fn remove_reactions(&mut self, reaction_ids: &[String], remove_orphans: bool) {
        for reaction_id in reaction_ids {
            self.reactions.shift_remove(reaction_id);
            self.objective.shift_remove(reaction_id);
        }
        if remove_orphans {
            let referenced_metabolites: HashSet<String> = self
                .reactions
                .values()
                .flat_map(|reaction| reaction.metabolites.keys().cloned())
                .collect();
            self.metabolites
                .retain(|id, _| referenced_metabolites.contains(id));
            let referenced_genes: HashSet<String> = self
                .reactions
                .values()
                .flat_map(|reaction| reaction.genes())
                .collect();
            self.genes.retain(|id, _| referenced_genes.contains(id));
        }
        self.invalidate_problem();
    }

    /// The underlying optimization problem, if it has been built
    pub fn problem(&self) -> Option<&Problem> {
        self.problem.as_ref()
    }

    /// The underlying optimization problem, built on first access
    pub(crate) fn problem_mut(&mut self) -> Result<&mut Problem, ModelError> {
        if self.problem.is_none() {
            self.problem = Some(self.build_problem()?);
        }
        Ok(self.problem.as_mut().unwrap())
    }

    pub(crate) fn invalidate_problem(&mut self) {
        self.problem = None;
    }

    /// Build the flux balance problem for the model
    ///
    /// Each reaction is split into a forward and a reverse flux variable, each
    /// metabolite contributes one steady state mass balance constraint, and
    /// the objective is assembled from the model's objective coefficients.
    pub fn build_problem(&self) -> Result<Problem, ModelError> {
        let mut problem = Problem::new(self.objective_sense);
        for reaction in self.reactions.values() {
            let (forward_lower, forward_upper) = reaction.forward_bounds();
            problem.add_new_variable(
                &reaction.forward_id(),
                None,
                VariableType::Continuous,
                forward_lower,
                forward_upper,
            )?;
            let (reverse_lower, reverse_upper) = reaction.reverse_bounds();
            problem.add_new_variable(
                &reaction.reverse_id(),
                None,
                VariableType::Continuous,
                reverse_lower,
                reverse_upper,
            )?;
        }
        for metabolite_id in self.metabolites.keys() {
            let mut variables: Vec<String> = Vec::new();
            let mut coefficients: Vec<f64> = Vec::new();
            for reaction in self.reactions.values() {
                if let Some(stoichiometry) = reaction.metabolites.get(metabolite_id) {
                    variables.push(reaction.forward_id());
                    coefficients.push(*stoichiometry);
                    variables.push(reaction.reverse_id());
                    coefficients.push(-*stoichiometry);
                }
            }
            if variables.is_empty() {
                continue;
            }
            let variable_refs: Vec<&str> = variables.iter().map(String::as_str).collect();
            problem.add_new_equality_constraint(
                &format!("mass_balance_{}", metabolite_id),
                &variable_refs,
                &coefficients,
                0.0,
            )?;
        }
        for (reaction_id, coefficient) in &self.objective {
            let reaction = self
                .reactions
                .get(reaction_id)
                .ok_or_else(|| ModelError::UnknownReaction(reaction_id.clone()))?;
            problem.add_new_linear_objective_term(&reaction.forward_id(), *coefficient)?;
            problem.add_new_linear_objective_term(&reaction.reverse_id(), -*coefficient)?;
        }
        Ok(problem)
    }

    /// Optimize the model, returning the flux distribution and objective value
    pub fn optimize(&mut self) -> Result<Solution, ModelError> {
        let lp_solution = {
            let problem = self.problem_mut()?;
            problem.solve()?
        };
        let mut fluxes = IndexMap::new();
        for (reaction_id, reaction) in &self.reactions {
            let forward = lp_solution
                .variable_values
                .get(&reaction.forward_id())
                .copied()
                .unwrap_or(0.0);
            let reverse = lp_solution
                .variable_values
                .get(&reaction.reverse_id())
                .copied()
                .unwrap_or(0.0);
            fluxes.insert(reaction_id.clone(), forward - reverse);
        }
        Ok(Solution {
            fluxes,
            objective_value: lp_solution.objective_value,
        })
    }

    /// Optimize the model and return only the objective value
    pub fn slim_optimize(&mut self) -> Result<f64, ModelError> {
        Ok(self.optimize()?.objective_value)
    }
}

/// Result of optimizing a model
#[derive(Clone, Debug)]
pub struct Solution {
    /// Flux carried by each reaction at the optimum, keyed by reaction id
    pub fluxes: IndexMap<String, f64>,
    /// Value of the objective at the optimum
    pub objective_value: f64,
}

/// Errors raised when building or optimizing a model
#[derive(Debug, Error)]
pub enum ModelError {
    /// Lookup of a reaction that is not in the model
    #[error("The model does not contain a reaction with id {0}")]
    UnknownReaction(String),
    /// Reaction bounds where the lower bound exceeds the upper bound
    #[error("Reaction bounds with lower {lower} > upper {upper} are invalid")]
    InvalidBounds { lower: f64, upper: f64 },
    /// Failure while constructing the optimization problem
    #[error("Failed to construct the optimization problem: {0}")]
    Problem(#[from] ProblemError),
    /// Failure reported by the solver, including infeasibility
    #[error(transparent)]
    Solver(#[from] SolverError),
}

// region GPR Functionality
/// Representation of a gene reaction rule as an AST
#[derive(Clone, Debug, PartialEq)]
pub enum Gpr {
    /// Operation joining two subexpressions (see [`GprOperation`])
    Operation(GprOperation),
    /// A terminal gene node, referencing a gene by id
    GeneNode(String),
}

/// Possible operations joining genes in a rule
#[derive(Clone, Debug, PartialEq)]
pub enum GprOperation {
    /// Isozymes, either side suffices to catalyze the reaction
    Or { left: Box<Gpr>, right: Box<Gpr> },
    /// Complex subunits, both sides are required
    And { left: Box<Gpr>, right: Box<Gpr> },
}

/// Types of allowed GPR operations
pub enum GprOperatorType {
    /// Or, the reaction is catalyzed if either side is available
    Or,
    /// And, the reaction is catalyzed only if both sides are available
    And,
}

/// Policy for aggregating per-gene expression values across a rule
///
/// `and` always takes the minimum, the limiting subunit of a complex.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Aggregation {
    /// `or` takes the best expressed isozyme
    #[default]
    Or2MaxAnd2Min,
    /// `or` sums the isozyme contributions
    Or2SumAnd2Min,
}

impl Gpr {
    /// Create a new binary operation node
    pub fn new_binary_operation(left: Gpr, operator: GprOperatorType, right: Gpr) -> Gpr {
        let operation = match operator {
            GprOperatorType::Or => GprOperation::Or {
                left: Box::new(left),
                right: Box::new(right),
            },
            GprOperatorType::And => GprOperation::And {
                left: Box::new(left),
                right: Box::new(right),
            },
        };
        Gpr::Operation(operation)
    }

    /// Create a new gene node
    pub fn new_gene_node(gene: &str) -> Gpr {
        Gpr::GeneNode(gene.to_string())
    }

    /// Ids of all genes referenced by the rule, in first-mention order
    pub fn genes(&self) -> Vec<String> {
        let mut genes = Vec::new();
        self.collect_genes(&mut genes);
        genes
    }

    fn collect_genes(&self, genes: &mut Vec<String>) {
        match self {
            Gpr::GeneNode(gene) => {
                if !genes.contains(gene) {
                    genes.push(gene.clone());
                }
            }
            Gpr::Operation(
                GprOperation::Or { left, right } | GprOperation::And { left, right },
            ) => {
                left.collect_genes(genes);
                right.collect_genes(genes);
            }
        }
    }

    /// Substitute per-gene expression values and aggregate them into a single
    /// reaction level score
    ///
    /// Genes missing from `values` take the `default` value.
    pub fn evaluate(
        &self,
        values: &IndexMap<String, f64>,
        default: f64,
        aggregation: Aggregation,
    ) -> f64 {
        match self {
            Gpr::GeneNode(gene) => values.get(gene).copied().unwrap_or(default),
            Gpr::Operation(GprOperation::And { left, right }) => left
                .evaluate(values, default, aggregation)
                .min(right.evaluate(values, default, aggregation)),
            Gpr::Operation(GprOperation::Or { left, right }) => {
                let left_value = left.evaluate(values, default, aggregation);
                let right_value = right.evaluate(values, default, aggregation);
                match aggregation {
                    Aggregation::Or2MaxAnd2Min => left_value.max(right_value),
                    Aggregation::Or2SumAnd2Min => left_value + right_value,
                }
            }
        }
    }

    /// Generate a GPR string with gene ids from the GPR AST
    pub fn to_string_id(&self) -> String {
        match self {
            Gpr::Operation(op) => match op {
                GprOperation::Or { left, right } => {
                    format!("({} or {})", left.to_string_id(), right.to_string_id())
                }
                GprOperation::And { left, right } => {
                    format!("({} and {})", left.to_string_id(), right.to_string_id())
                }
            },
            Gpr::GeneNode(gene) => gene.clone(),
        }
    }
}

impl Display for Gpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_id())
    }
}
// endregion GPR Functionality


#[cfg(test)]
mod model_tests {
    use super::*;
    use crate::metabolic_model::metabolite::MetaboliteBuilder;
    use crate::metabolic_model::reaction::ReactionBuilder;

    /// A -> B -> with an intake cap of 10 on the first reaction
    fn linear_model() -> Model {
        let mut model = Model::new_empty();
        model.add_metabolite(MetaboliteBuilder::default().id("A").build().unwrap());
        let mut intake = IndexMap::new();
        intake.insert("A".to_string(), 1.0);
        model.add_reaction(
            ReactionBuilder::default()
                .id("R1")
                .metabolites(intake)
                .lower_bound(0.0)
                .upper_bound(10.0)
                .build()
                .unwrap(),
        );
        let mut outflow = IndexMap::new();
        outflow.insert("A".to_string(), -1.0);
        model.add_reaction(
            ReactionBuilder::default()
                .id("R2")
                .metabolites(outflow)
                .lower_bound(0.0)
                .upper_bound(1000.0)
                .build()
                .unwrap(),
        );
        model.set_objective("R2").unwrap();
        model
    }

    #[test]
    fn build_problem() {
        let model = linear_model();
        let problem = model.build_problem().unwrap();
        // Two variables per reaction, one mass balance per metabolite
        assert_eq!(problem.variables().len(), 4);
        assert_eq!(problem.constraints().len(), 1);
        assert_eq!(problem.objective().terms().len(), 2);
    }

    #[test]
    fn optimize() {
        let mut model = linear_model();
        let solution = model.optimize().unwrap();
        assert!((solution.objective_value - 10.0).abs() < 1e-6);
        assert!((solution.fluxes["R1"] - 10.0).abs() < 1e-6);
        assert!((solution.fluxes["R2"] - 10.0).abs() < 1e-6);
    }

    #[test]
    fn set_reaction_bounds() {
        let mut model = linear_model();
        model.set_reaction_bounds("R1", 0.0, 4.0).unwrap();
        assert!((model.slim_optimize().unwrap() - 4.0).abs() < 1e-6);

        let res = model.set_reaction_bounds("R1", 5.0, 4.0);
        assert!(matches!(res, Err(ModelError::InvalidBounds { .. })));
        let res = model.set_reaction_bounds("missing", 0.0, 4.0);
        assert!(matches!(res, Err(ModelError::UnknownReaction(_))));
    }

    #[test]
    fn remove_reactions_prunes_orphans() {
        let mut model = linear_model();
        model.remove_reactions(&["R1".to_string(), "R2".to_string()], true);
        assert!(model.reactions.is_empty());
        assert!(model.metabolites.is_empty());
        assert!(model.objective.is_empty());
    }

    #[test]
    fn add_gene() {
        let mut model = Model::new_empty();
        model.add_gene(Gene::new("g1"));
        assert!(model.genes.contains_key("g1"));
    }

    #[test]
    fn unknown_objective_reaction_fails() {
        let mut model = linear_model();
        assert!(matches!(
            model.set_objective("missing"),
            Err(ModelError::UnknownReaction(_))
        ));
    }
}
