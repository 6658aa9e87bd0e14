//! This module provides a struct for representing reactions
use derive_builder::Builder;
use indexmap::IndexMap;

use crate::configuration::CONFIGURATION;
use crate::metabolic_model::model::Gpr;
use crate::utils::hashing::hash_as_hex_string;

/// Represents a reaction in the metabolic model
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Reaction {
    /// Used to identify the reaction
    #[builder(setter(into))]
    pub id: String,
    /// Metabolite stoichiometry of the reaction
    #[builder(default = "IndexMap::new()")]
    pub metabolites: IndexMap<String, f64>,
    /// Human-readable reaction name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Gene reaction rule describing which gene products catalyze the reaction
    #[builder(default = "None")]
    pub gpr: Option<Gpr>,
    /// Lower flux bound
    #[builder(default = "CONFIGURATION.read().unwrap().lower_bound")]
    pub lower_bound: f64,
    /// Upper flux bound
    #[builder(default = "CONFIGURATION.read().unwrap().upper_bound")]
    pub upper_bound: f64,
    /// Reaction subsystem
    #[builder(default = "None")]
    pub subsystem: Option<String>,
    /// Notes about the reaction
    #[builder(default = "None")]
    pub notes: Option<String>,
    /// Reaction annotations
    #[builder(default = "None")]
    pub annotation: Option<String>,
}

impl Reaction {
    /// Determine the id associated with the forward flux variable in the
    /// optimization problem
    ///
    /// # Note:
    /// The forward id is "{reaction_id}_forward"
    pub fn forward_id(&self) -> String {
        format!("{}_forward", &self.id)
    }

    /// Determine the id associated with the reverse flux variable in the
    /// optimization problem
    ///
    /// # Note:
    /// The reverse id is "{reaction_id}_reverse_{hexadecimal hash of reaction_id}"
    pub fn reverse_id(&self) -> String {
        format!("{}_reverse_{}", &self.id, hash_as_hex_string(&self.id))
    }

    /// Whether the reaction can carry flux in the reverse direction
    pub fn reversibility(&self) -> bool {
        self.lower_bound < 0.0
    }

    /// Bounds of the variable associated with the forward flux
    pub(crate) fn forward_bounds(&self) -> (f64, f64) {
        (self.lower_bound.max(0.0), self.upper_bound.max(0.0))
    }

    /// Bounds of the variable associated with the reverse flux
    pub(crate) fn reverse_bounds(&self) -> (f64, f64) {
        ((-self.upper_bound).max(0.0), (-self.lower_bound).max(0.0))
    }

    /// Ids of the genes referenced by the reaction's gene reaction rule
    pub fn genes(&self) -> Vec<String> {
        self.gpr.as_ref().map(|gpr| gpr.genes()).unwrap_or_default()
    }
}
