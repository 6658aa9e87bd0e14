//! This module provides the Gene struct, representing a gene in the metabolic model
use std::fmt::{Display, Formatter};

use derive_builder::Builder;

/// Structure representing a gene
#[derive(Builder, Clone, Debug, Eq, PartialEq)]
pub struct Gene {
    /// Used to identify the gene
    #[builder(setter(into))]
    pub id: String,
    /// Human readable gene name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Notes about the gene
    #[builder(default = "None")]
    pub notes: Option<String>,
    /// Gene annotations
    #[builder(default = "None")]
    pub annotation: Option<String>,
}

impl Gene {
    /// Create a new gene with only an id
    pub fn new(id: &str) -> Gene {
        GeneBuilder::default().id(id).build().unwrap()
    }
}

impl Display for Gene {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_gene() {
        let gene = Gene::new("Rv0001");
        assert_eq!(gene.id, "Rv0001");
        assert_eq!(gene.name, None);
        assert_eq!(format!("{}", gene), "Rv0001");
    }
}
