//! Module providing JSON io for Models
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::io::gpr_parse::{parse_gpr, GprParseError};
use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::{Reaction, ReactionBuilder, ReactionBuilderError};
use crate::optimize::objective::ObjectiveSense;

// region JSON Model
/// Represents a JSON serialized model, used for reading and writing models in
/// the cobra json format
#[derive(Serialize, Deserialize)]
struct JsonModel {
    metabolites: Vec<JsonMetabolite>,
    reactions: Vec<JsonReaction>,
    genes: Vec<JsonGene>,
    id: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct JsonMetabolite {
    id: String,
    name: Option<String>,
    compartment: Option<String>,
    charge: Option<i32>,
    formula: Option<String>,
    notes: Option<Value>,
    annotation: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct JsonReaction {
    id: String,
    name: Option<String>,
    metabolites: IndexMap<String, f64>,
    lower_bound: f64,
    upper_bound: f64,
    gene_reaction_rule: String,
    objective_coefficient: Option<f64>,
    subsystem: Option<String>,
    notes: Option<Value>,
    annotation: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct JsonGene {
    id: String,
    name: Option<String>,
    notes: Option<Value>,
    annotation: Option<Value>,
}
// endregion JSON Model

// region Conversions
/* The notes and annotations are kept as JSON strings. The data is not very
structured, so unpacking more than this would take a lot of maintenance. */
impl From<JsonGene> for Gene {
    fn from(g: JsonGene) -> Self {
        Self {
            id: g.id,
            name: g.name,
            notes: g.notes.map(|v| v.to_string()),
            annotation: g.annotation.map(|v| v.to_string()),
        }
    }
}

impl From<JsonMetabolite> for Metabolite {
    fn from(m: JsonMetabolite) -> Self {
        Self {
            id: m.id,
            name: m.name,
            compartment: m.compartment,
            charge: m.charge.unwrap_or_default(),
            formula: m.formula,
            notes: m.notes.map(|v| v.to_string()),
            annotation: m.annotation.map(|v| v.to_string()),
        }
    }
}

impl From<Gene> for JsonGene {
    fn from(g: Gene) -> Self {
        Self {
            id: g.id,
            name: g.name,
            notes: g
                .notes
                .map(|n| serde_json::from_str(&n).unwrap_or(Value::String(n))),
            annotation: g
                .annotation
                .map(|a| serde_json::from_str(&a).unwrap_or(Value::String(a))),
        }
    }
}

impl From<Metabolite> for JsonMetabolite {
    fn from(m: Metabolite) -> Self {
        Self {
            id: m.id,
            name: m.name,
            compartment: m.compartment,
            charge: Some(m.charge),
            formula: m.formula,
            notes: m
                .notes
                .map(|n| serde_json::from_str(&n).unwrap_or(Value::String(n))),
            annotation: m
                .annotation
                .map(|a| serde_json::from_str(&a).unwrap_or(Value::String(a))),
        }
    }
}

impl Model {
    /// Read a model from a cobra format JSON file
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Model, JsonError> {
        let model_str = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) => return Err(JsonError::UnableToRead(format!("{:?}", err))),
        };
        let json_model = serde_json::from_str::<JsonModel>(&model_str)?;
        Model::from_json(json_model)
    }

    /// Write the model to a cobra format JSON file
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), JsonError> {
        let json_model = self.to_json();
        let model_string = serde_json::to_string(&json_model)?;
        fs::write(path, model_string)?;
        Ok(())
    }

    fn from_json(json_model: JsonModel) -> Result<Self, JsonError> {
        let mut reactions: IndexMap<String, Reaction> = IndexMap::new();
        let mut genes: IndexMap<String, Gene> = IndexMap::new();
        let mut metabolites: IndexMap<String, Metabolite> = IndexMap::new();
        let mut objective: IndexMap<String, f64> = IndexMap::new();
        // Start by converting the genes and metabolites using the From methods
        json_model.genes.into_iter().for_each(|g| {
            genes.insert(g.id.clone(), Gene::from(g));
        });
        json_model.metabolites.into_iter().for_each(|m| {
            metabolites.insert(m.id.clone(), Metabolite::from(m));
        });
        /* Now, iterate through the reactions, parsing GPRs, and adding to
        the objective along the way */
        for rxn in json_model.reactions {
            let gpr = if !rxn.gene_reaction_rule.is_empty() {
                Some(parse_gpr(&rxn.gene_reaction_rule, &mut genes)?)
            } else {
                None
            };
            let new_reaction = ReactionBuilder::default()
                .id(rxn.id.clone())
                .metabolites(rxn.metabolites)
                .name(rxn.name)
                .gpr(gpr)
                .lower_bound(rxn.lower_bound)
                .upper_bound(rxn.upper_bound)
                .subsystem(rxn.subsystem)
                .notes(rxn.notes.map(|v| v.to_string()))
                .annotation(rxn.annotation.map(|v| v.to_string()))
                .build()?;
            reactions.insert(rxn.id.clone(), new_reaction);
            // Add the reaction to the objective function if desired
            if let Some(coef) = rxn.objective_coefficient {
                objective.insert(rxn.id, coef);
            }
        }
        Ok(Model {
            reactions,
            genes,
            metabolites,
            objective,
            objective_sense: ObjectiveSense::Maximize,
            problem: None,
            id: json_model.id,
        })
    }

    fn to_json(&self) -> JsonModel {
        let json_genes: Vec<JsonGene> =
            self.genes.values().map(|g| g.clone().into()).collect();
        let json_metabolites: Vec<JsonMetabolite> = self
            .metabolites
            .values()
            .map(|m| m.clone().into())
            .collect();
        let mut json_reactions: Vec<JsonReaction> = Vec::new();
        for r in self.reactions.values() {
            json_reactions.push(JsonReaction {
                id: r.id.clone(),
                name: r.name.clone(),
                metabolites: r.metabolites.clone(),
                lower_bound: r.lower_bound,
                upper_bound: r.upper_bound,
                gene_reaction_rule: r
                    .gpr
                    .clone()
                    .map(|rule| rule.to_string_id())
                    .unwrap_or_default(),
                objective_coefficient: self.objective.get(&r.id).copied(),
                subsystem: r.subsystem.clone(),
                notes: r
                    .notes
                    .clone()
                    .map(|n| serde_json::from_str(&n).unwrap_or(Value::String(n))),
                annotation: r
                    .annotation
                    .clone()
                    .map(|a| serde_json::from_str(&a).unwrap_or(Value::String(a))),
            })
        }

        JsonModel {
            metabolites: json_metabolites,
            reactions: json_reactions,
            genes: json_genes,
            id: self.id.clone(),
        }
    }
}

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("Unable to parse a gene reaction rule during conversion from JSON: {0}")]
    GprParserError(#[from] GprParseError),
    #[error("Unable to read file due to {0}")]
    UnableToRead(String),
    #[error("Unable to build reaction: {0}")]
    UnableToBuildReaction(#[from] ReactionBuilderError),
    #[error("Serde json parse error: {0}")]
    SerdeJsonParseError(#[from] serde_json::Error),
    #[error("Unable to write to file: {0}")]
    UnableToWrite(#[from] std::io::Error),
}
// endregion Conversions

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::model::{Gpr, GprOperation};
    use std::path::PathBuf;

    fn mini_model_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join("mini_model.json")
    }

    #[test]
    fn json_reaction() {
        let data = r#"{
"id":"R2",
"name":"A to B",
"metabolites":{
"A":-1.0,
"B":1.0
},
"lower_bound":0.0,
"upper_bound":1000.0,
"gene_reaction_rule":"g1 and g2",
"objective_coefficient":1.0
}"#;
        let reaction: JsonReaction = serde_json::from_str(data).unwrap();
        assert_eq!(reaction.id, "R2");
        assert_eq!(reaction.name.unwrap(), "A to B");
        assert!((reaction.metabolites["A"] + 1.0).abs() < 1e-25);
        assert!((reaction.metabolites["B"] - 1.0).abs() < 1e-25);
        assert!((reaction.lower_bound - 0.0).abs() < 1e-25);
        assert!((reaction.upper_bound - 1000.0).abs() < 1e-25);
        assert_eq!(reaction.gene_reaction_rule, "g1 and g2");
        assert!((reaction.objective_coefficient.unwrap() - 1.0).abs() < 1e-25);
    }

    #[test]
    fn read_json() {
        let model = Model::read_json(mini_model_path()).unwrap();
        assert_eq!(model.id.clone().unwrap(), "mini");
        assert_eq!(model.reactions.len(), 3);
        assert_eq!(model.metabolites.len(), 2);
        assert_eq!(model.genes.len(), 2);

        let reaction = model.reactions.get("R2").unwrap();
        assert!((reaction.metabolites["A"] + 1.0).abs() < 1e-25);
        match reaction.gpr {
            Some(Gpr::Operation(GprOperation::And { ref left, ref right })) => {
                assert_eq!(**left, Gpr::GeneNode("g1".to_string()));
                assert_eq!(**right, Gpr::GeneNode("g2".to_string()));
            }
            _ => panic!("Incorrect gene reaction rule parse"),
        }
        assert!((model.objective["R2"] - 1.0).abs() < 1e-25);
    }

    #[test]
    fn optimize_loaded_model() {
        let mut model = Model::read_json(mini_model_path()).unwrap();
        let solution = model.optimize().unwrap();
        // R2 is limited by the R1 intake cap of 10
        assert!((solution.objective_value - 10.0).abs() < 1e-6);
    }

    #[test]
    fn write_and_reread() {
        let model = Model::read_json(mini_model_path()).unwrap();
        let path = std::env::temp_dir().join("driven_core_mini_model_roundtrip.json");
        model.write_json(&path).unwrap();
        let reread = Model::read_json(&path).unwrap();
        assert_eq!(
            model.reactions.keys().collect::<Vec<_>>(),
            reread.reactions.keys().collect::<Vec<_>>()
        );
        assert_eq!(model.objective, reread.objective);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn round_trip() {
        let model = Model::read_json(mini_model_path()).unwrap();
        let rendered = serde_json::to_string(&model.to_json()).unwrap();
        let reread = Model::from_json(serde_json::from_str(&rendered).unwrap()).unwrap();
        assert_eq!(model.id, reread.id);
        assert_eq!(
            model.reactions.keys().collect::<Vec<_>>(),
            reread.reactions.keys().collect::<Vec<_>>()
        );
        assert_eq!(model.objective, reread.objective);
        let original = model.reactions.get("R2").unwrap();
        let restored = reread.reactions.get("R2").unwrap();
        assert_eq!(original.metabolites, restored.metabolites);
        assert_eq!(
            original.gpr.as_ref().map(|g| g.to_string_id()),
            restored.gpr.as_ref().map(|g| g.to_string_id())
        );
    }
}
