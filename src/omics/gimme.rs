//! Gene Inactivity Moderated by Metabolism and Expression (GIMME)
use log::debug;

use crate::data_sets::expression_profile::{Condition, ExpressionProfile};
use crate::metabolic_model::edit::EditSession;
use crate::metabolic_model::model::{Aggregation, Model, ModelError, Solution};
use crate::omics::OmicsError;
use crate::optimize::objective::{Objective, ObjectiveSense};

/// Build a context-specific flux distribution with GIMME.
///
/// The model's own objective is optimized first, then constrained to stay
/// within `fraction_of_optimum` of that optimum (the required metabolic
/// functionality), and a weighted sum of fluxes through reactions expressed
/// below `cutoff` is minimized under that constraint.
///
/// The returned objective value is the inconsistency between the flux
/// distribution and the expression data: it is non-negative, and zero exactly
/// when no reaction expressed below the cutoff has to carry flux.
///
/// All edits to the model are rolled back before returning.
pub fn gimme(
    model: &mut Model,
    expression_profile: &ExpressionProfile,
    cutoff: f64,
    fraction_of_optimum: f64,
    condition: impl Into<Condition>,
) -> Result<Solution, OmicsError> {
    let reaction_profile =
        expression_profile.to_reaction_dict(condition, model, 0.0, Aggregation::default())?;
    let objective_value = model.slim_optimize()?;
    debug!("GIMME objective optimum before integration: {objective_value}");

    let mut session = EditSession::new(model)?;

    // Required metabolic functionality: pin the native objective near its optimum
    let mut rmf_variables: Vec<String> = Vec::new();
    let mut rmf_coefficients: Vec<f64> = Vec::new();
    for (reaction_id, coefficient) in session.model().objective.clone() {
        let reaction = session
            .model()
            .reactions
            .get(&reaction_id)
            .ok_or_else(|| ModelError::UnknownReaction(reaction_id.clone()))?;
        rmf_variables.push(reaction.forward_id());
        rmf_coefficients.push(coefficient);
        rmf_variables.push(reaction.reverse_id());
        rmf_coefficients.push(-coefficient);
    }
    let rmf_refs: Vec<&str> = rmf_variables.iter().map(String::as_str).collect();
    match session.model().objective_sense {
        ObjectiveSense::Maximize => session.add_inequality_constraint(
            "RMF",
            &rmf_refs,
            &rmf_coefficients,
            fraction_of_optimum * objective_value,
            f64::INFINITY,
        )?,
        ObjectiveSense::Minimize => session.add_inequality_constraint(
            "RMF",
            &rmf_refs,
            &rmf_coefficients,
            f64::NEG_INFINITY,
            fraction_of_optimum * objective_value,
        )?,
    }

    // Penalize flux through every reaction expressed below the cutoff
    let mut objective = Objective::new(ObjectiveSense::Minimize);
    for (reaction_id, expression) in &reaction_profile {
        if *expression < cutoff {
            let Some(reaction) = session.model().reactions.get(reaction_id) else {
                continue;
            };
            let coefficient = cutoff - expression;
            let forward = reaction.forward_id();
            let reverse = reaction.reverse_id();
            objective.add_linear_term(&forward, coefficient);
            objective.add_linear_term(&reverse, coefficient);
        }
    }
    session.set_objective(objective)?;

    let solution = session.optimize()?;
    debug!("GIMME inconsistency score: {}", solution.objective_value);
    Ok(solution)
}
