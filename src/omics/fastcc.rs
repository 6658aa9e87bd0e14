//! FASTCC flux consistency check
use log::debug;

use crate::metabolic_model::edit::EditSession;
use crate::metabolic_model::model::{Model, Solution};
use crate::omics::OmicsError;
use crate::optimize::objective::{Objective, ObjectiveSense};
use crate::optimize::variable::VariableType;

/// Check consistency of a metabolic network with FASTCC.
///
/// A single LP maximizes the sum of per-reaction auxiliary variables, each
/// bounded by `flux_threshold` and forced below the reaction's total flux
/// magnitude. Reactions whose flux stays below `zero_cutoff` at the optimum
/// cannot carry flux in any steady state and are removed, together with any
/// metabolites and genes this leaves unreferenced.
///
/// Returns a new, flux-consistent model; the input model is left unmodified.
pub fn fastcc(
    model: &mut Model,
    flux_threshold: f64,
    zero_cutoff: f64,
) -> Result<Model, OmicsError> {
    let solution = maximize_flux_support(model, flux_threshold)?;

    let blocked: Vec<String> = solution
        .fluxes
        .iter()
        .filter(|(_, flux)| flux.abs() < zero_cutoff)
        .map(|(reaction_id, _)| reaction_id.clone())
        .collect();
    debug!(
        "FASTCC found {} blocked reactions out of {}",
        blocked.len(),
        model.reactions.len()
    );

    let mut consistent_model = model.clone();
    consistent_model.remove_reactions(&blocked, true);
    Ok(consistent_model)
}

/// Maximize the number of reactions that carry flux simultaneously
fn maximize_flux_support(model: &mut Model, flux_threshold: f64) -> Result<Solution, OmicsError> {
    let mut session = EditSession::new(model)?;
    let reaction_ids: Vec<String> = session.model().reactions.keys().cloned().collect();
    let mut objective = Objective::new(ObjectiveSense::Maximize);
    for reaction_id in &reaction_ids {
        let Some(reaction) = session.model().reactions.get(reaction_id) else {
            continue;
        };
        let forward = reaction.forward_id();
        let reverse = reaction.reverse_id();
        let auxiliary = format!("auxiliary_{}", reaction_id);
        session.add_variable(&auxiliary, VariableType::Continuous, 0.0, flux_threshold)?;
        // The auxiliary can only reach its bound if the reaction carries flux
        session.add_inequality_constraint(
            &format!("consistency_{}", reaction_id),
            &[&forward, &reverse, &auxiliary],
            &[1.0, 1.0, -1.0],
            0.0,
            f64::INFINITY,
        )?;
        objective.add_linear_term(&auxiliary, 1.0);
    }
    session.set_objective(objective)?;
    Ok(session.optimize()?)
}
