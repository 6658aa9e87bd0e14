//! FASTCORE context-specific network reconstruction
use indexmap::IndexSet;
use log::{debug, warn};

use crate::configuration::CONFIGURATION;
use crate::metabolic_model::edit::EditSession;
use crate::metabolic_model::model::Model;
use crate::omics::OmicsError;
use crate::optimize::objective::{Objective, ObjectiveSense};
use crate::optimize::variable::VariableType;

/// Build a minimal flux-consistent subnetwork containing the core reactions.
///
/// The model must already be flux consistent (e.g. the output of
/// [`fastcc`](crate::omics::fastcc)). Sparse-mode searches flag core
/// reactions together with the support they need; the remaining unflagged
/// core is retried against the shrinking penalty set. When an iteration adds
/// nothing, the sign convention of the unflagged reversible core reactions is
/// flipped once, and if that still adds nothing the final pass's support is
/// taken and the search stops.
///
/// Core reactions that never activate are excluded from the result, with a
/// warning; callers can detect them by comparing `active_reactions` with the
/// returned model's reaction set. The input model is left unmodified.
pub fn fastcore(
    model: &mut Model,
    active_reactions: &[String],
    flux_threshold: f64,
    zero_cutoff: Option<f64>,
) -> Result<Model, OmicsError> {
    let zero_cutoff = zero_cutoff.unwrap_or_else(|| CONFIGURATION.read().unwrap().tolerance);
    for reaction_id in active_reactions {
        if !model.reactions.contains_key(reaction_id) {
            return Err(OmicsError::UnknownCoreReaction(reaction_id.clone()));
        }
    }
    let core: IndexSet<String> = active_reactions.iter().cloned().collect();
    let penalty: Vec<String> = model
        .reactions
        .keys()
        .filter(|reaction_id| !core.contains(*reaction_id))
        .cloned()
        .collect();
    let irreversible_core: Vec<String> = core
        .iter()
        .filter(|reaction_id| {
            model
                .reactions
                .get(*reaction_id)
                .is_some_and(|reaction| !reaction.reversibility())
        })
        .cloned()
        .collect();

    // The session scopes the reversible-core bound flips applied below
    let mut session = EditSession::new(model)?;
    let mut kept: IndexSet<String> = find_sparse_mode(
        session.model_mut(),
        &irreversible_core,
        &penalty,
        flux_threshold,
        zero_cutoff,
    )?;
    let mut remaining: IndexSet<String> = core
        .iter()
        .filter(|reaction_id| !kept.contains(*reaction_id))
        .cloned()
        .collect();
    let mut flipped = false;
    while !remaining.is_empty() {
        let targets: Vec<String> = remaining.iter().cloned().collect();
        let shrunk_penalty: Vec<String> = penalty
            .iter()
            .filter(|reaction_id| !kept.contains(*reaction_id))
            .cloned()
            .collect();
        let found = find_sparse_mode(
            session.model_mut(),
            &targets,
            &shrunk_penalty,
            flux_threshold,
            zero_cutoff,
        )?;
        let activated = remaining.iter().any(|reaction_id| found.contains(reaction_id));
        if activated {
            kept.extend(found);
            remaining.retain(|reaction_id| !kept.contains(reaction_id));
            flipped = false;
        } else if !flipped {
            // One-shot fallback: flip the sign convention of the unflagged
            // reversible core reactions and retry
            flipped = true;
            for reaction_id in &targets {
                let Some(reaction) = session.model().reactions.get(reaction_id) else {
                    continue;
                };
                if reaction.reversibility() {
                    let (lower_bound, upper_bound) =
                        (reaction.lower_bound, reaction.upper_bound);
                    session.set_reaction_bounds(reaction_id, -upper_bound, -lower_bound)?;
                }
            }
        } else {
            // Still nothing new after the flip, take whatever the final pass
            // activated and stop
            kept.extend(found);
            for reaction_id in &remaining {
                warn!("FASTCORE could not activate core reaction {reaction_id}");
            }
            break;
        }
    }
    drop(session);

    let to_remove: Vec<String> = model
        .reactions
        .keys()
        .filter(|reaction_id| !kept.contains(*reaction_id))
        .cloned()
        .collect();
    debug!(
        "FASTCORE keeps {} of {} reactions",
        model.reactions.len() - to_remove.len(),
        model.reactions.len()
    );
    let mut context_specific_model = model.clone();
    context_specific_model.remove_reactions(&to_remove, true);
    Ok(context_specific_model)
}

/// One sparse-mode search.
///
/// First maximize the number of core reactions whose flux magnitude reaches
/// `flux_threshold` (via capped auxiliary variables), then hold the activated
/// core at its achieved magnitude while minimizing the total flux the penalty
/// set contributes. Returns every reaction carrying non-negligible flux in
/// that minimal mode.
fn find_sparse_mode(
    model: &mut Model,
    core_reactions: &[String],
    penalty_reactions: &[String],
    flux_threshold: f64,
    zero_cutoff: f64,
) -> Result<IndexSet<String>, OmicsError> {
    if core_reactions.is_empty() {
        return Ok(IndexSet::new());
    }

    let support_solution = {
        let mut session = EditSession::new(model)?;
        let mut objective = Objective::new(ObjectiveSense::Maximize);
        for reaction_id in core_reactions {
            let Some(reaction) = session.model().reactions.get(reaction_id) else {
                continue;
            };
            let forward = reaction.forward_id();
            let reverse = reaction.reverse_id();
            let auxiliary = format!("auxiliary_{}", reaction_id);
            session.add_variable(&auxiliary, VariableType::Continuous, 0.0, flux_threshold)?;
            session.add_inequality_constraint(
                &format!("support_{}", reaction_id),
                &[&forward, &reverse, &auxiliary],
                &[1.0, 1.0, -1.0],
                0.0,
                f64::INFINITY,
            )?;
            objective.add_linear_term(&auxiliary, 1.0);
        }
        session.set_objective(objective)?;
        session.optimize()?
    };

    // Core reactions that achieved flux, held at their achieved magnitude
    // (capped by the threshold) so the minimization below stays feasible
    let activated: Vec<(String, f64)> = core_reactions
        .iter()
        .filter_map(|reaction_id| {
            let flux = support_solution.fluxes.get(reaction_id)?;
            (flux.abs() > zero_cutoff)
                .then(|| (reaction_id.clone(), flux.abs().min(flux_threshold)))
        })
        .collect();
    if activated.is_empty() {
        return Ok(IndexSet::new());
    }

    let sparse_solution = {
        let mut session = EditSession::new(model)?;
        for (reaction_id, magnitude) in &activated {
            let Some(reaction) = session.model().reactions.get(reaction_id) else {
                continue;
            };
            let forward = reaction.forward_id();
            let reverse = reaction.reverse_id();
            session.add_inequality_constraint(
                &format!("activate_{}", reaction_id),
                &[&forward, &reverse],
                &[1.0, 1.0],
                *magnitude,
                f64::INFINITY,
            )?;
        }
        let mut objective = Objective::new(ObjectiveSense::Minimize);
        for reaction_id in penalty_reactions {
            let Some(reaction) = session.model().reactions.get(reaction_id) else {
                continue;
            };
            let forward = reaction.forward_id();
            let reverse = reaction.reverse_id();
            objective.add_linear_term(&forward, 1.0);
            objective.add_linear_term(&reverse, 1.0);
        }
        session.set_objective(objective)?;
        session.optimize()?
    };

    Ok(sparse_solution
        .fluxes
        .iter()
        .filter(|(_, flux)| flux.abs() > zero_cutoff)
        .map(|(reaction_id, _)| reaction_id.clone())
        .collect())
}
