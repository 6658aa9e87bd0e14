//! Integrative Metabolic Analysis Tool (iMAT)
use log::debug;

use crate::data_sets::expression_profile::{Condition, ExpressionProfile};
use crate::metabolic_model::edit::EditSession;
use crate::metabolic_model::model::{Aggregation, Model, Solution};
use crate::omics::OmicsError;
use crate::optimize::objective::{Objective, ObjectiveSense};
use crate::optimize::variable::VariableType;

/// Build a context-specific flux distribution with iMAT.
///
/// iMAT does not assume the cell pursues an objective. Reactions are
/// classified against the `(low, high)` cutoff pair: scores strictly above
/// `high` are highly expressed, scores strictly below `low` are lowly
/// expressed, everything else is left out of the optimization. The MILP then
/// maximizes the number of reactions whose flux state agrees with their
/// expression state: a highly expressed reaction should carry at least
/// `epsilon` flux in either direction, a lowly expressed one should carry
/// none.
///
/// All added variables and constraints are removed from the model before
/// returning, whether the solve succeeds or fails.
pub fn imat(
    model: &mut Model,
    expression_profile: &ExpressionProfile,
    cutoff: (f64, f64),
    epsilon: f64,
    condition: impl Into<Condition>,
) -> Result<Solution, OmicsError> {
    let (low_cutoff, high_cutoff) = cutoff;
    if low_cutoff > high_cutoff {
        return Err(OmicsError::InvalidCutoffs {
            low: low_cutoff,
            high: high_cutoff,
        });
    }
    let reaction_profile =
        expression_profile.to_reaction_dict(condition, model, 0.0, Aggregation::default())?;

    let mut session = EditSession::new(model)?;
    let mut objective = Objective::new(ObjectiveSense::Maximize);
    let mut highly = 0usize;
    let mut lowly = 0usize;
    for (reaction_id, expression) in &reaction_profile {
        let Some(reaction) = session.model().reactions.get(reaction_id) else {
            continue;
        };
        let lower_bound = reaction.lower_bound;
        let upper_bound = reaction.upper_bound;
        let forward = reaction.forward_id();
        let reverse = reaction.reverse_id();

        if *expression > high_cutoff {
            highly += 1;
            let y_pos = format!("y_pos_{}", reaction_id);
            let y_neg = format!("y_neg_{}", reaction_id);
            session.add_variable(&y_pos, VariableType::Binary, 0.0, 1.0)?;
            session.add_variable(&y_neg, VariableType::Binary, 0.0, 1.0)?;
            // v + y_pos (lb - epsilon) >= lb: setting y_pos demands forward flux
            session.add_inequality_constraint(
                &format!("y_{}_lower", reaction_id),
                &[&forward, &reverse, &y_pos],
                &[1.0, -1.0, lower_bound - epsilon],
                lower_bound,
                f64::INFINITY,
            )?;
            // v + y_neg (ub + epsilon) <= ub: setting y_neg demands reverse flux
            session.add_inequality_constraint(
                &format!("y_{}_upper", reaction_id),
                &[&forward, &reverse, &y_neg],
                &[1.0, -1.0, upper_bound + epsilon],
                f64::NEG_INFINITY,
                upper_bound,
            )?;
            objective.add_linear_term(&y_pos, 1.0);
            objective.add_linear_term(&y_neg, 1.0);
        } else if *expression < low_cutoff {
            lowly += 1;
            let x_var = format!("x_{}", reaction_id);
            session.add_variable(&x_var, VariableType::Binary, 0.0, 1.0)?;
            // (1 - x) ub - v >= 0: setting x squeezes the flux down to zero
            session.add_inequality_constraint(
                &format!("x_{}_upper", reaction_id),
                &[&forward, &reverse, &x_var],
                &[-1.0, 1.0, -upper_bound],
                -upper_bound,
                f64::INFINITY,
            )?;
            // (1 - x) lb - v <= 0
            session.add_inequality_constraint(
                &format!("x_{}_lower", reaction_id),
                &[&forward, &reverse, &x_var],
                &[-1.0, 1.0, -lower_bound],
                f64::NEG_INFINITY,
                -lower_bound,
            )?;
            objective.add_linear_term(&x_var, 1.0);
        }
    }
    debug!("iMAT classified {highly} reactions as highly and {lowly} as lowly expressed");
    session.set_objective(objective)?;

    let solution = session.optimize()?;
    debug!(
        "iMAT matched {} expression-consistent reaction states",
        solution.objective_value
    );
    Ok(solution)
}
