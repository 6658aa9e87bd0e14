//! Scoped, rolled-back edits to a model's optimization problem
use log::warn;

use crate::metabolic_model::model::{Model, ModelError, Solution};
use crate::optimize::objective::Objective;
use crate::optimize::variable::VariableType;

/// A transactional editing scope over a model's optimization problem.
///
/// Every mutation records its reverse operation, and dropping the session
/// replays the reverses in reverse order. The model is therefore restored on
/// normal exit, on `?` error exit, and during panic unwinding alike, so
/// callers never observe partial edits.
pub struct EditSession<'m> {
    model: &'m mut Model,
    undo: Vec<UndoOp>,
}

enum UndoOp {
    RemoveVariable(String),
    RemoveConstraint(String),
    RestoreObjective(Objective),
    RestoreReactionBounds {
        reaction_id: String,
        lower_bound: f64,
        upper_bound: f64,
    },
}

impl<'m> EditSession<'m> {
    /// Open an editing scope, building the model's problem if needed
    pub fn new(model: &'m mut Model) -> Result<EditSession<'m>, ModelError> {
        model.problem_mut()?;
        Ok(EditSession {
            model,
            undo: Vec::new(),
        })
    }

    /// The model being edited
    pub fn model(&self) -> &Model {
        self.model
    }

    /// Reborrow the model mutably, e.g. to run a nested editing scope
    pub fn model_mut(&mut self) -> &mut Model {
        self.model
    }

    /// Add a variable to the problem, removed again when the session ends
    pub fn add_variable(
        &mut self,
        id: &str,
        variable_type: VariableType,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ModelError> {
        let problem = self.model.problem_mut()?;
        problem.add_new_variable(id, None, variable_type, lower_bound, upper_bound)?;
        self.undo.push(UndoOp::RemoveVariable(id.to_string()));
        Ok(())
    }

    /// Add an equality constraint to the problem, removed again when the
    /// session ends
    pub fn add_equality_constraint(
        &mut self,
        id: &str,
        variables: &[&str],
        coefficients: &[f64],
        equals: f64,
    ) -> Result<(), ModelError> {
        let problem = self.model.problem_mut()?;
        problem.add_new_equality_constraint(id, variables, coefficients, equals)?;
        self.undo.push(UndoOp::RemoveConstraint(id.to_string()));
        Ok(())
    }

    /// Add an inequality constraint to the problem, removed again when the
    /// session ends
    pub fn add_inequality_constraint(
        &mut self,
        id: &str,
        variables: &[&str],
        coefficients: &[f64],
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ModelError> {
        let problem = self.model.problem_mut()?;
        problem.add_new_inequality_constraint(id, variables, coefficients, lower_bound, upper_bound)?;
        self.undo.push(UndoOp::RemoveConstraint(id.to_string()));
        Ok(())
    }

    /// Replace the problem objective, restoring the previous one when the
    /// session ends
    pub fn set_objective(&mut self, objective: Objective) -> Result<(), ModelError> {
        let problem = self.model.problem_mut()?;
        let previous = problem.objective().clone();
        problem.set_objective(objective)?;
        self.undo.push(UndoOp::RestoreObjective(previous));
        Ok(())
    }

    /// Change a reaction's flux bounds, restoring them when the session ends
    pub fn set_reaction_bounds(
        &mut self,
        reaction_id: &str,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ModelError> {
        let reaction = self
            .model
            .reactions
            .get(reaction_id)
            .ok_or_else(|| ModelError::UnknownReaction(reaction_id.to_string()))?;
        let previous = (reaction.lower_bound, reaction.upper_bound);
        apply_reaction_bounds(self.model, reaction_id, lower_bound, upper_bound)?;
        self.undo.push(UndoOp::RestoreReactionBounds {
            reaction_id: reaction_id.to_string(),
            lower_bound: previous.0,
            upper_bound: previous.1,
        });
        Ok(())
    }

    /// Solve the problem in its edited state
    pub fn optimize(&mut self) -> Result<Solution, ModelError> {
        self.model.optimize()
    }
}

impl Drop for EditSession<'_> {
    fn drop(&mut self) {
        while let Some(op) = self.undo.pop() {
            let result = match op {
                UndoOp::RemoveVariable(id) => match self.model.problem.as_mut() {
                    Some(problem) => problem.delete_variable(&id).map_err(ModelError::from),
                    None => Ok(()),
                },
                UndoOp::RemoveConstraint(id) => {
                    if let Some(problem) = self.model.problem.as_mut() {
                        problem.remove_constraint(&id);
                    }
                    Ok(())
                }
                UndoOp::RestoreObjective(objective) => match self.model.problem.as_mut() {
                    Some(problem) => problem.set_objective(objective).map_err(ModelError::from),
                    None => Ok(()),
                },
                UndoOp::RestoreReactionBounds {
                    reaction_id,
                    lower_bound,
                    upper_bound,
                } => apply_reaction_bounds(self.model, &reaction_id, lower_bound, upper_bound),
            };
            if let Err(err) = result {
                warn!("failed to roll back a model edit: {err}");
            }
        }
    }
}

/// Update a reaction's bounds together with the bounds of its forward and
/// reverse flux variables, without rebuilding the problem
fn apply_reaction_bounds(
    model: &mut Model,
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
    let (forward_id, reverse_id, forward_bounds, reverse_bounds) = {
        let reaction = model
            .reactions
            .get_mut(reaction_id)
            .ok_or_else(|| ModelError::UnknownReaction(reaction_id.to_string()))?;
        reaction.lower_bound = lower_bound;
        reaction.upper_bound = upper_bound;
        (
            reaction.forward_id(),
            reaction.reverse_id(),
            reaction.forward_bounds(),
            reaction.reverse_bounds(),
        )
    };
    if let Some(problem) = model.problem.as_mut() {
        problem.update_variable_bounds(&forward_id, forward_bounds.0, forward_bounds.1)?;
        problem.update_variable_bounds(&reverse_id, reverse_bounds.0, reverse_bounds.1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::metabolite::MetaboliteBuilder;
    use crate::metabolic_model::reaction::ReactionBuilder;
    use crate::optimize::objective::ObjectiveSense;
    use indexmap::IndexMap;

    fn two_reaction_model() -> Model {
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

    fn fingerprint(model: &Model) -> (Vec<String>, Vec<String>, usize) {
        let problem = model.problem().expect("problem not built");
        (
            problem.variables().keys().cloned().collect(),
            problem.constraints().keys().cloned().collect(),
            problem.objective().terms().len(),
        )
    }

    #[test]
    fn edits_roll_back_on_drop() {
        let mut model = two_reaction_model();
        model.optimize().unwrap();
        let before = fingerprint(&model);

        {
            let mut session = EditSession::new(&mut model).unwrap();
            session
                .add_variable("scratch", VariableType::Continuous, 0.0, 1.0)
                .unwrap();
            session
                .add_inequality_constraint("pin", &["scratch"], &[1.0], 0.5, 1.0)
                .unwrap();
            session
                .add_equality_constraint("tie", &["scratch"], &[2.0], 1.6)
                .unwrap();
            let mut objective = Objective::new(ObjectiveSense::Minimize);
            objective.add_linear_term("scratch", 1.0);
            session.set_objective(objective).unwrap();
            let solution = session.optimize().unwrap();
            assert!((solution.objective_value - 0.8).abs() < 1e-6);
        }

        assert_eq!(fingerprint(&model), before);
        // The original objective solves to its old optimum again
        assert!((model.slim_optimize().unwrap() - 10.0).abs() < 1e-6);
    }

    #[test]
    fn bound_changes_roll_back_on_drop() {
        let mut model = two_reaction_model();
        model.optimize().unwrap();

        {
            let mut session = EditSession::new(&mut model).unwrap();
            session.set_reaction_bounds("R1", 0.0, 2.0).unwrap();
            let solution = session.optimize().unwrap();
            assert!((solution.objective_value - 2.0).abs() < 1e-6);
        }

        assert!((model.reactions["R1"].upper_bound - 10.0).abs() < 1e-12);
        assert!((model.slim_optimize().unwrap() - 10.0).abs() < 1e-6);
    }

    #[test]
    fn edits_roll_back_on_early_error() {
        let mut model = two_reaction_model();
        model.optimize().unwrap();
        let before = fingerprint(&model);

        let result: Result<(), ModelError> = (|| {
            let mut session = EditSession::new(&mut model)?;
            session.add_variable("scratch", VariableType::Continuous, 0.0, 1.0)?;
            // Duplicate id fails and the closure returns early
            session.add_variable("scratch", VariableType::Continuous, 0.0, 1.0)?;
            Ok(())
        })();

        assert!(result.is_err());
        assert_eq!(fingerprint(&model), before);
    }
}
