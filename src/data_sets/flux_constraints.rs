//! Define a general flux constraint data store
use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;
use nalgebra::DMatrix;

use crate::data_sets::frame::Frame;
use crate::data_sets::{index_of, DataSetError};
use crate::metabolic_model::model::{Model, ModelError};

/// Kinds of tabular flux data accepted by the import factories
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    /// `value`/`deviation` columns, turned into `[value - deviation, value + deviation]`
    Measurement,
    /// Explicit `lower_limit`/`upper_limit` columns
    Constraints,
}

impl FromStr for DataType {
    type Err = DataSetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "measurement" => Ok(DataType::Measurement),
            "constraints" => Ok(DataType::Constraints),
            other => Err(DataSetError::InvalidDataType(other.to_string())),
        }
    }
}

/// Representation of a flux constraint data store
#[derive(Clone, Debug)]
pub struct FluxConstraints {
    /// The reaction ids data is stored for
    reaction_ids: Vec<String>,
    /// Map of reaction id to row position
    reaction_id_index: IndexMap<String, usize>,
    /// The flux limits of the reactions, columns `[lower, upper]`
    limits: DMatrix<f64>,
}

impl FluxConstraints {
    /// Instantiate FluxConstraints
    ///
    /// The limit matrix must have one `[lower, upper]` row per reaction id,
    /// and the ids must be unique.
    pub fn new(
        reaction_ids: Vec<String>,
        limits: DMatrix<f64>,
    ) -> Result<FluxConstraints, DataSetError> {
        if limits.shape() != (reaction_ids.len(), 2) {
            return Err(DataSetError::ShapeMismatch {
                expected: (reaction_ids.len(), 2),
                found: limits.shape(),
            });
        }
        let reaction_id_index = index_of(&reaction_ids)?;
        Ok(FluxConstraints {
            reaction_ids,
            reaction_id_index,
            limits,
        })
    }

    /// The reaction ids, in stored order
    pub fn reaction_ids(&self) -> &[String] {
        &self.reaction_ids
    }

    /// The limit matrix
    pub fn limits(&self) -> &DMatrix<f64> {
        &self.limits
    }

    /// `[lower, upper]` limits of a reaction by id
    pub fn get(&self, reaction_id: &str) -> Result<[f64; 2], DataSetError> {
        let position = self
            .reaction_id_index
            .get(reaction_id)
            .copied()
            .ok_or_else(|| DataSetError::UnknownReaction(reaction_id.to_string()))?;
        self.get_at(position)
    }

    /// `[lower, upper]` limits of a reaction by position
    pub fn get_at(&self, position: usize) -> Result<[f64; 2], DataSetError> {
        if position >= self.reaction_ids.len() {
            return Err(DataSetError::ReactionIndexOutOfRange {
                index: position,
                count: self.reaction_ids.len(),
            });
        }
        Ok([self.limits[(position, 0)], self.limits[(position, 1)]])
    }

    /// Iterate the reaction ids in stored order
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.reaction_ids.iter()
    }

    /// Instantiate FluxConstraints from a data frame
    ///
    /// `DataType::Measurement` reads `value`/`deviation` columns and computes
    /// `[value - deviation, value + deviation]` per row, while
    /// `DataType::Constraints` reads `lower_limit`/`upper_limit` directly.
    pub fn from_data_frame(
        frame: &Frame,
        data_type: DataType,
    ) -> Result<FluxConstraints, DataSetError> {
        let limits = match data_type {
            DataType::Measurement => {
                let value = required_column(frame, "value")?;
                let deviation = required_column(frame, "deviation")?;
                DMatrix::from_fn(frame.index.len(), 2, |row, column| {
                    let center = frame.values[(row, value)];
                    let spread = frame.values[(row, deviation)];
                    if column == 0 {
                        center - spread
                    } else {
                        center + spread
                    }
                })
            }
            DataType::Constraints => {
                let lower = required_column(frame, "lower_limit")?;
                let upper = required_column(frame, "upper_limit")?;
                DMatrix::from_fn(frame.index.len(), 2, |row, column| {
                    if column == 0 {
                        frame.values[(row, lower)]
                    } else {
                        frame.values[(row, upper)]
                    }
                })
            }
        };
        FluxConstraints::new(frame.index.clone(), limits)
    }

    /// Instantiate FluxConstraints from a CSV file
    pub fn from_csv<P: AsRef<Path>>(
        path: P,
        data_type: DataType,
    ) -> Result<FluxConstraints, DataSetError> {
        Self::from_data_frame(&Frame::from_csv(path)?, data_type)
    }

    /// Export as a data frame with `lower_limit`/`upper_limit` columns
    pub fn data_frame(&self) -> Frame {
        Frame {
            index: self.reaction_ids.clone(),
            columns: vec!["lower_limit".to_string(), "upper_limit".to_string()],
            values: self.limits.clone(),
        }
    }

    /// Tighten the bounds of every listed reaction on the model
    pub fn apply(&self, model: &mut Model) -> Result<(), ModelError> {
        for (position, reaction_id) in self.reaction_ids.iter().enumerate() {
            model.set_reaction_bounds(
                reaction_id,
                self.limits[(position, 0)],
                self.limits[(position, 1)],
            )?;
        }
        Ok(())
    }
}

impl PartialEq for FluxConstraints {
    /// Equality requires an identical id list and elementwise equal limits
    fn eq(&self, other: &Self) -> bool {
        self.reaction_ids == other.reaction_ids && self.limits == other.limits
    }
}

impl<'a> IntoIterator for &'a FluxConstraints {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.reaction_ids.iter()
    }
}

/// Look up a required column by label
fn required_column(frame: &Frame, label: &str) -> Result<usize, DataSetError> {
    frame
        .column_index(label)
        .ok_or_else(|| DataSetError::MissingColumn(label.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_data(file: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join(file)
    }

    fn mock_flux_constraints() -> FluxConstraints {
        FluxConstraints::new(
            vec!["R1".to_string(), "R2".to_string(), "R3".to_string()],
            DMatrix::from_row_slice(3, 2, &[0., 10., 0.5, 0.7, 5.1, 5.2]),
        )
        .unwrap()
    }

    #[test]
    fn indexing() {
        let constraints = mock_flux_constraints();
        assert_eq!(constraints.get("R2").unwrap(), [0.5, 0.7]);
        assert_eq!(constraints.get_at(0).unwrap(), [0., 10.]);
        assert!(matches!(
            constraints.get("R9"),
            Err(DataSetError::UnknownReaction(_))
        ));
        assert!(matches!(
            constraints.get_at(7),
            Err(DataSetError::ReactionIndexOutOfRange { .. })
        ));
    }

    #[test]
    fn iteration_order() {
        let constraints = mock_flux_constraints();
        let ids: Vec<&String> = constraints.iter().collect();
        assert_eq!(ids, vec!["R1", "R2", "R3"]);
        let ids: Vec<&String> = (&constraints).into_iter().collect();
        assert_eq!(ids, vec!["R1", "R2", "R3"]);
        assert_eq!(constraints.reaction_ids().len(), 3);
        assert_eq!(constraints.limits().nrows(), 3);
    }

    #[test]
    fn apply_to_model() {
        use crate::metabolic_model::metabolite::MetaboliteBuilder;
        use crate::metabolic_model::model::{Model, ModelError};
        use crate::metabolic_model::reaction::ReactionBuilder;
        use indexmap::IndexMap;

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

        let constraints = FluxConstraints::new(
            vec!["R1".to_string()],
            DMatrix::from_row_slice(1, 2, &[0., 4.]),
        )
        .unwrap();
        constraints.apply(&mut model).unwrap();
        assert!((model.reactions["R1"].upper_bound - 4.0).abs() < 1e-12);

        let unknown = FluxConstraints::new(
            vec!["R9".to_string()],
            DMatrix::from_row_slice(1, 2, &[0., 4.]),
        )
        .unwrap();
        assert!(matches!(
            unknown.apply(&mut model),
            Err(ModelError::UnknownReaction(_))
        ));
    }

    #[test]
    fn shape_invariant() {
        let result = FluxConstraints::new(
            vec!["R1".to_string(), "R2".to_string()],
            DMatrix::from_row_slice(1, 2, &[0., 10.]),
        );
        assert!(matches!(result, Err(DataSetError::ShapeMismatch { .. })));
    }

    #[test]
    fn equality() {
        let constraints = mock_flux_constraints();
        assert_eq!(constraints, mock_flux_constraints());

        let different = FluxConstraints::new(
            vec!["R1".to_string(), "R2".to_string(), "R3".to_string()],
            DMatrix::from_row_slice(3, 2, &[0., 10., 0.5, 0.7, 5.1, 9.9]),
        )
        .unwrap();
        assert_ne!(constraints, different);
    }

    #[test]
    fn data_frame_round_trip() {
        let constraints = mock_flux_constraints();
        let frame = constraints.data_frame();
        assert_eq!(frame.columns, vec!["lower_limit", "upper_limit"]);
        let restored = FluxConstraints::from_data_frame(&frame, DataType::Constraints).unwrap();
        assert_eq!(constraints, restored);
    }

    #[test]
    fn from_data_frame_measurement() {
        let frame = Frame::new(
            vec!["R1".to_string(), "R2".to_string()],
            vec!["value".to_string(), "deviation".to_string()],
            DMatrix::from_row_slice(2, 2, &[5., 1., -2., 0.5]),
        )
        .unwrap();
        let constraints = FluxConstraints::from_data_frame(&frame, DataType::Measurement).unwrap();
        assert_eq!(constraints.get("R1").unwrap(), [4., 6.]);
        assert_eq!(constraints.get("R2").unwrap(), [-2.5, -1.5]);
    }

    #[test]
    fn missing_column_fails() {
        let frame = Frame::new(
            vec!["R1".to_string()],
            vec!["value".to_string()],
            DMatrix::from_row_slice(1, 1, &[5.]),
        )
        .unwrap();
        let result = FluxConstraints::from_data_frame(&frame, DataType::Measurement);
        assert!(matches!(result, Err(DataSetError::MissingColumn(_))));
    }

    #[test]
    fn data_type_from_str() {
        assert_eq!("measurement".parse::<DataType>().unwrap(), DataType::Measurement);
        assert_eq!("constraints".parse::<DataType>().unwrap(), DataType::Constraints);
        assert!(matches!(
            "nonsense".parse::<DataType>(),
            Err(DataSetError::InvalidDataType(_))
        ));
    }

    #[test]
    fn from_csv() {
        let constraints =
            FluxConstraints::from_csv(test_data("flux_constraints.csv"), DataType::Constraints)
                .unwrap();
        assert_eq!(constraints, mock_flux_constraints());
    }
}
