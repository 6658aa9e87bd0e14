//! Define a general gene or protein expression data store
use std::path::Path;

use indexmap::IndexMap;
use nalgebra::DMatrix;

use crate::data_sets::frame::Frame;
use crate::data_sets::{index_of, DataSetError};
use crate::metabolic_model::model::{Aggregation, Model};
use crate::utils::text::common_prefix;

/// Addresses a condition column by label or position
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// Column label
    Label(String),
    /// Column position
    Index(usize),
}

impl Default for Condition {
    fn default() -> Self {
        Condition::Index(0)
    }
}

impl From<usize> for Condition {
    fn from(index: usize) -> Self {
        Condition::Index(index)
    }
}

impl From<&str> for Condition {
    fn from(label: &str) -> Self {
        Condition::Label(label.to_string())
    }
}

impl From<String> for Condition {
    fn from(label: String) -> Self {
        Condition::Label(label)
    }
}

/// Representation of an expression profile.
///
/// It can be RNA-Seq, proteomics, TnSeq or any other profile that links
/// genes/proteins to a value (continuous or discrete). It stores single or
/// multiple conditions as well as p-values between conditions.
#[derive(Clone, Debug)]
pub struct ExpressionProfile {
    /// The gene/protein ids
    identifiers: Vec<String>,
    /// Map of identifier to row position
    identifier_index: IndexMap<String, usize>,
    /// The conditions in the expression profile (e.g., time points, media
    /// conditions, etc.)
    conditions: Vec<String>,
    /// Map of condition to column position
    condition_index: IndexMap<String, usize>,
    /// Expression values, one row per identifier and one column per condition
    expression: DMatrix<f64>,
    /// The p-values between conditions
    p_values: Option<DMatrix<f64>>,
}

impl ExpressionProfile {
    /// Instantiate a new ExpressionProfile
    ///
    /// The expression matrix must have one row per identifier and one column
    /// per condition, and both label sets must be unique. The p-value width is
    /// only enforced by [`Self::set_p_values`].
    pub fn new(
        identifiers: Vec<String>,
        conditions: Vec<String>,
        expression: DMatrix<f64>,
        p_values: Option<DMatrix<f64>>,
    ) -> Result<ExpressionProfile, DataSetError> {
        if expression.shape() != (identifiers.len(), conditions.len()) {
            return Err(DataSetError::ShapeMismatch {
                expected: (identifiers.len(), conditions.len()),
                found: expression.shape(),
            });
        }
        let identifier_index = index_of(&identifiers)?;
        let condition_index = index_of(&conditions)?;
        Ok(ExpressionProfile {
            identifiers,
            identifier_index,
            conditions,
            condition_index,
            expression,
            p_values,
        })
    }

    /// The gene/protein ids
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    /// The condition labels
    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    /// The expression matrix
    pub fn expression(&self) -> &DMatrix<f64> {
        &self.expression
    }

    /// The p-values between the conditions
    ///
    /// Fails when no p-values have been set.
    pub fn p_values(&self) -> Result<&DMatrix<f64>, DataSetError> {
        self.p_values.as_ref().ok_or(DataSetError::PValuesNotDefined)
    }

    /// Set the p-values, which must have one column per unordered condition pair
    pub fn set_p_values(&mut self, p_values: DMatrix<f64>) -> Result<(), DataSetError> {
        let expected = self.p_value_columns().len();
        if p_values.ncols() != expected {
            return Err(DataSetError::PValueShape {
                expected,
                found: p_values.ncols(),
            });
        }
        self.p_values = Some(p_values);
        Ok(())
    }

    /// Delete the p-values
    pub fn clear_p_values(&mut self) {
        self.p_values = None;
    }

    fn condition_position(&self, condition: &Condition) -> Result<usize, DataSetError> {
        match condition {
            Condition::Index(index) => {
                if *index < self.conditions.len() {
                    Ok(*index)
                } else {
                    Err(DataSetError::ConditionIndexOutOfRange {
                        index: *index,
                        count: self.conditions.len(),
                    })
                }
            }
            Condition::Label(label) => self
                .condition_index
                .get(label)
                .copied()
                .ok_or_else(|| DataSetError::UnknownCondition(label.clone())),
        }
    }

    /// Expression value of one identifier under one condition
    pub fn get(
        &self,
        identifier: &str,
        condition: impl Into<Condition>,
    ) -> Result<f64, DataSetError> {
        let row = self
            .identifier_index
            .get(identifier)
            .copied()
            .ok_or_else(|| DataSetError::UnknownIdentifier(identifier.to_string()))?;
        let column = self.condition_position(&condition.into())?;
        Ok(self.expression[(row, column)])
    }

    /// Build a map of identifiers to the expression values for a condition
    pub fn to_dict(
        &self,
        condition: impl Into<Condition>,
    ) -> Result<IndexMap<String, f64>, DataSetError> {
        let column = self.condition_position(&condition.into())?;
        Ok(self
            .identifiers
            .iter()
            .enumerate()
            .map(|(row, identifier)| (identifier.clone(), self.expression[(row, column)]))
            .collect())
    }

    /// Build a map of reactions to expression scores for a condition.
    ///
    /// Gene values are combined through each reaction's gene reaction rule.
    /// Genes missing from the profile take the `cutoff` value, and reactions
    /// without any gene overlapping the profile are omitted from the result.
    pub fn to_reaction_dict(
        &self,
        condition: impl Into<Condition>,
        model: &Model,
        cutoff: f64,
        aggregation: Aggregation,
    ) -> Result<IndexMap<String, f64>, DataSetError> {
        let gene_expression = self.to_dict(condition)?;
        let mut reaction_expression = IndexMap::new();
        for (reaction_id, reaction) in &model.reactions {
            let Some(gpr) = reaction.gpr.as_ref() else {
                continue;
            };
            let genes = gpr.genes();
            if genes.is_empty()
                || !genes
                    .iter()
                    .any(|gene| self.identifier_index.contains_key(gene))
            {
                continue;
            }
            let score = gpr.evaluate(&gene_expression, cutoff, aggregation);
            reaction_expression.insert(reaction_id.clone(), score);
        }
        Ok(reaction_expression)
    }

    /// Return the min and max expression values over the whole profile, or
    /// over a single condition
    pub fn minmax(&self, condition: Option<Condition>) -> Result<(f64, f64), DataSetError> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        match condition {
            None => {
                for value in self.expression.iter() {
                    min = min.min(*value);
                    max = max.max(*value);
                }
            }
            Some(condition) => {
                let column = self.condition_position(&condition)?;
                for value in self.expression.column(column).iter() {
                    min = min.min(*value);
                    max = max.max(*value);
                }
            }
        }
        Ok((min, max))
    }

    /// Generate the p-value column labels, one per unordered condition pair
    /// in combination order
    pub fn p_value_columns(&self) -> Vec<String> {
        let mut columns = Vec::new();
        for i in 0..self.conditions.len() {
            for j in (i + 1)..self.conditions.len() {
                columns.push(format!(
                    "{} {} p-value",
                    self.conditions[i], self.conditions[j]
                ));
            }
        }
        columns
    }

    /// Calculate the expression trend between consecutive conditions.
    ///
    /// A transition's signal is 0 when its p-value exceeds `p_value_threshold`,
    /// and the sign of the value change otherwise. Requires p-values.
    pub fn differences(
        &self,
        p_value_threshold: f64,
    ) -> Result<IndexMap<String, Vec<i8>>, DataSetError> {
        let p_values = self.p_values()?;
        let transitions = self.conditions.len().saturating_sub(1);
        if p_values.ncols() < transitions {
            return Err(DataSetError::PValueShape {
                expected: transitions,
                found: p_values.ncols(),
            });
        }
        let mut differences = IndexMap::new();
        for (row, identifier) in self.identifiers.iter().enumerate() {
            let mut signals = Vec::with_capacity(transitions);
            for column in 1..self.conditions.len() {
                let start = self.expression[(row, column - 1)];
                let end = self.expression[(row, column)];
                let p_value = p_values[(row, column - 1)];
                if p_value <= p_value_threshold {
                    signals.push(if start < end {
                        1
                    } else if start > end {
                        -1
                    } else {
                        0
                    });
                } else {
                    signals.push(0);
                }
            }
            differences.insert(identifier.clone(), signals);
        }
        Ok(differences)
    }

    /// Build a data frame with the expression columns followed by the
    /// p-value columns
    pub fn data_frame(&self) -> Frame {
        match &self.p_values {
            None => Frame {
                index: self.identifiers.clone(),
                columns: self.conditions.clone(),
                values: self.expression.clone(),
            },
            Some(p_values) => {
                let mut columns = self.conditions.clone();
                columns.extend(
                    self.p_value_columns()
                        .into_iter()
                        .take(p_values.ncols()),
                );
                let split = self.conditions.len();
                let values =
                    DMatrix::from_fn(self.identifiers.len(), columns.len(), |row, column| {
                        if column < split {
                            self.expression[(row, column)]
                        } else {
                            p_values[(row, column - split)]
                        }
                    });
                Frame {
                    index: self.identifiers.clone(),
                    columns,
                    values,
                }
            }
        }
    }

    /// Read expression data from a data frame.
    ///
    /// Columns whose label contains "p-value" are interpreted as pairwise
    /// p-values, the remaining columns as conditions.
    pub fn from_data_frame(frame: &Frame) -> Result<ExpressionProfile, DataSetError> {
        let mut condition_columns = Vec::new();
        let mut p_value_columns = Vec::new();
        for (position, label) in frame.columns.iter().enumerate() {
            if label.contains("p-value") {
                p_value_columns.push(position);
            } else {
                condition_columns.push(position);
            }
        }
        let conditions: Vec<String> = condition_columns
            .iter()
            .map(|position| frame.columns[*position].clone())
            .collect();
        let expression = select_columns(&frame.values, &condition_columns);
        let p_values = if p_value_columns.is_empty() {
            None
        } else {
            Some(select_columns(&frame.values, &p_value_columns))
        };
        ExpressionProfile::new(frame.index.clone(), conditions, expression, p_values)
    }

    /// Read expression data from a comma separated values (csv) file.
    ///
    /// With `replicates = Some(k)`, every block of k consecutive columns is
    /// collapsed to its row-wise median, and the new column label is the
    /// longest common prefix of the block's original labels.
    pub fn from_csv<P: AsRef<Path>>(
        path: P,
        replicates: Option<usize>,
    ) -> Result<ExpressionProfile, DataSetError> {
        let frame = Frame::from_csv(path)?;
        match replicates {
            None => Self::from_data_frame(&frame),
            Some(replicates) => Self::from_data_frame(&collapse_replicates(&frame, replicates)?),
        }
    }
}

impl PartialEq for ExpressionProfile {
    /// Two profiles are equal iff identifiers, conditions, p-values (or both
    /// absent), and expression matrices are all elementwise equal
    fn eq(&self, other: &Self) -> bool {
        self.identifiers == other.identifiers
            && self.conditions == other.conditions
            && self.p_values == other.p_values
            && self.expression == other.expression
    }
}

/// Extract a set of columns from a matrix, in the given order
fn select_columns(values: &DMatrix<f64>, columns: &[usize]) -> DMatrix<f64> {
    DMatrix::from_fn(values.nrows(), columns.len(), |row, column| {
        values[(row, columns[column])]
    })
}

/// Collapse every block of `replicates` consecutive columns to its row-wise
/// median, labeling it with the common prefix of the block's labels
fn collapse_replicates(frame: &Frame, replicates: usize) -> Result<Frame, DataSetError> {
    if replicates == 0 {
        return Err(DataSetError::InvalidReplicates);
    }
    let row_count = frame.index.len();
    let mut columns = Vec::new();
    let mut collapsed: Vec<Vec<f64>> = Vec::new();
    let mut start = 0;
    while start < frame.columns.len() {
        let end = (start + replicates).min(frame.columns.len());
        let labels: Vec<&str> = frame.columns[start..end]
            .iter()
            .map(String::as_str)
            .collect();
        columns.push(common_prefix(&labels));
        let mut column = Vec::with_capacity(row_count);
        for row in 0..row_count {
            let mut block: Vec<f64> = (start..end).map(|c| frame.values[(row, c)]).collect();
            column.push(median(&mut block));
        }
        collapsed.push(column);
        start = end;
    }
    let values = DMatrix::from_fn(row_count, columns.len(), |row, column| {
        collapsed[column][row]
    });
    Frame::new(frame.index.clone(), columns, values)
}

/// Median of a slice, averaging the two middle elements for even lengths
fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
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

    fn mock_expression_profile() -> ExpressionProfile {
        ExpressionProfile::new(
            vec!["G1".to_string(), "G2".to_string()],
            vec!["T1".to_string(), "T2".to_string()],
            DMatrix::from_row_slice(2, 2, &[10., 11., 65., 109.]),
            Some(DMatrix::from_row_slice(2, 1, &[0.02, 0.048])),
        )
        .unwrap()
    }

    #[test]
    fn indexing() {
        let profile = mock_expression_profile();
        assert!((profile.get("G1", "T1").unwrap() - 10.).abs() < 1e-12);
        assert!((profile.get("G2", 1).unwrap() - 109.).abs() < 1e-12);
        assert!(matches!(
            profile.get("G3", "T1"),
            Err(DataSetError::UnknownIdentifier(_))
        ));
        assert!(matches!(
            profile.get("G1", "T9"),
            Err(DataSetError::UnknownCondition(_))
        ));
        assert!(matches!(
            profile.get("G1", 7),
            Err(DataSetError::ConditionIndexOutOfRange { .. })
        ));
    }

    #[test]
    fn shape_invariant() {
        let result = ExpressionProfile::new(
            vec!["G1".to_string(), "G2".to_string()],
            vec!["T1".to_string()],
            DMatrix::from_row_slice(2, 2, &[10., 11., 65., 109.]),
            None,
        );
        assert!(matches!(result, Err(DataSetError::ShapeMismatch { .. })));
    }

    #[test]
    fn unique_labels() {
        let result = ExpressionProfile::new(
            vec!["G1".to_string(), "G1".to_string()],
            vec!["T1".to_string()],
            DMatrix::from_row_slice(2, 1, &[10., 65.]),
            None,
        );
        assert!(matches!(result, Err(DataSetError::DuplicateLabel(_))));
    }

    #[test]
    fn equality() {
        let profile = mock_expression_profile();
        let equal = mock_expression_profile();
        assert_eq!(profile, equal);
        assert_eq!(profile.identifiers(), &["G1", "G2"]);
        assert_eq!(profile.conditions(), &["T1", "T2"]);
        assert_eq!(profile.expression().shape(), (2, 2));

        let mut different = mock_expression_profile();
        different.clear_p_values();
        assert_ne!(profile, different);
    }

    #[test]
    fn p_value_columns() {
        let profile = mock_expression_profile();
        assert_eq!(profile.p_value_columns(), vec!["T1 T2 p-value"]);
    }

    #[test]
    fn p_values_lookup() {
        let profile = mock_expression_profile();
        let p_values = profile.p_values().unwrap();
        assert!((p_values[(0, 0)] - 0.02).abs() < 1e-12);

        let mut profile = profile;
        profile.clear_p_values();
        assert!(matches!(
            profile.p_values(),
            Err(DataSetError::PValuesNotDefined)
        ));
        assert!(matches!(
            profile.differences(0.005),
            Err(DataSetError::PValuesNotDefined)
        ));
    }

    #[test]
    fn set_p_values_checks_width() {
        let mut profile = mock_expression_profile();
        let result = profile.set_p_values(DMatrix::from_row_slice(2, 2, &[0.1, 0.2, 0.3, 0.4]));
        assert!(matches!(result, Err(DataSetError::PValueShape { .. })));
        profile
            .set_p_values(DMatrix::from_row_slice(2, 1, &[0.5, 0.6]))
            .unwrap();
        assert!((profile.p_values().unwrap()[(1, 0)] - 0.6).abs() < 1e-12);
    }

    #[test]
    fn to_dict() {
        let profile = mock_expression_profile();
        let values = profile.to_dict("T1").unwrap();
        assert!((values["G1"] - 10.).abs() < 1e-12);
        assert!((values["G2"] - 65.).abs() < 1e-12);
    }

    #[test]
    fn minmax() {
        let profile = mock_expression_profile();
        assert_eq!(profile.minmax(None).unwrap(), (10., 109.));
        assert_eq!(profile.minmax(Some("T2".into())).unwrap(), (11., 109.));
    }

    #[test]
    fn differences_respect_p_value_threshold() {
        let profile = ExpressionProfile::new(
            vec!["G1".to_string()],
            vec![
                "T1".to_string(),
                "T2".to_string(),
                "T3".to_string(),
                "T4".to_string(),
            ],
            DMatrix::from_row_slice(1, 4, &[10., 11., 65., 109.]),
            Some(DMatrix::from_row_slice(1, 3, &[0.02, 0.048, 0.0012])),
        )
        .unwrap();
        let differences = profile.differences(0.005).unwrap();
        // Only the last transition is significant at the 0.005 threshold
        assert_eq!(differences["G1"], vec![0, 0, 1]);
    }

    #[test]
    fn data_frame_round_trip() {
        let profile = mock_expression_profile();
        let frame = profile.data_frame();
        assert_eq!(frame.columns, vec!["T1", "T2", "T1 T2 p-value"]);
        let restored = ExpressionProfile::from_data_frame(&frame).unwrap();
        assert_eq!(profile, restored);

        let mut no_p_values = mock_expression_profile();
        no_p_values.clear_p_values();
        let restored = ExpressionProfile::from_data_frame(&no_p_values.data_frame()).unwrap();
        assert_eq!(no_p_values, restored);
    }

    #[test]
    fn from_csv() {
        let profile = ExpressionProfile::from_csv(test_data("expression.csv"), None).unwrap();
        assert_eq!(profile, mock_expression_profile());
    }

    #[test]
    fn from_csv_with_replicates() {
        let profile =
            ExpressionProfile::from_csv(test_data("expression_replicates.csv"), Some(3)).unwrap();
        assert_eq!(profile.conditions(), &["early_", "late_"]);
        // Medians of (1, 2, 9) and (4, 6, 5)
        assert!((profile.get("G1", "early_").unwrap() - 2.).abs() < 1e-12);
        assert!((profile.get("G1", "late_").unwrap() - 5.).abs() < 1e-12);
    }

    #[test]
    fn replicates_must_be_positive() {
        let result = ExpressionProfile::from_csv(test_data("expression.csv"), Some(0));
        assert!(matches!(result, Err(DataSetError::InvalidReplicates)));
    }
}
