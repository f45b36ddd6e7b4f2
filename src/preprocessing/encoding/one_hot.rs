//! One-hot encoding for categorical features.
//!
//! Transforms categorical labels to one-hot (dummy) encoded vectors.

use crate::dataset::Frame;
use crate::preprocessing::encoding::HandleUnknown;
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// One-hot encoder for categorical features.
///
/// Every input column is treated as a categorical feature. The encoder learns
/// the sorted set of labels present in each column during fitting, and emits
/// one output column per label. Numeric cells are encoded by their printed
/// form, so `60` and `"60"` are the same category.
///
/// # Example
/// ```ignore
/// use house_price_rs::preprocessing::{OneHotEncoder, Transformer};
///
/// // Street: ["Pave", "Grvl", "Pave"]
/// let fitted = OneHotEncoder::new().fit(&frame)?;
///
/// // Categories sorted: ["Grvl", "Pave"]
/// let encoded = fitted.transform(&frame)?;
/// // [[0, 1],
/// //  [1, 0],
/// //  [0, 1]]
/// ```
#[derive(Clone, Debug, Default)]
pub struct OneHotEncoder {
    /// How to handle unknown categories during transform.
    handle_unknown: HandleUnknown,
}

impl OneHotEncoder {
    /// Create a new OneHotEncoder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the strategy for handling unknown categories.
    pub fn with_handle_unknown(mut self, strategy: HandleUnknown) -> Self {
        self.handle_unknown = strategy;
        self
    }
}

/// Serializable parameters for a fitted OneHotEncoder.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OneHotEncoderParams {
    /// Input column names seen during fit.
    pub columns: Vec<String>,
    /// Categories (sorted unique labels) for each input column.
    pub categories_: Vec<Vec<String>>,
    /// Handle unknown strategy.
    pub handle_unknown: HandleUnknown,
}

/// Fitted OneHotEncoder ready for inference.
#[derive(Clone, Debug)]
pub struct FittedOneHotEncoder {
    columns: Vec<String>,
    categories_: Vec<Vec<String>>,
    /// Per column: label -> output offset within that column's block.
    lookup: Vec<HashMap<String, usize>>,
    /// Total number of output features.
    n_features_out: usize,
    handle_unknown: HandleUnknown,
}

impl FittedOneHotEncoder {
    fn build(
        columns: Vec<String>,
        categories_: Vec<Vec<String>>,
        handle_unknown: HandleUnknown,
    ) -> Self {
        let lookup = categories_
            .iter()
            .map(|cats| {
                cats.iter()
                    .enumerate()
                    .map(|(i, c)| (c.clone(), i))
                    .collect()
            })
            .collect();
        let n_features_out = categories_.iter().map(Vec::len).sum();
        Self {
            columns,
            categories_,
            lookup,
            n_features_out,
            handle_unknown,
        }
    }

    /// Get the categories learned for each feature.
    pub fn categories(&self) -> &[Vec<String>] {
        &self.categories_
    }

    /// Get the number of output features.
    pub fn n_features_out(&self) -> usize {
        self.n_features_out
    }

    /// Output column names, `<column>_<category>`.
    pub fn feature_names_out(&self) -> Vec<String> {
        self.columns
            .iter()
            .zip(&self.categories_)
            .flat_map(|(col, cats)| cats.iter().map(move |c| format!("{}_{}", col, c)))
            .collect()
    }
}

impl Transformer for OneHotEncoder {
    type Input = Frame;
    type Output = Array2<f64>;
    type Params = OneHotEncoderParams;
    type Fitted = FittedOneHotEncoder;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PreprocessingError> {
        if data.n_rows() == 0 {
            return Err(PreprocessingError::EmptyData(
                "Cannot fit OneHotEncoder on empty data".to_string(),
            ));
        }

        let categories_: Vec<Vec<String>> = (0..data.n_cols())
            .map(|col| {
                data.column(col)
                    .iter()
                    .filter_map(|v| v.as_category())
                    .collect::<BTreeSet<String>>()
                    .into_iter()
                    .collect()
            })
            .collect();

        Ok(FittedOneHotEncoder::build(
            data.names().to_vec(),
            categories_,
            self.handle_unknown,
        ))
    }
}

impl FittedTransformer for FittedOneHotEncoder {
    type Input = Frame;
    type Output = Array2<f64>;
    type Params = OneHotEncoderParams;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError> {
        let (rows, cols) = data.shape();

        if cols != self.categories_.len() {
            return Err(PreprocessingError::FeatureMismatch {
                expected_features: self.categories_.len(),
                got_features: cols,
            });
        }

        let mut result = Array2::<f64>::zeros((rows, self.n_features_out));

        let mut out_col_offset = 0;
        for col in 0..cols {
            for (row, value) in data.column(col).iter().enumerate() {
                let label = value.as_category();
                match label.as_ref().and_then(|l| self.lookup[col].get(l)) {
                    Some(&idx) => {
                        result[[row, out_col_offset + idx]] = 1.0;
                    }
                    None => {
                        if self.handle_unknown == HandleUnknown::Error {
                            return Err(PreprocessingError::UnknownCategory {
                                column: self.columns[col].clone(),
                                category: label.unwrap_or_else(|| "<missing>".to_string()),
                            });
                        }
                        // With Ignore, leave as zeros
                    }
                }
            }
            out_col_offset += self.categories_[col].len();
        }

        Ok(result)
    }

    fn extract_params(&self) -> Self::Params {
        OneHotEncoderParams {
            columns: self.columns.clone(),
            categories_: self.categories_.clone(),
            handle_unknown: self.handle_unknown,
        }
    }

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError> {
        if params.columns.len() != params.categories_.len() {
            return Err(PreprocessingError::InvalidParameter(format!(
                "OneHotEncoder has {} columns but {} category lists",
                params.columns.len(),
                params.categories_.len()
            )));
        }
        Ok(FittedOneHotEncoder::build(
            params.columns,
            params.categories_,
            params.handle_unknown,
        ))
    }

    fn n_features_in(&self) -> usize {
        self.categories_.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::FeatureValue;

    fn streets() -> Frame {
        Frame::new(
            vec!["Street".to_string()],
            vec![vec!["Pave".into(), "Grvl".into(), "Pave".into()]],
        )
        .unwrap()
    }

    fn single(label: FeatureValue) -> Frame {
        Frame::new(vec!["Street".to_string()], vec![vec![label]]).unwrap()
    }

    #[test]
    fn test_one_hot_encoder_single_column() {
        let fitted = OneHotEncoder::new().fit(&streets()).unwrap();

        assert_eq!(fitted.n_features_in(), 1);
        assert_eq!(fitted.n_features_out(), 2);
        assert_eq!(fitted.categories()[0], vec!["Grvl", "Pave"]);

        let encoded = fitted.transform(&streets()).unwrap();
        assert_eq!(encoded.row(0).to_vec(), vec![0.0, 1.0]);
        assert_eq!(encoded.row(1).to_vec(), vec![1.0, 0.0]);
        assert_eq!(encoded.row(2).to_vec(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_one_hot_encoder_multiple_columns() {
        let data = Frame::new(
            vec!["MS Zoning".to_string(), "Central Air".to_string()],
            vec![
                vec!["RL".into(), "RM".into(), "FV".into()],
                vec!["Y".into(), "N".into(), "Y".into()],
            ],
        )
        .unwrap();
        let fitted = OneHotEncoder::new().fit(&data).unwrap();
        assert_eq!(fitted.n_features_out(), 5); // 3 + 2

        let encoded = fitted.transform(&data).unwrap();
        // FV RL RM | N Y
        assert_eq!(encoded.row(1).to_vec(), vec![0.0, 0.0, 1.0, 1.0, 0.0]);
        assert_eq!(
            fitted.feature_names_out(),
            vec![
                "MS Zoning_FV",
                "MS Zoning_RL",
                "MS Zoning_RM",
                "Central Air_N",
                "Central Air_Y"
            ]
        );
    }

    #[test]
    fn test_one_hot_encoder_numbers_are_labels() {
        let data = single(FeatureValue::Int(60));
        let fitted = OneHotEncoder::new().fit(&data).unwrap();
        assert_eq!(fitted.categories()[0], vec!["60"]);

        let encoded = fitted.transform(&single("60".into())).unwrap();
        assert_eq!(encoded[[0, 0]], 1.0);
    }

    #[test]
    fn test_one_hot_encoder_unknown_error() {
        let fitted = OneHotEncoder::new().fit(&streets()).unwrap();
        let result = fitted.transform(&single("Dirt".into()));
        assert!(matches!(
            result,
            Err(PreprocessingError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn test_one_hot_encoder_unknown_ignore() {
        let fitted = OneHotEncoder::new()
            .with_handle_unknown(HandleUnknown::Ignore)
            .fit(&streets())
            .unwrap();

        let encoded = fitted.transform(&single("Dirt".into())).unwrap();
        assert_eq!(encoded.row(0).to_vec(), vec![0.0, 0.0]);

        let encoded = fitted.transform(&single(FeatureValue::Null)).unwrap();
        assert_eq!(encoded.row(0).to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_one_hot_encoder_serialization() {
        let fitted = OneHotEncoder::new()
            .with_handle_unknown(HandleUnknown::Ignore)
            .fit(&streets())
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("onehot.bin");
        fitted.save_to_file(&path).unwrap();
        let loaded = FittedOneHotEncoder::load_from_file(&path).unwrap();

        assert_eq!(loaded.n_features_out(), fitted.n_features_out());
        assert_eq!(loaded.categories(), fitted.categories());
        assert_eq!(
            loaded.transform(&streets()).unwrap(),
            fitted.transform(&streets()).unwrap()
        );
    }

    #[test]
    fn test_one_hot_encoder_empty_data() {
        let data = Frame::new(vec!["Street".to_string()], vec![vec![]]).unwrap();
        assert!(OneHotEncoder::new().fit(&data).is_err());
    }

    #[test]
    fn test_one_hot_encoder_feature_mismatch() {
        let fitted = OneHotEncoder::new().fit(&streets()).unwrap();
        let two_cols = Frame::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec!["x".into()], vec!["y".into()]],
        )
        .unwrap();
        assert!(matches!(
            fitted.transform(&two_cols),
            Err(PreprocessingError::FeatureMismatch { .. })
        ));
    }

    #[test]
    fn test_one_hot_encoder_from_params_validates() {
        let params = OneHotEncoderParams {
            columns: vec!["a".to_string()],
            categories_: vec![],
            handle_unknown: HandleUnknown::Error,
        };
        assert!(FittedOneHotEncoder::from_params(params).is_err());
    }
}
