//! Simple Imputer.
//!
//! Imputation transformer for completing missing values.
//! Supports mean, median, most_frequent, and constant strategies.
//!
//! `Null` cells and NaN floats are both treated as missing.
//!
//! # Example
//! ```ignore
//! use house_price_rs::preprocessing::{FillValue, ImputeStrategy, SimpleImputer, Transformer};
//!
//! let imputer = SimpleImputer::new(ImputeStrategy::Constant(FillValue::text("None")));
//! let fitted = imputer.fit(&frame)?;
//! let imputed = fitted.transform(&frame)?;
//! ```

use crate::dataset::{FeatureValue, Frame};
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A learned or configured fill value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FillValue {
    Number(f64),
    Text(String),
}

impl FillValue {
    pub fn text(s: &str) -> Self {
        FillValue::Text(s.to_string())
    }

    fn to_feature_value(&self) -> FeatureValue {
        match self {
            FillValue::Number(v) => FeatureValue::Float(*v),
            FillValue::Text(s) => FeatureValue::Str(s.clone()),
        }
    }
}

/// Strategy for imputing missing values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Replace missing values with the mean of each column.
    #[default]
    Mean,
    /// Replace missing values with the median of each column.
    Median,
    /// Replace missing values with the most frequent value of each column.
    MostFrequent,
    /// Replace missing values with a constant value.
    Constant(FillValue),
}

/// Serializable parameters for a fitted SimpleImputer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimpleImputerParams {
    /// Strategy used for imputation.
    pub strategy: ImputeStrategy,
    /// Statistics (fill values) for each feature.
    pub statistics_: Vec<FillValue>,
    /// Number of features seen during fit.
    pub n_features: usize,
}

/// SimpleImputer transformer (unfitted).
#[derive(Clone, Debug)]
pub struct SimpleImputer {
    strategy: ImputeStrategy,
}

impl Default for SimpleImputer {
    fn default() -> Self {
        Self::new(ImputeStrategy::default())
    }
}

impl SimpleImputer {
    /// Create a new SimpleImputer with the specified strategy.
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &ImputeStrategy {
        &self.strategy
    }
}

fn numeric_values(name: &str, column: &[FeatureValue]) -> Result<Vec<f64>, PreprocessingError> {
    let mut values = Vec::with_capacity(column.len());
    for cell in column {
        match cell {
            FeatureValue::Str(s) => {
                return Err(PreprocessingError::TypeMismatch {
                    column: name.to_string(),
                    expected: "number",
                    got: format!("{:?}", s),
                })
            }
            other => {
                if let Some(v) = other.as_f64() {
                    values.push(v);
                }
            }
        }
    }
    Ok(values)
}

fn most_frequent(column: &[FeatureValue]) -> Option<FillValue> {
    let present: Vec<&FeatureValue> = column.iter().filter(|v| !v.is_missing()).collect();
    if present.is_empty() {
        return None;
    }

    if present.iter().all(|v| v.is_numeric()) {
        let mut counts: HashMap<u64, usize> = HashMap::new();
        for v in &present {
            if let Some(x) = v.as_f64() {
                *counts.entry(x.to_bits()).or_insert(0) += 1;
            }
        }
        // Ties go to the smallest value.
        counts
            .into_iter()
            .map(|(bits, count)| (f64::from_bits(bits), count))
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.total_cmp(&a.0)))
            .map(|(v, _)| FillValue::Number(v))
    } else {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for v in &present {
            if let Some(label) = v.as_category() {
                *counts.entry(label).or_insert(0) += 1;
            }
        }
        counts
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
            .map(|(label, _)| FillValue::Text(label))
    }
}

/// Compute the fill value for every column of `data`.
fn compute_statistics(
    data: &Frame,
    strategy: &ImputeStrategy,
) -> Result<Vec<FillValue>, PreprocessingError> {
    let mut stats = Vec::with_capacity(data.n_cols());

    for (idx, name) in data.names().iter().enumerate() {
        let column = data.column(idx);
        let stat = match strategy {
            ImputeStrategy::Mean => {
                let values = numeric_values(name, column)?;
                if values.is_empty() {
                    FillValue::Number(0.0) // Default to 0 if all values are missing
                } else {
                    FillValue::Number(values.iter().sum::<f64>() / values.len() as f64)
                }
            }
            ImputeStrategy::Median => {
                let mut values = numeric_values(name, column)?;
                if values.is_empty() {
                    FillValue::Number(0.0)
                } else {
                    values.sort_by(|a, b| a.total_cmp(b));
                    let n = values.len();
                    if n % 2 == 0 {
                        FillValue::Number((values[n / 2 - 1] + values[n / 2]) / 2.0)
                    } else {
                        FillValue::Number(values[n / 2])
                    }
                }
            }
            ImputeStrategy::MostFrequent => {
                most_frequent(column).unwrap_or(FillValue::Number(0.0))
            }
            ImputeStrategy::Constant(val) => val.clone(),
        };
        stats.push(stat);
    }

    Ok(stats)
}

impl Transformer for SimpleImputer {
    type Input = Frame;
    type Output = Frame;
    type Params = SimpleImputerParams;
    type Fitted = FittedSimpleImputer;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PreprocessingError> {
        if data.n_rows() == 0 {
            return Err(PreprocessingError::EmptyData(
                "Cannot fit SimpleImputer on empty data".to_string(),
            ));
        }

        let statistics_ = compute_statistics(data, &self.strategy)?;

        Ok(FittedSimpleImputer {
            strategy: self.strategy.clone(),
            statistics_,
            n_features: data.n_cols(),
        })
    }
}

/// Fitted SimpleImputer ready for inference.
#[derive(Clone, Debug)]
pub struct FittedSimpleImputer {
    strategy: ImputeStrategy,
    statistics_: Vec<FillValue>,
    n_features: usize,
}

impl FittedSimpleImputer {
    /// Get the imputation statistics (fill values) for each feature.
    pub fn statistics(&self) -> &[FillValue] {
        &self.statistics_
    }
}

impl FittedTransformer for FittedSimpleImputer {
    type Input = Frame;
    type Output = Frame;
    type Params = SimpleImputerParams;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError> {
        if data.n_cols() != self.n_features {
            return Err(PreprocessingError::FeatureMismatch {
                expected_features: self.n_features,
                got_features: data.n_cols(),
            });
        }

        let mut out = data.clone();
        out.map_columns(|idx, column| {
            let fill = self.statistics_[idx].to_feature_value();
            for cell in column.iter_mut().filter(|c| c.is_missing()) {
                *cell = fill.clone();
            }
        });
        Ok(out)
    }

    fn extract_params(&self) -> Self::Params {
        SimpleImputerParams {
            strategy: self.strategy.clone(),
            statistics_: self.statistics_.clone(),
            n_features: self.n_features,
        }
    }

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError> {
        if params.statistics_.len() != params.n_features {
            return Err(PreprocessingError::InvalidParameter(format!(
                "SimpleImputer has {} statistics for {} features",
                params.statistics_.len(),
                params.n_features
            )));
        }

        Ok(Self {
            strategy: params.strategy,
            statistics_: params.statistics_,
            n_features: params.n_features,
        })
    }

    fn n_features_in(&self) -> usize {
        self.n_features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_data_with_missing() -> Frame {
        // LotFrontage: [1, NaN, 5], GarageYrBlt: [Null, 4, 6]
        Frame::new(
            vec!["LotFrontage".to_string(), "GarageYrBlt".to_string()],
            vec![
                vec![
                    FeatureValue::Float(1.0),
                    FeatureValue::Float(f64::NAN),
                    FeatureValue::Float(5.0),
                ],
                vec![FeatureValue::Null, FeatureValue::Int(4), FeatureValue::Int(6)],
            ],
        )
        .unwrap()
    }

    fn categorical() -> Frame {
        Frame::new(
            vec!["Alley".to_string()],
            vec![vec![
                FeatureValue::Null,
                FeatureValue::from("Pave"),
                FeatureValue::from("Grvl"),
                FeatureValue::from("Pave"),
            ]],
        )
        .unwrap()
    }

    #[test]
    fn test_simple_imputer_mean() {
        let data = create_test_data_with_missing();
        let fitted = SimpleImputer::new(ImputeStrategy::Mean).fit(&data).unwrap();

        assert_eq!(
            fitted.statistics(),
            &[FillValue::Number(3.0), FillValue::Number(5.0)]
        );

        let imputed = fitted.transform(&data).unwrap();
        assert_eq!(imputed.column(0)[1], FeatureValue::Float(3.0));
        assert_eq!(imputed.column(1)[0], FeatureValue::Float(5.0));
        // Present values untouched
        assert_eq!(imputed.column(1)[1], FeatureValue::Int(4));
    }

    #[test]
    fn test_simple_imputer_median() {
        let data = Frame::new(
            vec!["x".to_string()],
            vec![vec![
                FeatureValue::Int(10),
                FeatureValue::Int(1),
                FeatureValue::Null,
                FeatureValue::Int(4),
                FeatureValue::Int(3),
            ]],
        )
        .unwrap();
        let fitted = SimpleImputer::new(ImputeStrategy::Median).fit(&data).unwrap();
        // median of [1, 3, 4, 10] = 3.5
        assert_eq!(fitted.statistics(), &[FillValue::Number(3.5)]);
    }

    #[test]
    fn test_simple_imputer_median_rejects_strings() {
        let result = SimpleImputer::new(ImputeStrategy::Median).fit(&categorical());
        assert!(matches!(
            result,
            Err(PreprocessingError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_simple_imputer_constant_text() {
        let data = categorical();
        let fitted = SimpleImputer::new(ImputeStrategy::Constant(FillValue::text("None")))
            .fit(&data)
            .unwrap();
        let imputed = fitted.transform(&data).unwrap();
        assert_eq!(imputed.column(0)[0], FeatureValue::from("None"));
        assert_eq!(imputed.column(0)[2], FeatureValue::from("Grvl"));
    }

    #[test]
    fn test_simple_imputer_most_frequent() {
        let fitted = SimpleImputer::new(ImputeStrategy::MostFrequent)
            .fit(&categorical())
            .unwrap();
        assert_eq!(fitted.statistics(), &[FillValue::text("Pave")]);

        let numeric = Frame::new(
            vec!["x".to_string()],
            vec![vec![
                FeatureValue::Int(2),
                FeatureValue::Int(1),
                FeatureValue::Null,
            ]],
        )
        .unwrap();
        let fitted = SimpleImputer::new(ImputeStrategy::MostFrequent)
            .fit(&numeric)
            .unwrap();
        // Tie between 1 and 2 goes to the smaller value
        assert_eq!(fitted.statistics(), &[FillValue::Number(1.0)]);
    }

    #[test]
    fn test_simple_imputer_all_missing_column() {
        let data = Frame::new(
            vec!["Pool QC".to_string()],
            vec![vec![FeatureValue::Null, FeatureValue::Null]],
        )
        .unwrap();
        let fitted = SimpleImputer::new(ImputeStrategy::Median).fit(&data).unwrap();
        assert_eq!(fitted.statistics(), &[FillValue::Number(0.0)]);
    }

    #[test]
    fn test_simple_imputer_feature_mismatch() {
        let data = create_test_data_with_missing(); // 2 features
        let fitted = SimpleImputer::new(ImputeStrategy::Mean).fit(&data).unwrap();

        let result = fitted.transform(&categorical()); // 1 feature
        assert!(matches!(
            result,
            Err(PreprocessingError::FeatureMismatch {
                expected_features: 2,
                got_features: 1
            })
        ));
    }

    #[test]
    fn test_simple_imputer_empty_data() {
        let data = Frame::new(vec!["x".to_string()], vec![vec![]]).unwrap();
        assert!(SimpleImputer::new(ImputeStrategy::Mean).fit(&data).is_err());
    }

    #[test]
    fn test_simple_imputer_save_load_file() {
        let data = create_test_data_with_missing();
        let fitted = SimpleImputer::new(ImputeStrategy::Median).fit(&data).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imputer.bin");
        fitted.save_to_file(&path).unwrap();
        let loaded = FittedSimpleImputer::load_from_file(&path).unwrap();

        assert_eq!(loaded.n_features_in(), fitted.n_features_in());
        assert_eq!(
            loaded.transform(&data).unwrap().column(0),
            fitted.transform(&data).unwrap().column(0)
        );
    }

    #[test]
    fn test_from_params_rejects_inconsistent_lengths() {
        let params = SimpleImputerParams {
            strategy: ImputeStrategy::Median,
            statistics_: vec![FillValue::Number(1.0)],
            n_features: 2,
        };
        assert!(FittedSimpleImputer::from_params(params).is_err());
    }
}
