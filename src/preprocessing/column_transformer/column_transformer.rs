//! ColumnTransformer implementation.
//!
//! Applies different transformers to different column subsets and concatenates results.

use crate::dataset::Frame;
use crate::preprocessing::encoding::{FittedOneHotEncoder, OneHotEncoder, OneHotEncoderParams};
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::imputation::{FittedSimpleImputer, SimpleImputer, SimpleImputerParams};
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use ndarray::{concatenate, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Specifies which columns a transformer should be applied to.
#[derive(Clone, Debug)]
pub enum ColumnSpec {
    /// Apply to the named columns.
    Names(Vec<String>),
    /// Apply to specific column indices.
    Indices(Vec<usize>),
    /// Apply to a range of columns.
    Range(Range<usize>),
    /// Apply to all columns.
    All,
}

impl ColumnSpec {
    /// Resolve the column spec to actual column indices.
    fn resolve(&self, data: &Frame) -> Result<Vec<usize>, PreprocessingError> {
        let n_features = data.n_cols();
        let indices: Vec<usize> = match self {
            ColumnSpec::Names(names) => names
                .iter()
                .map(|name| {
                    data.position(name).ok_or_else(|| {
                        PreprocessingError::InvalidParameter(format!("Unknown column {}", name))
                    })
                })
                .collect::<Result<_, _>>()?,
            ColumnSpec::Indices(indices) => indices.clone(),
            ColumnSpec::Range(range) => range.clone().collect(),
            ColumnSpec::All => (0..n_features).collect(),
        };

        if let Some(&col) = indices.iter().find(|&&col| col >= n_features) {
            return Err(PreprocessingError::InvalidParameter(format!(
                "Column index {} out of bounds ({} columns)",
                col, n_features
            )));
        }
        Ok(indices)
    }
}

/// What happens to columns no step claims.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Remainder {
    /// Leave them out of the output.
    #[default]
    Drop,
    /// Append them unchanged as numbers. Missing cells stay NaN.
    Passthrough,
}

/// Unfitted transformers that can be used in a ColumnTransformer.
#[derive(Clone, Debug)]
pub enum ColumnTransformerStep {
    /// Impute, then emit the columns as numbers.
    Numeric(SimpleImputer),
    /// Impute, then one-hot encode.
    Categorical {
        imputer: SimpleImputer,
        encoder: OneHotEncoder,
    },
    /// Emit the columns as numbers without learning anything.
    Passthrough,
}

/// Fitted transformers for ColumnTransformer.
#[derive(Clone, Debug)]
pub enum FittedColumnTransformerStep {
    Numeric(FittedSimpleImputer),
    Categorical {
        imputer: FittedSimpleImputer,
        encoder: FittedOneHotEncoder,
    },
    Passthrough,
}

/// Dense view of a column subset. Strings are a type error.
fn numeric_matrix(data: &Frame) -> Result<Array2<f64>, PreprocessingError> {
    data.to_matrix().map_err(|(row, col)| PreprocessingError::TypeMismatch {
        column: data.names()[col].clone(),
        expected: "number",
        got: data.column(col)[row].to_string(),
    })
}

impl FittedColumnTransformerStep {
    /// Transform the data.
    fn transform(&self, data: &Frame) -> Result<Array2<f64>, PreprocessingError> {
        match self {
            FittedColumnTransformerStep::Numeric(imputer) => {
                numeric_matrix(&imputer.transform(data)?)
            }
            FittedColumnTransformerStep::Categorical { imputer, encoder } => {
                encoder.transform(&imputer.transform(data)?)
            }
            FittedColumnTransformerStep::Passthrough => numeric_matrix(data),
        }
    }

    /// Get the step kind.
    fn step_kind(&self) -> &'static str {
        match self {
            FittedColumnTransformerStep::Numeric(_) => "Numeric",
            FittedColumnTransformerStep::Categorical { .. } => "Categorical",
            FittedColumnTransformerStep::Passthrough => "Passthrough",
        }
    }

    /// Output column names, without the step prefix.
    fn feature_names_out(&self, input_names: &[String]) -> Vec<String> {
        match self {
            FittedColumnTransformerStep::Categorical { encoder, .. } => encoder.feature_names_out(),
            _ => input_names.to_vec(),
        }
    }

    fn to_params(&self) -> StepKindParams {
        match self {
            FittedColumnTransformerStep::Numeric(imputer) => {
                StepKindParams::Numeric(imputer.extract_params())
            }
            FittedColumnTransformerStep::Categorical { imputer, encoder } => {
                StepKindParams::Categorical {
                    imputer: imputer.extract_params(),
                    encoder: encoder.extract_params(),
                }
            }
            FittedColumnTransformerStep::Passthrough => StepKindParams::Passthrough,
        }
    }

    fn from_params(params: StepKindParams) -> Result<Self, PreprocessingError> {
        Ok(match params {
            StepKindParams::Numeric(p) => {
                FittedColumnTransformerStep::Numeric(FittedSimpleImputer::from_params(p)?)
            }
            StepKindParams::Categorical { imputer, encoder } => {
                FittedColumnTransformerStep::Categorical {
                    imputer: FittedSimpleImputer::from_params(imputer)?,
                    encoder: FittedOneHotEncoder::from_params(encoder)?,
                }
            }
            StepKindParams::Passthrough => FittedColumnTransformerStep::Passthrough,
        })
    }
}

/// Fit a column transformer step from an unfitted step.
fn fit_step(
    step: &ColumnTransformerStep,
    data: &Frame,
) -> Result<FittedColumnTransformerStep, PreprocessingError> {
    match step {
        ColumnTransformerStep::Numeric(imputer) => {
            let fitted = imputer.fit(data)?;
            // Fail at fit time rather than on the first request.
            numeric_matrix(&fitted.transform(data)?)?;
            Ok(FittedColumnTransformerStep::Numeric(fitted))
        }
        ColumnTransformerStep::Categorical { imputer, encoder } => {
            let imputer = imputer.fit(data)?;
            let encoder = encoder.fit(&imputer.transform(data)?)?;
            Ok(FittedColumnTransformerStep::Categorical { imputer, encoder })
        }
        ColumnTransformerStep::Passthrough => {
            numeric_matrix(data)?;
            Ok(FittedColumnTransformerStep::Passthrough)
        }
    }
}

/// ColumnTransformer applies different transformers to different columns.
///
/// This is useful when you have heterogeneous data and want to apply
/// different preprocessing to different feature subsets (e.g., median-impute
/// numerical features, one-hot encode categorical features).
///
/// The fitted transformer remembers the input column names (`feature_names_in`)
/// and requires them, in the same order, at transform time.
///
/// # Example
/// ```ignore
/// use house_price_rs::preprocessing::{
///     ColumnSpec, ColumnTransformer, FillValue, ImputeStrategy, OneHotEncoder, Remainder,
///     SimpleImputer, Transformer,
/// };
///
/// let ct = ColumnTransformer::new()
///     .add_numeric("num", SimpleImputer::new(ImputeStrategy::Median), ColumnSpec::Names(numeric))
///     .add_categorical(
///         "cat",
///         SimpleImputer::new(ImputeStrategy::Constant(FillValue::text("None"))),
///         OneHotEncoder::new(),
///         ColumnSpec::Names(categorical),
///     )
///     .with_remainder(Remainder::Passthrough);
///
/// let fitted = ct.fit(&frame)?;
/// let transformed = fitted.transform(&frame)?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct ColumnTransformer {
    steps: Vec<(String, ColumnSpec, ColumnTransformerStep)>,
    remainder: Remainder,
}

impl ColumnTransformer {
    /// Create a new empty ColumnTransformer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an imputer whose output is used as numeric features.
    pub fn add_numeric(mut self, name: &str, imputer: SimpleImputer, spec: ColumnSpec) -> Self {
        self.steps
            .push((name.to_string(), spec, ColumnTransformerStep::Numeric(imputer)));
        self
    }

    /// Add an imputer followed by a one-hot encoder.
    pub fn add_categorical(
        mut self,
        name: &str,
        imputer: SimpleImputer,
        encoder: OneHotEncoder,
        spec: ColumnSpec,
    ) -> Self {
        self.steps.push((
            name.to_string(),
            spec,
            ColumnTransformerStep::Categorical { imputer, encoder },
        ));
        self
    }

    /// Add a generic step.
    pub fn add(mut self, name: &str, step: ColumnTransformerStep, spec: ColumnSpec) -> Self {
        self.steps.push((name.to_string(), spec, step));
        self
    }

    /// Set the handling of unclaimed columns.
    pub fn with_remainder(mut self, remainder: Remainder) -> Self {
        self.remainder = remainder;
        self
    }

    /// Get the number of transformer steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Serializable parameters of one fitted step.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum StepKindParams {
    Numeric(SimpleImputerParams),
    Categorical {
        imputer: SimpleImputerParams,
        encoder: OneHotEncoderParams,
    },
    Passthrough,
}

/// Serializable parameters for fitted column transformer step.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepParams {
    /// Step name, used as the output feature prefix.
    pub name: String,
    /// Column indices this step was applied to.
    pub columns: Vec<usize>,
    /// Fitted step parameters.
    pub kind: StepKindParams,
}

/// Serializable parameters for a fitted ColumnTransformer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnTransformerParams {
    /// Input column names in fit order, when the training data had names.
    pub feature_names_in: Option<Vec<String>>,
    /// Number of input features.
    pub n_features_in: usize,
    /// Number of output features.
    pub n_features_out: usize,
    /// Step parameters.
    pub steps: Vec<StepParams>,
}

/// Fitted ColumnTransformer ready for inference.
#[derive(Clone, Debug)]
pub struct FittedColumnTransformer {
    /// Fitted steps with their names and column indices.
    fitted_steps: Vec<(String, Vec<usize>, FittedColumnTransformerStep)>,
    feature_names_in: Option<Vec<String>>,
    n_features_in: usize,
    n_features_out: usize,
}

impl FittedColumnTransformer {
    /// Input column names seen during fit, in order.
    pub fn feature_names_in(&self) -> Option<&[String]> {
        self.feature_names_in.as_deref()
    }

    /// Get the number of output features.
    pub fn n_features_out(&self) -> usize {
        self.n_features_out
    }

    /// Get step names, kinds and the columns they own.
    pub fn step_names(&self) -> Vec<(&str, &'static str, &[usize])> {
        self.fitted_steps
            .iter()
            .map(|(name, cols, step)| (name.as_str(), step.step_kind(), cols.as_slice()))
            .collect()
    }

    /// Output feature names, `<step>__<feature>`.
    ///
    /// Without input names, columns are called `x<index>`.
    pub fn feature_names_out(&self) -> Vec<String> {
        let input_name = |idx: usize| match &self.feature_names_in {
            Some(names) => names[idx].clone(),
            None => format!("x{}", idx),
        };
        self.fitted_steps
            .iter()
            .flat_map(|(name, cols, step)| {
                let inputs: Vec<String> = cols.iter().map(|&c| input_name(c)).collect();
                step.feature_names_out(&inputs)
                    .into_iter()
                    .map(move |f| format!("{}__{}", name, f))
            })
            .collect()
    }
}

impl Transformer for ColumnTransformer {
    type Input = Frame;
    type Output = Array2<f64>;
    type Params = ColumnTransformerParams;
    type Fitted = FittedColumnTransformer;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PreprocessingError> {
        let (rows, cols) = data.shape();

        if rows == 0 {
            return Err(PreprocessingError::EmptyData(
                "Cannot fit ColumnTransformer on empty data".to_string(),
            ));
        }

        if self.steps.is_empty() && self.remainder == Remainder::Drop {
            return Err(PreprocessingError::InvalidParameter(
                "Cannot fit empty ColumnTransformer".to_string(),
            ));
        }

        let mut fitted_steps = Vec::with_capacity(self.steps.len() + 1);
        let mut claimed = vec![false; cols];

        for (name, spec, step) in &self.steps {
            let columns = spec.resolve(data)?;
            for &col in &columns {
                claimed[col] = true;
            }
            let fitted = fit_step(step, &data.select(&columns))?;
            fitted_steps.push((name.clone(), columns, fitted));
        }

        let rest: Vec<usize> = (0..cols).filter(|&c| !claimed[c]).collect();
        if self.remainder == Remainder::Passthrough && !rest.is_empty() {
            let fitted = fit_step(&ColumnTransformerStep::Passthrough, &data.select(&rest))?;
            fitted_steps.push(("remainder".to_string(), rest, fitted));
        }

        let mut fitted = FittedColumnTransformer {
            fitted_steps,
            feature_names_in: Some(data.names().to_vec()),
            n_features_in: cols,
            n_features_out: 0,
        };
        fitted.n_features_out = fitted.transform(&data.take_rows(&[0]))?.ncols();
        Ok(fitted)
    }
}

impl FittedTransformer for FittedColumnTransformer {
    type Input = Frame;
    type Output = Array2<f64>;
    type Params = ColumnTransformerParams;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError> {
        let cols = data.n_cols();

        if cols != self.n_features_in {
            return Err(PreprocessingError::FeatureMismatch {
                expected_features: self.n_features_in,
                got_features: cols,
            });
        }

        if let Some(expected) = &self.feature_names_in {
            if expected.as_slice() != data.names() {
                return Err(PreprocessingError::FeatureNamesMismatch {
                    expected: expected.clone(),
                    got: data.names().to_vec(),
                });
            }
        }

        if self.fitted_steps.is_empty() {
            return Ok(Array2::zeros((data.n_rows(), 0)));
        }

        let outputs = self
            .fitted_steps
            .iter()
            .map(|(_, columns, step)| step.transform(&data.select(columns)))
            .collect::<Result<Vec<_>, _>>()?;
        let views: Vec<_> = outputs.iter().map(|o| o.view()).collect();

        concatenate(Axis(1), &views)
            .map_err(|e| PreprocessingError::NumericalError(format!("Failed to stack outputs: {}", e)))
    }

    fn extract_params(&self) -> Self::Params {
        ColumnTransformerParams {
            feature_names_in: self.feature_names_in.clone(),
            n_features_in: self.n_features_in,
            n_features_out: self.n_features_out,
            steps: self
                .fitted_steps
                .iter()
                .map(|(name, columns, step)| StepParams {
                    name: name.clone(),
                    columns: columns.clone(),
                    kind: step.to_params(),
                })
                .collect(),
        }
    }

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError> {
        if let Some(names) = &params.feature_names_in {
            if names.len() != params.n_features_in {
                return Err(PreprocessingError::InvalidParameter(format!(
                    "{} feature names for {} input features",
                    names.len(),
                    params.n_features_in
                )));
            }
        }

        let mut fitted_steps = Vec::with_capacity(params.steps.len());
        for step in params.steps {
            if let Some(&col) = step.columns.iter().find(|&&c| c >= params.n_features_in) {
                return Err(PreprocessingError::InvalidParameter(format!(
                    "Step {} references column {} of {}",
                    step.name, col, params.n_features_in
                )));
            }
            let fitted = FittedColumnTransformerStep::from_params(step.kind)?;
            fitted_steps.push((step.name, step.columns, fitted));
        }

        Ok(FittedColumnTransformer {
            fitted_steps,
            feature_names_in: params.feature_names_in,
            n_features_in: params.n_features_in,
            n_features_out: params.n_features_out,
        })
    }

    fn n_features_in(&self) -> usize {
        self.n_features_in
    }
}
