//! Predictive pipeline combining preprocessing and model inference.
//!
//! [`HousePricePipeline`] chains a fitted [`FittedColumnTransformer`], a fitted
//! gradient boosting regressor and a target transform. The whole pipeline
//! serializes to one bincode artifact.
//!
//! Consumers that only need single-row inference see it through the
//! [`TabularPipeline`] trait.

use crate::dataset::{FeatureValue, Frame};
use crate::model::{FittedGradientBoostingRegressor, GradientBoostingParams};
use crate::preprocessing::column_transformer::{ColumnTransformerParams, FittedColumnTransformer};
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::traits::FittedTransformer;
use crate::serialization::SerializableParams;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::io;

/// Version tag written into every artifact.
pub const FORMAT_VERSION: u32 = 1;

/// Single-row inference over named tabular features.
///
/// Implementations are immutable after construction, so one instance can
/// serve concurrent callers.
pub trait TabularPipeline: Send + Sync {
    /// Column names the pipeline was fitted on, in order.
    fn feature_names_in(&self) -> Option<&[String]>;

    /// Predict one row whose cells follow [`feature_names_in`](Self::feature_names_in).
    fn predict_row(&self, row: &[FeatureValue]) -> Result<f64, PreprocessingError>;
}

/// Transform applied to the target before fitting and inverted after predicting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetTransform {
    #[default]
    Identity,
    /// `ln(1 + y)`, inverted with `exp(y) - 1`.
    Log1p,
}

impl TargetTransform {
    pub fn forward(&self, y: f64) -> f64 {
        match self {
            TargetTransform::Identity => y,
            TargetTransform::Log1p => y.ln_1p(),
        }
    }

    pub fn inverse(&self, y: f64) -> f64 {
        match self {
            TargetTransform::Identity => y,
            TargetTransform::Log1p => y.exp_m1(),
        }
    }
}

/// Serializable parameters for the predictive pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineParams {
    /// Artifact format version, checked on load.
    pub format_version: u32,
    /// Preprocessor parameters.
    pub preprocessor: ColumnTransformerParams,
    /// Regressor parameters.
    pub regressor: GradientBoostingParams,
    /// Target transform.
    pub target: TargetTransform,
}

/// Preprocessing, regression and target transform as one unit.
#[derive(Clone, Debug)]
pub struct HousePricePipeline {
    preprocessor: FittedColumnTransformer,
    regressor: FittedGradientBoostingRegressor,
    target: TargetTransform,
}

impl HousePricePipeline {
    /// Create a new predictive pipeline.
    ///
    /// Fails if the regressor was not fitted on the preprocessor's output width.
    pub fn new(
        preprocessor: FittedColumnTransformer,
        regressor: FittedGradientBoostingRegressor,
        target: TargetTransform,
    ) -> Result<Self, PreprocessingError> {
        if preprocessor.n_features_out() != regressor.n_features_in() {
            return Err(PreprocessingError::FeatureMismatch {
                expected_features: regressor.n_features_in(),
                got_features: preprocessor.n_features_out(),
            });
        }
        Ok(Self {
            preprocessor,
            regressor,
            target,
        })
    }

    /// Get the number of input features.
    pub fn n_features_in(&self) -> usize {
        self.preprocessor.n_features_in()
    }

    pub fn preprocessor(&self) -> &FittedColumnTransformer {
        &self.preprocessor
    }

    pub fn regressor(&self) -> &FittedGradientBoostingRegressor {
        &self.regressor
    }

    pub fn target(&self) -> TargetTransform {
        self.target
    }

    /// Preprocess data with the fitted column transformer.
    pub fn preprocess(&self, data: &Frame) -> Result<Array2<f64>, PreprocessingError> {
        self.preprocessor.transform(data)
    }

    /// Make predictions on new data, in target units.
    pub fn predict(&self, data: &Frame) -> Result<Vec<f64>, PreprocessingError> {
        let processed = self.preprocess(data)?;
        let raw = self.regressor.predict(&processed)?;
        Ok(raw.into_iter().map(|y| self.target.inverse(y)).collect())
    }

    /// Save the entire pipeline to a file.
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> io::Result<()> {
        let bytes = self.to_bytes().map_err(io::Error::other)?;
        std::fs::write(path, bytes)
    }

    /// Load a pipeline from a file.
    pub fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, PreprocessingError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        self.extract_params().to_bytes()
    }

    /// Decode and validate an artifact.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PreprocessingError> {
        let params = PipelineParams::from_bytes(bytes)?;
        Self::from_params(params)
    }

    /// Extract parameters for serialization.
    pub fn extract_params(&self) -> PipelineParams {
        PipelineParams {
            format_version: FORMAT_VERSION,
            preprocessor: self.preprocessor.extract_params(),
            regressor: self.regressor.extract_params(),
            target: self.target,
        }
    }

    /// Reconstruct from parameters.
    pub fn from_params(params: PipelineParams) -> Result<Self, PreprocessingError> {
        if params.format_version != FORMAT_VERSION {
            return Err(PreprocessingError::SerializationError(format!(
                "Unsupported artifact format version {} (expected {})",
                params.format_version, FORMAT_VERSION
            )));
        }
        let preprocessor = FittedColumnTransformer::from_params(params.preprocessor)?;
        let regressor = FittedGradientBoostingRegressor::from_params(params.regressor)?;
        Self::new(preprocessor, regressor, params.target)
    }
}

impl TabularPipeline for HousePricePipeline {
    fn feature_names_in(&self) -> Option<&[String]> {
        self.preprocessor.feature_names_in()
    }

    fn predict_row(&self, row: &[FeatureValue]) -> Result<f64, PreprocessingError> {
        let names = self.preprocessor.feature_names_in().ok_or_else(|| {
            PreprocessingError::InvalidParameter("Pipeline has no input feature names".to_string())
        })?;
        if row.len() != names.len() {
            return Err(PreprocessingError::FeatureMismatch {
                expected_features: names.len(),
                got_features: row.len(),
            });
        }
        let frame = Frame::from_row(names.to_vec(), row.to_vec())
            .map_err(|e| PreprocessingError::InvalidParameter(e.to_string()))?;

        self.predict(&frame)?.into_iter().next().ok_or_else(|| {
            PreprocessingError::NumericalError("Pipeline produced no prediction".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GradientBoostingRegressor;
    use crate::preprocessing::{
        ColumnSpec, ColumnTransformer, FillValue, HandleUnknown, ImputeStrategy, OneHotEncoder,
        Remainder, SimpleImputer, Transformer,
    };

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn sales() -> (Frame, Vec<f64>) {
        let hoods = ["NAmes", "CollgCr", "OldTown"];
        let rows: Vec<Vec<FeatureValue>> = (0..60)
            .map(|i| {
                vec![
                    FeatureValue::Int(i),
                    FeatureValue::Int(800 + 25 * i),
                    hoods[(i % 3) as usize].into(),
                ]
            })
            .collect();
        let y = (0..60)
            .map(|i| 50_000.0 + 100.0 * (800 + 25 * i) as f64 + 20_000.0 * (i % 3) as f64)
            .collect();
        let frame = Frame::from_rows(names(&["Order", "Gr Liv Area", "Neighborhood"]), rows).unwrap();
        (frame, y)
    }

    fn fitted() -> HousePricePipeline {
        let (frame, y) = sales();
        let preprocessor = ColumnTransformer::new()
            .add_numeric(
                "num",
                SimpleImputer::new(ImputeStrategy::Median),
                ColumnSpec::Names(names(&["Gr Liv Area"])),
            )
            .add_categorical(
                "cat",
                SimpleImputer::new(ImputeStrategy::Constant(FillValue::text("None"))),
                OneHotEncoder::new().with_handle_unknown(HandleUnknown::Ignore),
                ColumnSpec::Names(names(&["Neighborhood"])),
            )
            .with_remainder(Remainder::Passthrough)
            .fit(&frame)
            .unwrap();
        let x = preprocessor.transform(&frame).unwrap();
        let target = TargetTransform::Log1p;
        let y_t: Vec<f64> = y.iter().map(|v| target.forward(*v)).collect();
        let regressor = GradientBoostingRegressor::new()
            .with_n_estimators(50)
            .with_learning_rate(0.2)
            .with_max_depth(3)
            .fit(&x, &y_t)
            .unwrap();
        HousePricePipeline::new(preprocessor, regressor, target).unwrap()
    }

    #[test]
    fn test_target_transform_inverts() {
        let t = TargetTransform::Log1p;
        assert!((t.inverse(t.forward(215_000.0)) - 215_000.0).abs() < 1e-6);
        assert_eq!(TargetTransform::Identity.inverse(3.0), 3.0);
    }

    #[test]
    fn test_pipeline_predicts_in_target_units() {
        let pipeline = fitted();
        let (frame, y) = sales();
        let preds = pipeline.predict(&frame).unwrap();
        let mean_err: f64 =
            preds.iter().zip(&y).map(|(p, t)| (p - t).abs() / t).sum::<f64>() / y.len() as f64;
        assert!(mean_err < 0.1, "mean relative error {}", mean_err);
    }

    #[test]
    fn test_predict_row_matches_batch() {
        let pipeline = fitted();
        let (frame, _) = sales();
        let batch = pipeline.predict(&frame.take_rows(&[5])).unwrap()[0];

        let row: Vec<FeatureValue> = (0..frame.n_cols()).map(|c| frame.column(c)[5].clone()).collect();
        assert_eq!(pipeline.predict_row(&row).unwrap(), batch);
    }

    #[test]
    fn test_predict_row_tolerates_missing_and_unknown() {
        let pipeline = fitted();
        let row = vec![FeatureValue::Null, FeatureValue::Null, "Atlantis".into()];
        assert!(pipeline.predict_row(&row).unwrap().is_finite());
    }

    #[test]
    fn test_predict_row_wrong_width() {
        let pipeline = fitted();
        assert!(matches!(
            pipeline.predict_row(&[FeatureValue::Int(1)]),
            Err(PreprocessingError::FeatureMismatch { .. })
        ));
    }

    #[test]
    fn test_feature_names_in() {
        let pipeline = fitted();
        assert_eq!(
            pipeline.feature_names_in().unwrap(),
            names(&["Order", "Gr Liv Area", "Neighborhood"]).as_slice()
        );
    }

    #[test]
    fn test_save_and_load() {
        let pipeline = fitted();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        pipeline.save_to_file(&path).unwrap();

        let loaded = HousePricePipeline::load_from_file(&path).unwrap();
        let (frame, _) = sales();
        assert_eq!(loaded.predict(&frame).unwrap(), pipeline.predict(&frame).unwrap());
        assert_eq!(loaded.target(), TargetTransform::Log1p);
    }

    #[test]
    fn test_from_bytes_rejects_garbage_and_versions() {
        assert!(HousePricePipeline::from_bytes(b"not a model").is_err());

        let mut params = fitted().extract_params();
        params.format_version = 99;
        assert!(matches!(
            HousePricePipeline::from_params(params),
            Err(PreprocessingError::SerializationError(_))
        ));
    }
}
