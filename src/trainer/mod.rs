// trainer/mod.rs
use crate::dataset::{train_test_split, ColumnKind, DatasetError, Frame};
use crate::model::{rmse, BoostingConfig, GradientBoostingRegressor};
use crate::pipeline::{HousePricePipeline, TargetTransform};
use crate::preprocessing::{
    ColumnSpec, ColumnTransformer, FillValue, FittedTransformer, HandleUnknown, ImputeStrategy,
    OneHotEncoder, PreprocessingError, Remainder, SimpleImputer, Transformer,
};
use std::fmt;

/// Error raised while training a pipeline.
#[derive(Debug)]
pub enum TrainingError {
    /// No rows to train on.
    EmptyData,
    /// The target column is absent.
    MissingTarget(String),
    /// A target cell is missing, textual, or outside the target transform's domain.
    InvalidTarget { row: usize, value: String },
    /// Fitting the preprocessor or the regressor failed.
    Preprocessing(PreprocessingError),
}

impl fmt::Display for TrainingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainingError::EmptyData => write!(f, "Training data is empty"),
            TrainingError::MissingTarget(name) => {
                write!(f, "Target column {} not found", name)
            }
            TrainingError::InvalidTarget { row, value } => {
                write!(f, "Invalid target value {} at row {}", value, row)
            }
            TrainingError::Preprocessing(e) => write!(f, "Training failed: {}", e),
        }
    }
}

impl std::error::Error for TrainingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrainingError::Preprocessing(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PreprocessingError> for TrainingError {
    fn from(err: PreprocessingError) -> Self {
        TrainingError::Preprocessing(err)
    }
}

/// Result of a training run.
#[derive(Debug)]
pub struct TrainingOutcome {
    pub pipeline: HousePricePipeline,
    /// RMSE on the held-out split in target units, `None` when nothing was held out.
    pub holdout_rmse: Option<f64>,
    pub n_train: usize,
    pub n_test: usize,
}

/// Trains the house price pipeline from a raw frame.
///
/// Numeric columns are median-imputed, text columns are filled with `"None"`
/// and one-hot encoded, and the identifier columns pass through untouched.
/// The regressor learns a transformed target and the pipeline inverts it.
///
/// Once built via [`HousePriceTrainerBuilder`], it is immutable and can be
/// reused across frames.
#[derive(Clone, Debug)]
pub struct HousePriceTrainer {
    pub(crate) target: String,
    pub(crate) passthrough: Vec<String>,
    pub(crate) test_size: f64,
    pub(crate) seed: u64,
    pub(crate) boosting: BoostingConfig,
    pub(crate) target_transform: TargetTransform,
}

/// Fluent builder for constructing a [`HousePriceTrainer`].
///
/// Defaults:
/// - `target`: `SalePrice`
/// - `passthrough`: `Order`, `PID`
/// - `test_size`: 0.2
/// - `seed`: 42
/// - `target_transform`: `Log1p`
#[derive(Clone, Debug)]
pub struct HousePriceTrainerBuilder {
    target: String,
    passthrough: Vec<String>,
    test_size: f64,
    seed: u64,
    boosting: BoostingConfig,
    target_transform: TargetTransform,
}

impl Default for HousePriceTrainerBuilder {
    fn default() -> Self {
        Self {
            target: "SalePrice".to_string(),
            passthrough: vec!["Order".to_string(), "PID".to_string()],
            test_size: 0.2,
            seed: 42,
            boosting: BoostingConfig::default(),
            target_transform: TargetTransform::Log1p,
        }
    }
}

impl HousePriceTrainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(mut self, name: &str) -> Self {
        self.target = name.to_string();
        self
    }

    /// Columns kept out of imputation and appended unchanged.
    pub fn passthrough<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.passthrough = names.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    pub fn test_size(mut self, fraction: f64) -> Self {
        self.test_size = fraction;
        self
    }

    /// Seed for the split. The regressor keeps its own `random_state`.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn boosting(mut self, config: BoostingConfig) -> Self {
        self.boosting = config;
        self
    }

    pub fn target_transform(mut self, transform: TargetTransform) -> Self {
        self.target_transform = transform;
        self
    }

    pub fn build(self) -> HousePriceTrainer {
        HousePriceTrainer {
            target: self.target,
            passthrough: self.passthrough,
            test_size: self.test_size,
            seed: self.seed,
            boosting: self.boosting,
            target_transform: self.target_transform,
        }
    }
}

impl HousePriceTrainer {
    /// Convenience constructor that starts the builder pattern.
    pub fn builder() -> HousePriceTrainerBuilder {
        HousePriceTrainerBuilder::new()
    }

    /// Split, fit the preprocessor and regressor, and score the holdout.
    pub fn fit(&self, frame: &Frame) -> Result<TrainingOutcome, TrainingError> {
        if frame.n_rows() == 0 {
            return Err(TrainingError::EmptyData);
        }
        if frame.position(&self.target).is_none() {
            return Err(TrainingError::MissingTarget(self.target.clone()));
        }

        // Kinds come from every row so a label seen only in the holdout still
        // marks its column categorical.
        let recipe = self.column_transformer(frame);

        let (mut train, mut test) = train_test_split(frame, self.test_size, self.seed);
        if train.n_rows() == 0 {
            return Err(TrainingError::EmptyData);
        }
        let y_train = self.take_target(&mut train)?;
        let y_test = self.take_target(&mut test)?;
        tracing::info!(
            train_rows = train.n_rows(),
            test_rows = test.n_rows(),
            features = train.n_cols(),
            "split training data"
        );

        let preprocessor = recipe.fit(&train)?;
        let x_train = preprocessor.transform(&train)?;
        tracing::info!(
            inputs = preprocessor.n_features_in(),
            outputs = preprocessor.n_features_out(),
            "fitted preprocessor"
        );

        let y_fit: Vec<f64> = y_train
            .iter()
            .map(|&v| self.target_transform.forward(v))
            .collect();
        let regressor = GradientBoostingRegressor::from_config(self.boosting.clone()).fit(&x_train, &y_fit)?;
        let pipeline = HousePricePipeline::new(preprocessor, regressor, self.target_transform)?;

        let holdout_rmse = if test.n_rows() > 0 {
            let preds = pipeline.predict(&test)?;
            Some(rmse(&preds, &y_test))
        } else {
            None
        };
        match holdout_rmse {
            Some(score) => tracing::info!(holdout_rmse = score, "training complete"),
            None => tracing::info!("training complete, no holdout"),
        }

        Ok(TrainingOutcome {
            pipeline,
            holdout_rmse,
            n_train: train.n_rows(),
            n_test: test.n_rows(),
        })
    }

    /// Remove the target column and check every value.
    fn take_target(&self, frame: &mut Frame) -> Result<Vec<f64>, TrainingError> {
        let values = frame.drop_column(&self.target).map_err(|e| match e {
            DatasetError::MissingColumn(name) => TrainingError::MissingTarget(name),
            other => TrainingError::Preprocessing(PreprocessingError::InvalidParameter(
                other.to_string(),
            )),
        })?;

        values
            .iter()
            .enumerate()
            .map(|(row, value)| {
                value
                    .as_f64()
                    .filter(|v| v.is_finite() && self.target_transform.forward(*v).is_finite())
                    .ok_or_else(|| TrainingError::InvalidTarget {
                        row,
                        value: value.to_string(),
                    })
            })
            .collect()
    }

    /// Build the preprocessing recipe for the feature columns of `frame`.
    /// The target and passthrough columns are left out.
    fn column_transformer(&self, frame: &Frame) -> ColumnTransformer {
        let is_feature = |name: &String| *name != self.target && !self.passthrough.contains(name);
        let numeric: Vec<String> = frame
            .columns_of_kind(ColumnKind::Numeric)
            .into_iter()
            .filter(is_feature)
            .collect();
        let categorical: Vec<String> = frame
            .columns_of_kind(ColumnKind::Categorical)
            .into_iter()
            .filter(is_feature)
            .collect();
        tracing::debug!(
            numeric = numeric.len(),
            categorical = categorical.len(),
            "inferred column kinds"
        );

        let mut ct = ColumnTransformer::new().with_remainder(Remainder::Passthrough);
        if !numeric.is_empty() {
            ct = ct.add_numeric(
                "num",
                SimpleImputer::new(ImputeStrategy::Median),
                ColumnSpec::Names(numeric),
            );
        }
        if !categorical.is_empty() {
            ct = ct.add_categorical(
                "cat",
                SimpleImputer::new(ImputeStrategy::Constant(FillValue::text("None"))),
                OneHotEncoder::new().with_handle_unknown(HandleUnknown::Ignore),
                ColumnSpec::Names(categorical),
            );
        }
        ct
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::FeatureValue;
    use crate::pipeline::TabularPipeline;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn ames_like(n: i64) -> Frame {
        let hoods = ["NAmes", "CollgCr", "OldTown", "Edwards"];
        let rows = (0..n)
            .map(|i| {
                let area = 900 + (i * 37) % 1500;
                let qual = 4 + i % 6;
                let garage = if i % 11 == 0 {
                    FeatureValue::Null
                } else {
                    FeatureValue::Float((i % 4) as f64)
                };
                let price = 20_000 + area * 90 + qual * 15_000 + (i % 4) * 8_000;
                vec![
                    FeatureValue::Int(i + 1),
                    FeatureValue::Int(area),
                    FeatureValue::Int(qual),
                    garage,
                    hoods[(i % 4) as usize].into(),
                    FeatureValue::Int(price),
                ]
            })
            .collect();
        Frame::from_rows(
            names(&["Order", "Gr Liv Area", "Overall Qual", "Garage Cars", "Neighborhood", "SalePrice"]),
            rows,
        )
        .unwrap()
    }

    fn quick() -> HousePriceTrainerBuilder {
        HousePriceTrainer::builder().boosting(BoostingConfig {
            n_estimators: 80,
            learning_rate: 0.2,
            ..BoostingConfig::default()
        })
    }

    #[test]
    fn test_builder_defaults() {
        let trainer = HousePriceTrainer::builder().build();
        assert_eq!(trainer.target, "SalePrice");
        assert_eq!(trainer.passthrough, names(&["Order", "PID"]));
        assert_eq!(trainer.test_size, 0.2);
        assert_eq!(trainer.seed, 42);
        assert_eq!(trainer.target_transform, TargetTransform::Log1p);
        assert_eq!(trainer.boosting, BoostingConfig::default());
    }

    #[test]
    fn test_fit_reports_holdout() {
        let outcome = quick().build().fit(&ames_like(200)).unwrap();
        assert_eq!(outcome.n_train, 160);
        assert_eq!(outcome.n_test, 40);

        let score = outcome.holdout_rmse.unwrap();
        assert!(score.is_finite());
        // Prices span roughly 150k to 320k
        assert!(score < 25_000.0, "holdout rmse {}", score);
    }

    #[test]
    fn test_fit_layout_excludes_target_and_passes_ids() {
        let outcome = quick().build().fit(&ames_like(50)).unwrap();
        let pipeline = &outcome.pipeline;

        assert_eq!(
            pipeline.feature_names_in().unwrap(),
            names(&["Order", "Gr Liv Area", "Overall Qual", "Garage Cars", "Neighborhood"]).as_slice()
        );
        let out = pipeline.preprocessor().feature_names_out();
        assert_eq!(out.last().unwrap(), "remainder__Order");
        assert!(out.contains(&"num__Garage Cars".to_string()));
        assert!(out.contains(&"cat__Neighborhood_OldTown".to_string()));
    }

    #[test]
    fn test_fit_is_deterministic() {
        let a = quick().build().fit(&ames_like(80)).unwrap();
        let b = quick().build().fit(&ames_like(80)).unwrap();
        assert_eq!(a.pipeline.to_bytes().unwrap(), b.pipeline.to_bytes().unwrap());
    }

    #[test]
    fn test_fit_without_holdout() {
        let outcome = quick().test_size(0.0).build().fit(&ames_like(30)).unwrap();
        assert_eq!(outcome.n_test, 0);
        assert!(outcome.holdout_rmse.is_none());
    }

    #[test]
    fn test_fit_missing_target() {
        let result = quick().target("Price").build().fit(&ames_like(10));
        assert!(matches!(result, Err(TrainingError::MissingTarget(_))));
    }

    #[test]
    fn test_fit_invalid_target() {
        let frame = Frame::from_rows(
            names(&["Gr Liv Area", "SalePrice"]),
            vec![
                vec![FeatureValue::Int(1000), FeatureValue::Int(100_000)],
                vec![FeatureValue::Int(1200), "expensive".into()],
            ],
        )
        .unwrap();
        let result = quick().test_size(0.0).build().fit(&frame);
        assert!(matches!(result, Err(TrainingError::InvalidTarget { .. })));
    }

    #[test]
    fn test_label_only_in_holdout_is_categorical() {
        let base = ames_like(60);
        let (_, test) = train_test_split(&base, 0.2, 42);
        let held_out = match test.column_by_name("Order").unwrap()[0] {
            FeatureValue::Int(order) => (order - 1) as usize,
            ref other => panic!("unexpected Order {:?}", other),
        };

        let zone: Vec<FeatureValue> = (0..60)
            .map(|i| {
                if i == held_out {
                    "C (all)".into()
                } else {
                    FeatureValue::Int(20 + (i as i64 % 3) * 10)
                }
            })
            .collect();
        let mut names: Vec<String> = base.names().to_vec();
        let mut columns: Vec<Vec<FeatureValue>> =
            (0..base.n_cols()).map(|i| base.column(i).to_vec()).collect();
        names.push("Zone".to_string());
        columns.push(zone);
        let frame = Frame::new(names, columns).unwrap();

        let outcome = quick().build().fit(&frame).unwrap();
        assert!(outcome.holdout_rmse.unwrap().is_finite());
        let out = outcome.pipeline.preprocessor().feature_names_out();
        assert!(out.contains(&"cat__Zone_20".to_string()), "{:?}", out);
        assert!(!out.contains(&"num__Zone".to_string()));
    }

    #[test]
    fn test_fit_empty() {
        let empty = ames_like(0);
        assert!(matches!(
            quick().build().fit(&empty),
            Err(TrainingError::EmptyData)
        ));
    }

    #[test]
    fn test_error_source() {
        let err = TrainingError::from(PreprocessingError::EmptyData("x".to_string()));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("Training failed"));
    }
}
