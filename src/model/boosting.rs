//! Gradient-boosted regression trees with squared-error loss.

use crate::model::histogram::BinMapper;
use crate::model::tree::{GrowConfig, RegressionTree, TreeGrower};
use crate::preprocessing::error::PreprocessingError;
use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Hyperparameters of a [`GradientBoostingRegressor`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoostingConfig {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    /// Fraction of rows sampled for each tree.
    pub subsample: f64,
    /// Fraction of features sampled for each tree.
    pub colsample_bytree: f64,
    /// L2 penalty on leaf weights.
    pub reg_lambda: f64,
    /// Minimum hessian sum in a child.
    pub min_child_weight: f64,
    pub max_bin: usize,
    pub random_state: u64,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 500,
            learning_rate: 0.05,
            max_depth: 4,
            subsample: 0.8,
            colsample_bytree: 0.7,
            reg_lambda: 1.0,
            min_child_weight: 1.0,
            max_bin: 256,
            random_state: 42,
        }
    }
}

impl BoostingConfig {
    fn validate(&self) -> Result<(), PreprocessingError> {
        let invalid = |msg: String| Err(PreprocessingError::InvalidParameter(msg));
        if self.n_estimators == 0 {
            return invalid("n_estimators must be at least 1".to_string());
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return invalid(format!("learning_rate must be positive, got {}", self.learning_rate));
        }
        if self.max_depth == 0 {
            return invalid("max_depth must be at least 1".to_string());
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return invalid(format!("subsample must be in (0, 1], got {}", self.subsample));
        }
        if !(self.colsample_bytree > 0.0 && self.colsample_bytree <= 1.0) {
            return invalid(format!(
                "colsample_bytree must be in (0, 1], got {}",
                self.colsample_bytree
            ));
        }
        if !(self.reg_lambda >= 0.0) || !(self.min_child_weight >= 0.0) {
            return invalid("reg_lambda and min_child_weight must be non-negative".to_string());
        }
        if self.max_bin < 2 || self.max_bin >= usize::from(u16::MAX) {
            return invalid(format!("max_bin must be in [2, 65534], got {}", self.max_bin));
        }
        Ok(())
    }
}

/// Gradient boosting regressor (unfitted).
///
/// # Example
/// ```ignore
/// use house_price_rs::model::GradientBoostingRegressor;
///
/// let model = GradientBoostingRegressor::new()
///     .with_n_estimators(200)
///     .with_max_depth(3)
///     .fit(&x_train, &y_train)?;
/// let preds = model.predict(&x_test)?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct GradientBoostingRegressor {
    config: BoostingConfig,
}

impl GradientBoostingRegressor {
    /// Create a regressor with the default training recipe.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: BoostingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BoostingConfig {
        &self.config
    }

    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.config.n_estimators = n;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.config.learning_rate = lr;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    pub fn with_subsample(mut self, fraction: f64) -> Self {
        self.config.subsample = fraction;
        self
    }

    pub fn with_colsample_bytree(mut self, fraction: f64) -> Self {
        self.config.colsample_bytree = fraction;
        self
    }

    pub fn with_reg_lambda(mut self, lambda: f64) -> Self {
        self.config.reg_lambda = lambda;
        self
    }

    pub fn with_min_child_weight(mut self, weight: f64) -> Self {
        self.config.min_child_weight = weight;
        self
    }

    pub fn with_max_bin(mut self, max_bin: usize) -> Self {
        self.config.max_bin = max_bin;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.config.random_state = seed;
        self
    }

    /// Fit the ensemble to `x` and `y`.
    ///
    /// # Errors
    /// - `InvalidParameter` for bad hyperparameters or a non-finite target
    /// - `EmptyData` when `x` has no rows or no columns
    /// - `FeatureMismatch` when `y` and `x` disagree on the number of rows
    pub fn fit(
        &self,
        x: &Array2<f64>,
        y: &[f64],
    ) -> Result<FittedGradientBoostingRegressor, PreprocessingError> {
        let cfg = &self.config;
        cfg.validate()?;

        let (n_rows, n_features) = x.dim();
        if n_rows == 0 || n_features == 0 {
            return Err(PreprocessingError::EmptyData(
                "Cannot fit GradientBoostingRegressor on empty data".to_string(),
            ));
        }
        if y.len() != n_rows {
            return Err(PreprocessingError::FeatureMismatch {
                expected_features: n_rows,
                got_features: y.len(),
            });
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(PreprocessingError::InvalidParameter(
                "Target contains non-finite values".to_string(),
            ));
        }

        let mapper = BinMapper::fit(x, cfg.max_bin);
        let binned = mapper.transform(x);
        let base_score = y.iter().sum::<f64>() / n_rows as f64;

        let mut rng = StdRng::seed_from_u64(cfg.random_state);
        let n_sample_rows = ((cfg.subsample * n_rows as f64).round() as usize).clamp(1, n_rows);
        let n_sample_cols =
            ((cfg.colsample_bytree * n_features as f64).round() as usize).clamp(1, n_features);

        let grow_config = GrowConfig {
            max_depth: cfg.max_depth,
            reg_lambda: cfg.reg_lambda,
            min_child_weight: cfg.min_child_weight,
            learning_rate: cfg.learning_rate,
        };

        let mut preds = vec![base_score; n_rows];
        let hess = vec![1.0; n_rows];
        let mut trees = Vec::with_capacity(cfg.n_estimators);

        for round in 0..cfg.n_estimators {
            let grad: Vec<f64> = preds.iter().zip(y).map(|(p, t)| p - t).collect();

            let mut rows = index::sample(&mut rng, n_rows, n_sample_rows).into_vec();
            rows.sort_unstable();
            let mut features = index::sample(&mut rng, n_features, n_sample_cols).into_vec();
            features.sort_unstable();

            let tree = TreeGrower {
                binned: &binned,
                mapper: &mapper,
                grad: &grad,
                hess: &hess,
                features: &features,
                config: grow_config,
            }
            .grow(rows);

            preds
                .par_iter_mut()
                .enumerate()
                .for_each(|(i, p)| *p += tree.predict(&x.row(i)));
            trees.push(tree);

            if (round + 1) % 100 == 0 || round + 1 == cfg.n_estimators {
                tracing::debug!(
                    round = round + 1,
                    train_rmse = rmse(&preds, y),
                    "boosting progress"
                );
            }
        }

        Ok(FittedGradientBoostingRegressor {
            base_score,
            n_features,
            trees,
        })
    }
}

/// Serializable parameters for a fitted regressor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GradientBoostingParams {
    pub base_score: f64,
    pub n_features: usize,
    pub trees: Vec<RegressionTree>,
}

/// Fitted ensemble ready for inference.
#[derive(Clone, Debug)]
pub struct FittedGradientBoostingRegressor {
    base_score: f64,
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl FittedGradientBoostingRegressor {
    /// Predict a single row.
    pub fn predict_row(&self, row: &ArrayView1<f64>) -> f64 {
        self.base_score + self.trees.iter().map(|t| t.predict(row)).sum::<f64>()
    }

    /// Predict every row of `x`.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<f64>, PreprocessingError> {
        if x.ncols() != self.n_features {
            return Err(PreprocessingError::FeatureMismatch {
                expected_features: self.n_features,
                got_features: x.ncols(),
            });
        }
        Ok(x.outer_iter().map(|row| self.predict_row(&row)).collect())
    }

    pub fn n_features_in(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    pub fn extract_params(&self) -> GradientBoostingParams {
        GradientBoostingParams {
            base_score: self.base_score,
            n_features: self.n_features,
            trees: self.trees.clone(),
        }
    }

    pub fn from_params(params: GradientBoostingParams) -> Result<Self, PreprocessingError> {
        if !params.base_score.is_finite() {
            return Err(PreprocessingError::InvalidParameter(
                "base_score is not finite".to_string(),
            ));
        }
        for tree in &params.trees {
            tree.validate(params.n_features)?;
        }
        Ok(Self {
            base_score: params.base_score,
            n_features: params.n_features,
            trees: params.trees,
        })
    }
}

/// Root mean squared error.
pub fn rmse(pred: &[f64], truth: &[f64]) -> f64 {
    if pred.is_empty() {
        return 0.0;
    }
    let sse: f64 = pred.iter().zip(truth).map(|(p, t)| (p - t).powi(2)).sum();
    (sse / pred.len() as f64).sqrt()
}
