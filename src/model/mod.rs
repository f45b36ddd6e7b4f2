//! Tree ensemble regressor.
//!
//! - [`GradientBoostingRegressor`]: unfitted, carries the hyperparameters.
//! - [`FittedGradientBoostingRegressor`]: inference-only, serializable predictor.
//!
//! Training bins every feature into quantile buckets ([`histogram`]), then grows
//! depth-limited trees on squared-error gradients ([`tree`]). The fitted model
//! holds only raw thresholds, so inference needs no binning.

pub mod boosting;
pub mod histogram;
pub mod tree;

pub use boosting::{
    rmse, BoostingConfig, FittedGradientBoostingRegressor, GradientBoostingParams,
    GradientBoostingRegressor,
};
pub use tree::{Node, RegressionTree};
