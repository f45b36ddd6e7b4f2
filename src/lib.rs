//! # house-price-rs
//!
//! Training and serving of a tabular house price model.
//!
//! A fitted [`pipeline::HousePricePipeline`] bundles a column transformer
//! (imputation plus one-hot encoding) with a gradient boosted tree ensemble.
//! It is persisted as a single binary artifact and loaded once by the
//! prediction service, which completes sparse requests from a table of
//! typical Ames values before scoring them.
//!
//! ## Core Design Principles
//!
//! - **Fit/Predict Separation**: every estimator has an unfitted configuration
//!   type and a fitted type that only knows how to transform or predict.
//! - **Plain Parameters**: fitted state is extracted into `*Params` structs and
//!   serialized with `bincode`, so artifacts never carry training logic.
//! - **Positional Contract**: the column order recorded at fit time is the only
//!   schema the service relies on.
//!
//! ## Quick Start
//!
//! ```rust
//! use house_price_rs::dataset::{FeatureValue, Frame};
//! use house_price_rs::model::BoostingConfig;
//! use house_price_rs::trainer::HousePriceTrainer;
//!
//! let names = vec!["GrLivArea".to_string(), "SalePrice".to_string()];
//! let rows = (0..40)
//!     .map(|i| vec![FeatureValue::Int(800 + i * 25), FeatureValue::Int(90_000 + i * 4_000)])
//!     .collect();
//! let frame = Frame::from_rows(names, rows).unwrap();
//!
//! let outcome = HousePriceTrainer::builder()
//!     .boosting(BoostingConfig { n_estimators: 20, ..BoostingConfig::default() })
//!     .build()
//!     .fit(&frame)
//!     .unwrap();
//! assert!(outcome.holdout_rmse.unwrap().is_finite());
//! ```
//!
//! ## Module Structure
//!
//! - `dataset`: named heterogeneous columns and CSV loading
//! - `preprocessing`: imputers, one-hot encoding and the column transformer
//! - `model`: histogram binning, regression trees and gradient boosting
//! - `pipeline`: the persisted preprocessor plus regressor bundle
//! - `trainer`: split, fit and evaluate a pipeline from a raw table
//! - `serving`: artifact acquisition, feature reconciliation and the HTTP API
//! - `serialization`: binary persistence of fitted parameters

pub mod dataset;
pub mod model;
pub mod pipeline;
pub mod preprocessing;
pub mod serialization;
pub mod serving;
pub mod trainer;

pub use pipeline::{HousePricePipeline, TabularPipeline};
pub use serving::{PredictionContext, ServingError};
