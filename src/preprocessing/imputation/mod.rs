//! Imputation transformers for handling missing values.
//!
//! | Transformer | Description |
//! |-------------|-------------|
//! | [`SimpleImputer`] | Impute with mean, median, most_frequent, or constant |
//!
//! # Example
//!
//! ```ignore
//! use house_price_rs::preprocessing::imputation::SimpleImputer;
//! use house_price_rs::preprocessing::{ImputeStrategy, Transformer};
//!
//! let imputer = SimpleImputer::new(ImputeStrategy::Median);
//! let fitted = imputer.fit(&frame)?;
//! let imputed = fitted.transform(&new_frame)?;
//! ```

pub mod simple;

pub use simple::{FillValue, FittedSimpleImputer, ImputeStrategy, SimpleImputer, SimpleImputerParams};
