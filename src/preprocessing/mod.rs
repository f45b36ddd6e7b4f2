//! Data preprocessing transformers for tabular pipelines.
//!
//! Transformers follow a fit/transform split:
//!
//! - [`Transformer`]: Unfitted transformer with hyperparameters
//! - [`FittedTransformer`]: Fitted transformer ready for inference and serialization
//!
//! # Available Transformers
//!
//! ## Imputation
//! - [`SimpleImputer`]: Fill missing values with mean, median, most_frequent, or constant
//!
//! ## Encoding
//! - [`OneHotEncoder`]: Dummy-encode categorical columns
//!
//! ## Composition
//! - [`ColumnTransformer`]: Route column subsets through different steps and
//!   concatenate the results
//!
//! # Example
//!
//! ```ignore
//! use house_price_rs::preprocessing::{ImputeStrategy, SimpleImputer, Transformer};
//!
//! let fitted = SimpleImputer::new(ImputeStrategy::Median).fit(&train)?;
//! fitted.save_to_file("imputer.bin")?;
//!
//! let loaded = FittedSimpleImputer::load_from_file("imputer.bin")?;
//! let filled = loaded.transform(&test)?;
//! ```

pub mod column_transformer;
pub mod encoding;
pub mod error;
pub mod imputation;
pub mod traits;

pub use column_transformer::{
    ColumnSpec, ColumnTransformer, ColumnTransformerParams, FittedColumnTransformer, Remainder,
};
pub use encoding::{FittedOneHotEncoder, HandleUnknown, OneHotEncoder, OneHotEncoderParams};
pub use error::PreprocessingError;
pub use imputation::{
    FillValue, FittedSimpleImputer, ImputeStrategy, SimpleImputer, SimpleImputerParams,
};
pub use traits::{FittedTransformer, Transformer};
