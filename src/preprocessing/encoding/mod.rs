//! Categorical feature encoding transformers.
//!
//! ## OneHotEncoder
//! Converts categorical labels to one-hot (dummy) encoding.
//!
//! ```ignore
//! // Input: [["Pave"], ["Grvl"]]  (2 samples, 1 categorical feature)
//! // Output: [[0, 1], [1, 0]]     (categories sorted: Grvl, Pave)
//! ```
//!
//! Labels are strings. Numeric cells in a categorical column are encoded by
//! their printed form.

mod one_hot;

pub use one_hot::{FittedOneHotEncoder, OneHotEncoder, OneHotEncoderParams};

/// Strategy for handling unknown categories during transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum HandleUnknown {
    /// Raise an error when unknown categories are encountered.
    #[default]
    Error,
    /// Ignore unknown categories (output zeros for the whole block).
    Ignore,
}
