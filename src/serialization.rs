//! Serialization of fitted parameters.
//!
//! Fitted transformers, trees and whole pipelines expose a plain-data `Params`
//! representation. This module turns those into bytes and back without
//! coupling callers to a specific format.

use std::error::Error;

/// A trait for parameter representations that can be serialized to and from bytes.
///
/// Implementors should contain only plain data (e.g., `Vec<f64>`, strings,
/// node tables), never runtime handles.
pub trait SerializableParams: Sized {
    /// The error type returned during (de)serialization.
    type Error: Error + Send + Sync + 'static;

    /// Serialize the parameters into a byte buffer.
    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error>;

    /// Deserialize the parameters from a byte buffer.
    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error>;
}

impl<T> SerializableParams for T
where
    T: serde::Serialize + for<'de> serde::Deserialize<'de>,
{
    type Error = bincode::Error;

    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error> {
        bincode::serialize(self)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error> {
        bincode::deserialize(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Stats {
        medians: Vec<f64>,
        names: Vec<String>,
    }

    #[test]
    fn test_params_bytes_roundtrip() {
        let stats = Stats {
            medians: vec![1.5, 2.0],
            names: vec!["LotArea".to_string(), "GrLivArea".to_string()],
        };
        let bytes = stats.to_bytes().unwrap();
        let back = Stats::from_bytes(&bytes).unwrap();
        assert_eq!(back, stats);
    }

    #[test]
    fn test_truncated_bytes_fail() {
        let stats = Stats {
            medians: vec![1.0; 8],
            names: vec![],
        };
        let bytes = stats.to_bytes().unwrap();
        assert!(Stats::from_bytes(&bytes[..bytes.len() / 2]).is_err());
    }
}
