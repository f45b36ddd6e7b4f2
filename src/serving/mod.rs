//! Serving layer: artifact loading, feature reconciliation and the HTTP API.
//!
//! At startup [`load_context`] acquires the artifact (locally or through an
//! [`ObjectStore`]) and builds a [`PredictionContext`]. Each request is merged
//! with the [`DefaultTable`], projected onto the pipeline's column order and
//! scored once.
//!
//! ```ignore
//! let context = load_context(&path, remote.as_ref(), &store, DefaultTable::ames());
//! let price = context.predict(&SimplifiedRecord::new(1500, 7, 2005).into())?;
//! ```

pub mod api;
pub mod artifact;
pub mod config;
pub mod defaults;
pub mod error;
pub mod predictor;
pub mod record;
pub mod store;

pub use api::{router, ErrorResponse, PredictionResponse, WelcomeResponse, WELCOME_MESSAGE};
pub use artifact::{acquire_artifact, extract_column_order, load_context, RemoteLocation};
pub use config::{AllowedOrigins, ConfigError, ServerConfig};
pub use defaults::DefaultTable;
pub use error::{InferenceFailure, ServingError};
pub use predictor::PredictionContext;
pub use record::{FeatureRecord, SimplifiedRecord};
pub use store::{DirectoryObjectStore, GcsObjectStore, ObjectStore, StoreError};
