//! Model artifact acquisition and schema extraction.

use crate::pipeline::{HousePricePipeline, TabularPipeline};
use crate::serving::defaults::DefaultTable;
use crate::serving::error::ServingError;
use crate::serving::predictor::PredictionContext;
use crate::serving::store::ObjectStore;
use std::path::Path;
use std::sync::Arc;

/// Where the artifact lives in remote storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteLocation {
    pub bucket: String,
    pub key: String,
}

impl RemoteLocation {
    pub fn new(bucket: &str, key: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }

    /// Both bucket and key are non-blank.
    pub fn is_valid(&self) -> bool {
        !self.bucket.trim().is_empty() && !self.key.trim().is_empty()
    }
}

/// Load the pipeline from `local_path`, fetching it from `remote` first if
/// the file is absent.
///
/// # Errors
/// - `ArtifactUnavailable` when there is no local file and no usable remote,
///   or when the fetch or the read fails
/// - `ArtifactCorrupt` when the bytes do not decode into a valid pipeline
pub fn acquire_artifact(
    local_path: &Path,
    remote: Option<&RemoteLocation>,
    store: &dyn ObjectStore,
) -> Result<HousePricePipeline, ServingError> {
    if !local_path.is_file() {
        match remote {
            Some(location) if location.is_valid() => {
                tracing::info!(
                    bucket = %location.bucket,
                    key = %location.key,
                    path = %local_path.display(),
                    "local artifact missing, fetching from remote storage"
                );
                store
                    .fetch_to_path(&location.bucket, &location.key, local_path)
                    .map_err(|e| {
                        ServingError::ArtifactUnavailable(format!(
                            "fetching {}/{} failed: {}",
                            location.bucket, location.key, e
                        ))
                    })?;
            }
            _ => {
                return Err(ServingError::ArtifactUnavailable(format!(
                    "{} does not exist and no remote location is configured",
                    local_path.display()
                )));
            }
        }
    }

    let bytes = std::fs::read(local_path).map_err(|e| {
        ServingError::ArtifactUnavailable(format!("reading {}: {}", local_path.display(), e))
    })?;
    let pipeline = HousePricePipeline::from_bytes(&bytes)
        .map_err(|e| ServingError::ArtifactCorrupt(format!("{}: {}", local_path.display(), e)))?;

    tracing::info!(
        path = %local_path.display(),
        bytes = bytes.len(),
        trees = pipeline.regressor().n_trees(),
        "model artifact loaded"
    );
    Ok(pipeline)
}

/// Input column names of the pipeline's preprocessing stage, in order.
pub fn extract_column_order(pipeline: &dyn TabularPipeline) -> Result<Arc<[String]>, ServingError> {
    match pipeline.feature_names_in() {
        Some(names) if !names.is_empty() => Ok(Arc::from(names)),
        Some(_) => Err(ServingError::SchemaExtraction(
            "preprocessor reports an empty feature list".to_string(),
        )),
        None => Err(ServingError::SchemaExtraction(
            "preprocessor does not record input feature names".to_string(),
        )),
    }
}

/// Build the process-wide prediction context.
///
/// Never fails: any load error is logged and yields a degraded context whose
/// predictions report [`ServingError::ModelNotLoaded`].
pub fn load_context(
    local_path: &Path,
    remote: Option<&RemoteLocation>,
    store: &dyn ObjectStore,
    defaults: DefaultTable,
) -> PredictionContext {
    let loaded = acquire_artifact(local_path, remote, store)
        .and_then(|pipeline| PredictionContext::ready(Arc::new(pipeline), defaults.clone()));

    match loaded {
        Ok(context) => {
            tracing::info!(
                columns = context.column_order().map_or(0, |c| c.len()),
                "prediction context ready"
            );
            context
        }
        Err(e) => {
            tracing::error!(error = %e, "model failed to load, serving without a model");
            PredictionContext::degraded(e.to_string(), defaults)
        }
    }
}
