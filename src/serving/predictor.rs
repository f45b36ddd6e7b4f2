//! Feature reconciliation and single-row inference.

use crate::dataset::FeatureValue;
use crate::pipeline::TabularPipeline;
use crate::serving::artifact::extract_column_order;
use crate::serving::defaults::DefaultTable;
use crate::serving::error::{InferenceFailure, ServingError};
use crate::serving::record::FeatureRecord;
use std::sync::Arc;

#[derive(Clone)]
enum ContextState {
    Ready {
        pipeline: Arc<dyn TabularPipeline>,
        columns: Arc<[String]>,
    },
    Degraded {
        reason: String,
    },
}

/// Everything a request needs to turn a sparse record into a price.
///
/// Built once at startup and read-only afterwards. Cloning is cheap and
/// shares the pipeline.
#[derive(Clone)]
pub struct PredictionContext {
    defaults: Arc<DefaultTable>,
    state: ContextState,
}

impl std::fmt::Debug for PredictionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("PredictionContext");
        s.field("defaults", &self.defaults.len());
        match &self.state {
            ContextState::Ready { columns, .. } => s.field("columns", &columns.len()),
            ContextState::Degraded { reason } => s.field("degraded", reason),
        };
        s.finish()
    }
}

impl PredictionContext {
    /// Context serving `pipeline`, with the column order read from it.
    pub fn ready(
        pipeline: Arc<dyn TabularPipeline>,
        defaults: DefaultTable,
    ) -> Result<Self, ServingError> {
        let columns = extract_column_order(pipeline.as_ref())?;
        Ok(Self {
            defaults: Arc::new(defaults),
            state: ContextState::Ready { pipeline, columns },
        })
    }

    /// Context without a model. Every prediction fails with `ModelNotLoaded`.
    pub fn degraded<S: Into<String>>(reason: S, defaults: DefaultTable) -> Self {
        Self {
            defaults: Arc::new(defaults),
            state: ContextState::Degraded {
                reason: reason.into(),
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, ContextState::Ready { .. })
    }

    /// Why the model is missing, if it is.
    pub fn degraded_reason(&self) -> Option<&str> {
        match &self.state {
            ContextState::Degraded { reason } => Some(reason),
            ContextState::Ready { .. } => None,
        }
    }

    /// Column order the pipeline expects.
    pub fn column_order(&self) -> Option<&[String]> {
        match &self.state {
            ContextState::Ready { columns, .. } => Some(columns),
            ContextState::Degraded { .. } => None,
        }
    }

    pub fn defaults(&self) -> &DefaultTable {
        &self.defaults
    }

    /// Defaults overlaid with every key of `input`, unknown keys included.
    pub fn reconcile(&self, input: &FeatureRecord) -> FeatureRecord {
        let mut full = self.defaults.to_record();
        full.overlay(input);
        full
    }

    /// Cells of `full` in the expected column order. Absent columns are `Null`.
    pub fn project(&self, full: &FeatureRecord) -> Result<Vec<FeatureValue>, ServingError> {
        match &self.state {
            ContextState::Ready { columns, .. } => Ok(full.project(columns)),
            ContextState::Degraded { .. } => Err(ServingError::ModelNotLoaded),
        }
    }

    /// Complete `input` from the defaults and predict a price.
    ///
    /// # Errors
    /// - `ModelNotLoaded` if the context is degraded
    /// - `Inference` if the pipeline fails or returns a non-finite value
    pub fn predict(&self, input: &FeatureRecord) -> Result<f64, ServingError> {
        let ContextState::Ready { pipeline, columns } = &self.state else {
            return Err(ServingError::ModelNotLoaded);
        };

        let row = self.reconcile(input).project(columns);
        let value = pipeline
            .predict_row(&row)
            .map_err(InferenceFailure::Pipeline)?;
        if !value.is_finite() {
            return Err(InferenceFailure::NonFinite(value).into());
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::error::PreprocessingError;
    use std::sync::Mutex;

    /// Sums the numeric cells it is given and remembers the last row.
    struct SumPipeline {
        names: Option<Vec<String>>,
        seen: Mutex<Vec<FeatureValue>>,
    }

    impl SumPipeline {
        fn new(names: &[&str]) -> Self {
            Self {
                names: Some(names.iter().map(|s| s.to_string()).collect()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl TabularPipeline for SumPipeline {
        fn feature_names_in(&self) -> Option<&[String]> {
            self.names.as_deref()
        }

        fn predict_row(&self, row: &[FeatureValue]) -> Result<f64, PreprocessingError> {
            *self.seen.lock().unwrap() = row.to_vec();
            for value in row {
                if let FeatureValue::Str(s) = value {
                    if s == "boom" {
                        return Err(PreprocessingError::TypeMismatch {
                            column: "Street".to_string(),
                            expected: "number",
                            got: s.clone(),
                        });
                    }
                }
            }
            Ok(row.iter().filter_map(FeatureValue::as_f64).sum())
        }
    }

    fn table() -> DefaultTable {
        DefaultTable::from_entries([
            ("GrLivArea", FeatureValue::Int(1500)),
            ("TotalBsmtSF", FeatureValue::Float(1000.0)),
            ("Street", "Pave".into()),
        ])
    }

    fn record(entries: &[(&str, FeatureValue)]) -> FeatureRecord {
        entries.iter().cloned().collect()
    }

    #[test]
    fn test_reconcile_fills_defaults_and_overlays() {
        let ctx = PredictionContext::degraded("no model", table());
        let full = ctx.reconcile(&record(&[
            ("TotalBsmtSF", FeatureValue::Float(2000.0)),
            ("Unknown", FeatureValue::Int(1)),
        ]));

        assert_eq!(full.get("GrLivArea"), Some(&FeatureValue::Int(1500)));
        assert_eq!(full.get("TotalBsmtSF"), Some(&FeatureValue::Float(2000.0)));
        assert_eq!(full.get("Unknown"), Some(&FeatureValue::Int(1)));
        assert_eq!(full.len(), 4);
    }

    #[test]
    fn test_predict_projects_in_column_order() {
        let pipeline = Arc::new(SumPipeline::new(&["TotalBsmtSF", "PoolArea", "GrLivArea"]));
        let ctx = PredictionContext::ready(pipeline.clone(), table()).unwrap();

        let value = ctx.predict(&record(&[("GrLivArea", FeatureValue::Int(2000))])).unwrap();
        assert_eq!(value, 3000.0);
        assert_eq!(
            *pipeline.seen.lock().unwrap(),
            vec![FeatureValue::Float(1000.0), FeatureValue::Null, FeatureValue::Int(2000)]
        );
    }

    #[test]
    fn test_predict_is_idempotent() {
        let ctx =
            PredictionContext::ready(Arc::new(SumPipeline::new(&["GrLivArea"])), table()).unwrap();
        let input = record(&[("GrLivArea", FeatureValue::Int(1800))]);
        assert_eq!(ctx.predict(&input).unwrap(), ctx.predict(&input).unwrap());
    }

    #[test]
    fn test_degraded_context_reports_not_loaded() {
        let ctx = PredictionContext::degraded("missing", table());
        assert!(matches!(
            ctx.predict(&FeatureRecord::new()),
            Err(ServingError::ModelNotLoaded)
        ));
        assert!(matches!(
            ctx.project(&FeatureRecord::new()),
            Err(ServingError::ModelNotLoaded)
        ));
        assert_eq!(ctx.degraded_reason(), Some("missing"));
        assert!(ctx.column_order().is_none());
    }

    #[test]
    fn test_pipeline_error_becomes_inference_error() {
        let ctx = PredictionContext::ready(Arc::new(SumPipeline::new(&["Street"])), table()).unwrap();
        let err = ctx.predict(&record(&[("Street", "boom".into())])).unwrap_err();
        assert!(matches!(
            err,
            ServingError::Inference(InferenceFailure::Pipeline(PreprocessingError::TypeMismatch { .. }))
        ));
    }

    #[test]
    fn test_non_finite_prediction_is_rejected() {
        let ctx =
            PredictionContext::ready(Arc::new(SumPipeline::new(&["GrLivArea"])), table()).unwrap();
        let err = ctx
            .predict(&record(&[("GrLivArea", FeatureValue::Float(f64::INFINITY))]))
            .unwrap_err();
        assert!(matches!(
            err,
            ServingError::Inference(InferenceFailure::NonFinite(_))
        ));
    }

    #[test]
    fn test_nameless_pipeline_fails_schema_extraction() {
        let pipeline = SumPipeline {
            names: None,
            seen: Mutex::new(Vec::new()),
        };
        assert!(matches!(
            PredictionContext::ready(Arc::new(pipeline), table()),
            Err(ServingError::SchemaExtraction(_))
        ));

        let empty = SumPipeline::new(&[]);
        assert!(matches!(
            PredictionContext::ready(Arc::new(empty), table()),
            Err(ServingError::SchemaExtraction(_))
        ));
    }
}
