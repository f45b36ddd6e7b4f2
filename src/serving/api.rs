//! HTTP surface: `GET /` and `POST /predict`.

use crate::serving::config::AllowedOrigins;
use crate::serving::error::ServingError;
use crate::serving::predictor::PredictionContext;
use crate::serving::record::{FeatureRecord, SimplifiedRecord};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const WELCOME_MESSAGE: &str = "Welcome to the House Price Prediction API";

#[derive(Debug, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predicted_price: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Build the application router around a shared context.
pub fn router(context: Arc<PredictionContext>, origins: &AllowedOrigins) -> Router {
    let app = Router::new()
        .route("/", get(root))
        .route("/predict", post(predict))
        .with_state(context)
        .layer(TraceLayer::new_for_http());

    match cors_layer(origins) {
        Some(cors) => app.layer(cors),
        None => app,
    }
}

fn cors_layer(origins: &AllowedOrigins) -> Option<CorsLayer> {
    let allow_origin = match origins {
        AllowedOrigins::Disabled => return None,
        AllowedOrigins::Any => AllowOrigin::from(Any),
        AllowedOrigins::List(list) => {
            let values: Vec<HeaderValue> = list
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(%origin, "ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(values)
        }
    };
    Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: WELCOME_MESSAGE.to_string(),
    })
}

async fn predict(
    State(context): State<Arc<PredictionContext>>,
    payload: Result<Json<SimplifiedRecord>, JsonRejection>,
) -> Response {
    let Json(record) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            let message = rejection.body_text();
            tracing::warn!(error = %message, "rejected request body");
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, message);
        }
    };

    match context.predict(&FeatureRecord::from(record)) {
        Ok(price) => Json(PredictionResponse {
            predicted_price: price,
        })
        .into_response(),
        Err(e) => {
            let cause = std::error::Error::source(&e).map(|s| s.to_string());
            tracing::error!(error = %e, cause = ?cause, "prediction failed");
            error_response(status_for(&e), e.to_string())
        }
    }
}

fn status_for(err: &ServingError) -> StatusCode {
    match err {
        ServingError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ServingError::ModelNotLoaded
        | ServingError::ArtifactUnavailable(_)
        | ServingError::ArtifactCorrupt(_)
        | ServingError::SchemaExtraction(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorResponse { error: message })).into_response()
}
