use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use tracing::{error, warn};

use crate::api::{state::AppState, types::*};
use crate::error::PredictError;

/// POST /predict
///
/// The body is taken as raw bytes so that non-JSON input lands on the
/// generic 500 path instead of an extractor rejection.
pub async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> std::result::Result<Json<PredictResponse>, (StatusCode, Json<ErrorResponse>)> {
    let outcome = state.predictor.predict_body(&body);
    state.metrics.record(&outcome);

    match outcome {
        Ok(diagnosis) => Ok(Json(PredictResponse {
            result: diagnosis.to_string(),
        })),
        Err(e) => Err(error_response(&e, state.expose_error_details)),
    }
}

pub fn error_response(
    err: &PredictError,
    expose_details: bool,
) -> (StatusCode, Json<ErrorResponse>) {
    if err.is_client_error() {
        if let PredictError::MissingSymptomKeys { missing } = err {
            warn!(?missing, "Rejected prediction request");
        } else {
            warn!(error = %err, "Rejected prediction request");
        }
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(err.to_string())));
    }

    error!(error = %err, "Prediction request failed");
    let message = if expose_details {
        err.to_string()
    } else {
        err.public_message()
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse::new(message)))
}
