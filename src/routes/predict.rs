use crate::{
    model_service::InferenceError,
    pipeline::{PredictError, Prediction},
    presentation::render_page,
    server::SharedState,
};
use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    response::Html,
};
use std::time::Instant;
use tracing::instrument;

const UPLOAD_FIELD: &str = "imagefile";

struct Upload {
    filename: String,
    bytes: Bytes,
}

/// Always answers 200: failures are rendered inline as `Error: <message>`.
#[instrument(skip(state, multipart))]
pub async fn predict(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Html<String> {
    let started = Instant::now();

    match run_prediction(&state, multipart).await {
        Ok(prediction) => {
            let emotion = prediction.emotion.as_str();
            state.metrics.record_prediction(emotion);
            state
                .metrics
                .record_prediction_duration(started.elapsed().as_millis() as u64);
            tracing::info!("Predicted {} for {}", emotion, prediction.image.url);

            render_page(Some(emotion), Some(&prediction.image.url))
        }
        Err(e) => {
            tracing::error!("Prediction error: {}", e);
            state.metrics.record_error(e.kind());

            render_page(Some(&format!("Error: {}", e)), None)
        }
    }
}

async fn run_prediction(
    state: &SharedState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Prediction, PredictError> {
    let multipart = multipart.map_err(|e| PredictError::Upload(e.body_text()))?;
    let upload = read_upload(multipart).await?;

    let pipeline = state.pipeline.clone();
    tokio::task::spawn_blocking(move || pipeline.run(&upload.filename, &upload.bytes))
        .await
        .map_err(|e| InferenceError::Run(format!("prediction task failed: {}", e)))?
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, PredictError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PredictError::Upload(e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| PredictError::Upload(e.body_text()))?;

        return Ok(Upload { filename, bytes });
    }

    Err(PredictError::MissingUpload)
}
