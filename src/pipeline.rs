use crate::{
    emotion::Emotion,
    image_store::{ImageStore, StoredImage},
    model_service::{EmotionModel, InferenceError},
    prediction_log::PredictionLog,
    preprocess::{image_to_tensor, DecodeError},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("no file uploaded in form field 'imagefile'")]
    MissingUpload,
    #[error("failed to read upload: {0}")]
    Upload(String),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Decode(#[from] DecodeError),
    #[error("{0}")]
    Inference(#[from] InferenceError),
}

impl PredictError {
    pub fn kind(&self) -> &'static str {
        match self {
            PredictError::MissingUpload => "missing_upload",
            PredictError::Upload(_) => "upload",
            PredictError::Io(_) => "io",
            PredictError::Decode(_) => "decode",
            PredictError::Inference(_) => "inference",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Prediction {
    pub emotion: Emotion,
    pub image: StoredImage,
}

/// Store, preprocess, infer and log one uploaded image.
///
/// Every step blocks; callers on the async runtime should run it through
/// `spawn_blocking`.
#[derive(Clone)]
pub struct PredictionPipeline {
    model: Arc<dyn EmotionModel>,
    image_store: ImageStore,
    prediction_log: PredictionLog,
}

impl PredictionPipeline {
    pub fn new(
        model: impl EmotionModel,
        image_store: ImageStore,
        prediction_log: PredictionLog,
    ) -> Self {
        Self {
            model: Arc::new(model),
            image_store,
            prediction_log,
        }
    }

    pub fn image_store(&self) -> &ImageStore {
        &self.image_store
    }

    #[instrument(skip(self, image_data), fields(size = image_data.len()))]
    pub fn run(&self, filename: &str, image_data: &[u8]) -> Result<Prediction, PredictError> {
        let image = self.image_store.store(filename, image_data)?;

        let input = image_to_tensor(image_data)?;
        let scores = self.model.predict(&input)?;
        let emotion = Emotion::from_scores(&scores)
            .ok_or(InferenceError::UnexpectedOutput(scores.len()))?;
        tracing::debug!("Scores {:?} resolved to {}", scores, emotion);

        let stored_path = image.path.to_string_lossy();
        if let Err(e) = self.prediction_log.append(&stored_path, emotion.as_str()) {
            tracing::warn!("Failed to log prediction for {}: {}", stored_path, e);
        }

        Ok(Prediction { emotion, image })
    }
}
