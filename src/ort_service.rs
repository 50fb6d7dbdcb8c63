use crate::{
    config::ModelConfig,
    model_service::{EmotionModel, InferenceError},
};
use ndarray::Array4;
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use std::{
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("invalid model configuration: {0}")]
    Config(String),
    #[error("failed to load model {path}: {reason}")]
    Session { path: String, reason: String },
}

fn load_error(path: &Path, err: impl std::fmt::Display) -> ModelLoadError {
    ModelLoadError::Session {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

#[derive(Clone)]
pub struct OrtModelService {
    sessions: Arc<Vec<Arc<Mutex<Session>>>>,
    counter: Arc<AtomicUsize>,
}

impl OrtModelService {
    pub fn new(model_config: &ModelConfig) -> Result<Self, ModelLoadError> {
        model_config.validate().map_err(ModelLoadError::Config)?;

        let path = model_config.get_path();
        let num_instances = model_config.num_instances;
        let sessions = (0..num_instances)
            .map(|_| {
                let session = Session::builder()
                    .map_err(|e| load_error(&path, e))?
                    .with_optimization_level(GraphOptimizationLevel::Level3)
                    .map_err(|e| load_error(&path, e))?
                    .commit_from_file(&path)
                    .map_err(|e| load_error(&path, e))?;
                Ok(Arc::new(Mutex::new(session)))
            })
            .collect::<Result<Vec<_>, ModelLoadError>>()?;

        tracing::info!("Created {} ONNX sessions from {:?}", num_instances, path);

        Ok(Self {
            counter: Arc::new(AtomicUsize::new(0)),
            sessions: Arc::new(sessions),
        })
    }
}

impl EmotionModel for OrtModelService {
    fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>, InferenceError> {
        let index = self.counter.fetch_add(1, Ordering::SeqCst) % self.sessions.len();
        let mut session = self.sessions[index]
            .lock()
            .map_err(|e| InferenceError::Poisoned(e.to_string()))?;

        tracing::debug!("Handling request with session {}", index);
        let owned_buffer;
        let input_view = if input.view().is_standard_layout() {
            input.view()
        } else {
            owned_buffer = input.as_standard_layout().to_owned();
            owned_buffer.view()
        };

        let tensor_ref = TensorRef::from_array_view(input_view)
            .map_err(|e| InferenceError::Tensor(e.to_string()))?;

        let outputs = session
            .run(ort::inputs![tensor_ref])
            .map_err(|e| InferenceError::Run(e.to_string()))?;

        let (_, scores) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::Extract(e.to_string()))?;

        Ok(scores.to_vec())
    }
}
