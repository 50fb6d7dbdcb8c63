mod emotion;
mod image_store;
mod model_service;
mod ort_service;
mod pipeline;
mod prediction_log;
mod preprocess;
mod presentation;
mod routes;
mod server;
mod telemetry;

pub mod app;
pub mod config;

pub use app::start_app;
pub use emotion::Emotion;
pub use image_store::ImageStore;
pub use model_service::{EmotionModel, InferenceError};
pub use pipeline::{PredictError, Prediction, PredictionPipeline};
pub use prediction_log::{LogError, PredictionLog};
