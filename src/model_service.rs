use ndarray::Array4;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("session mutex poisoned: {0}")]
    Poisoned(String),
    #[error("failed to build tensor: {0}")]
    Tensor(String),
    #[error("inference failed: {0}")]
    Run(String),
    #[error("failed to extract tensor: {0}")]
    Extract(String),
    #[error("model returned {0} scores, expected 7")]
    UnexpectedOutput(usize),
}

/// A loaded classifier mapping a `(1, 48, 48, 1)` grayscale tensor to one
/// score per emotion class.
pub trait EmotionModel: Send + Sync + 'static {
    fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>, InferenceError>;
}
