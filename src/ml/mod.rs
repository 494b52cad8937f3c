pub mod ml_model;
pub mod inference;

pub use ml_model::{model_to_bytes, restore_model, ModelConfig, WellnessClassifier};
pub use inference::InferenceEngine;
