pub mod types;
pub mod error;
pub mod csv_loader;
pub mod logging;
pub mod scenario;

// 前処理・後処理とモデル関連のモジュール
pub mod analyzer;
pub mod model;
#[cfg(feature = "ml")]
pub mod ml;

pub use error::PredictionError;
pub use scenario::{default_scenarios, run_scenarios, VerificationSummary, WellnessPredictor};
pub use types::{Prediction, RawReading, Scenario, ScenarioOutcome};
