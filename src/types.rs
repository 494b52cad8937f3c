use serde::{Deserialize, Serialize};

/// センサー読み取り値（正規化前）
///
/// 値域の検証は行わない。負値や想定範囲外の値もそのまま扱う。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    pub lux: f32,          // 照度
    pub noise: f32,        // 騒音レベル (dB)
    pub temperature: f32,  // 気温 (℃)
    pub aqi: f32,          // 大気質指数
}

impl RawReading {
    pub fn new(lux: f32, noise: f32, temperature: f32, aqi: f32) -> Self {
        Self { lux, noise, temperature, aqi }
    }
}

/// 検証シナリオ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub reading: RawReading,
    /// 期待されるラベル（モデルの挙動に対する期待値であり、不変条件ではない）
    #[serde(default)]
    pub expected: Option<String>,
}

impl Scenario {
    pub fn new(name: &str, lux: f32, noise: f32, temperature: f32, aqi: f32) -> Self {
        Self {
            name: name.to_string(),
            reading: RawReading::new(lux, noise, temperature, aqi),
            expected: None,
        }
    }

    pub fn expecting(mut self, label: &str) -> Self {
        self.expected = Some(label.to_string());
        self
    }
}

/// 1回の推論結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub index: usize,
    pub label: String,
    /// argmax位置の生の出力値（softmax等の再正規化はしない）
    pub confidence: f32,
    pub scores: Vec<f32>,
}

/// シナリオ評価結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub prediction: Prediction,
    pub expected: Option<String>,
}

impl ScenarioOutcome {
    /// 期待ラベルと一致したか（期待値が無い場合は None）
    pub fn matches_expectation(&self) -> Option<bool> {
        self.expected
            .as_ref()
            .map(|expected| expected == &self.prediction.label)
    }
}
