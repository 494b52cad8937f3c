//! ウェルネス診断の前処理と後処理
//!
//! センサー値の正規化、モデル出力のargmax、ラベル変換、結果行の整形を行う。
//! いずれも状態を持たない純粋関数で、推論ランタイムには依存しない。

use serde::{Deserialize, Serialize};

use crate::error::PredictionError;
use crate::types::{Prediction, RawReading};

/// 入力特徴量の次元数
pub const NUM_FEATURES: usize = 4;

/// クラス数
pub const NUM_CLASSES: usize = 5;

/// クラス名の定義（モデル出力のインデックス順）
pub const CLASS_NAMES: [&str; NUM_CLASSES] = [
    "Ideal",
    "Sensory Overload",
    "Respiratory Risk",
    "Social Isolation",
    "Sleep Disturbance",
];

/// 正規化スケール
///
/// 各センサー値をこの値で割って特徴量にする。クランプはしない。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureScale {
    pub lux: f32,
    pub noise: f32,
    pub temperature: f32,
    pub aqi: f32,
}

impl Default for FeatureScale {
    fn default() -> Self {
        Self {
            lux: 1000.0,
            noise: 100.0,
            temperature: 45.0,
            aqi: 5.0,
        }
    }
}

impl FeatureScale {
    pub fn as_array(&self) -> [f32; NUM_FEATURES] {
        [self.lux, self.noise, self.temperature, self.aqi]
    }

    /// 全スケールが正の有限値か
    pub fn is_valid(&self) -> bool {
        self.as_array().iter().all(|s| s.is_finite() && *s > 0.0)
    }
}

/// 単一の値を正規化
pub fn normalize(value: f32, divisor: f32) -> f32 {
    value / divisor
}

/// センサー値を特徴ベクトルに変換
///
/// 順序: [lux, noise, temperature, aqi]
pub fn normalize_reading(reading: &RawReading, scale: &FeatureScale) -> [f32; NUM_FEATURES] {
    [
        normalize(reading.lux, scale.lux),
        normalize(reading.noise, scale.noise),
        normalize(reading.temperature, scale.temperature),
        normalize(reading.aqi, scale.aqi),
    ]
}

/// 最大値のインデックスを取得
///
/// 同値の最大値が複数ある場合は最小のインデックスを返す。NaNは選ばれない。
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, max)) if v <= max => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// クラスインデックスからラベルを取得
pub fn label_for<S: AsRef<str>>(labels: &[S], index: usize) -> Result<&str, PredictionError> {
    labels
        .get(index)
        .map(|l| l.as_ref())
        .ok_or(PredictionError::LabelOutOfRange {
            index,
            num_labels: labels.len(),
        })
}

/// モデル出力ベクトルから予測結果を組み立てる
pub fn resolve_prediction<S: AsRef<str>>(
    scores: Vec<f32>,
    labels: &[S],
) -> Result<Prediction, PredictionError> {
    if scores.len() != labels.len() && !scores.is_empty() {
        return Err(PredictionError::DimensionMismatch {
            output_dim: scores.len(),
            num_labels: labels.len(),
        });
    }

    let index = argmax(&scores).ok_or(PredictionError::EmptyOutput)?;
    let label = label_for(labels, index)?.to_string();
    let confidence = scores[index];

    Ok(Prediction {
        index,
        label,
        confidence,
        scores,
    })
}

/// 結果行を整形
///
/// 名前は20文字、ラベルは18文字に左寄せで埋める。長い場合は切り詰めない。
pub fn format_result_line(name: &str, label: &str, confidence: f32) -> String {
    format!(
        "Test: {:<20} | Result: {:<18} | Conf: {:.2}",
        name, label, confidence
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_matches_division() {
        let scale = FeatureScale::default();
        for &x in &[0.0f32, 1.0, 5.0, 37.5, 900.0, 12345.0, -3.0] {
            assert_eq!(normalize(x, scale.lux), x / 1000.0);
            assert_eq!(normalize(x, scale.noise), x / 100.0);
            assert_eq!(normalize(x, scale.temperature), x / 45.0);
            assert_eq!(normalize(x, scale.aqi), x / 5.0);
        }
    }

    #[test]
    fn test_normalize_reading_high_light_noise() {
        let features = normalize_reading(
            &RawReading::new(900.0, 85.0, 25.0, 2.0),
            &FeatureScale::default(),
        );
        assert_eq!(features[0], 0.9);
        assert_eq!(features[1], 0.85);
        assert!((features[2] - 0.5556).abs() < 1e-4);
        assert_eq!(features[3], 0.4);
    }

    #[test]
    fn test_normalize_does_not_clamp() {
        let features = normalize_reading(
            &RawReading::new(5000.0, 150.0, -10.0, 12.0),
            &FeatureScale::default(),
        );
        assert_eq!(features[0], 5.0);
        assert_eq!(features[1], 1.5);
        assert!(features[2] < 0.0);
        assert_eq!(features[3], 2.4);
    }

    #[test]
    fn test_argmax_picks_lowest_index_on_tie() {
        assert_eq!(argmax(&[0.1, 0.4, 0.2, 0.4, 0.0]), Some(1));
        assert_eq!(argmax(&[0.5, 0.5, 0.5]), Some(0));
    }

    #[test]
    fn test_argmax_skips_nan_and_handles_empty() {
        assert_eq!(argmax(&[f32::NAN, 0.2, 0.1]), Some(1));
        assert_eq!(argmax(&[f32::NAN]), None);
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[-3.0, -1.0, -2.0]), Some(1));
    }

    #[test]
    fn test_label_for_is_positional() {
        assert_eq!(label_for(&CLASS_NAMES, 0), Ok("Ideal"));
        assert_eq!(label_for(&CLASS_NAMES, 4), Ok("Sleep Disturbance"));
        assert_eq!(
            label_for(&CLASS_NAMES, 5),
            Err(PredictionError::LabelOutOfRange { index: 5, num_labels: 5 })
        );
    }

    #[test]
    fn test_resolve_prediction_reports_raw_confidence() {
        let prediction =
            resolve_prediction(vec![0.05, 0.7, 0.1, 0.1, 0.05], &CLASS_NAMES).unwrap();
        assert_eq!(prediction.index, 1);
        assert_eq!(prediction.label, "Sensory Overload");
        assert_eq!(prediction.confidence, 0.7);
    }

    #[test]
    fn test_resolve_prediction_rejects_mismatched_output() {
        assert_eq!(
            resolve_prediction(vec![0.1, 0.9, 0.0], &CLASS_NAMES),
            Err(PredictionError::DimensionMismatch { output_dim: 3, num_labels: 5 })
        );
        assert_eq!(
            resolve_prediction(Vec::new(), &CLASS_NAMES),
            Err(PredictionError::EmptyOutput)
        );
    }

    #[test]
    fn test_format_result_line_widths() {
        let line = format_result_line("Dark + Quiet", "Social Isolation", 0.876);
        assert_eq!(
            line,
            "Test: Dark + Quiet         | Result: Social Isolation   | Conf: 0.88"
        );

        let name_field = &line["Test: ".len().."Test: ".len() + 20];
        assert_eq!(name_field, "Dark + Quiet        ");
    }

    #[test]
    fn test_format_result_line_keeps_long_names() {
        let name = "A very long scenario name";
        let line = format_result_line(name, "Ideal", 1.0);
        assert!(line.starts_with("Test: A very long scenario name | Result: Ideal "));
        assert!(line.ends_with("| Conf: 1.00"));
    }
}
