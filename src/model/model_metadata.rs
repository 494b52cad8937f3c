//! モデルメタデータの定義
//!
//! tar.gz形式でモデルと関連するメタデータを保存・読み込みします。
//!
//! ## 入力の仕様
//! - 特徴量: [lux, noise, temperature, aqi] をそれぞれ feature_scale で割った値
//! - 出力: class_labels と同じ順序のクラススコア

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analyzer::{FeatureScale, CLASS_NAMES, NUM_FEATURES};

/// 重みの保存精度
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordPrecision {
    /// f32
    #[default]
    Full,
    /// f16（量子化済みのコンパクト版）
    Half,
}

impl std::fmt::Display for RecordPrecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordPrecision::Full => write!(f, "full (f32)"),
            RecordPrecision::Half => write!(f, "half (f16)"),
        }
    }
}

fn default_class_labels() -> Vec<String> {
    CLASS_NAMES.iter().map(|s| s.to_string()).collect()
}

fn default_num_features() -> usize {
    NUM_FEATURES
}

fn default_hidden_size() -> usize {
    16
}

/// モデルメタデータ
///
/// tar.gz形式で保存される情報：
/// - metadata.json: このメタデータ（JSON形式）
/// - model.bin: モデルの重み（バイナリ）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// 全クラスラベル（モデル出力のインデックス順）
    #[serde(default = "default_class_labels")]
    pub class_labels: Vec<String>,

    /// 入力特徴量の次元数（常に4）
    #[serde(default = "default_num_features")]
    pub num_features: usize,

    /// 隠れ層のユニット数
    #[serde(default = "default_hidden_size")]
    pub hidden_size: usize,

    /// 重みの保存精度
    #[serde(default)]
    pub precision: RecordPrecision,

    /// 学習時に使用した正規化スケール
    #[serde(default)]
    pub feature_scale: FeatureScale,

    /// モデルの書き出し時刻（ISO8601形式）
    pub exported_at: String,
}

impl Default for ModelMetadata {
    fn default() -> Self {
        Self::new(default_class_labels(), default_hidden_size(), RecordPrecision::Full)
    }
}

impl ModelMetadata {
    /// 新しいメタデータを作成
    pub fn new(class_labels: Vec<String>, hidden_size: usize, precision: RecordPrecision) -> Self {
        let exported_at = chrono::Local::now().to_rfc3339();

        Self {
            class_labels,
            num_features: NUM_FEATURES,
            hidden_size,
            precision,
            feature_scale: FeatureScale::default(),
            exported_at,
        }
    }

    /// クラス数（モデルの出力次元）
    pub fn num_classes(&self) -> usize {
        self.class_labels.len()
    }

    /// 推論に使える内容か検証
    pub fn validate(&self) -> Result<()> {
        if self.class_labels.is_empty() {
            anyhow::bail!("クラスラベルが空です");
        }
        if self.num_features != NUM_FEATURES {
            anyhow::bail!(
                "入力次元が不正です: {} (期待: {})",
                self.num_features,
                NUM_FEATURES
            );
        }
        if self.hidden_size == 0 {
            anyhow::bail!("隠れ層のユニット数が0です");
        }
        if !self.feature_scale.is_valid() {
            anyhow::bail!("正規化スケールが不正です: {:?}", self.feature_scale);
        }
        Ok(())
    }

    /// メタデータをJSON文字列に変換
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize metadata to JSON")
    }

    /// JSON文字列からメタデータを生成
    pub fn from_json_string(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to deserialize metadata from JSON")
    }
}
