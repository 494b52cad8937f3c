//! モデルメタデータを使用した推論設定
//!
//! 保存されたモデルメタデータを読み込んで推論に必要な情報を取得します。

use anyhow::{Context, Result};
use std::path::Path;

use crate::analyzer::{label_for, FeatureScale};
use crate::model::model_metadata::{ModelMetadata, RecordPrecision};
use crate::model::model_storage;

/// モデルメタデータから推論用情報を取得
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// 全クラスラベル（モデル出力のインデックス順）
    pub class_labels: Vec<String>,

    /// 正規化スケール
    pub feature_scale: FeatureScale,

    pub num_features: usize,
    pub hidden_size: usize,
    pub precision: RecordPrecision,
}

impl InferenceConfig {
    /// メタデータからInferenceConfigを作成
    pub fn from_metadata(metadata: &ModelMetadata) -> Self {
        Self {
            class_labels: metadata.class_labels.clone(),
            feature_scale: metadata.feature_scale,
            num_features: metadata.num_features,
            hidden_size: metadata.hidden_size,
            precision: metadata.precision,
        }
    }

    /// モデルファイルから推論設定を読み込む
    pub fn load_from_model(model_path: &Path) -> Result<Self> {
        let metadata =
            model_storage::load_metadata(model_path).context("Failed to load model metadata")?;
        Ok(Self::from_metadata(&metadata))
    }

    /// クラス数（ラベル表の長さ）
    pub fn num_total_classes(&self) -> usize {
        self.class_labels.len()
    }

    /// クラスインデックスからラベルを取得
    pub fn class_index_to_label(&self, index: usize) -> Option<String> {
        label_for(&self.class_labels, index).ok().map(str::to_string)
    }

    /// ラベルからクラスインデックスを取得
    pub fn label_to_index(&self, label: &str) -> Option<usize> {
        self.class_labels.iter().position(|l| l == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_index_mapping() {
        let config = InferenceConfig::from_metadata(&ModelMetadata::default());
        assert_eq!(config.num_total_classes(), 5);
        assert_eq!(config.class_index_to_label(3).as_deref(), Some("Social Isolation"));
        assert_eq!(config.class_index_to_label(5), None);
        assert_eq!(config.label_to_index("Respiratory Risk"), Some(2));
        assert_eq!(config.label_to_index("Unknown"), None);
    }
}
