//! モデル推論機能

use anyhow::{Context, Result};
use burn::tensor::{backend::Backend, Tensor};
use burn_ndarray::{NdArray, NdArrayDevice};
use burn_wgpu::{Wgpu, WgpuDevice};
use std::path::Path;

use crate::analyzer::{normalize_reading, resolve_prediction, NUM_FEATURES};
use crate::error::PredictionError;
use crate::ml::{restore_model, WellnessClassifier};
use crate::model::{load_model_with_metadata, log_metadata_info, DeviceType, InferenceConfig, ModelMetadata};
use crate::scenario::WellnessPredictor;
use crate::types::{Prediction, RawReading};

/// 推論エンジン
///
/// モデルは読み込み後は変更しない。
pub enum InferenceEngine {
    Wgpu {
        model: WellnessClassifier<Wgpu>,
        config: InferenceConfig,
        device: WgpuDevice,
    },
    NdArray {
        model: WellnessClassifier<NdArray>,
        config: InferenceConfig,
        device: NdArrayDevice,
    },
}

/// 復元したモデルがメタデータと整合しているか
fn check_model_shape<B: Backend>(model: &WellnessClassifier<B>, metadata: &ModelMetadata) -> Result<()> {
    if model.input_dim() != NUM_FEATURES {
        anyhow::bail!(
            "モデルの入力次元が不正です: {} (期待: {})",
            model.input_dim(),
            NUM_FEATURES
        );
    }
    if model.output_dim() != metadata.num_classes() {
        return Err(PredictionError::DimensionMismatch {
            output_dim: model.output_dim(),
            num_labels: metadata.num_classes(),
        }
        .into());
    }
    Ok(())
}

fn build_model<B: Backend>(
    metadata: &ModelMetadata,
    binary: Vec<u8>,
    device: &B::Device,
) -> Result<WellnessClassifier<B>> {
    let model = restore_model::<B>(metadata, binary, device)?;
    check_model_shape(&model, metadata)?;
    Ok(model)
}

/// 1バッチ分の推論を実行し、行ごとの出力ベクトルを返す
fn run_batch<B: Backend>(
    model: &WellnessClassifier<B>,
    device: &B::Device,
    features: &[[f32; NUM_FEATURES]],
) -> Result<Vec<Vec<f32>>> {
    if features.is_empty() {
        return Ok(Vec::new());
    }

    let flat: Vec<f32> = features.iter().flatten().copied().collect();
    let tensor = Tensor::<B, 1>::from_floats(flat.as_slice(), device)
        .reshape([features.len(), NUM_FEATURES]);

    let output = model.infer(tensor);
    let [_, num_classes] = output.dims();

    let values = output
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| anyhow::anyhow!("推論結果の取得エラー: {:?}", e))?;

    Ok(values.chunks(num_classes).map(|row| row.to_vec()).collect())
}

impl InferenceEngine {
    /// モデルを読み込んで推論エンジンを初期化（CPU）
    pub fn load<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        Self::load_with_backend(model_path.as_ref(), false)
    }

    /// 設定のデバイス種別で初期化
    pub fn load_for_device<P: AsRef<Path>>(model_path: P, device_type: DeviceType) -> Result<Self> {
        Self::load_with_backend(model_path.as_ref(), device_type == DeviceType::Wgpu)
    }

    /// バックエンドを指定して初期化
    pub fn load_with_backend(model_path: &Path, use_gpu: bool) -> Result<Self> {
        let (metadata, binary) = load_model_with_metadata(model_path)
            .with_context(|| format!("モデルの読み込みに失敗しました: {}", model_path.display()))?;
        metadata.validate().context("モデルメタデータが不正です")?;
        log_metadata_info(&metadata);

        let config = InferenceConfig::from_metadata(&metadata);

        let engine = if use_gpu {
            let device = WgpuDevice::default();
            let model = build_model::<Wgpu>(&metadata, binary, &device)?;
            InferenceEngine::Wgpu { model, config, device }
        } else {
            let device = NdArrayDevice::Cpu;
            let model = build_model::<NdArray>(&metadata, binary, &device)?;
            InferenceEngine::NdArray { model, config, device }
        };

        tracing::info!(backend = engine.backend_name(), "推論エンジンを初期化しました");
        Ok(engine)
    }

    /// InferenceConfigへの参照を取得
    pub fn config(&self) -> &InferenceConfig {
        match self {
            InferenceEngine::Wgpu { config, .. } => config,
            InferenceEngine::NdArray { config, .. } => config,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            InferenceEngine::Wgpu { .. } => "wgpu",
            InferenceEngine::NdArray { .. } => "ndarray",
        }
    }

    /// 正規化済み特徴量を推論し、出力ベクトルをそのまま返す
    pub fn infer(&self, features: &[f32; NUM_FEATURES]) -> Result<Vec<f32>> {
        self.infer_batch(std::slice::from_ref(features))?
            .pop()
            .ok_or_else(|| PredictionError::EmptyOutput.into())
    }

    /// 複数行をまとめて推論
    pub fn infer_batch(&self, features: &[[f32; NUM_FEATURES]]) -> Result<Vec<Vec<f32>>> {
        match self {
            InferenceEngine::Wgpu { model, device, .. } => run_batch(model, device, features),
            InferenceEngine::NdArray { model, device, .. } => run_batch(model, device, features),
        }
    }

    /// 複数の読み取り値をバッチ分類
    pub fn predict_batch(&self, readings: &[RawReading]) -> Result<Vec<Prediction>> {
        let scale = &self.config().feature_scale;
        let features: Vec<[f32; NUM_FEATURES]> =
            readings.iter().map(|r| normalize_reading(r, scale)).collect();

        self.infer_batch(&features)?
            .into_iter()
            .map(|scores| {
                resolve_prediction(scores, &self.config().class_labels).map_err(anyhow::Error::from)
            })
            .collect()
    }
}

impl WellnessPredictor for InferenceEngine {
    fn predict(&self, reading: &RawReading) -> Result<Prediction> {
        let features = normalize_reading(reading, &self.config().feature_scale);
        let scores = self.infer(&features)?;
        Ok(resolve_prediction(scores, &self.config().class_labels)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::{model_to_bytes, ModelConfig};
    use crate::model::{save_model_with_metadata, RecordPrecision};
    use crate::scenario::{default_scenarios, run_scenarios};

    /// ランダム初期化したモデルをアーカイブとして保存
    fn write_model(dir: &Path, metadata: &ModelMetadata) -> std::path::PathBuf {
        let device = NdArrayDevice::Cpu;
        let model = ModelConfig::new(NUM_FEATURES, metadata.num_classes())
            .with_hidden_size(metadata.hidden_size)
            .init::<NdArray>(&device);
        let bytes = model_to_bytes(&model, metadata.precision).unwrap();
        save_model_with_metadata(&dir.join("wellness"), metadata, &bytes).unwrap()
    }

    #[test]
    fn test_predict_matches_raw_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model(dir.path(), &ModelMetadata::default());
        let engine = InferenceEngine::load(&path).unwrap();
        assert_eq!(engine.backend_name(), "ndarray");

        let reading = RawReading::new(900.0, 85.0, 25.0, 2.0);
        let prediction = engine.predict(&reading).unwrap();

        let features = normalize_reading(&reading, &engine.config().feature_scale);
        let scores = engine.infer(&features).unwrap();
        assert_eq!(scores.len(), 5);
        assert_eq!(prediction.scores, scores);
        assert_eq!(prediction.confidence, scores[prediction.index]);
        assert!(scores.iter().all(|s| *s <= prediction.confidence));
        assert_eq!(
            engine.config().class_index_to_label(prediction.index),
            Some(prediction.label.clone())
        );
    }

    #[test]
    fn test_batch_agrees_with_single() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model(dir.path(), &ModelMetadata::default());
        let engine = InferenceEngine::load(&path).unwrap();

        let readings: Vec<RawReading> = default_scenarios().iter().map(|s| s.reading).collect();
        let batch = engine.predict_batch(&readings).unwrap();
        assert_eq!(batch.len(), 4);

        for (reading, from_batch) in readings.iter().zip(batch.iter()) {
            let single = engine.predict(reading).unwrap();
            assert_eq!(single.index, from_batch.index);
            assert!((single.confidence - from_batch.confidence).abs() < 1e-6);
        }
    }

    #[test]
    fn test_scenarios_are_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model(dir.path(), &ModelMetadata::default());
        let engine = InferenceEngine::load(&path).unwrap();

        let mut first = Vec::new();
        let mut second = Vec::new();
        run_scenarios(&engine, &default_scenarios(), &mut first).unwrap();
        run_scenarios(&engine, &default_scenarios(), &mut second).unwrap();
        assert_eq!(first, second);
        assert_eq!(String::from_utf8(first).unwrap().lines().count(), 5);
    }

    #[test]
    fn test_half_precision_model_loads() {
        let dir = tempfile::tempdir().unwrap();
        let metadata = ModelMetadata::new(
            ModelMetadata::default().class_labels,
            8,
            RecordPrecision::Half,
        );
        let path = write_model(dir.path(), &metadata);
        let engine = InferenceEngine::load(&path).unwrap();
        assert_eq!(engine.config().precision, RecordPrecision::Half);
        assert!(engine.predict(&RawReading::new(5.0, 20.0, 22.0, 1.0)).is_ok());
    }

    #[test]
    fn test_rejects_label_table_mismatch() {
        let device = NdArrayDevice::Cpu;
        let model = ModelConfig::new(NUM_FEATURES, 5).init::<NdArray>(&device);

        let mut metadata = ModelMetadata::default();
        assert!(check_model_shape(&model, &metadata).is_ok());

        metadata.class_labels.truncate(4);
        let err = check_model_shape(&model, &metadata).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PredictionError>(),
            Some(PredictionError::DimensionMismatch { output_dim: 5, num_labels: 4 })
        ));
    }

    #[test]
    fn test_missing_model_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(InferenceEngine::load(dir.path().join("absent.tar.gz")).is_err());
    }
}
