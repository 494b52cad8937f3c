//! 機械学習モデルの共通定義
//!
//! ウェルネス診断用の全結合モデルと関連する設定を提供します。

use anyhow::Result;
use burn::{
    config::Config,
    module::Module,
    nn::{Linear, LinearConfig, Relu},
    record::{BinBytesRecorder, FullPrecisionSettings, HalfPrecisionSettings, PrecisionSettings, Recorder},
    tensor::{activation::softmax, backend::Backend, Tensor},
};

use crate::analyzer::{NUM_CLASSES, NUM_FEATURES};
use crate::model::{ModelMetadata, RecordPrecision};

/// モデル設定
#[derive(Config, Debug)]
pub struct ModelConfig {
    /// 入力特徴量の次元数
    pub num_features: usize,
    /// 分類クラス数
    pub num_classes: usize,
    /// 隠れ層のユニット数
    #[config(default = 16)]
    pub hidden_size: usize,
}

impl ModelConfig {
    /// 標準構成（4入力・5クラス）
    pub fn standard() -> Self {
        Self::new(NUM_FEATURES, NUM_CLASSES)
    }

    /// メタデータから設定を作成
    pub fn from_metadata(metadata: &ModelMetadata) -> Self {
        Self {
            num_features: metadata.num_features,
            num_classes: metadata.num_classes(),
            hidden_size: metadata.hidden_size,
        }
    }

    /// モデルを初期化
    pub fn init<B: Backend>(&self, device: &B::Device) -> WellnessClassifier<B> {
        WellnessClassifier {
            input: LinearConfig::new(self.num_features, self.hidden_size).init(device),
            hidden: LinearConfig::new(self.hidden_size, self.hidden_size).init(device),
            output: LinearConfig::new(self.hidden_size, self.num_classes).init(device),
            activation: Relu::new(),
        }
    }
}

/// ウェルネス診断モデル
///
/// # アーキテクチャ
/// - FC: 4 -> h + ReLU
/// - FC: h -> h + ReLU
/// - FC: h -> num_classes
/// - Softmax（推論時）
#[derive(Module, Debug)]
pub struct WellnessClassifier<B: Backend> {
    input: Linear<B>,
    hidden: Linear<B>,
    output: Linear<B>,
    activation: Relu,
}

impl<B: Backend> WellnessClassifier<B> {
    /// 順伝播
    ///
    /// # 引数
    /// - `features`: 正規化済み特徴量 [batch_size, num_features]
    ///
    /// # 戻り値
    /// - クラスごとのロジット [batch_size, num_classes]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.input.forward(features);
        let x = self.activation.forward(x);

        let x = self.hidden.forward(x);
        let x = self.activation.forward(x);

        self.output.forward(x)
    }

    /// クラス確率 [batch_size, num_classes]
    pub fn infer(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        softmax(self.forward(features), 1)
    }

    /// 入力次元
    pub fn input_dim(&self) -> usize {
        self.input.weight.val().dims()[0]
    }

    /// 出力次元
    pub fn output_dim(&self) -> usize {
        self.output.weight.val().dims()[1]
    }
}

fn record_bytes<B: Backend, S: PrecisionSettings>(model: &WellnessClassifier<B>) -> Result<Vec<u8>> {
    let recorder = BinBytesRecorder::<S>::default();
    <BinBytesRecorder<S> as Recorder<B>>::record(&recorder, model.clone().into_record(), ())
        .map_err(|e| anyhow::anyhow!("モデル重みの書き出しエラー: {:?}", e))
}

fn load_record_bytes<B: Backend, S: PrecisionSettings>(
    binary: Vec<u8>,
    device: &B::Device,
) -> Result<<WellnessClassifier<B> as Module<B>>::Record> {
    let recorder = BinBytesRecorder::<S>::default();
    <BinBytesRecorder<S> as Recorder<B>>::load(&recorder, binary, device)
        .map_err(|e| anyhow::anyhow!("モデル重みの読み込みエラー: {:?}", e))
}

/// モデルの重みをバイナリに変換
pub fn model_to_bytes<B: Backend>(
    model: &WellnessClassifier<B>,
    precision: RecordPrecision,
) -> Result<Vec<u8>> {
    match precision {
        RecordPrecision::Full => record_bytes::<B, FullPrecisionSettings>(model),
        RecordPrecision::Half => record_bytes::<B, HalfPrecisionSettings>(model),
    }
}

/// メタデータと重みバイナリからモデルを復元
pub fn restore_model<B: Backend>(
    metadata: &ModelMetadata,
    binary: Vec<u8>,
    device: &B::Device,
) -> Result<WellnessClassifier<B>> {
    let model = ModelConfig::from_metadata(metadata).init::<B>(device);

    let record = match metadata.precision {
        RecordPrecision::Full => load_record_bytes::<B, FullPrecisionSettings>(binary, device)?,
        RecordPrecision::Half => load_record_bytes::<B, HalfPrecisionSettings>(binary, device)?,
    };

    Ok(model.load_record(record))
}
