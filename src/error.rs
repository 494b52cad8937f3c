//! 推論結果の解釈で発生するエラー

use thiserror::Error;

/// 出力ベクトルからラベルを決定する際のエラー
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    /// モデル出力が空
    #[error("モデル出力が空です")]
    EmptyOutput,

    /// argmaxがラベル表の範囲外
    #[error("クラスインデックス {index} は範囲外です (ラベル数: {num_labels})")]
    LabelOutOfRange { index: usize, num_labels: usize },

    /// 出力次元とラベル表の長さが一致しない
    #[error("出力次元 {output_dim} とラベル数 {num_labels} が一致しません")]
    DimensionMismatch { output_dim: usize, num_labels: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PredictionError::LabelOutOfRange { index: 7, num_labels: 5 };
        assert_eq!(err.to_string(), "クラスインデックス 7 は範囲外です (ラベル数: 5)");
    }

    #[test]
    fn test_error_converts_into_anyhow() {
        let err: anyhow::Error = PredictionError::EmptyOutput.into();
        assert!(err.downcast_ref::<PredictionError>().is_some());
    }
}
