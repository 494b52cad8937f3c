//! ログ初期化
//!
//! 診断ログは標準エラーに出力し、標準出力は結果行専用にする。

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// ログを初期化
///
/// RUST_LOG が設定されていればそれを優先する。
pub fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false).compact())
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {e}"))?;

    Ok(())
}
