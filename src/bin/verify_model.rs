//! ウェルネス診断モデルの検証ツール
//!
//! モデルを読み込み、検証シナリオを順に推論して結果を標準出力に表示する。

#[cfg(feature = "ml")]
mod cli {
    use anyhow::{Context, Result};
    use clap::Parser;
    use std::path::PathBuf;

    use chetna_wellness_lib::csv_loader::load_scenarios;
    use chetna_wellness_lib::logging::setup_logging;
    use chetna_wellness_lib::ml::InferenceEngine;
    use chetna_wellness_lib::model::{AppConfig, DeviceType};
    use chetna_wellness_lib::scenario::{default_scenarios, run_scenarios};

    fn parse_device(name: &str) -> Result<DeviceType, String> {
        DeviceType::parse(name).ok_or_else(|| format!("unknown backend: {} (cpu|wgpu)", name))
    }

    /// Verify a wellness diagnostic model against test scenarios
    #[derive(Parser, Debug)]
    #[command(name = "verify_model", version)]
    pub struct Args {
        /// Model archive (.tar.gz)
        #[arg(short, long, value_name = "FILE")]
        model: Option<PathBuf>,

        /// JSON config file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Inference backend: cpu | wgpu
        #[arg(short, long, value_parser = parse_device)]
        backend: Option<DeviceType>,

        /// Scenario CSV (name,lux,noise,temperature,aqi[,expected])
        #[arg(short, long, value_name = "FILE")]
        scenarios: Option<PathBuf>,

        /// Exit with an error when a result differs from its expected label
        #[arg(long)]
        strict: bool,

        /// Debug logging
        #[arg(short, long)]
        verbose: bool,
    }

    pub fn run(args: Args) -> Result<()> {
        setup_logging(args.verbose)?;

        let config_path = args.config.clone().unwrap_or_else(AppConfig::default_path);
        let mut config = AppConfig::load_or_default(&config_path);

        if let Some(model) = &args.model {
            config.set_model_path(model.to_string_lossy().to_string());
        }
        if let Some(device_type) = args.backend {
            config.set_device_type(device_type);
        }
        if let Some(scenarios) = &args.scenarios {
            config.scenarios_path = Some(scenarios.to_string_lossy().to_string());
        }
        config.log_summary();

        let scenarios = match &config.scenarios_path {
            Some(path) => load_scenarios(&PathBuf::from(path))?,
            None => default_scenarios(),
        };

        let engine = InferenceEngine::load_for_device(&config.model.model_path, config.device_type)?;

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let summary = run_scenarios(&engine, &scenarios, &mut out)
            .context("シナリオの評価中にエラーが発生しました")?;

        tracing::info!(
            total = summary.total,
            matched = summary.matched,
            mismatched = summary.mismatches.len(),
            "検証完了"
        );

        if args.strict && !summary.all_matched() {
            anyhow::bail!(
                "{}件のシナリオが期待ラベルと一致しませんでした",
                summary.mismatches.len()
            );
        }

        Ok(())
    }
}

#[cfg(feature = "ml")]
fn main() -> anyhow::Result<()> {
    use clap::Parser;
    cli::run(cli::Args::parse())
}

#[cfg(not(feature = "ml"))]
fn main() {
    eprintln!("ML機能が有効化されていません");
    std::process::exit(1);
}
