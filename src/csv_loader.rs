use crate::types::{RawReading, Scenario};
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use std::path::Path;

const COLUMNS: [&str; 5] = ["name", "lux", "noise", "temperature", "aqi"];

fn parse_field(record: &StringRecord, index: usize, column: &str, line: u64) -> Result<f32> {
    let raw = record
        .get(index)
        .ok_or_else(|| anyhow::anyhow!("{}行目: {} がありません", line, column))?;
    raw.trim()
        .parse::<f32>()
        .with_context(|| format!("{}行目: {} の値が数値ではありません: {:?}", line, column, raw))
}

/// シナリオCSVを読み込む
///
/// ヘッダー: name,lux,noise,temperature,aqi[,expected]
pub fn load_scenarios(path: &Path) -> Result<Vec<Scenario>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open scenario CSV: {:?}", path))?;

    let headers = reader.headers()?.clone();
    for (i, expected) in COLUMNS.iter().enumerate() {
        if headers.get(i) != Some(*expected) {
            anyhow::bail!(
                "CSVヘッダーが不正です: {:?} (期待: {}[,expected])",
                headers,
                COLUMNS.join(",")
            );
        }
    }
    let has_expected = headers.get(5) == Some("expected");

    let mut scenarios = Vec::new();

    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let name = record
            .get(0)
            .ok_or_else(|| anyhow::anyhow!("{}行目: name がありません", line))?
            .to_string();

        let reading = RawReading {
            lux: parse_field(&record, 1, "lux", line)?,
            noise: parse_field(&record, 2, "noise", line)?,
            temperature: parse_field(&record, 3, "temperature", line)?,
            aqi: parse_field(&record, 4, "aqi", line)?,
        };

        // 空欄は期待値なし
        let expected = if has_expected {
            record.get(5).filter(|s| !s.is_empty()).map(str::to_string)
        } else {
            None
        };

        scenarios.push(Scenario { name, reading, expected });
    }

    Ok(scenarios)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_csv(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenarios.csv");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_with_expected_column() {
        let (_dir, path) = write_csv(
            "name,lux,noise,temperature,aqi,expected\n\
             Bright Office,800,60,23,1,Ideal\n\
             Smoky Kitchen,300,55,30,4.5,\n",
        );
        let scenarios = load_scenarios(&path).unwrap();
        assert_eq!(scenarios.len(), 2);
        assert_eq!(scenarios[0].name, "Bright Office");
        assert_eq!(scenarios[0].reading, RawReading::new(800.0, 60.0, 23.0, 1.0));
        assert_eq!(scenarios[0].expected.as_deref(), Some("Ideal"));
        assert_eq!(scenarios[1].reading.aqi, 4.5);
        assert!(scenarios[1].expected.is_none());
    }

    #[test]
    fn test_load_without_expected_column() {
        let (_dir, path) = write_csv("name,lux,noise,temperature,aqi\nNight, 0 , 15, 18, 1\n");
        let scenarios = load_scenarios(&path).unwrap();
        assert_eq!(scenarios.len(), 1);
        assert_eq!(scenarios[0].reading.lux, 0.0);
        assert!(scenarios[0].expected.is_none());
    }

    #[test]
    fn test_rejects_bad_header_and_values() {
        let (_dir, path) = write_csv("label,lux,noise,temperature,aqi\nx,1,2,3,4\n");
        assert!(load_scenarios(&path).is_err());

        let (_dir, path) = write_csv("name,lux,noise,temperature,aqi\nx,loud,2,3,4\n");
        let err = load_scenarios(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("lux"));
    }
}
