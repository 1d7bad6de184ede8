use crate::dataset::Dataset;
use crate::domain::price::PriceRecord;
use crate::ingest::types::CsvPriceRow;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::io::Read;
use std::path::PathBuf;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[async_trait::async_trait]
pub trait DatasetLoader: Send + Sync {
    fn source_name(&self) -> String;

    async fn load(&self) -> Result<Dataset>;
}

/// Loads a Yahoo-Finance-style daily CSV (`Date,Open,High,Low,Close,Adj Close,Volume`).
#[derive(Debug, Clone)]
pub struct CsvFileLoader {
    path: PathBuf,
}

impl CsvFileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl DatasetLoader for CsvFileLoader {
    fn source_name(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> Result<Dataset> {
        let t0 = std::time::Instant::now();
        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("failed to read price data {}", self.path.display()))?;

        let dataset = parse_csv(bytes.as_slice())
            .with_context(|| format!("failed to parse price data {}", self.path.display()))?;

        tracing::info!(
            path = %self.path.display(),
            records = dataset.len(),
            first_date = ?dataset.first_date(),
            last_date = ?dataset.last_date(),
            elapsed_ms = t0.elapsed().as_millis(),
            "price dataset loaded"
        );
        Ok(dataset)
    }
}

pub fn parse_csv<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = ::csv::ReaderBuilder::new()
        .trim(::csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (idx, row) in rdr.deserialize::<CsvPriceRow>().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let row = row.with_context(|| format!("malformed CSV row at line {line}"))?;
        let record = row_to_record(row).with_context(|| format!("invalid price row at line {line}"))?;
        if record.open == 0.0 {
            tracing::warn!(line, date = %record.date, "zero open price; percent change undefined");
        }
        records.push(record);
    }

    Dataset::new(records)
}

fn row_to_record(row: CsvPriceRow) -> Result<PriceRecord> {
    let date = NaiveDate::parse_from_str(&row.date, DATE_FORMAT)
        .with_context(|| format!("invalid date {:?}", row.date))?;

    for (name, v) in [
        ("Open", row.open),
        ("High", row.high),
        ("Low", row.low),
        ("Close", row.close),
    ] {
        anyhow::ensure!(
            v.is_finite() && v >= 0.0,
            "{name} must be a non-negative number (got {v})"
        );
    }

    Ok(PriceRecord {
        date,
        open: row.open,
        high: row.high,
        low: row.low,
        close: row.close,
        volume: parse_volume(&row.volume)?,
    })
}

fn parse_volume(s: &str) -> Result<u64> {
    if let Ok(v) = s.parse::<u64>() {
        return Ok(v);
    }

    // Some exports write integral volumes as floats ("1234.0").
    let f = s
        .parse::<f64>()
        .with_context(|| format!("invalid volume {s:?}"))?;
    anyhow::ensure!(
        f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64,
        "volume must be a non-negative integer (got {s:?})"
    );
    Ok(f as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
Date,Open,High,Low,Close,Adj Close,Volume
2020-01-03,88.1,90.8,87.38,88.6,88.6,88892500
2020-01-02,84.9,86.13,84.34,86.05,86.05,47660500
2019-12-31,81.0,84.26,80.42,83.67,83.67,51428500
";

    #[test]
    fn parses_and_orders_rows() {
        let ds = parse_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.first_date(), NaiveDate::from_ymd_opt(2019, 12, 31));

        let y2020 = ds.records_for_year(2020);
        assert_eq!(y2020.len(), 2);
        assert_eq!(y2020[0].date, NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
        assert_eq!(y2020[0].open, 84.9);
        assert_eq!(y2020[0].volume, 47_660_500);
    }

    #[test]
    fn accepts_float_formatted_volume() {
        let csv = "Date,Open,High,Low,Close,Volume\n2020-01-02,1,2,0.5,1.5,1200.0\n";
        let ds = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(ds.records()[0].volume, 1200);
    }

    #[test]
    fn accepts_zero_open() {
        let csv = "Date,Open,High,Low,Close,Volume\n2020-01-02,0,5,0,5,10\n";
        let ds = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(ds.records()[0].open, 0.0);
    }

    #[test]
    fn rejects_bad_rows_with_line_number() {
        let csv = "Date,Open,High,Low,Close,Volume\n2020-01-02,1,2,0.5,1.5,10\n2020-13-40,1,2,0.5,1.5,10\n";
        let err = parse_csv(csv.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("line 3"));

        let csv = "Date,Open,High,Low,Close,Volume\n2020-01-02,-1,2,0.5,1.5,10\n";
        assert!(parse_csv(csv.as_bytes()).is_err());

        let csv = "Date,Open,High,Low,Close,Volume\n2020-01-02,1,2,0.5,1.5,12.5\n";
        assert!(parse_csv(csv.as_bytes()).is_err());
    }

    #[test]
    fn rejects_duplicate_dates() {
        let csv = "Date,Open,High,Low,Close,Volume\n2020-01-02,1,2,0.5,1.5,10\n2020-01-02,1,2,0.5,1.5,10\n";
        assert!(parse_csv(csv.as_bytes()).is_err());
    }

    #[tokio::test]
    async fn file_loader_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let loader = CsvFileLoader::new(file.path());
        let ds = loader.load().await.unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(loader.source_name(), file.path().display().to_string());
    }

    #[tokio::test]
    async fn file_loader_reports_missing_file() {
        let loader = CsvFileLoader::new("/definitely/not/here.csv");
        let err = loader.load().await.unwrap_err();
        assert!(err.to_string().contains("failed to read price data"));
    }
}
