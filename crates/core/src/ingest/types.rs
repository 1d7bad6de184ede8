use serde::Deserialize;

/// One CSV row as exported by Yahoo Finance. Columns not listed here are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct CsvPriceRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "High")]
    pub high: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "Volume")]
    pub volume: String,
}
