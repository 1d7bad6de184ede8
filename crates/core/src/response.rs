use crate::domain::price::Trend;
use crate::query::{QueryError, QueryResult};
use serde::Serialize;

/// Column-oriented payload consumed by the dashboard. Every array has the same length
/// and index `i` describes the same trading day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearResponse {
    pub year: i32,
    pub date: Vec<String>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<u64>,
    pub price_diff: Vec<f64>,
    pub percent_change: Vec<Option<f64>>,
    pub trend: Vec<Trend>,
}

impl From<QueryResult> for YearResponse {
    fn from(result: QueryResult) -> Self {
        let n = result.records.len();
        let mut out = YearResponse {
            year: result.year,
            date: Vec::with_capacity(n),
            open: Vec::with_capacity(n),
            high: Vec::with_capacity(n),
            low: Vec::with_capacity(n),
            close: Vec::with_capacity(n),
            volume: Vec::with_capacity(n),
            price_diff: Vec::with_capacity(n),
            percent_change: Vec::with_capacity(n),
            trend: Vec::with_capacity(n),
        };

        for d in result.records {
            out.date.push(d.record.date.format("%Y-%m-%d").to_string());
            out.open.push(d.record.open);
            out.high.push(d.record.high);
            out.low.push(d.record.low);
            out.close.push(d.record.close);
            out.volume.push(d.record.volume);
            out.price_diff.push(d.price_diff);
            out.percent_change.push(d.percent_change);
            out.trend.push(d.trend);
        }

        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

impl From<&QueryError> for ErrorResponse {
    fn from(err: &QueryError) -> Self {
        Self {
            error: err.to_string(),
            kind: err.kind(),
        }
    }
}
