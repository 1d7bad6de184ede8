use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day of OHLCV data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Bullish,
    Bearish,
}

impl Trend {
    /// Strictly rising days are bullish; a flat day counts as bearish.
    pub fn classify(open: f64, close: f64) -> Self {
        if close > open {
            Trend::Bullish
        } else {
            Trend::Bearish
        }
    }
}

/// How percent change is reported for a day whose open price is zero.
///
/// The division is undefined there. Either way only that record is affected; the query
/// still succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PercentChangePolicy {
    /// `None`, serialized as JSON `null`.
    #[default]
    NullOnZeroOpen,
    /// `Some(0.0)`.
    ZeroOnZeroOpen,
}

impl std::str::FromStr for PercentChangePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "null" => Ok(Self::NullOnZeroOpen),
            "zero" => Ok(Self::ZeroOnZeroOpen),
            other => anyhow::bail!("unknown percent change policy {other:?} (expected null or zero)"),
        }
    }
}

impl PriceRecord {
    pub fn price_diff(&self) -> f64 {
        self.close - self.open
    }

    /// Open-to-close change in percent. A zero `open` is resolved by `policy`.
    pub fn percent_change(&self, policy: PercentChangePolicy) -> Option<f64> {
        if self.open == 0.0 {
            return match policy {
                PercentChangePolicy::NullOnZeroOpen => None,
                PercentChangePolicy::ZeroOnZeroOpen => Some(0.0),
            };
        }
        Some((self.close - self.open) / self.open * 100.0)
    }

    pub fn trend(&self) -> Trend {
        Trend::classify(self.open, self.close)
    }
}

/// A record plus the metrics computed for it at query time.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRecord {
    pub record: PriceRecord,
    pub price_diff: f64,
    pub percent_change: Option<f64>,
    pub trend: Trend,
}

impl DerivedRecord {
    pub fn derive(record: PriceRecord, policy: PercentChangePolicy) -> Self {
        Self {
            price_diff: record.price_diff(),
            percent_change: record.percent_change(policy),
            trend: record.trend(),
            record,
        }
    }
}
